//! Field formats shared by the intake steps, and the rule bundles built on them.

use regex::Regex;
use std::sync::LazyLock;
use wizard_flow::{Check, Rule};

pub static PERSON_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-zÀ-ÖØ-öø-ÿ' -]+$").expect("person name pattern"));

pub static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern"));

/// French numbers, national or +33 form, spaces allowed between pairs.
pub static PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\+33 ?|0)[1-9](?: ?[0-9]{2}){4}$").expect("phone pattern")
});

pub static POSTAL_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{5}$").expect("postal code pattern"));

pub static COMPANY_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-zÀ-ÖØ-öø-ÿ0-9&.,' -]+$").expect("company pattern"));

pub static POLICY_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9-]{5,20}$").expect("policy number pattern"));

pub static DOCUMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^.+\.(pdf|jpe?g|png)$").expect("document pattern"));

pub fn person_name(path: &str, label: &str) -> Vec<Rule> {
    vec![
        Rule::required(path, format!("{label} est requis")),
        Rule::new(path, Check::MinLength(2), format!("{label} doit contenir au moins 2 caractères")),
        Rule::new(path, Check::MaxLength(50), format!("{label} ne peut pas dépasser 50 caractères")),
        Rule::new(
            path,
            Check::Pattern(PERSON_NAME.clone()),
            format!("{label} ne peut contenir que des lettres, espaces, apostrophes et tirets"),
        ),
    ]
}

pub fn email(path: &str) -> Vec<Rule> {
    vec![
        Rule::required(path, "L'adresse email est requise"),
        Rule::new(path, Check::Pattern(EMAIL.clone()), "Adresse email invalide"),
    ]
}

pub fn phone(path: &str, required: bool) -> Vec<Rule> {
    let mut rules = Vec::new();
    if required {
        rules.push(Rule::required(path, "Le numéro de téléphone est requis"));
    }
    rules.push(Rule::new(
        path,
        Check::Pattern(PHONE.clone()),
        "Numéro de téléphone invalide",
    ));
    rules
}

/// Street, postal code and city of an address record at `section`.
pub fn address(section: &str) -> Vec<Rule> {
    let street = format!("{section}.street");
    let postal_code = format!("{section}.postalCode");
    let city = format!("{section}.city");
    vec![
        Rule::required(&street, "L'adresse est requise"),
        Rule::new(&street, Check::MinLength(5), "L'adresse doit contenir au moins 5 caractères"),
        Rule::new(&street, Check::MaxLength(200), "L'adresse ne peut pas dépasser 200 caractères"),
        Rule::required(&postal_code, "Le code postal est requis"),
        Rule::new(
            &postal_code,
            Check::Pattern(POSTAL_CODE.clone()),
            "Le code postal doit contenir 5 chiffres",
        ),
        Rule::required(&city, "La ville est requise"),
        Rule::new(&city, Check::MinLength(2), "La ville doit contenir au moins 2 caractères"),
        Rule::new(
            &city,
            Check::Pattern(PERSON_NAME.clone()),
            "La ville ne peut contenir que des lettres",
        ),
    ]
}

/// Whole number within `[min, max]`.
pub fn count(path: &str, label: &str, min: f64, max: f64, required: bool) -> Vec<Rule> {
    let mut rules = Vec::new();
    if required {
        rules.push(Rule::required(path, format!("{label} est requis")));
    }
    rules.push(Rule::new(
        path,
        Check::Integer,
        format!("{label} doit être un nombre entier"),
    ));
    rules.push(Rule::new(path, Check::Min(min), format!("{label} doit être au moins {min}")));
    rules.push(Rule::new(path, Check::Max(max), format!("{label} ne peut pas dépasser {max}")));
    rules
}
