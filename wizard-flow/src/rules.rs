//! Declarative field rules.
//!
//! A rule names a field pattern, a check and the message shown when the check
//! fails. Patterns may contain `*` to address every entry of a list section,
//! e.g. `multipleRelocationRequests.*.email`. Every rule of a step is
//! evaluated by [`validate_rules`]; nothing is short-circuited across fields.

use chrono::{Local, NaiveDate};
use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::path::FieldPath;
use crate::store::FormStore;
use crate::validation::{ValidationErrors, ValidationResult};

/// Guard deciding whether a rule applies to the current answers.
pub type Condition = Arc<dyn Fn(&FormStore) -> bool + Send + Sync>;

/// Free-form predicate over a field value.
pub type CustomCheck = Arc<dyn Fn(&Value, &FormStore) -> bool + Send + Sync>;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// What a rule verifies about its field.
///
/// Apart from `Required`, `Checked` and `MinItems`, checks pass on blank
/// fields so they compose with `Required` instead of duplicating it.
/// Text checks only accept JSON strings and numeric checks only JSON
/// numbers, so a value that validates also decodes into the host's types.
#[derive(Clone)]
pub enum Check {
    Required,
    MinLength(usize),
    MaxLength(usize),
    Pattern(Regex),
    /// Inclusive numeric lower bound.
    Min(f64),
    /// Exclusive numeric lower bound.
    Above(f64),
    Max(f64),
    /// Whole JSON number, e.g. a head count.
    Integer,
    OneOf(Vec<String>),
    /// Checkbox that must be ticked.
    Checked,
    MinItems(usize),
    /// `YYYY-MM-DD` calendar date.
    Date,
    NotInPast,
    /// Date strictly after the date at another pattern. Wildcards in the
    /// other pattern bind to the same list indices as the rule's own.
    DateAfter(String),
    /// Number not greater than the number at another pattern.
    NotAbove(String),
    Custom(CustomCheck),
}

impl fmt::Debug for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Check::Required => write!(f, "Required"),
            Check::MinLength(n) => write!(f, "MinLength({n})"),
            Check::MaxLength(n) => write!(f, "MaxLength({n})"),
            Check::Pattern(re) => write!(f, "Pattern({})", re.as_str()),
            Check::Min(n) => write!(f, "Min({n})"),
            Check::Above(n) => write!(f, "Above({n})"),
            Check::Max(n) => write!(f, "Max({n})"),
            Check::Integer => write!(f, "Integer"),
            Check::OneOf(options) => write!(f, "OneOf({options:?})"),
            Check::Checked => write!(f, "Checked"),
            Check::MinItems(n) => write!(f, "MinItems({n})"),
            Check::Date => write!(f, "Date"),
            Check::NotInPast => write!(f, "NotInPast"),
            Check::DateAfter(other) => write!(f, "DateAfter({other})"),
            Check::NotAbove(other) => write!(f, "NotAbove({other})"),
            Check::Custom(_) => write!(f, "Custom"),
        }
    }
}

impl Check {
    fn passes(
        &self,
        value: Option<&Value>,
        form: &FormStore,
        bindings: &[usize],
        today: NaiveDate,
    ) -> bool {
        match self {
            Check::Required => !is_blank(value),
            Check::Checked => value.and_then(Value::as_bool) == Some(true),
            Check::MinItems(min) => value.and_then(Value::as_array).map_or(0, Vec::len) >= *min,
            _ if is_blank(value) => true,
            Check::MinLength(min) => {
                text(value).is_some_and(|s| s.trim().chars().count() >= *min)
            }
            Check::MaxLength(max) => {
                text(value).is_some_and(|s| s.trim().chars().count() <= *max)
            }
            Check::Pattern(re) => text(value).is_some_and(|s| re.is_match(s.trim())),
            Check::Min(min) => number(value).is_some_and(|n| n >= *min),
            Check::Above(bound) => number(value).is_some_and(|n| n > *bound),
            Check::Max(max) => number(value).is_some_and(|n| n <= *max),
            Check::Integer => value.is_some_and(|v| v.is_i64() || v.is_u64()),
            Check::OneOf(options) => {
                text(value).is_some_and(|s| options.iter().any(|option| option == s.trim()))
            }
            Check::Date => date(value).is_some(),
            Check::NotInPast => date(value).is_none_or(|d| d >= today),
            Check::DateAfter(other) => {
                let other = resolve(other, bindings, form);
                match (date(value), date(other.as_ref())) {
                    (Some(this), Some(other)) => this > other,
                    _ => true,
                }
            }
            Check::NotAbove(other) => {
                let other = resolve(other, bindings, form);
                match (number(value), number(other.as_ref())) {
                    (Some(this), Some(other)) => this <= other,
                    _ => true,
                }
            }
            Check::Custom(check) => value.is_some_and(|v| check(v, form)),
        }
    }
}

/// A single `{field pattern, check, message}` constraint.
#[derive(Clone)]
pub struct Rule {
    pattern: String,
    check: Check,
    message: String,
    condition: Option<Condition>,
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("pattern", &self.pattern)
            .field("check", &self.check)
            .field("message", &self.message)
            .field("conditional", &self.condition.is_some())
            .finish()
    }
}

impl Rule {
    pub fn new(pattern: impl Into<String>, check: Check, message: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            check,
            message: message.into(),
            condition: None,
        }
    }

    pub fn required(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(pattern, Check::Required, message)
    }

    /// Makes the rule apply only while `condition` holds.
    pub fn when<F>(mut self, condition: F) -> Self
    where
        F: Fn(&FormStore) -> bool + Send + Sync + 'static,
    {
        self.condition = Some(Arc::new(condition));
        self
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn check(&self) -> &Check {
        &self.check
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_active(&self, form: &FormStore) -> bool {
        self.condition.as_ref().is_none_or(|condition| condition(form))
    }

    /// Concrete paths that violate this rule.
    pub fn violations(&self, form: &FormStore, today: NaiveDate) -> Vec<FieldPath> {
        if !self.is_active(form) {
            return Vec::new();
        }
        expand(&self.pattern, form)
            .into_iter()
            .filter(|(path, bindings)| {
                let value = form.value(path);
                !self.check.passes(value.as_ref(), form, bindings, today)
            })
            .map(|(path, _)| path)
            .collect()
    }
}

/// Evaluates every rule against the current answers.
pub fn validate_rules(rules: &[Rule], form: &FormStore) -> ValidationResult {
    validate_rules_at(rules, form, Local::now().date_naive())
}

/// Same as [`validate_rules`] with an explicit reference date.
pub fn validate_rules_at(rules: &[Rule], form: &FormStore, today: NaiveDate) -> ValidationResult {
    let mut errors = ValidationErrors::new();
    for rule in rules {
        for path in rule.violations(form, today) {
            errors.insert(path.to_string(), rule.message());
        }
    }
    errors.into()
}

/// Expands list wildcards against the current answers, keeping the indices
/// each `*` was bound to.
fn expand(pattern: &str, form: &FormStore) -> Vec<(FieldPath, Vec<usize>)> {
    let mut partial: Vec<(String, Vec<usize>)> = vec![(String::new(), Vec::new())];
    for part in pattern.split('.') {
        let mut next = Vec::new();
        for (prefix, bindings) in partial {
            if part == "*" {
                let Ok(list) = FieldPath::parse(&prefix) else {
                    continue;
                };
                for index in 0..form.len(&list) {
                    let mut bound = bindings.clone();
                    bound.push(index);
                    next.push((format!("{prefix}.{index}"), bound));
                }
            } else if prefix.is_empty() {
                next.push((part.to_string(), bindings));
            } else {
                next.push((format!("{prefix}.{part}"), bindings));
            }
        }
        partial = next;
    }

    partial
        .into_iter()
        .filter_map(|(raw, bindings)| FieldPath::parse(&raw).ok().map(|path| (path, bindings)))
        .collect()
}

fn resolve(pattern: &str, bindings: &[usize], form: &FormStore) -> Option<Value> {
    let mut bound = bindings.iter();
    let mut parts = Vec::new();
    for part in pattern.split('.') {
        if part == "*" {
            parts.push(bound.next()?.to_string());
        } else {
            parts.push(part.to_string());
        }
    }
    let path = FieldPath::parse(&parts.join(".")).ok()?;
    form.value(&path)
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(map)) => map.is_empty(),
        Some(_) => false,
    }
}

fn text(value: Option<&Value>) -> Option<&str> {
    value?.as_str()
}

fn number(value: Option<&Value>) -> Option<f64> {
    value?.as_f64()
}

/// Parses a `YYYY-MM-DD` answer.
pub fn parse_date(value: &Value) -> Option<NaiveDate> {
    value
        .as_str()
        .and_then(|s| NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok())
}

fn date(value: Option<&Value>) -> Option<NaiveDate> {
    value.and_then(parse_date)
}
