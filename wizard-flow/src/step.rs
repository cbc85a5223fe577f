use serde::{Deserialize, Serialize};

use crate::path::pattern_matches;
use crate::rules::{Rule, validate_rules};
use crate::store::FormStore;
use crate::validation::ValidationResult;

/// How a field is entered, for hosts that render steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "options", rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Number,
    Date,
    Boolean,
    Choice(Vec<String>),
    File,
    List,
}

/// Presentation metadata of one field of a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub path: String,
    pub label: String,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub fn new(path: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            path: path.into(),
            label: label.into(),
            kind,
        }
    }
}

/// Contract every wizard step implements.
///
/// The controller only ever calls [`Step::validate`]; steps with rules that
/// cannot be expressed declaratively override it instead of being special
/// cased by the controller.
pub trait Step: Send + Sync {
    /// Unique identifier for this step
    fn id(&self) -> &str;

    fn title(&self) -> &str;

    fn fields(&self) -> &[FieldSpec] {
        &[]
    }

    fn rules(&self) -> &[Rule];

    fn validate(&self, form: &FormStore) -> ValidationResult {
        validate_rules(self.rules(), form)
    }

    /// True when `path` is validated or rendered by this step.
    fn owns(&self, path: &str) -> bool {
        let covers = |pattern: &str| {
            pattern_matches(pattern, path) || path.starts_with(&format!("{pattern}."))
                || wildcard_prefix(pattern, path)
        };
        self.rules().iter().any(|rule| covers(rule.pattern()))
            || self.fields().iter().any(|field| covers(&field.path))
    }
}

fn wildcard_prefix(pattern: &str, path: &str) -> bool {
    let depth = path.split('.').count();
    let truncated: Vec<&str> = pattern.split('.').take(depth).collect();
    truncated.len() < pattern.split('.').count() && pattern_matches(&truncated.join("."), path)
}

/// A step assembled from data: title, fields and rules.
#[derive(Debug, Clone)]
pub struct FormStep {
    id: String,
    title: String,
    fields: Vec<FieldSpec>,
    rules: Vec<Rule>,
}

impl FormStep {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            fields: Vec::new(),
            rules: Vec::new(),
        }
    }

    pub fn field(mut self, path: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push(FieldSpec::new(path, label, kind));
        self
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules_from(mut self, rules: impl IntoIterator<Item = Rule>) -> Self {
        self.rules.extend(rules);
        self
    }
}

impl Step for FormStep {
    fn id(&self) -> &str {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    fn rules(&self) -> &[Rule] {
        &self.rules
    }
}
