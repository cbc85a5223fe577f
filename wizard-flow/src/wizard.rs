use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::error::{Result, WizardError};
use crate::path::FieldPath;
use crate::step::Step;
use crate::store::{FormStore, Watcher};

/// Key of the step table: the branch a step belongs to (`None` for steps
/// shared by every branch) and its 1-based position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StepKey {
    pub branch: Option<String>,
    pub index: usize,
}

/// A wizard: shared leading steps, then one step sequence per branch.
///
/// The table is built once; adding a step or a branch is a change to the
/// builder calls, not to the controller.
pub struct WizardDefinition {
    pub id: String,
    branch_selector: Option<FieldPath>,
    placeholder_steps: usize,
    shared_steps: usize,
    branch_lengths: BTreeMap<String, usize>,
    table: HashMap<StepKey, Arc<dyn Step>>,
    defaults: Map<String, Value>,
    watchers: Vec<Watcher>,
}

impl fmt::Debug for WizardDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WizardDefinition")
            .field("id", &self.id)
            .field("branch_selector", &self.branch_selector)
            .field("shared_steps", &self.shared_steps)
            .field("branch_lengths", &self.branch_lengths)
            .finish()
    }
}

impl WizardDefinition {
    pub fn branch_selector(&self) -> Option<&FieldPath> {
        self.branch_selector.as_ref()
    }

    pub fn branches(&self) -> Vec<&str> {
        self.branch_lengths.keys().map(String::as_str).collect()
    }

    /// Selected branch, as read from the answers.
    pub fn branch_of(&self, form: &FormStore) -> Option<String> {
        let selector = self.branch_selector.as_ref()?;
        form.value(selector)
            .and_then(|value| value.as_str().map(str::to_string))
            .filter(|branch| !branch.is_empty())
    }

    /// Number of data-entry steps for a branch. Unknown or unset branches
    /// report the placeholder count.
    pub fn total_steps(&self, branch: Option<&str>) -> usize {
        if self.branch_selector.is_none() {
            return self.shared_steps;
        }
        branch
            .and_then(|branch| self.branch_lengths.get(branch))
            .map(|len| self.shared_steps + len)
            .unwrap_or(self.placeholder_steps)
    }

    /// Step at a 1-based position. Shared steps resolve for every branch.
    pub fn step_at(&self, branch: Option<&str>, index: usize) -> Option<Arc<dyn Step>> {
        let shared = StepKey {
            branch: None,
            index,
        };
        if let Some(step) = self.table.get(&shared) {
            return Some(step.clone());
        }
        let branch = branch?;
        self.table
            .get(&StepKey {
                branch: Some(branch.to_string()),
                index,
            })
            .cloned()
    }

    pub fn step(&self, branch: Option<&str>, index: usize) -> Result<Arc<dyn Step>> {
        self.step_at(branch, index).ok_or_else(|| {
            WizardError::StepNotFound(format!(
                "{}: step {} of branch {}",
                self.id,
                index,
                branch.unwrap_or("<none>")
            ))
        })
    }

    /// Every step of a branch, in order.
    pub fn steps_for(&self, branch: Option<&str>) -> Vec<Arc<dyn Step>> {
        (1..=self.total_steps(branch))
            .map_while(|index| self.step_at(branch, index))
            .collect()
    }

    /// Fresh answer tree seeded with the wizard's defaults, with the
    /// derived-value watchers attached.
    pub fn initial_answers(&self) -> FormStore {
        // An object of sections always loads.
        let form = FormStore::from_snapshot(Value::Object(self.defaults.clone()))
            .unwrap_or_default();
        for watcher in &self.watchers {
            let watcher = watcher.clone();
            form.watch(move |path, value, store| watcher(path, value, store));
        }
        form
    }
}

/// Builder for creating wizard definitions
pub struct WizardBuilder {
    id: String,
    branch_selector: Option<String>,
    placeholder_steps: Option<usize>,
    shared: Vec<Arc<dyn Step>>,
    branches: BTreeMap<String, Vec<Arc<dyn Step>>>,
    defaults: Map<String, Value>,
    watchers: Vec<Watcher>,
}

impl WizardBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            branch_selector: None,
            placeholder_steps: None,
            shared: Vec::new(),
            branches: BTreeMap::new(),
            defaults: Map::new(),
            watchers: Vec::new(),
        }
    }

    /// Field whose answer selects the branch.
    pub fn branch_selector(mut self, path: impl Into<String>) -> Self {
        self.branch_selector = Some(path.into());
        self
    }

    /// Step count reported while no branch is selected. Defaults to the
    /// longest branch.
    pub fn placeholder_steps(mut self, steps: usize) -> Self {
        self.placeholder_steps = Some(steps);
        self
    }

    /// Adds a step shared by every branch, ahead of the branch point.
    pub fn add_step(mut self, step: Arc<dyn Step>) -> Self {
        self.shared.push(step);
        self
    }

    pub fn add_branch_step(mut self, branch: impl Into<String>, step: Arc<dyn Step>) -> Self {
        self.branches.entry(branch.into()).or_default().push(step);
        self
    }

    /// Partial defaults a new session starts with, keyed by section.
    pub fn default_section(mut self, section: impl Into<String>, value: Value) -> Self {
        self.defaults.insert(section.into(), value);
        self
    }

    /// Watcher attached to every session's answers, typically to keep a
    /// derived field in sync with its inputs.
    pub fn watch<F>(mut self, watcher: F) -> Self
    where
        F: Fn(&FieldPath, &Value, &FormStore) + Send + Sync + 'static,
    {
        self.watchers.push(Arc::new(watcher));
        self
    }

    pub fn build(self) -> Result<WizardDefinition> {
        let branch_selector = self
            .branch_selector
            .as_deref()
            .map(FieldPath::parse)
            .transpose()?;

        if branch_selector.is_none() && !self.branches.is_empty() {
            return Err(WizardError::UnknownBranch(format!(
                "{}: branch steps declared without a branch selector",
                self.id
            )));
        }

        let shared_steps = self.shared.len();
        let mut table = HashMap::new();
        for (position, step) in self.shared.into_iter().enumerate() {
            table.insert(
                StepKey {
                    branch: None,
                    index: position + 1,
                },
                step,
            );
        }

        let mut branch_lengths = BTreeMap::new();
        for (branch, steps) in self.branches {
            branch_lengths.insert(branch.clone(), steps.len());
            for (position, step) in steps.into_iter().enumerate() {
                table.insert(
                    StepKey {
                        branch: Some(branch.clone()),
                        index: shared_steps + position + 1,
                    },
                    step,
                );
            }
        }

        let placeholder_steps = self.placeholder_steps.unwrap_or_else(|| {
            shared_steps + branch_lengths.values().copied().max().unwrap_or(0)
        });

        Ok(WizardDefinition {
            id: self.id,
            branch_selector,
            placeholder_steps,
            shared_steps,
            branch_lengths,
            table,
            defaults: self.defaults,
            watchers: self.watchers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::FormStep;
    use crate::store::SetOptions;
    use serde_json::json;

    fn step(id: &str) -> Arc<dyn Step> {
        Arc::new(FormStep::new(id, id))
    }

    fn branching() -> WizardDefinition {
        WizardBuilder::new("trip")
            .branch_selector("mode")
            .add_step(step("mode"))
            .add_branch_step("solo", step("solo.a"))
            .add_branch_step("solo", step("solo.b"))
            .add_branch_step("group", step("group.a"))
            .default_section("group", json!({ "people": [] }))
            .watch(|path, value, store| {
                if path.as_str() == "mode" {
                    let label = format!("mode:{}", value.as_str().unwrap_or_default());
                    store.set_with(
                        &FieldPath::parse("summary").unwrap(),
                        json!(label),
                        SetOptions::silent(),
                    )
                    .unwrap();
                }
            })
            .build()
            .unwrap()
    }

    #[test]
    fn total_steps_depends_on_branch_only() {
        let wizard = branching();
        assert_eq!(wizard.total_steps(Some("solo")), 3);
        assert_eq!(wizard.total_steps(Some("group")), 2);
        assert_eq!(wizard.total_steps(None), 3);
        assert_eq!(wizard.total_steps(Some("unknown")), 3);
    }

    #[test]
    fn table_resolves_shared_then_branch_steps() {
        let wizard = branching();
        assert_eq!(wizard.step_at(None, 1).unwrap().id(), "mode");
        assert_eq!(wizard.step_at(Some("group"), 1).unwrap().id(), "mode");
        assert_eq!(wizard.step_at(Some("solo"), 3).unwrap().id(), "solo.b");
        assert!(wizard.step_at(Some("group"), 3).is_none());
        assert!(wizard.step_at(None, 2).is_none());
        assert!(matches!(
            wizard.step(Some("group"), 9),
            Err(WizardError::StepNotFound(_))
        ));
        let ids: Vec<String> = wizard
            .steps_for(Some("solo"))
            .iter()
            .map(|s| s.id().to_string())
            .collect();
        assert_eq!(ids, vec!["mode", "solo.a", "solo.b"]);
    }

    #[test]
    fn branch_is_read_from_answers() {
        let wizard = branching();
        let form = wizard.initial_answers();
        assert_eq!(wizard.branch_of(&form), None);
        assert_eq!(form.snapshot(), json!({ "group": { "people": [] } }));
        form.set_sync("mode", "group").unwrap();
        assert_eq!(wizard.branch_of(&form).as_deref(), Some("group"));
        assert_eq!(form.get_sync::<String>("summary").as_deref(), Some("mode:group"));
    }

    #[test]
    fn linear_wizards_need_no_selector() {
        let wizard = WizardBuilder::new("linear")
            .add_step(step("one"))
            .add_step(step("two"))
            .build()
            .unwrap();
        assert_eq!(wizard.total_steps(None), 2);
        assert!(
            WizardBuilder::new("broken")
                .add_branch_step("x", step("x"))
                .build()
                .is_err()
        );
    }
}
