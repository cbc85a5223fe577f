use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::{FormStore, controller::WizardState, error::Result, wizard::WizardDefinition};

/// One isolated wizard run: controller state plus the answer tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub wizard_id: String,
    pub state: WizardState,
    pub form: FormStore,
}

impl Session {
    pub fn new_for(definition: &WizardDefinition) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            wizard_id: definition.id.clone(),
            state: WizardState::default(),
            form: definition.initial_answers(),
        }
    }

    /// Copy whose answer tree is independent of this one.
    pub fn detached(&self) -> Self {
        Self {
            id: self.id.clone(),
            wizard_id: self.wizard_id.clone(),
            state: self.state.clone(),
            form: self.form.detached(),
        }
    }
}

/// Trait for storing and retrieving sessions
#[async_trait]
pub trait SessionStorage: Send + Sync {
    async fn save(&self, session: Session) -> Result<()>;
    async fn get(&self, id: &str) -> Result<Option<Session>>;
    async fn delete(&self, id: &str) -> Result<()>;
}

/// In-memory implementation of SessionStorage. Sessions are copied in and
/// out, so a loaded session only changes the stored one once it is saved.
pub struct InMemorySessionStorage {
    sessions: Arc<DashMap<String, Session>>,
}

impl InMemorySessionStorage {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
        }
    }
}

impl Default for InMemorySessionStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStorage for InMemorySessionStorage {
    async fn save(&self, session: Session) -> Result<()> {
        self.sessions.insert(session.id.clone(), session.detached());
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Session>> {
        Ok(self.sessions.get(id).map(|entry| entry.detached()))
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.sessions.remove(id);
        Ok(())
    }
}
