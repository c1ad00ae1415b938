use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type DefinitionId = Uuid;

/// What to hit, with how many virtual users, for how long.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestDefinition {
    pub id: DefinitionId,
    pub target_url: String,
    pub virtual_users: u32,
    pub duration_secs: u64,
}

impl TestDefinition {
    #[must_use]
    pub fn new(target_url: impl Into<String>, virtual_users: u32, duration_secs: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            target_url: target_url.into(),
            virtual_users,
            duration_secs,
        }
    }

    /// Worker pool size; never below one.
    #[must_use]
    pub fn pool_size(&self) -> usize {
        usize::try_from(self.virtual_users.max(1)).unwrap_or(1)
    }

    /// Run length; never below one second.
    #[must_use]
    pub fn effective_duration(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.duration_secs.max(1))
    }
}
