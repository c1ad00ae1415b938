use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::domain::RunId;

use super::RunContext;

/// Active run contexts keyed by run id.
#[derive(Debug, Default)]
pub struct RunRegistry {
    contexts: RwLock<HashMap<RunId, Arc<RunContext>>>,
}

impl RunRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a context. Returns `false` if the run id is already taken.
    pub fn insert(&self, context: Arc<RunContext>) -> bool {
        let mut contexts = self.write();
        if contexts.contains_key(&context.run_id()) {
            return false;
        }
        contexts.insert(context.run_id(), context);
        true
    }

    #[must_use]
    pub fn get(&self, run_id: RunId) -> Option<Arc<RunContext>> {
        self.read().get(&run_id).cloned()
    }

    /// Removes and returns the context; only one caller ever gets `Some`.
    pub fn remove(&self, run_id: RunId) -> Option<Arc<RunContext>> {
        self.write().remove(&run_id)
    }

    #[must_use]
    pub fn contains(&self, run_id: RunId) -> bool {
        self.read().contains_key(&run_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    #[must_use]
    pub fn run_ids(&self) -> Vec<RunId> {
        self.read().keys().copied().collect()
    }

    // A panic elsewhere must not stop runs from being released.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<RunId, Arc<RunContext>>> {
        match self.contexts.read() {
            Ok(contexts) => contexts,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<RunId, Arc<RunContext>>> {
        match self.contexts.write() {
            Ok(contexts) => contexts,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
