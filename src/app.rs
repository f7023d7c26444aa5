// Startup wiring for the task list and theme preference

use crate::storage::KeyValueStorage;
use crate::task_store::{PersistPolicy, TaskStore};
use crate::theme::ThemePreference;

/// Both state-owning units, loaded from one storage handle
pub struct App<S> {
    pub tasks: TaskStore<S>,
    pub theme: ThemePreference<S>,
}

impl<S: KeyValueStorage + Clone> App<S> {
    /// Build and load both units
    pub fn open(storage: S, policy: PersistPolicy) -> Self {
        Self {
            tasks: TaskStore::new(storage.clone()).with_policy(policy),
            theme: ThemePreference::new(storage),
        }
        .loaded()
    }

    fn loaded(mut self) -> Self {
        self.tasks.load();
        self.theme.load();
        self
    }
}
