// Authoritative task list, mirrored to key-value storage

use crate::storage::KeyValueStorage;
use crate::task::{IdGenerator, Task, TaskId, now_ms};
use eyre::{Context, Result, eyre};
use serde_json::Value;
use tracing::{debug, warn};

/// Storage key holding the serialized task list
pub const TASKS_KEY: &str = "tasks";

/// Whether an empty task list is written to storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PersistPolicy {
    /// Every mutation is persisted, including deleting the last task
    #[default]
    Always,
    /// Writes of an empty list are skipped; deleting the last task is not persisted
    SkipEmpty,
}

/// In-memory ordered task list that persists itself after every mutation
///
/// The backing list keeps insertion order. Display order is a projection
/// computed by `ordered_for_display`.
pub struct TaskStore<S> {
    storage: S,
    tasks: Vec<Task>,
    ids: IdGenerator,
    policy: PersistPolicy,
}

impl<S: KeyValueStorage> TaskStore<S> {
    /// Create an empty store over `storage` without loading
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            tasks: Vec::new(),
            ids: IdGenerator::new(),
            policy: PersistPolicy::default(),
        }
    }

    /// Create a store and load the persisted list
    pub fn open(storage: S) -> Self {
        let mut store = Self::new(storage);
        store.load();
        store
    }

    pub fn with_policy(mut self, policy: PersistPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> PersistPolicy {
        self.policy
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Replace the in-memory list with the persisted one
    ///
    /// Missing or malformed data yields an empty list; the failure is logged
    /// and never returned.
    pub fn load(&mut self) {
        let tasks = match self.storage.get(TASKS_KEY) {
            Ok(Some(raw)) => {
                debug!(key = TASKS_KEY, raw = %raw, "Raw stored tasks");
                match parse_tasks(&raw) {
                    Ok(tasks) => tasks,
                    Err(e) => {
                        warn!(key = TASKS_KEY, error = ?e, "Stored tasks are malformed, starting empty");
                        Vec::new()
                    }
                }
            }
            Ok(None) => {
                debug!(key = TASKS_KEY, "No stored tasks, starting empty");
                Vec::new()
            }
            Err(e) => {
                warn!(key = TASKS_KEY, error = ?e, "Failed to read stored tasks, starting empty");
                Vec::new()
            }
        };

        for task in &tasks {
            self.ids.observe(task.id);
        }

        debug!(count = tasks.len(), "Loaded tasks");
        self.tasks = tasks;
    }

    /// Append a task with the trimmed text
    ///
    /// Returns `None` without touching storage when the text is blank.
    pub fn add(&mut self, raw_text: &str) -> Result<Option<TaskId>> {
        let text = raw_text.trim();
        if text.is_empty() {
            return Ok(None);
        }

        let id = match self.ids.next_id() {
            Some(id) => id,
            None => self.free_id().ok_or_else(|| eyre!("No free task id"))?,
        };
        let previous = self.tasks.clone();
        self.tasks.push(Task {
            id,
            text: text.to_string(),
            completed: false,
        });
        debug!(%id, "Added task");

        self.commit(previous)?;
        Ok(Some(id))
    }

    /// Remove the task with `id`, returning whether one was removed
    pub fn remove(&mut self, id: TaskId) -> Result<bool> {
        let previous = self.tasks.clone();
        self.tasks.retain(|task| task.id != id);
        let removed = self.tasks.len() != previous.len();
        debug!(%id, removed, "Remove task");

        self.commit(previous)?;
        Ok(removed)
    }

    /// Flip completion on the task with `id`
    ///
    /// Returns the new state, or `None` if no task matched.
    pub fn toggle(&mut self, id: TaskId) -> Result<Option<bool>> {
        let previous = self.tasks.clone();
        let completed = self.tasks.iter_mut().find(|task| task.id == id).map(|task| {
            task.completed = !task.completed;
            task.completed
        });
        debug!(%id, ?completed, "Toggle task");

        self.commit(previous)?;
        Ok(completed)
    }

    /// Persist, restoring `previous` if the write fails so memory matches storage
    fn commit(&mut self, previous: Vec<Task>) -> Result<()> {
        if let Err(e) = self.persist() {
            warn!(error = ?e, "Persist failed, rolling back");
            self.tasks = previous;
            return Err(e);
        }
        Ok(())
    }

    /// Unused id near the current time, once the generator has run past `i64::MAX`
    fn free_id(&self) -> Option<TaskId> {
        let now = now_ms();
        (now..=i64::MAX)
            .chain(i64::MIN..now)
            .map(TaskId)
            .find(|id| self.get(*id).is_none())
    }

    /// Write the current list to storage
    pub fn persist(&self) -> Result<()> {
        if self.tasks.is_empty() && self.policy == PersistPolicy::SkipEmpty {
            debug!("Task list is empty, skipping persist");
            return Ok(());
        }

        let json = serde_json::to_string(&self.tasks).context("Failed to serialize tasks")?;
        self.storage
            .set(TASKS_KEY, &json)
            .context("Failed to persist tasks")?;

        debug!(count = self.tasks.len(), "Persisted tasks");
        Ok(())
    }

    /// Tasks in insertion order
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Incomplete tasks first, then completed ones, insertion order kept within each group
    pub fn ordered_for_display(&self) -> impl Iterator<Item = &Task> + Clone + '_ {
        let pending = self.tasks.iter().filter(|task| !task.completed);
        let done = self.tasks.iter().filter(|task| task.completed);
        pending.chain(done)
    }
}

/// Parse a stored task list
///
/// The value must be a JSON array. Entries that are not tasks are skipped.
pub fn parse_tasks(raw: &str) -> Result<Vec<Task>> {
    let value: Value = serde_json::from_str(raw).context("Stored tasks are not valid JSON")?;

    let entries = match value {
        Value::Array(entries) => entries,
        other => return Err(eyre!("Stored tasks are not an array: {}", json_kind(&other))),
    };

    let mut tasks = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        match serde_json::from_value::<Task>(entry) {
            Ok(task) => tasks.push(task),
            Err(e) => {
                warn!(index, error = ?e, "Failed to parse stored task, skipping");
            }
        }
    }

    Ok(tasks)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
