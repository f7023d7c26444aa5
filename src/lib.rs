// minitodo - A minimal to-do list persisted to key-value storage

pub mod app;
pub mod config;
pub mod storage;
pub mod task;
pub mod task_store;
pub mod theme;

// Re-export main types for convenience
pub use app::App;
pub use config::Config;
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};
pub use task::{IdGenerator, Task, TaskId, now_ms};
pub use task_store::{PersistPolicy, TASKS_KEY, TaskStore};
pub use theme::{DARK_MODE_KEY, Theme, ThemePreference};
