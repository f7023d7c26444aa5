// Data model for to-do tasks

use chrono::{DateTime, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Task identifier, derived from the creation time in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub i64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(TaskId)
    }
}

/// A single to-do entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
}

impl Task {
    /// When the task was created, recovered from its id
    pub fn created_at(&self) -> Option<DateTime<Local>> {
        Local.timestamp_millis_opt(self.id.0).single()
    }
}

/// Hands out strictly increasing ids based on the wall clock
///
/// Two creations in the same millisecond get `last + 1` instead of colliding.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    last: i64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure later ids are greater than `id`
    pub fn observe(&mut self, id: TaskId) {
        self.last = self.last.max(id.0);
    }

    /// Next id, or `None` once an id of `i64::MAX` has been handed out or observed
    pub fn next_id(&mut self) -> Option<TaskId> {
        self.next_at(now_ms())
    }

    fn next_at(&mut self, now: i64) -> Option<TaskId> {
        let floor = self.last.checked_add(1)?;
        let id = now.max(floor);
        self.last = id;
        Some(TaskId(id))
    }
}

/// Helper function to get current timestamp in milliseconds
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_ms() {
        let ts = now_ms();
        assert!(ts > 0);
        // Should be reasonable timestamp (after year 2020)
        assert!(ts > 1_600_000_000_000);
    }

    #[test]
    fn test_task_serialization_shape() {
        let task = Task {
            id: TaskId(1_700_000_000_000),
            text: "Buy milk".to_string(),
            completed: false,
        };

        let json = serde_json::to_string(&task).unwrap();
        assert_eq!(json, r#"{"id":1700000000000,"text":"Buy milk","completed":false}"#);

        let deserialized: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, task);
    }

    #[test]
    fn test_task_completed_defaults_to_false() {
        let task: Task = serde_json::from_str(r#"{"id":5,"text":"x"}"#).unwrap();
        assert!(!task.completed);
    }

    #[test]
    fn test_task_id_parse() {
        assert_eq!(" 42 ".parse::<TaskId>().unwrap(), TaskId(42));
        assert!("abc".parse::<TaskId>().is_err());
        assert_eq!(TaskId(7).to_string(), "7");
    }

    #[test]
    fn test_created_at_from_id() {
        let task = Task {
            id: TaskId(1_700_000_000_000),
            text: "x".to_string(),
            completed: false,
        };
        let created = task.created_at().unwrap();
        assert_eq!(created.timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn test_id_generator_same_millisecond() {
        let mut ids = IdGenerator::new();
        let a = ids.next_at(1000);
        let b = ids.next_at(1000);
        let c = ids.next_at(1000);
        assert_eq!(a, Some(TaskId(1000)));
        assert_eq!(b, Some(TaskId(1001)));
        assert_eq!(c, Some(TaskId(1002)));
    }

    #[test]
    fn test_id_generator_follows_clock() {
        let mut ids = IdGenerator::new();
        assert_eq!(ids.next_at(1000), Some(TaskId(1000)));
        assert_eq!(ids.next_at(5000), Some(TaskId(5000)));
        // Clock going backwards never produces a smaller id
        assert_eq!(ids.next_at(10), Some(TaskId(5001)));
    }

    #[test]
    fn test_id_generator_observe() {
        let mut ids = IdGenerator::new();
        ids.observe(TaskId(9000));
        ids.observe(TaskId(100));
        assert_eq!(ids.next_at(1000), Some(TaskId(9001)));
    }

    #[test]
    fn test_id_generator_exhausted_at_max() {
        let mut ids = IdGenerator::new();
        ids.observe(TaskId(i64::MAX));
        assert_eq!(ids.next_at(1000), None);
        assert_eq!(ids.next_at(i64::MAX), None);

        let mut ids = IdGenerator::new();
        assert_eq!(ids.next_at(i64::MAX), Some(TaskId(i64::MAX)));
        assert_eq!(ids.next_at(i64::MAX), None);
    }

    #[test]
    fn test_id_generator_real_clock_is_increasing() {
        let mut ids = IdGenerator::new();
        let first = ids.next_id().unwrap();
        let second = ids.next_id().unwrap();
        assert!(second > first);
    }
}
