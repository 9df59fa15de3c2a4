//! Task identifiers.
//!
//! Ids are ULIDs rendered as `task-<ulid>`.
//!
//! ## Why ULID
//! - **Sortable by creation time**: the timestamp sits in the high bits, so
//!   ids order the way tasks were submitted.
//! - **No coordination**: 80 random bits per millisecond make collisions
//!   negligible, so uniqueness is left to the generator and never re-checked
//!   against the store.
//! - **Compact**: 128 bits, same size as a UUID.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

const PREFIX: &str = "task-";

/// Identifier of a task record. Immutable once assigned; the only lookup key.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct TaskId(Ulid);

impl TaskId {
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }

    pub fn as_ulid(&self) -> Ulid {
        self.0
    }
}

impl From<Ulid> for TaskId {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{PREFIX}{}", self.0)
    }
}

/// The string is not of the form `task-<ulid>`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed task id: {0:?}")]
pub struct ParseTaskIdError(String);

impl FromStr for TaskId {
    type Err = ParseTaskIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s
            .strip_prefix(PREFIX)
            .ok_or_else(|| ParseTaskIdError(s.to_string()))?;
        Ulid::from_string(raw)
            .map(Self)
            .map_err(|_| ParseTaskIdError(s.to_string()))
    }
}

impl TryFrom<String> for TaskId {
    type Error = ParseTaskIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TaskId> for String {
    fn from(id: TaskId) -> Self {
        id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_prefix_and_parses_back() {
        let id = TaskId::from_ulid(Ulid::new());
        let text = id.to_string();

        assert!(text.starts_with("task-"));
        assert_eq!(text.parse::<TaskId>().unwrap(), id);
    }

    #[test]
    fn parse_rejects_foreign_strings() {
        assert!("".parse::<TaskId>().is_err());
        assert!("01ARZ3NDEKTSV4RRFFQ69G5FAV".parse::<TaskId>().is_err());
        assert!("job-01ARZ3NDEKTSV4RRFFQ69G5FAV".parse::<TaskId>().is_err());
        assert!("task-not-a-ulid".parse::<TaskId>().is_err());
    }

    #[test]
    fn serializes_as_display_string() {
        let id = TaskId::from_ulid(Ulid::new());
        let json = serde_json::to_value(id).unwrap();
        assert_eq!(json, serde_json::Value::String(id.to_string()));

        let back: TaskId = serde_json::from_value(json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn ids_sort_by_creation_time() {
        let id1 = TaskId::from_ulid(Ulid::new());
        std::thread::sleep(std::time::Duration::from_millis(2));
        let id2 = TaskId::from_ulid(Ulid::new());

        assert!(id1 < id2);
    }

    #[test]
    fn newtype_does_not_add_size() {
        assert_eq!(std::mem::size_of::<TaskId>(), std::mem::size_of::<Ulid>());
    }
}
