//! Task record: the unit of work and its outcome.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use super::{CourierError, TaskId, TaskStatus};

/// String tag selecting the routine that runs a task.
///
/// Any non-blank tag is accepted at submission. Whether a routine exists is
/// only checked when the task runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskType(String);

impl TaskType {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Validating constructor used on the submission path.
    pub fn parse(s: impl Into<String>) -> Result<Self, CourierError> {
        let s = s.into();
        if s.trim().is_empty() {
            return Err(CourierError::InvalidInput(
                "task type must not be blank".to_string(),
            ));
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One record per submission.
///
/// Design:
/// - Records are values. Stores hand out clones and take whole records back,
///   so a reader never sees a half-written record.
/// - Status only changes through [`start`](Self::start),
///   [`complete`](Self::complete) and [`fail`](Self::fail), which consume the
///   record and refuse anything but a forward step.
/// - `updated_at` is stamped by the store on replace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    id: TaskId,
    #[serde(rename = "type")]
    task_type: TaskType,
    status: TaskStatus,
    payload: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TaskRecord {
    /// A fresh `pending` record.
    pub fn new(
        id: TaskId,
        task_type: TaskType,
        payload: Map<String, Value>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            task_type,
            status: TaskStatus::Pending,
            payload,
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn task_type(&self) -> &TaskType {
        &self.task_type
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }

    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// `pending -> running`.
    pub fn start(self) -> Result<Self, CourierError> {
        self.transition(TaskStatus::Running)
    }

    /// `running -> completed`, carrying the routine's result.
    pub fn complete(self, result: Value) -> Result<Self, CourierError> {
        let mut next = self.transition(TaskStatus::Completed)?;
        next.result = Some(result);
        Ok(next)
    }

    /// `running -> failed`, carrying the failure description.
    pub fn fail(self, error: impl Into<String>) -> Result<Self, CourierError> {
        let mut next = self.transition(TaskStatus::Failed)?;
        next.error = Some(error.into());
        Ok(next)
    }

    /// Used by stores when persisting a replacement.
    pub fn with_updated_at(mut self, at: DateTime<Utc>) -> Self {
        self.updated_at = at;
        self
    }

    /// `result` only when completed, `error` only when failed, neither before.
    pub fn is_consistent(&self) -> bool {
        match self.status {
            TaskStatus::Pending | TaskStatus::Running => {
                self.result.is_none() && self.error.is_none()
            }
            TaskStatus::Completed => self.result.is_some() && self.error.is_none(),
            TaskStatus::Failed => self.error.is_some() && self.result.is_none(),
        }
    }

    fn transition(mut self, next: TaskStatus) -> Result<Self, CourierError> {
        if !self.status.can_transition_to(next) {
            return Err(CourierError::InvalidTransition {
                id: self.id,
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(self)
    }
}

/// What `get_result` hands back for a completed task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    pub id: TaskId,
    pub result: Value,
}
