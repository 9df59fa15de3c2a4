//! Task status vocabulary.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a task.
///
/// State transitions:
/// - Pending -> Running -> Completed
/// - Pending -> Running -> Failed
///
/// Strictly forward. Nothing leaves a terminal state and nothing re-enters
/// `Pending` or `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Accepted and queued, not yet picked up by an executor.
    Pending,

    /// An executor is running the task body.
    Running,

    /// Finished with a result.
    Completed,

    /// Finished with an error.
    Failed,
}

impl TaskStatus {
    /// Is this a terminal state (no further transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }

    /// Is `next` the single legal step forward from `self`?
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (TaskStatus::Pending, TaskStatus::Running)
                | (TaskStatus::Running, TaskStatus::Completed)
                | (TaskStatus::Running, TaskStatus::Failed)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use TaskStatus::*;

    #[rstest]
    #[case(Pending, Running, true)]
    #[case(Running, Completed, true)]
    #[case(Running, Failed, true)]
    #[case(Pending, Completed, false)]
    #[case(Pending, Failed, false)]
    #[case(Pending, Pending, false)]
    #[case(Running, Pending, false)]
    #[case(Running, Running, false)]
    #[case(Completed, Running, false)]
    #[case(Completed, Failed, false)]
    #[case(Failed, Pending, false)]
    #[case(Failed, Completed, false)]
    fn transitions_only_move_forward(
        #[case] from: TaskStatus,
        #[case] to: TaskStatus,
        #[case] allowed: bool,
    ) {
        assert_eq!(from.can_transition_to(to), allowed);
    }

    #[rstest]
    #[case(Pending, false)]
    #[case(Running, false)]
    #[case(Completed, true)]
    #[case(Failed, true)]
    fn terminal_states(#[case] status: TaskStatus, #[case] terminal: bool) {
        assert_eq!(status.is_terminal(), terminal);
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Completed).unwrap(), "\"completed\"");
        let back: TaskStatus = serde_json::from_str("\"running\"").unwrap();
        assert_eq!(back, Running);
        assert_eq!(Failed.to_string(), "failed");
    }
}
