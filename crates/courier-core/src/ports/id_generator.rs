//! IdGenerator port - task id generation behind a trait.

use parking_lot::Mutex;
use std::time::SystemTime;
use ulid::{Generator, Ulid};

use crate::domain::TaskId;
use crate::ports::Clock;

/// Called concurrently from every submission.
pub trait IdGenerator: Send + Sync {
    fn generate_task_id(&self) -> TaskId;
}

/// Monotonic ULIDs stamped by the injected clock.
///
/// Ids made within one millisecond still sort in submission order: the
/// random part is incremented instead of redrawn. If that increment would
/// overflow, a fresh random id for the same millisecond is used instead,
/// which is still unique but no longer ordered.
pub struct UlidGenerator<C> {
    clock: C,
    generator: Mutex<Generator>,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            generator: Mutex::new(Generator::new()),
        }
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_task_id(&self) -> TaskId {
        let now = self.clock.now();
        let ulid = self
            .generator
            .lock()
            .generate_from_datetime(SystemTime::from(now))
            .unwrap_or_else(|_| Ulid::from_parts(now.timestamp_millis() as u64, rand::random()));
        TaskId::from_ulid(ulid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{FixedClock, SystemClock};
    use chrono::{TimeZone, Utc};
    use std::collections::HashSet;

    #[test]
    fn ids_are_unique_and_prefixed() {
        let ids = UlidGenerator::new(SystemClock);

        let generated: HashSet<TaskId> = (0..1000).map(|_| ids.generate_task_id()).collect();

        assert_eq!(generated.len(), 1000);
        assert!(generated.iter().all(|id| id.to_string().starts_with("task-")));
    }

    #[test]
    fn same_millisecond_ids_keep_submission_order() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap();
        let ids = UlidGenerator::new(FixedClock::new(at));

        let generated: Vec<TaskId> = (0..50).map(|_| ids.generate_task_id()).collect();

        assert!(generated.windows(2).all(|w| w[0] < w[1]));
        assert!(
            generated
                .iter()
                .all(|id| id.as_ulid().timestamp_ms() == at.timestamp_millis() as u64)
        );
    }
}
