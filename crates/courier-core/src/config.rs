//! Engine configuration.

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Largest queue capacity or concurrency limit tokio's channel and
/// semaphore can hold.
pub const MAX_ENGINE_SIZE: usize = Semaphore::MAX_PERMITS;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineConfigError {
    #[error("{field} must be at least 1")]
    Zero { field: &'static str },

    #[error("{field} must be at most {max}, got {value}")]
    TooLarge {
        field: &'static str,
        value: usize,
        max: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Slots in the dispatch queue. The only admission control: once full,
    /// submissions fail with `QueueFull`.
    pub queue_capacity: usize,

    /// Cap on concurrently running executors. `None` runs one executor per
    /// dequeued task with no upper bound.
    pub max_concurrency: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            max_concurrency: None,
        }
    }
}

impl EngineConfig {
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn with_max_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrency = Some(limit);
        self
    }

    pub fn validate(&self) -> Result<(), EngineConfigError> {
        check_size("queue_capacity", self.queue_capacity)?;
        if let Some(limit) = self.max_concurrency {
            check_size("max_concurrency", limit)?;
        }
        Ok(())
    }
}

fn check_size(field: &'static str, value: usize) -> Result<(), EngineConfigError> {
    if value == 0 {
        return Err(EngineConfigError::Zero { field });
    }
    if value > MAX_ENGINE_SIZE {
        return Err(EngineConfigError::TooLarge {
            field,
            value,
            max: MAX_ENGINE_SIZE,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = EngineConfig::default();
        assert_eq!(config.queue_capacity, 100);
        assert_eq!(config.max_concurrency, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_sizes_are_rejected() {
        assert_eq!(
            EngineConfig::default().with_queue_capacity(0).validate(),
            Err(EngineConfigError::Zero { field: "queue_capacity" })
        );
        assert_eq!(
            EngineConfig::default().with_max_concurrency(0).validate(),
            Err(EngineConfigError::Zero { field: "max_concurrency" })
        );
    }

    #[test]
    fn queue_capacity_above_channel_limit_is_rejected() {
        let config = EngineConfig::default().with_queue_capacity(usize::MAX);
        assert_eq!(
            config.validate(),
            Err(EngineConfigError::TooLarge {
                field: "queue_capacity",
                value: usize::MAX,
                max: MAX_ENGINE_SIZE,
            })
        );
        assert!(
            EngineConfig::default()
                .with_queue_capacity(MAX_ENGINE_SIZE)
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn max_concurrency_above_semaphore_limit_is_rejected() {
        let config = EngineConfig::default().with_max_concurrency(MAX_ENGINE_SIZE + 1);
        assert!(matches!(
            config.validate(),
            Err(EngineConfigError::TooLarge { field: "max_concurrency", .. })
        ));
        assert!(
            EngineConfig::default()
                .with_max_concurrency(MAX_ENGINE_SIZE)
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"max_concurrency": 4}"#).unwrap();
        assert_eq!(config.queue_capacity, DEFAULT_QUEUE_CAPACITY);
        assert_eq!(config.max_concurrency, Some(4));
    }
}
