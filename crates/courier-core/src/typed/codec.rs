//! PayloadCodec - JSON payloads in, JSON results out.

use serde_json::Value;

use super::task::Task;

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("invalid payload for task type {task_type}: {source}")]
    Decode {
        task_type: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not encode result of task type {task_type}: {source}")]
    Encode {
        task_type: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Converts between the record's type-erased JSON and a [`Task`]'s own types.
///
/// The engine never looks inside a payload; each routine validates its own
/// shape here, and a mismatch becomes that task's failure.
pub struct PayloadCodec;

impl PayloadCodec {
    pub fn decode<T: Task>(payload: Value) -> Result<T, CodecError> {
        serde_json::from_value(payload).map_err(|source| CodecError::Decode {
            task_type: T::TYPE,
            source,
        })
    }

    pub fn encode<T: Task>(output: &T::Output) -> Result<Value, CodecError> {
        serde_json::to_value(output).map_err(|source| CodecError::Encode {
            task_type: T::TYPE,
            source,
        })
    }
}
