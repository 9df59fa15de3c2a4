//! Task trait - binds a `task_type` tag to a payload type and a result type.

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Binds a `task_type` string to the Rust types of its payload and result.
///
/// # Example
/// ```ignore
/// #[derive(Serialize, Deserialize)]
/// struct Resize {
///     url: String,
///     width: u32,
/// }
///
/// impl Task for Resize {
///     const TYPE: &'static str = "images.resize";
///     type Output = ResizeReport;
/// }
/// ```
///
/// # Trait Bounds
/// - `DeserializeOwned`: the payload is decoded from the stored JSON object.
/// - `Send + Sync + 'static`: handlers live in an `Arc` shared by executors.
pub trait Task: Serialize + DeserializeOwned + Send + Sync + 'static {
    const TYPE: &'static str;

    /// Encoded into the record's `result` on success.
    type Output: Serialize + Send + 'static;
}
