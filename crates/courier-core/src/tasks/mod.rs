//! Built-in task routines.

pub mod example;

pub use self::example::{ExampleOutput, ExampleTask, ExampleTaskHandler};
