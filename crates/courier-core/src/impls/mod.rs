//! Impls - implementations of the ports.
//!
//! # Included
//! - **InMemoryTaskStore**: process-lifetime store, nothing survives a restart.

pub mod inmem_store;

pub use self::inmem_store::InMemoryTaskStore;
