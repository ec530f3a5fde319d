//! Shared mutable state for staged runs.
//!
//! A single lock around a single map: tasks and the orchestrator share one
//! [`SharedState`] handle type, and every read or write takes the same mutex.
//! The map is never iterated from outside, which keeps the locking discipline
//! total.

pub mod store;

pub use store::SharedState;
