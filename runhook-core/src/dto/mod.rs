//! Data Transfer Objects
//!
//! Wire formats exchanged with the orchestrator.

pub mod task_result;
