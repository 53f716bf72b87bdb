//! Runhook job runner
//!
//! Everything that happens to an accepted job: the bounded queue it waits
//! in, the worker that drains it, and the pipeline stages that worker runs
//! (workspace, artifacts, script execution, reporting).

pub mod archive;
pub mod artifacts;
pub mod config;
pub mod deadline;
pub mod executor;
pub mod queue;
pub mod scheduler;
pub mod workspace;

pub use config::WorkerConfig;
pub use queue::{JobQueue, JobReceiver};
pub use scheduler::Worker;
