//! Worker process: claims `rag_reindex` jobs, runs the reindex binary as an
//! isolated subprocess, and reports liveness on a separate heartbeat task.

mod error;
mod heartbeat;
mod runner;
mod worker_loop;

pub use error::WorkerError;
pub use heartbeat::HeartbeatLoop;
pub use runner::{JobRunner, SubprocessRunner};
pub use worker_loop::WorkerLoop;
