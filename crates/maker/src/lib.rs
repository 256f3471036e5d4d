//! Video maker jobs: the in-memory [`JobRegistry`] and the subprocess
//! [`JobRunner`] that feeds it.

pub mod registry;
pub mod runner;

pub use registry::{JobRegistry, DEFAULT_RETENTION};
pub use runner::{JobRunner, MakerCommand, MakerPayload, COMPLETED_MESSAGE};
