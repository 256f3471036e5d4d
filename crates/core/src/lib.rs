//! Domain types and pure rules shared by the tubedeck crates.
//!
//! Nothing in here performs I/O: the store, the YouTube client, the job
//! runner and the HTTP layer all build on these types.

pub mod analytics;
pub mod channel_url;
pub mod error;
pub mod job;
pub mod presets;
pub mod schedule;
pub mod settings;
pub mod types;
