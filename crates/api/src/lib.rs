//! HTTP backend of the tubedeck dashboard: channel and user settings,
//! analytics history, and video maker jobs.
//!
//! The binary in `main.rs` wires a [`state::AppState`] from the environment;
//! the integration tests build the same router around in-memory fakes.

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod routes;
pub mod state;
