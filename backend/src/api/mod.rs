//! HTTP API module.
//!
//! This module provides the HTTP server, the response types and the
//! progress/log broadcaster shared with the CLI.

pub mod logs;
pub mod server;
pub mod types;

pub use logs::*;
pub use server::{router, start_server};
pub use types::*;
