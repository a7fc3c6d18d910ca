//! # Quarry Host
//!
//! Host-level plumbing shared by every subsystem: reserved names and
//! directory layout ([`constants`]), the top-level [`Error`](error::Error)
//! type, and the explicit [`HostContext`](context::HostContext) threaded
//! through the load pipeline.

pub mod constants;
pub mod context;
pub mod error;

pub use context::{HostContext, LoadOptions};
pub use error::{Error, Result};
