//! # parking-core
//!
//! Core crate for the parking reservation service. Contains typed
//! identifiers, topic addressing, wire events, the collaborator traits the
//! coordinator calls into, configuration schemas, and the unified error
//! system.
//!
//! This crate has **no** internal dependencies on other workspace crates.

pub mod config;
pub mod error;
pub mod events;
pub mod result;
pub mod traits;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
