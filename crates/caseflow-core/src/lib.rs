//! # caseflow-core
//!
//! Core types, traits, and abstractions for the caseflow support-ticket
//! service.
//!
//! This crate provides the foundational data structures and trait definitions
//! that other caseflow crates depend on: domain models, the error taxonomy,
//! the live-event wire types, and the store traits implemented by
//! `caseflow-db`.

pub mod error;
pub mod events;
pub mod logging;
pub mod memory;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use events::LiveEvent;
pub use models::*;
pub use traits::*;
