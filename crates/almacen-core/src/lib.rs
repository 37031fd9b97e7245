//! # almacen-core
//!
//! Core types, traits, and abstractions for the almacen inventory backend.
//!
//! This crate provides the foundational data structures and trait definitions
//! that the storage and HTTP crates depend on: the typed domain records, the
//! canonical filter set and its normalizer, the sort whitelist, the error
//! taxonomy, and shared defaults.

pub mod defaults;
pub mod error;
pub mod filter;
pub mod logging;
pub mod models;
pub mod sort;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use filter::{FilterField, IdMatch, MaterialFilter};
pub use models::*;
pub use sort::{SortDir, SortKey};
pub use traits::*;
