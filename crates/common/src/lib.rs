//! SubSnipe Common - Shared types and traits
//!
//! This crate provides the data model, error types, and the resolver
//! capability trait used across the SubSnipe crates.

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{LoadError, ResolutionFailure, SubsnipeError, SubsnipeResult};
pub use traits::CnameResolver;
pub use types::{
    Bucket, Classification, ConfirmationMode, FingerprintEntry, ReconJob, ResolutionResult,
    RunStats,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
