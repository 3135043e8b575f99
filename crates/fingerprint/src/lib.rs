//! Fingerprint Store - third-party service identification by CNAME
//!
//! This module provides:
//! - Loading of can-i-take-over-xyz style fingerprint databases
//! - Direct CNAME suffix matching (first match wins, load order)
//! - Second-level-domain fallback matching

mod domain;
mod store;

pub use domain::{second_level_label, service_key, trim_root};
pub use store::{FingerprintMatch, FingerprintStore};
