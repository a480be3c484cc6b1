//! Hordebrowse-Common: Shared types and errors.
//!
//! This crate provides functionality used by both the metadata store and the
//! browser itself:
//!
//! - **Identifiers**: Candidate asset ids, tiger-tree fingerprints, query
//!   generations and resolver request ids
//! - **Criteria**: The key/value query constraints built by the filter bar
//! - **Error Handling**: Common error types and result aliases
//!
//! # Examples
//!
//! ```
//! use hordebrowse_common::{CandidateId, Criteria, CriterionValue};
//!
//! let id = CandidateId::new("tree:tiger:ABCDEFGHIJKLMNOPQRSTUVWXYZ234567ABCDEFG");
//! assert!(id.fingerprint().is_some());
//!
//! let mut criteria = Criteria::new();
//! criteria.insert("genre", CriterionValue::Any);
//! assert_eq!(criteria.len(), 1);
//! ```

pub mod error;
pub mod ids;
pub mod types;

pub use error::{Error, Result};
pub use ids::*;
pub use types::*;
