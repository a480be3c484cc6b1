//! Typed identifier wrappers.
//!
//! Asset ids in the metadata store are opaque strings tagged with a scheme
//! prefix. Only `tree:tiger:` ids carry a fingerprint the resolver can look
//! up; everything else is browsable metadata without fetchable content.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Scheme prefix of identifiers addressable through the resolver.
pub const TREE_TIGER_SCHEME: &str = "tree:tiger:";

/// Identifier of an asset in the metadata store, as produced by a query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateId(String);

impl CandidateId {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The tiger-tree fingerprint carried by this id, if it uses the
    /// `tree:tiger:` scheme and has a non-empty hash part.
    pub fn fingerprint(&self) -> Option<Fingerprint> {
        self.0
            .strip_prefix(TREE_TIGER_SCHEME)
            .filter(|hash| !hash.is_empty())
            .map(Fingerprint::new)
    }
}

impl From<&str> for CandidateId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for CandidateId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Base32-encoded tiger-tree root hash, without the scheme prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn new<S: Into<String>>(hash: S) -> Self {
        Self(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Re-attach the scheme prefix.
    pub fn to_candidate_id(&self) -> CandidateId {
        CandidateId(format!("{TREE_TIGER_SCHEME}{}", self.0))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Marker distinguishing one query lifetime from the next.
///
/// Every refresh bumps the generation; completions tagged with an older
/// generation are stale and must be dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Generation(u64);

impl Generation {
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for Generation {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Correlation id of a single request on the resolver connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(u64);

impl RequestId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for RequestId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
