//! Asset resolution against the local bithorde daemon.
//!
//! An [`AssetResolver`] accepts fingerprint lookups and reports each one's
//! [`ResolutionOutcome`] exactly once, asynchronously, as a [`Completion`]
//! sent on the channel supplied with the request. Completions arrive from a
//! background context in whatever order the daemon answers.
//!
//! # Module layout
//!
//! - [`protocol`] -- Newline-delimited JSON lookup messages.
//! - [`client`] -- [`BithordeResolver`], the process-wide connection.

pub mod client;
pub mod protocol;

#[cfg(test)]
pub(crate) mod testing;

use std::path::PathBuf;

use hordebrowse_common::{CandidateId, Fingerprint, Generation};
use tokio::sync::mpsc;

pub use client::{BithordeResolver, MAX_LINE_LENGTH};

/// Channel on which a resolver delivers completions.
pub type CompletionSender = mpsc::Sender<Completion>;

/// One lookup submitted on behalf of a query generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionRequest {
    pub candidate: CandidateId,
    pub fingerprint: Fingerprint,
    pub generation: Generation,
}

impl ResolutionRequest {
    /// Build a request for a candidate, or `None` if it has no tiger fingerprint.
    pub fn for_candidate(candidate: CandidateId, generation: Generation) -> Option<Self> {
        let fingerprint = candidate.fingerprint()?;
        Some(Self {
            candidate,
            fingerprint,
            generation,
        })
    }
}

/// An asset the daemon can serve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
    pub fingerprint: Fingerprint,
    pub size: Option<u64>,
}

/// Why a lookup did not produce an asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The daemon does not know the asset.
    NotFound,
    /// The daemon answered with an error status.
    Rejected(String),
    /// The request was dropped by [`AssetResolver::clear`].
    Cancelled,
    /// The daemon connection is gone.
    Disconnected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionOutcome {
    Success(ResolvedAsset),
    Failure(FailureReason),
}

impl ResolutionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// A finished lookup, echoing its request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub request: ResolutionRequest,
    pub outcome: ResolutionOutcome,
}

/// A fingerprint lookup service.
///
/// `submit` never blocks. Every submitted request yields exactly one
/// [`Completion`] on `reply`, including requests dropped by `clear`, which
/// complete with [`FailureReason::Cancelled`]. Callers must still treat
/// completions from before a `clear` as stale: one may already be in flight.
pub trait AssetResolver: Send + Sync {
    fn submit(&self, request: ResolutionRequest, reply: CompletionSender);

    /// Abandon every pending request.
    fn clear(&self);
}

/// Resolver error types
#[derive(Debug, thiserror::Error)]
pub enum ResolverError {
    #[error("Failed to connect to bithorde at {path:?}: {source}")]
    Connect {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Resolver startup failed: {0}")]
    Startup(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Protocol error: {0}")]
    Protocol(String),
}
