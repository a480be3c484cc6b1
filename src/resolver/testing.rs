//! A resolver whose lookups are completed by hand from tests.

use hordebrowse_common::CandidateId;
use parking_lot::Mutex;

use super::{
    AssetResolver, Completion, CompletionSender, FailureReason, ResolutionOutcome,
    ResolutionRequest, ResolvedAsset,
};

#[derive(Default)]
pub(crate) struct ManualResolver {
    pending: Mutex<Vec<(ResolutionRequest, CompletionSender)>>,
    submitted: Mutex<Vec<CandidateId>>,
    clears: Mutex<usize>,
}

impl ManualResolver {
    pub(crate) fn submitted(&self) -> Vec<CandidateId> {
        self.submitted.lock().clone()
    }

    pub(crate) fn in_flight(&self) -> usize {
        self.pending.lock().len()
    }

    pub(crate) fn clears(&self) -> usize {
        *self.clears.lock()
    }

    fn take(&self, candidate: &str) -> (ResolutionRequest, CompletionSender) {
        let mut pending = self.pending.lock();
        let index = pending
            .iter()
            .rposition(|(request, _)| request.candidate.as_str() == candidate)
            .unwrap_or_else(|| panic!("no pending request for {candidate}"));
        pending.remove(index)
    }

    pub(crate) fn succeed(&self, candidate: &str) {
        let (request, reply) = self.take(candidate);
        let outcome = ResolutionOutcome::Success(ResolvedAsset {
            fingerprint: request.fingerprint.clone(),
            size: None,
        });
        reply.try_send(Completion { request, outcome }).unwrap();
    }

    pub(crate) fn fail(&self, candidate: &str) {
        let (request, reply) = self.take(candidate);
        let outcome = ResolutionOutcome::Failure(FailureReason::NotFound);
        reply.try_send(Completion { request, outcome }).unwrap();
    }
}

impl AssetResolver for ManualResolver {
    fn submit(&self, request: ResolutionRequest, reply: CompletionSender) {
        self.submitted.lock().push(request.candidate.clone());
        self.pending.lock().push((request, reply));
    }

    /// Keeps pending entries so tests can deliver late completions.
    fn clear(&self) {
        *self.clears.lock() += 1;
    }
}
