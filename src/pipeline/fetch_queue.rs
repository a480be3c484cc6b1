//! Pressure-bounded admission of lookups.
//!
//! The queue pulls candidate ids lazily from a single-pass source and keeps
//! at most `pressure` lookups outstanding. `desired_requests` counts the free
//! slots the view has asked to fill; together with the in-flight count it
//! never exceeds the pressure.

use std::fmt;
use std::sync::Arc;

use hordebrowse_common::{CandidateId, Generation};
use tracing::{debug, trace};

use crate::resolver::{
    AssetResolver, Completion, CompletionSender, ResolutionOutcome, ResolutionRequest,
};

pub struct BoundedFetchQueue {
    unfiltered: Box<dyn Iterator<Item = CandidateId> + Send>,
    pressure: usize,
    desired_requests: usize,
    in_flight: usize,
    exhausted: bool,
    skipped: usize,
    generation: Generation,
    resolver: Arc<dyn AssetResolver>,
    reply: CompletionSender,
}

impl BoundedFetchQueue {
    /// Create a queue over `candidates`. Nothing is submitted until
    /// [`fetch_more`](Self::fetch_more) is called.
    pub fn new<I>(
        candidates: I,
        pressure: usize,
        generation: Generation,
        resolver: Arc<dyn AssetResolver>,
        reply: CompletionSender,
    ) -> Self
    where
        I: IntoIterator<Item = CandidateId>,
        I::IntoIter: Send + 'static,
    {
        Self {
            unfiltered: Box::new(candidates.into_iter().fuse()),
            pressure: pressure.max(1),
            desired_requests: 0,
            in_flight: 0,
            exhausted: false,
            skipped: 0,
            generation,
            resolver,
            reply,
        }
    }

    /// Whether the view should keep asking for more rows.
    ///
    /// Stays true after the source runs dry as long as slots were left
    /// unfilled; `fetch_more` is then a no-op.
    pub fn can_fetch_more(&self) -> bool {
        self.desired_requests < self.pressure
    }

    /// Open every free slot and fill as many as the source allows.
    pub fn fetch_more(&mut self) {
        self.desired_requests = self.pressure - self.in_flight;
        self.try_fetch();
    }

    fn try_fetch(&mut self) {
        while self.desired_requests > 0 && !self.exhausted {
            let Some(candidate) = self.unfiltered.next() else {
                debug!(generation = %self.generation, skipped = self.skipped, "Candidate source exhausted");
                self.exhausted = true;
                break;
            };

            let Some(request) = ResolutionRequest::for_candidate(candidate, self.generation) else {
                self.skipped += 1;
                continue;
            };

            trace!(candidate = %request.candidate, "Admitting lookup");
            self.resolver.submit(request, self.reply.clone());
            self.desired_requests -= 1;
            self.in_flight += 1;
        }
    }

    /// Account for a completion of this queue's generation.
    ///
    /// A success is handed to `on_success` before the queue refills; a
    /// failure returns its slot so a replacement is admitted immediately.
    /// The failed candidate is never retried.
    pub fn handle_completion<F>(&mut self, completion: Completion, on_success: F)
    where
        F: FnOnce(CandidateId),
    {
        self.in_flight = self.in_flight.saturating_sub(1);

        match completion.outcome {
            ResolutionOutcome::Success(_) => on_success(completion.request.candidate),
            ResolutionOutcome::Failure(reason) => {
                debug!(candidate = %completion.request.candidate, ?reason, "Lookup failed");
                self.desired_requests += 1;
            }
        }

        self.try_fetch();
    }

    pub fn pressure(&self) -> usize {
        self.pressure
    }

    pub fn desired_requests(&self) -> usize {
        self.desired_requests
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Candidates dropped for lacking a `tree:tiger:` fingerprint.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }
}

impl fmt::Debug for BoundedFetchQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedFetchQueue")
            .field("pressure", &self.pressure)
            .field("desired_requests", &self.desired_requests)
            .field("in_flight", &self.in_flight)
            .field("exhausted", &self.exhausted)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::testing::ManualResolver;
    use tokio::sync::mpsc;

    fn ids(raw: &[&str]) -> Vec<CandidateId> {
        raw.iter().map(|id| CandidateId::from(*id)).collect()
    }

    fn queue(
        raw: &[&str],
        pressure: usize,
    ) -> (BoundedFetchQueue, Arc<ManualResolver>, mpsc::Receiver<Completion>) {
        let resolver = Arc::new(ManualResolver::default());
        let (tx, rx) = mpsc::channel(64);
        let queue = BoundedFetchQueue::new(
            ids(raw),
            pressure,
            Generation::default(),
            resolver.clone(),
            tx,
        );
        (queue, resolver, rx)
    }

    #[test]
    fn test_nothing_submitted_before_fetch_more() {
        let (queue, resolver, _rx) = queue(&["tree:tiger:A"], 2);
        assert!(queue.can_fetch_more());
        assert!(resolver.submitted().is_empty());
    }

    #[test]
    fn test_fetch_more_fills_to_pressure() {
        let (mut queue, resolver, _rx) = queue(
            &["tree:tiger:A", "tree:tiger:B", "tree:tiger:C", "tree:tiger:D"],
            3,
        );
        queue.fetch_more();

        assert_eq!(resolver.submitted(), ids(&["tree:tiger:A", "tree:tiger:B", "tree:tiger:C"]));
        assert_eq!(queue.in_flight(), 3);
        assert_eq!(queue.desired_requests(), 0);
    }

    #[test]
    fn test_unscheme_ids_never_take_a_slot() {
        let (mut queue, resolver, _rx) = queue(
            &["sha1:X", "tree:tiger:A", "ed2k:Y", "tree:tiger:", "tree:tiger:B"],
            2,
        );
        queue.fetch_more();

        assert_eq!(resolver.submitted(), ids(&["tree:tiger:A", "tree:tiger:B"]));
        assert_eq!(queue.skipped(), 3);
        assert_eq!(queue.in_flight(), 2);
    }

    #[tokio::test]
    async fn test_failure_admits_replacement() {
        let (mut queue, resolver, mut rx) =
            queue(&["tree:tiger:A", "tree:tiger:B", "tree:tiger:C"], 2);
        queue.fetch_more();

        resolver.fail("tree:tiger:A");
        let completion = rx.recv().await.unwrap();
        let mut delivered = Vec::new();
        queue.handle_completion(completion, |id| delivered.push(id));

        assert!(delivered.is_empty());
        assert_eq!(
            resolver.submitted(),
            ids(&["tree:tiger:A", "tree:tiger:B", "tree:tiger:C"])
        );
        assert_eq!(queue.in_flight(), 2);
    }

    #[tokio::test]
    async fn test_success_delivers_without_reopening_slot() {
        let (mut queue, resolver, mut rx) =
            queue(&["tree:tiger:A", "tree:tiger:B", "tree:tiger:C"], 2);
        queue.fetch_more();

        resolver.succeed("tree:tiger:B");
        let completion = rx.recv().await.unwrap();
        let mut delivered = Vec::new();
        queue.handle_completion(completion, |id| delivered.push(id));

        assert_eq!(delivered, ids(&["tree:tiger:B"]));
        assert_eq!(queue.in_flight(), 1);
        assert_eq!(resolver.submitted().len(), 2);

        // The view asks again and the freed slot is refilled.
        assert!(queue.can_fetch_more());
        queue.fetch_more();
        assert_eq!(resolver.submitted().len(), 3);
        assert_eq!(queue.in_flight(), 2);
    }

    #[test]
    fn test_repeated_fetch_more_respects_pressure() {
        let raw: Vec<String> = (0..20).map(|i| format!("tree:tiger:{i}")).collect();
        let raw: Vec<&str> = raw.iter().map(String::as_str).collect();
        let (mut queue, resolver, _rx) = queue(&raw, 4);

        for _ in 0..5 {
            queue.fetch_more();
            assert!(queue.in_flight() <= 4);
            assert_eq!(resolver.in_flight(), queue.in_flight());
        }
        assert_eq!(resolver.submitted().len(), 4);
    }

    #[test]
    fn test_exhaustion_is_terminal_and_quiet() {
        let (mut queue, resolver, _rx) = queue(&["tree:tiger:A", "bad"], 3);
        queue.fetch_more();

        assert!(queue.is_exhausted());
        assert_eq!(resolver.submitted(), ids(&["tree:tiger:A"]));
        assert!(queue.can_fetch_more());

        queue.fetch_more();
        assert_eq!(resolver.submitted().len(), 1);
    }

    #[test]
    fn test_empty_source_stops_asking() {
        let (mut queue, resolver, _rx) = queue(&[], 3);
        queue.fetch_more();

        assert!(queue.is_exhausted());
        assert!(!queue.can_fetch_more());
        assert!(resolver.submitted().is_empty());
    }
}
