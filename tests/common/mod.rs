//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which seeds an in-memory metadata store and wires
//! a [`ResultsView`] to a [`ScriptedResolver`] whose lookups are completed by
//! the test.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use hordebrowse::pipeline::{ResultsView, RowObserver};
use hordebrowse::presentation::{PresentationRegistry, ViewItem};
use hordebrowse::resolver::{
    AssetResolver, Completion, CompletionSender, FailureReason, ResolutionOutcome,
    ResolutionRequest, ResolvedAsset,
};
use hordebrowse_common::CandidateId;
use hordebrowse_db::{Record, SqliteStore};

#[derive(Default)]
struct ScriptState {
    pending: Vec<(ResolutionRequest, CompletionSender)>,
    submitted: Vec<CandidateId>,
    max_in_flight: usize,
    clears: usize,
}

/// Resolver that holds every request until the test settles it.
///
/// `clear` is counted but leaves requests pending, so tests can deliver
/// completions that race a refresh.
#[derive(Default)]
pub struct ScriptedResolver {
    state: Mutex<ScriptState>,
}

impl ScriptedResolver {
    pub fn submitted(&self) -> Vec<String> {
        let state = self.state.lock();
        state.submitted.iter().map(|id| id.to_string()).collect()
    }

    /// Candidates with an unsettled lookup, oldest first.
    pub fn pending(&self) -> Vec<String> {
        let state = self.state.lock();
        state
            .pending
            .iter()
            .map(|(request, _)| request.candidate.to_string())
            .collect()
    }

    pub fn in_flight(&self) -> usize {
        self.state.lock().pending.len()
    }

    pub fn max_in_flight(&self) -> usize {
        self.state.lock().max_in_flight
    }

    pub fn clears(&self) -> usize {
        self.state.lock().clears
    }

    pub fn succeed(&self, candidate: &str) {
        self.settle(candidate, |request| {
            ResolutionOutcome::Success(ResolvedAsset {
                fingerprint: request.fingerprint.clone(),
                size: Some(1024),
            })
        });
    }

    pub fn fail(&self, candidate: &str) {
        self.settle(candidate, |_| {
            ResolutionOutcome::Failure(FailureReason::NotFound)
        });
    }

    fn settle<F>(&self, candidate: &str, outcome: F)
    where
        F: FnOnce(&ResolutionRequest) -> ResolutionOutcome,
    {
        let (request, reply) = {
            let mut state = self.state.lock();
            let index = state
                .pending
                .iter()
                .rposition(|(request, _)| request.candidate.as_str() == candidate)
                .unwrap_or_else(|| panic!("no pending lookup for {candidate}"));
            state.pending.remove(index)
        };
        let outcome = outcome(&request);
        reply
            .try_send(Completion { request, outcome })
            .expect("completion inbox full");
    }
}

impl AssetResolver for ScriptedResolver {
    fn submit(&self, request: ResolutionRequest, reply: CompletionSender) {
        let mut state = self.state.lock();
        state.submitted.push(request.candidate.clone());
        state.pending.push((request, reply));
        state.max_in_flight = state.max_in_flight.max(state.pending.len());
    }

    fn clear(&self) {
        self.state.lock().clears += 1;
    }
}

/// Records row insertions and resets.
#[derive(Default)]
pub struct Rows {
    pub titles: Vec<String>,
    pub resets: usize,
}

impl RowObserver for Rows {
    fn model_reset(&mut self, _generation: hordebrowse_common::Generation) {
        self.titles.clear();
        self.resets += 1;
    }

    fn rows_inserted(&mut self, _first: usize, _last: usize, rows: &[ViewItem]) {
        self.titles.extend(rows.iter().map(|row| row.title.clone()));
    }
}

/// An in-memory store, a scripted resolver, and a view over them.
pub struct TestHarness {
    pub store: Arc<SqliteStore>,
    pub resolver: Arc<ScriptedResolver>,
    pub view: ResultsView,
    pub rows: Rows,
}

impl TestHarness {
    /// Harness over `records` with the given pressure.
    pub fn new(records: &[Record], pressure: usize) -> Self {
        let store = SqliteStore::in_memory().expect("failed to create in-memory store");
        for record in records {
            store.insert_record(record).expect("failed to seed record");
        }
        let store = Arc::new(store);
        let resolver = Arc::new(ScriptedResolver::default());
        let view = ResultsView::new(
            store.clone(),
            resolver.clone(),
            Arc::new(PresentationRegistry::standard()),
            pressure,
        );

        Self {
            store,
            resolver,
            view,
            rows: Rows::default(),
        }
    }

    /// Drain the inbox into the view.
    pub fn pump(&mut self) -> usize {
        self.view.pump(&mut self.rows)
    }
}

/// A record titled `title`, modified `age` minutes before a fixed instant.
///
/// Lower ages sort first under the default newest-first ordering.
pub fn titled(id: &str, title: &str, age: i64) -> Record {
    let base = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    Record::new(id, base - chrono::Duration::minutes(age)).with_attr("title", title)
}
