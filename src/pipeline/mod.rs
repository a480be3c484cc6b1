//! The result-streaming pipeline.
//!
//! A [`ResultsView`] owns the query session of the browser: it asks the
//! metadata store for candidate ids, builds one [`BoundedFetchQueue`] and one
//! [`StreamingResultCollection`] per query, and funnels resolver completions
//! through a bounded inbox that the UI loop drains.
//!
//! # Module layout
//!
//! - [`fetch_queue`] -- Pressure-bounded admission of lookups.
//! - [`collection`] -- The append-only view-model of one query.

pub mod collection;
pub mod fetch_queue;

use std::cmp::Reverse;
use std::sync::Arc;

use hordebrowse_common::{CandidateId, Criteria, Generation, PathScope, Result, SortKey};
use hordebrowse_db::MetadataStore;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::presentation::{PresentationRegistry, ViewItem};
use crate::resolver::{AssetResolver, Completion, CompletionSender};

pub use collection::{Field, FieldValue, RowObserver, StreamingResultCollection};
pub use fetch_queue::BoundedFetchQueue;

/// Capacity of the completion inbox between the resolver and the UI loop.
pub const INBOX_CAPACITY: usize = 256;

pub struct ResultsView {
    store: Arc<dyn MetadataStore>,
    resolver: Arc<dyn AssetResolver>,
    registry: Arc<PresentationRegistry>,
    pressure: usize,
    sort_key: SortKey,
    scope: PathScope,
    criteria: Option<Criteria>,
    generation: Generation,
    inbox_tx: CompletionSender,
    inbox: mpsc::Receiver<Completion>,
    model: Option<StreamingResultCollection>,
}

impl ResultsView {
    /// Create a view with no query yet; call [`refresh`](Self::refresh) to start one.
    pub fn new(
        store: Arc<dyn MetadataStore>,
        resolver: Arc<dyn AssetResolver>,
        registry: Arc<PresentationRegistry>,
        pressure: usize,
    ) -> Self {
        let (inbox_tx, inbox) = mpsc::channel(INBOX_CAPACITY);
        Self {
            store,
            resolver,
            registry,
            pressure: pressure.max(1),
            sort_key: SortKey::default(),
            scope: PathScope::default(),
            criteria: None,
            generation: Generation::default(),
            inbox_tx,
            inbox,
            model: None,
        }
    }

    pub fn with_sort_key(mut self, sort_key: SortKey) -> Self {
        self.sort_key = sort_key;
        self
    }

    pub fn with_scope(mut self, scope: PathScope) -> Self {
        self.scope = scope;
        self
    }

    /// Replace the current query with a new one.
    ///
    /// `None` (or empty criteria) browses every asset. Outstanding lookups of
    /// the previous query are cleared and any of their completions that still
    /// arrive are ignored. On a store error the previous query stays in place.
    pub fn refresh(
        &mut self,
        criteria: Option<Criteria>,
        observer: &mut dyn RowObserver,
    ) -> Result<()> {
        let ids = match criteria.as_ref() {
            Some(criteria) if !criteria.is_empty() => self.store.query_ids(criteria)?,
            _ => self.store.all_ids()?,
        };
        let ids = self.sorted(self.scoped(ids)?)?;

        self.resolver.clear();
        self.generation = self.generation.next();

        info!(
            generation = %self.generation,
            candidates = ids.len(),
            sort = %self.sort_key,
            "Refreshing results"
        );

        let queue = BoundedFetchQueue::new(
            ids,
            self.pressure,
            self.generation,
            self.resolver.clone(),
            self.inbox_tx.clone(),
        );
        self.model = Some(StreamingResultCollection::new(
            queue,
            self.store.clone(),
            self.registry.clone(),
        ));
        self.criteria = criteria;

        observer.model_reset(self.generation);
        Ok(())
    }

    /// Change the ordering and re-run the last query.
    pub fn set_sort_key(&mut self, sort_key: SortKey, observer: &mut dyn RowObserver) -> Result<()> {
        self.sort_key = sort_key;
        self.refresh(self.criteria.clone(), observer)
    }

    pub fn can_fetch_more(&self) -> bool {
        self.model.as_ref().is_some_and(|model| model.can_fetch_more())
    }

    pub fn fetch_more(&mut self) {
        if let Some(model) = self.model.as_mut() {
            model.fetch_more();
        }
    }

    /// Apply one completion to the current collection. Returns whether it
    /// belonged to the current query.
    pub fn dispatch(&mut self, completion: Completion, observer: &mut dyn RowObserver) -> bool {
        match self.model.as_mut() {
            Some(model) => model.apply(completion, observer),
            None => {
                debug!(candidate = %completion.request.candidate, "Completion before first query");
                false
            }
        }
    }

    /// Drain every completion already waiting in the inbox.
    pub fn pump(&mut self, observer: &mut dyn RowObserver) -> usize {
        let mut drained = 0;
        while let Ok(completion) = self.inbox.try_recv() {
            self.dispatch(completion, observer);
            drained += 1;
        }
        drained
    }

    /// Wait for the next completion. The view keeps a sender alive, so this
    /// only returns `None` if it is dropped mid-await.
    pub async fn next_completion(&mut self) -> Option<Completion> {
        self.inbox.recv().await
    }

    pub fn model(&self) -> Option<&StreamingResultCollection> {
        self.model.as_ref()
    }

    pub fn row_count(&self) -> usize {
        self.model.as_ref().map_or(0, StreamingResultCollection::row_count)
    }

    pub fn item(&self, index: usize) -> Option<&ViewItem> {
        self.model.as_ref()?.item(index)
    }

    pub fn is_loading(&self) -> bool {
        self.model.as_ref().is_some_and(StreamingResultCollection::is_loading)
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn sort_key(&self) -> SortKey {
        self.sort_key
    }

    pub fn scope(&self) -> &PathScope {
        &self.scope
    }

    pub fn criteria(&self) -> Option<&Criteria> {
        self.criteria.as_ref()
    }

    pub fn store(&self) -> &Arc<dyn MetadataStore> {
        &self.store
    }

    fn scoped(&self, ids: Vec<CandidateId>) -> Result<Vec<CandidateId>> {
        if self.scope.is_root() {
            return Ok(ids);
        }

        let mut kept = Vec::with_capacity(ids.len());
        for id in ids {
            let in_scope = self
                .store
                .get_attr(&id, "path")?
                .is_some_and(|paths| paths.iter().any(|path| self.scope.contains(path)));
            if in_scope {
                kept.push(id);
            }
        }
        Ok(kept)
    }

    fn sorted(&self, ids: Vec<CandidateId>) -> Result<Vec<CandidateId>> {
        match self.sort_key {
            SortKey::Time => {
                let mut keyed = ids
                    .into_iter()
                    .map(|id| Ok((self.store.get_mtime(&id)?, id)))
                    .collect::<Result<Vec<_>>>()?;
                keyed.sort_by_key(|(mtime, _)| Reverse(*mtime));
                Ok(keyed.into_iter().map(|(_, id)| id).collect())
            }
            SortKey::Title => {
                let mut keyed = ids
                    .into_iter()
                    .map(|id| Ok((self.title_of(&id)?, id)))
                    .collect::<Result<Vec<_>>>()?;
                keyed.sort();
                Ok(keyed.into_iter().map(|(_, id)| id).collect())
            }
        }
    }

    fn title_of(&self, id: &CandidateId) -> Result<String> {
        for key in ["title", "name"] {
            if let Some(value) = self
                .store
                .get_attr(id, key)?
                .and_then(|values| values.into_iter().next())
            {
                return Ok(value);
            }
        }
        Ok(id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::testing::ManualResolver;
    use chrono::{TimeZone, Utc};
    use hordebrowse_common::CriterionValue;
    use hordebrowse_db::{Record, SqliteStore};

    struct Quiet;

    impl RowObserver for Quiet {
        fn rows_inserted(&mut self, _first: usize, _last: usize, _rows: &[ViewItem]) {}
    }

    fn record(id: &str, day: u32, title: &str, path: &str) -> Record {
        Record::new(id, Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap())
            .with_attr("title", title)
            .with_attr("path", path)
    }

    fn view() -> (ResultsView, Arc<ManualResolver>) {
        let store = SqliteStore::in_memory().unwrap();
        store.insert_record(&record("tree:tiger:A", 1, "Zulu", "films/old")).unwrap();
        store.insert_record(&record("tree:tiger:B", 3, "Mike", "films/new")).unwrap();
        store
            .insert_record(&record("tree:tiger:C", 2, "Alpha", "shows").with_attr("genre", "drama"))
            .unwrap();

        let resolver = Arc::new(ManualResolver::default());
        let view = ResultsView::new(
            Arc::new(store),
            resolver.clone(),
            Arc::new(PresentationRegistry::standard()),
            10,
        );
        (view, resolver)
    }

    fn submitted(resolver: &ManualResolver) -> Vec<String> {
        resolver.submitted().iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn test_time_sort_is_newest_first() {
        let (mut view, resolver) = view();
        view.refresh(None, &mut Quiet).unwrap();
        view.fetch_more();

        assert_eq!(submitted(&resolver), vec!["tree:tiger:B", "tree:tiger:C", "tree:tiger:A"]);
    }

    #[test]
    fn test_title_sort_and_set_sort_key() {
        let (mut view, resolver) = view();
        view.refresh(None, &mut Quiet).unwrap();
        let first = view.generation();

        view.set_sort_key(SortKey::Title, &mut Quiet).unwrap();
        view.fetch_more();

        assert!(view.generation() > first);
        assert_eq!(resolver.clears(), 2);
        assert_eq!(submitted(&resolver), vec!["tree:tiger:C", "tree:tiger:B", "tree:tiger:A"]);
    }

    #[test]
    fn test_scope_limits_candidates() {
        let (view, resolver) = view();
        let mut view = view.with_scope(PathScope::parse("/films"));
        view.refresh(None, &mut Quiet).unwrap();
        view.fetch_more();

        assert_eq!(submitted(&resolver), vec!["tree:tiger:B", "tree:tiger:A"]);
    }

    #[test]
    fn test_criteria_are_kept_for_later_refreshes() {
        let (mut view, resolver) = view();
        let criteria = Criteria::new().with("genre", CriterionValue::Any);
        view.refresh(Some(criteria.clone()), &mut Quiet).unwrap();
        view.fetch_more();

        assert_eq!(view.criteria(), Some(&criteria));
        assert_eq!(submitted(&resolver), vec!["tree:tiger:C"]);
    }

    #[tokio::test]
    async fn test_pump_applies_current_and_drops_stale() {
        let (mut view, resolver) = view();
        view.refresh(None, &mut Quiet).unwrap();
        view.fetch_more();
        resolver.succeed("tree:tiger:C");

        view.refresh(None, &mut Quiet).unwrap();
        view.fetch_more();
        resolver.succeed("tree:tiger:A");

        assert_eq!(view.pump(&mut Quiet), 2);
        assert_eq!(view.row_count(), 1);
        assert_eq!(view.item(0).unwrap().asset.as_str(), "tree:tiger:A");
    }

    #[test]
    fn test_no_query_means_no_rows() {
        let (mut view, resolver) = view();
        assert!(!view.can_fetch_more());
        view.fetch_more();
        assert_eq!(view.row_count(), 0);
        assert!(resolver.submitted().is_empty());
    }
}
