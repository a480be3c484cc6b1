//! The view-model for one query.
//!
//! [`StreamingResultCollection`] is the indexed, append-only list the view
//! renders. It is owned by the UI thread; completions reach it only after
//! being drained from the UI inbox. Rows appear in completion order and an
//! index, once assigned, always refers to the same item.

use std::sync::Arc;

use hordebrowse_common::{CandidateId, Generation};
use hordebrowse_db::MetadataStore;
use tracing::{debug, warn};

use super::fetch_queue::BoundedFetchQueue;
use crate::presentation::{PresentationRegistry, ViewItem};
use crate::resolver::Completion;

/// Per-row data exposed to the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Title,
    CategoryIcon,
    Tags,
    ImageUri,
    Object,
}

/// Value of one [`Field`] of one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    List(&'a [String]),
    Object(&'a ViewItem),
}

/// Structural change notifications, bracketing each insertion.
///
/// Mirrors the begin/end insert contract incremental list views expect, so
/// the view can extend rather than redraw.
pub trait RowObserver {
    /// A new collection replaced the previous one.
    fn model_reset(&mut self, _generation: Generation) {}

    fn rows_about_to_be_inserted(&mut self, _first: usize, _last: usize) {}

    fn rows_inserted(&mut self, first: usize, last: usize, rows: &[ViewItem]);
}

pub struct StreamingResultCollection {
    generation: Generation,
    items: Vec<ViewItem>,
    queue: BoundedFetchQueue,
    store: Arc<dyn MetadataStore>,
    registry: Arc<PresentationRegistry>,
}

impl StreamingResultCollection {
    pub fn new(
        queue: BoundedFetchQueue,
        store: Arc<dyn MetadataStore>,
        registry: Arc<PresentationRegistry>,
    ) -> Self {
        Self {
            generation: queue.generation(),
            items: Vec::new(),
            queue,
            store,
            registry,
        }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn row_count(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item(&self, index: usize) -> Option<&ViewItem> {
        self.items.get(index)
    }

    pub fn items(&self) -> &[ViewItem] {
        &self.items
    }

    /// One field of one row; `None` past the end or for an absent image.
    pub fn data(&self, index: usize, field: Field) -> Option<FieldValue<'_>> {
        let item = self.items.get(index)?;
        match field {
            Field::Title => Some(FieldValue::Text(&item.title)),
            Field::CategoryIcon => Some(FieldValue::Text(&item.category_icon)),
            Field::Tags => Some(FieldValue::List(&item.tags)),
            Field::ImageUri => item.image_uri.as_deref().map(FieldValue::Text),
            Field::Object => Some(FieldValue::Object(item)),
        }
    }

    pub fn can_fetch_more(&self) -> bool {
        self.queue.can_fetch_more()
    }

    pub fn fetch_more(&mut self) {
        self.queue.fetch_more();
    }

    pub fn queue(&self) -> &BoundedFetchQueue {
        &self.queue
    }

    /// Whether any lookups of this generation are still outstanding.
    pub fn is_loading(&self) -> bool {
        self.queue.in_flight() > 0
    }

    /// Apply a completion drained from the UI inbox.
    ///
    /// Completions from another generation are dropped without touching any
    /// state. Returns whether the completion was accepted.
    pub fn apply(&mut self, completion: Completion, observer: &mut dyn RowObserver) -> bool {
        if completion.request.generation != self.generation {
            debug!(
                candidate = %completion.request.candidate,
                stale = %completion.request.generation,
                current = %self.generation,
                "Dropping stale completion"
            );
            return false;
        }

        let Self {
            items,
            queue,
            store,
            registry,
            ..
        } = self;

        queue.handle_completion(completion, |candidate| {
            if let Some(item) = map_candidate(&**store, registry, &candidate) {
                append(items, item, observer);
            }
        });

        true
    }
}

fn map_candidate(
    store: &dyn MetadataStore,
    registry: &PresentationRegistry,
    candidate: &CandidateId,
) -> Option<ViewItem> {
    match store.get_record(candidate) {
        Ok(Some(record)) => Some(registry.map(&record)),
        Ok(None) => {
            warn!(candidate = %candidate, "Resolved asset vanished from the metadata store");
            None
        }
        Err(e) => {
            warn!(candidate = %candidate, error = %e, "Failed to load resolved asset");
            None
        }
    }
}

fn append(items: &mut Vec<ViewItem>, item: ViewItem, observer: &mut dyn RowObserver) {
    let position = items.len();
    observer.rows_about_to_be_inserted(position, position);
    items.push(item);
    observer.rows_inserted(position, position, &items[position..]);
}
