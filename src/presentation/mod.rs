//! Mapping of metadata records to view items.
//!
//! A [`PresentationRegistry`] holds presentation variants in priority order.
//! Each variant declares the [`Criteria`] a record must satisfy and how to
//! build a [`ViewItem`] from it; the first matching variant wins. The last
//! variant must be a catch-all so that mapping is total.
//!
//! # Module layout
//!
//! - [`series`] -- Episodes of a series.
//! - [`movies`] -- Feature films.
//! - [`default`] -- Anything else.

pub mod default;
pub mod movies;
pub mod series;

use std::fmt;

use hordebrowse_common::{CandidateId, Criteria, Error, Result};
use hordebrowse_db::Record;

/// Which variant produced a view item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PresentationKind {
    Series,
    Movie,
    Default,
}

impl fmt::Display for PresentationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Series => write!(f, "series"),
            Self::Movie => write!(f, "movies"),
            Self::Default => write!(f, "default"),
        }
    }
}

/// What the view shows for one result row. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewItem {
    pub asset: CandidateId,
    pub kind: PresentationKind,
    pub title: String,
    pub category_icon: String,
    pub tags: Vec<String>,
    pub image_uri: Option<String>,
}

/// One presentation variant: a matcher and a constructor.
#[derive(Clone)]
pub struct Presentation {
    pub kind: PresentationKind,
    pub criteria: Criteria,
    pub build: fn(&Record) -> ViewItem,
}

impl Presentation {
    /// Whether this variant accepts every record.
    pub fn is_catch_all(&self) -> bool {
        self.criteria.is_empty()
    }
}

impl fmt::Debug for Presentation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Presentation")
            .field("kind", &self.kind)
            .field("criteria", &self.criteria)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct PresentationRegistry {
    variants: Vec<Presentation>,
}

impl PresentationRegistry {
    /// Build a registry from variants in priority order.
    ///
    /// Fails unless the last variant is a catch-all.
    pub fn new(variants: Vec<Presentation>) -> Result<Self> {
        match variants.last() {
            Some(last) if last.is_catch_all() => Ok(Self { variants }),
            Some(last) => Err(Error::invalid_input(format!(
                "last presentation '{}' must match every record",
                last.kind
            ))),
            None => Err(Error::invalid_input("no presentations registered")),
        }
    }

    /// Series, then movies, then the default presentation.
    pub fn standard() -> Self {
        Self {
            variants: vec![
                series::presentation(),
                movies::presentation(),
                default::presentation(),
            ],
        }
    }

    pub fn variants(&self) -> &[Presentation] {
        &self.variants
    }

    /// The first variant matching `record`.
    pub fn select(&self, record: &Record) -> &Presentation {
        self.variants
            .iter()
            .find(|variant| record.matches(&variant.criteria))
            .unwrap_or_else(|| {
                panic!(
                    "record {} matched no presentation; the registry lost its catch-all",
                    record.id
                )
            })
    }

    /// Map a record through the first matching variant.
    pub fn map(&self, record: &Record) -> ViewItem {
        (self.select(record).build)(record)
    }
}

impl Default for PresentationRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

/// Values of each key in order, without duplicates.
pub(crate) fn collect_tags(record: &Record, keys: &[&str]) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for key in keys {
        for value in record.values(key) {
            if !tags.contains(value) {
                tags.push(value.clone());
            }
        }
    }
    tags
}

/// `title`, then `name`, then the asset id itself.
pub(crate) fn display_name(record: &Record) -> String {
    record
        .first("title")
        .or_else(|| record.first("name"))
        .map(str::to_string)
        .unwrap_or_else(|| record.id.to_string())
}
