//! The metadata store seen by the browser.

use chrono::{DateTime, Utc};
use hordebrowse_common::{CandidateId, Criteria, Result};

use crate::models::Record;
use crate::pool::{get_conn, init_memory_pool, init_pool, DbPool};
use crate::queries::{assets, attributes};

/// Read access to asset metadata.
///
/// Implementations must be shareable across threads; the browser holds one
/// behind an `Arc` for the whole process lifetime.
pub trait MetadataStore: Send + Sync {
    /// Every asset id.
    fn all_ids(&self) -> Result<Vec<CandidateId>>;

    /// Ids of assets matching all constraints of `criteria`.
    fn query_ids(&self, criteria: &Criteria) -> Result<Vec<CandidateId>>;

    /// Attribute keys in use, with the number of assets carrying each.
    fn list_keys(&self) -> Result<Vec<(String, u64)>>;

    /// Distinct values stored under `key`.
    fn list_values(&self, key: &str) -> Result<Vec<String>>;

    /// Values of one attribute, `None` when the asset lacks it.
    fn get_attr(&self, id: &CandidateId, key: &str) -> Result<Option<Vec<String>>>;

    fn get_mtime(&self, id: &CandidateId) -> Result<DateTime<Utc>>;

    /// The full record for an id, `None` when unknown.
    fn get_record(&self, id: &CandidateId) -> Result<Option<Record>>;
}

/// [`MetadataStore`] backed by a pooled SQLite database.
#[derive(Clone)]
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Open (creating and migrating if needed) the database at `path`.
    pub fn open(path: &str) -> Result<Self> {
        Ok(Self::new(init_pool(path)?))
    }

    /// Fresh, empty in-memory store.
    pub fn in_memory() -> Result<Self> {
        Ok(Self::new(init_memory_pool()?))
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub fn insert_record(&self, record: &Record) -> Result<()> {
        let conn = get_conn(&self.pool)?;
        assets::insert_record(&conn, record)
    }
}

impl MetadataStore for SqliteStore {
    fn all_ids(&self) -> Result<Vec<CandidateId>> {
        let conn = get_conn(&self.pool)?;
        assets::all_ids(&conn)
    }

    fn query_ids(&self, criteria: &Criteria) -> Result<Vec<CandidateId>> {
        let conn = get_conn(&self.pool)?;
        assets::query_ids(&conn, criteria)
    }

    fn list_keys(&self) -> Result<Vec<(String, u64)>> {
        let conn = get_conn(&self.pool)?;
        attributes::list_keys(&conn)
    }

    fn list_values(&self, key: &str) -> Result<Vec<String>> {
        let conn = get_conn(&self.pool)?;
        attributes::list_values(&conn, key)
    }

    fn get_attr(&self, id: &CandidateId, key: &str) -> Result<Option<Vec<String>>> {
        let conn = get_conn(&self.pool)?;
        attributes::get_attr(&conn, id, key)
    }

    fn get_mtime(&self, id: &CandidateId) -> Result<DateTime<Utc>> {
        let conn = get_conn(&self.pool)?;
        assets::get_mtime(&conn, id)
    }

    fn get_record(&self, id: &CandidateId) -> Result<Option<Record>> {
        let conn = get_conn(&self.pool)?;
        assets::get_record(&conn, id)
    }
}
