//! Hordebrowse-DB: The media metadata store.
//!
//! Assets are identified by their content id and carry a free-form set of
//! multi-valued string attributes (`title`, `genre`, `path`, ...). This crate
//! stores them in SQLite using rusqlite and r2d2 connection pooling, and
//! exposes the read side the browser needs through [`MetadataStore`].
//!
//! # Modules
//!
//! - `migrations` - Database schema migrations
//! - `pool` - Connection pool management
//! - `models` - The [`Record`] model
//! - `queries` - Database query operations
//! - `store` - The [`MetadataStore`] trait and its SQLite implementation
//!
//! # Example
//!
//! ```no_run
//! use hordebrowse_common::{Criteria, CriterionValue};
//! use hordebrowse_db::{MetadataStore, SqliteStore};
//!
//! let store = SqliteStore::open("/var/lib/hordebrowse/metadata.db").unwrap();
//! let criteria = Criteria::new().with("genre", CriterionValue::Any);
//! for id in store.query_ids(&criteria).unwrap() {
//!     println!("{id}");
//! }
//! ```

pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;
pub mod store;

pub use models::Record;
pub use store::{MetadataStore, SqliteStore};
