//! Attribute queries.
//!
//! Key and value listings used to populate the filter bar, plus single
//! attribute lookups used when sorting.

use hordebrowse_common::{CandidateId, Error, Result};
use rusqlite::Connection;

/// Every attribute key in use, with the number of assets carrying it.
pub fn list_keys(conn: &Connection) -> Result<Vec<(String, u64)>> {
    let mut stmt = conn
        .prepare(
            "SELECT key, COUNT(DISTINCT asset_id) FROM attributes
             GROUP BY key ORDER BY key",
        )
        .map_err(|e| Error::database(e.to_string()))?;

    let keys = stmt
        .query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
        })
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(keys)
}

/// Distinct values stored under `key`, sorted.
pub fn list_values(conn: &Connection, key: &str) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare("SELECT DISTINCT value FROM attributes WHERE key = ? ORDER BY value")
        .map_err(|e| Error::database(e.to_string()))?;

    let values = stmt
        .query_map([key], |row| row.get::<_, String>(0))
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(values)
}

/// Values of one attribute of one asset, or `None` if the asset lacks it.
pub fn get_attr(conn: &Connection, id: &CandidateId, key: &str) -> Result<Option<Vec<String>>> {
    let mut stmt = conn
        .prepare(
            "SELECT value FROM attributes
             WHERE asset_id = ? AND key = ? ORDER BY position",
        )
        .map_err(|e| Error::database(e.to_string()))?;

    let values = stmt
        .query_map([id.as_str(), key], |row| row.get::<_, String>(0))
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(if values.is_empty() { None } else { Some(values) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Record;
    use crate::pool::{get_conn, init_memory_pool};
    use crate::queries::assets::insert_record;
    use chrono::Utc;

    fn seed(conn: &Connection) {
        insert_record(
            conn,
            &Record::new("tree:tiger:A", Utc::now())
                .with_attr("genre", "horror")
                .with_attr("genre", "scifi")
                .with_attr("title", "Alien"),
        )
        .unwrap();
        insert_record(
            conn,
            &Record::new("tree:tiger:B", Utc::now()).with_attr("genre", "crime"),
        )
        .unwrap();
    }

    #[test]
    fn test_list_keys_counts_assets() {
        let pool = init_memory_pool().unwrap();
        let conn = get_conn(&pool).unwrap();
        seed(&conn);

        let keys = list_keys(&conn).unwrap();
        assert_eq!(
            keys,
            vec![("genre".to_string(), 2), ("title".to_string(), 1)]
        );
    }

    #[test]
    fn test_list_values_distinct_sorted() {
        let pool = init_memory_pool().unwrap();
        let conn = get_conn(&pool).unwrap();
        seed(&conn);

        assert_eq!(
            list_values(&conn, "genre").unwrap(),
            vec!["crime", "horror", "scifi"]
        );
        assert!(list_values(&conn, "year").unwrap().is_empty());
    }

    #[test]
    fn test_get_attr() {
        let pool = init_memory_pool().unwrap();
        let conn = get_conn(&pool).unwrap();
        seed(&conn);

        let id = CandidateId::from("tree:tiger:A");
        assert_eq!(
            get_attr(&conn, &id, "title").unwrap(),
            Some(vec!["Alien".to_string()])
        );
        assert_eq!(get_attr(&conn, &id, "year").unwrap(), None);
    }
}
