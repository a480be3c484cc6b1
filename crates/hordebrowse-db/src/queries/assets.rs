//! Asset queries.
//!
//! Insertion, lookup, and criteria-driven id listing for assets.

use chrono::{DateTime, Utc};
use hordebrowse_common::{CandidateId, Criteria, CriterionValue, Error, Result};
use rusqlite::{Connection, OptionalExtension};

use crate::models::Record;

fn db_err(e: rusqlite::Error) -> Error {
    Error::database(e.to_string())
}

fn timestamp(secs: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| Error::database(format!("invalid mtime {secs}")))
}

/// Insert a record, replacing any existing asset with the same id.
///
/// The asset row and all of its attributes are written in one transaction.
pub fn insert_record(conn: &Connection, record: &Record) -> Result<()> {
    let tx = conn.unchecked_transaction().map_err(db_err)?;

    tx.execute(
        "INSERT INTO assets (id, mtime) VALUES (:id, :mtime)
         ON CONFLICT(id) DO UPDATE SET mtime = excluded.mtime",
        rusqlite::named_params! {
            ":id": record.id.as_str(),
            ":mtime": record.mtime.timestamp(),
        },
    )
    .map_err(db_err)?;

    tx.execute(
        "DELETE FROM attributes WHERE asset_id = ?",
        [record.id.as_str()],
    )
    .map_err(db_err)?;

    {
        let mut stmt = tx
            .prepare(
                "INSERT INTO attributes (asset_id, key, value, position)
                 VALUES (?, ?, ?, ?)",
            )
            .map_err(db_err)?;
        for (key, values) in &record.attributes {
            for (position, value) in values.iter().enumerate() {
                stmt.execute(rusqlite::params![
                    record.id.as_str(),
                    key,
                    value,
                    position as i64
                ])
                .map_err(db_err)?;
            }
        }
    }

    tx.commit().map_err(db_err)
}

/// Remove an asset and its attributes. Returns whether it existed.
pub fn delete_record(conn: &Connection, id: &CandidateId) -> Result<bool> {
    let removed = conn
        .execute("DELETE FROM assets WHERE id = ?", [id.as_str()])
        .map_err(db_err)?;
    Ok(removed > 0)
}

/// Fetch a full record.
///
/// # Returns
///
/// * `Ok(Some(Record))` - The record if found
/// * `Ok(None)` - If the asset does not exist
/// * `Err(Error)` - If a database error occurs
pub fn get_record(conn: &Connection, id: &CandidateId) -> Result<Option<Record>> {
    let mtime: Option<i64> = conn
        .query_row(
            "SELECT mtime FROM assets WHERE id = ?",
            [id.as_str()],
            |row| row.get(0),
        )
        .optional()
        .map_err(db_err)?;

    let Some(mtime) = mtime else {
        return Ok(None);
    };

    let mut record = Record::new(id.clone(), timestamp(mtime)?);

    let mut stmt = conn
        .prepare(
            "SELECT key, value FROM attributes
             WHERE asset_id = ? ORDER BY key, position",
        )
        .map_err(db_err)?;
    let rows = stmt
        .query_map([id.as_str()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })
        .map_err(db_err)?;
    for row in rows {
        let (key, value) = row.map_err(db_err)?;
        record.add_attr(key, value);
    }

    Ok(Some(record))
}

/// Modification time of an asset.
pub fn get_mtime(conn: &Connection, id: &CandidateId) -> Result<DateTime<Utc>> {
    let mtime: Option<i64> = conn
        .query_row(
            "SELECT mtime FROM assets WHERE id = ?",
            [id.as_str()],
            |row| row.get(0),
        )
        .optional()
        .map_err(db_err)?;

    match mtime {
        Some(secs) => timestamp(secs),
        None => Err(Error::not_found(id.as_str())),
    }
}

/// Every asset id in the store.
pub fn all_ids(conn: &Connection) -> Result<Vec<CandidateId>> {
    query_ids(conn, &Criteria::new())
}

/// Ids of assets matching every constraint in `criteria`.
///
/// `CriterionValue::Any` only requires the key to be present.
pub fn query_ids(conn: &Connection, criteria: &Criteria) -> Result<Vec<CandidateId>> {
    let mut sql = String::from("SELECT a.id FROM assets a");
    let mut clauses: Vec<&str> = Vec::new();
    let mut params: Vec<&str> = Vec::new();

    for (key, value) in criteria {
        match value {
            CriterionValue::Any => {
                clauses.push(
                    "EXISTS (SELECT 1 FROM attributes t
                     WHERE t.asset_id = a.id AND t.key = ?)",
                );
                params.push(key.as_str());
            }
            CriterionValue::Exact(expected) => {
                clauses.push(
                    "EXISTS (SELECT 1 FROM attributes t
                     WHERE t.asset_id = a.id AND t.key = ? AND t.value = ?)",
                );
                params.push(key.as_str());
                params.push(expected.as_str());
            }
        }
    }

    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY a.id");

    let mut stmt = conn.prepare(&sql).map_err(db_err)?;
    let ids = stmt
        .query_map(rusqlite::params_from_iter(params), |row| {
            row.get::<_, String>(0)
        })
        .map_err(db_err)?
        .map(|row| row.map(CandidateId::from).map_err(db_err))
        .collect::<Result<Vec<_>>>()?;

    Ok(ids)
}
