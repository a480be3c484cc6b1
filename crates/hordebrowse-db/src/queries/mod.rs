//! Database query operations.
//!
//! Functions take a plain `&Connection` so they compose with pooled
//! connections and transactions alike.

pub mod assets;
pub mod attributes;
