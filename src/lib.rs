//! Hordebrowse - Media browser streaming metadata queries through bithorde
//!
//! This library crate exposes the result pipeline and its collaborators for
//! the binary and for integration testing.

pub mod config;
pub mod console;
pub mod filter;
pub mod launcher;
pub mod mount;
pub mod pipeline;
pub mod presentation;
pub mod resolver;
