//! Shared helpers.

pub mod escape;

pub use escape::{query_escape, query_unescape, UnescapeError};
