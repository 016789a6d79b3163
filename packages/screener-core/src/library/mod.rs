//! Saved-screen library.
//!
//! Stores filter groups in save-normalized form with owner, permission and
//! tags, and answers the lookups the screener UI needs.

mod store;

pub use store::{
    normalize_tags, FilterGroupRecord, FilterLibrary, LIBRARY_FORMAT_VERSION, SYSTEM_USER,
};
