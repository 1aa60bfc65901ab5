//! Book model and related types.
//!
//! The persisted document is exactly a `Books` sequence encoded as a
//! pretty-printed JSON array; there is no secondary index and no metadata
//! beside the records themselves.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// A single book record.
///
/// Every persisted book has all five fields populated with non-default
/// values; records failing validation are rejected before they reach the
/// store. The identifier is assigned at creation time and never changes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct Book {
    /// Unique identifier, assigned by the store on creation
    pub id: String,
    pub title: String,
    pub pages: u32,
    pub price: f64,
    pub genres: Vec<String>,
}

impl Book {
    /// Assign a fresh identifier ahead of the first save
    pub fn prepare_to_create(&mut self) {
        self.id = Uuid::new_v4().to_string();
    }
}

/// The full ordered collection; this sequence IS the storage document.
pub type Books = Vec<Book>;

/// Price filter expression, e.g. `">10"` or `"<5.5"`.
///
/// Constructed per request and discarded after use; it has no persisted
/// lifecycle.
#[derive(Debug, Clone, Deserialize, IntoParams, ToSchema)]
pub struct BookFilter {
    /// Comparison of the form `<operator><number>` with operator `<` or `>`
    pub price: String,
}
