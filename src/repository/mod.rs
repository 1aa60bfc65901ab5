//! Repository layer for document storage operations

pub mod books;

use std::fs::File;

/// Main repository struct owning the persisted document
#[derive(Clone)]
pub struct Repository {
    pub books: books::BooksRepository,
}

impl Repository {
    /// Create a new repository around an already opened document handle.
    /// The handle must be readable and writable; the repository owns it
    /// exclusively until process shutdown.
    pub fn new(document: File) -> Self {
        Self {
            books: books::BooksRepository::new(document),
        }
    }
}
