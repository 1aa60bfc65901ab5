//! Library management service

use crate::{
    error::AppResult,
    models::book::{Book, BookFilter, Books},
    repository::Repository,
};

#[derive(Clone)]
pub struct LibraryService {
    repository: Repository,
}

impl LibraryService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// List the whole collection in insertion order
    pub async fn list_books(&self) -> AppResult<Books> {
        self.repository.books.get_books().await
    }

    /// List the books matching a price filter expression
    pub async fn filter_books(&self, filter: &BookFilter) -> AppResult<Books> {
        self.repository.books.price_filter(filter).await
    }

    /// Get a book by ID
    pub async fn get_book(&self, id: &str) -> AppResult<Book> {
        self.repository.books.get_book(id).await
    }

    /// Create a new book; the store validates and assigns the identifier
    pub async fn create_book(&self, book: Book) -> AppResult<Book> {
        let created = self.repository.books.create_book(book).await?;
        tracing::info!("Created book {} ({})", created.id, created.title);
        Ok(created)
    }

    /// Update an existing book
    pub async fn update_book(&self, book: Book) -> AppResult<Book> {
        self.repository.books.change_book(book).await
    }

    /// Remove a book by ID
    pub async fn remove_book(&self, id: &str) -> AppResult<()> {
        self.repository.books.remove_book(id).await?;
        tracing::info!("Removed book {}", id);
        Ok(())
    }
}
