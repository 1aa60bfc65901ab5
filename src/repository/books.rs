//! Books repository: the file backed book store.
//!
//! Every operation is a complete, independent load/compute/save cycle over
//! the whole document; no in-memory copy of the collection survives between
//! calls. The two primitives are `load_all` (seek to start, read, decode)
//! and `save_all` (truncate, seek to start, write the encoded sequence).
//!
//! `save_all` is not atomic: a failure between truncation and the final
//! write leaves the document partially written or empty. Callers must
//! surface such failures rather than retry blindly.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookFilter, Books},
};

/// Parsed form of a price filter expression
#[derive(Debug, Clone, Copy, PartialEq)]
enum PriceComparison {
    Above(f64),
    Below(f64),
}

impl PriceComparison {
    /// Parse `<operator><number>` with operator `<` or `>`
    fn parse(expr: &str) -> AppResult<Self> {
        if expr.len() < 2 {
            return Err(AppError::Validation(format!(
                "Price filter '{}' is too short",
                expr
            )));
        }
        let operator = expr.chars().next().unwrap_or_default();
        if operator != '<' && operator != '>' {
            return Err(AppError::UnsupportedOperator(format!(
                "Price filter operator '{}' is not supported, use '<' or '>'",
                operator
            )));
        }
        let threshold: f64 = expr[1..].parse().map_err(|_| {
            AppError::Validation(format!("'{}' is not a valid price", &expr[1..]))
        })?;
        match operator {
            '>' => Ok(PriceComparison::Above(threshold)),
            _ => Ok(PriceComparison::Below(threshold)),
        }
    }

    /// Strict comparison; equality never matches
    fn matches(&self, price: f64) -> bool {
        match *self {
            PriceComparison::Above(threshold) => price > threshold,
            PriceComparison::Below(threshold) => price < threshold,
        }
    }
}

/// File backed store for the book collection.
///
/// Holds the one open handle to the backing document for its whole lifetime
/// and is its sole writer. The mutex serializes whole load-modify-save
/// cycles within this process; concurrent writers from other processes
/// remain out of scope.
#[derive(Clone)]
pub struct BooksRepository {
    document: Arc<Mutex<File>>,
}

impl BooksRepository {
    /// Create a new repository around an opened read+write document handle
    pub fn new(document: File) -> Self {
        Self {
            document: Arc::new(Mutex::new(document)),
        }
    }

    /// Read the whole document and decode the book sequence.
    /// Seeks back to the start first, so repeated calls are idempotent
    /// reads of current state. A zero-length document is a decode error,
    /// not an empty collection.
    fn load_all(document: &mut File) -> AppResult<Books> {
        document.seek(SeekFrom::Start(0))?;
        let mut raw = String::new();
        document.read_to_string(&mut raw)?;
        serde_json::from_str(&raw).map_err(AppError::Decode)
    }

    /// Overwrite the document with the encoded sequence.
    /// Truncate, seek to start, then write; the previous content is fully
    /// discarded. Encoding happens before the truncation so an unencodable
    /// sequence never destroys the current document.
    fn save_all(document: &mut File, books: &Books) -> AppResult<()> {
        // Four-space pretty printing, matching the document's on-disk shape
        let mut encoded = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut encoded, formatter);
        books.serialize(&mut serializer).map_err(AppError::Encode)?;

        document.set_len(0)?;
        document.seek(SeekFrom::Start(0))?;
        document.write_all(&encoded)?;
        Ok(())
    }

    /// Index of the book with the given identifier
    fn wanted_index(id: &str, books: &Books) -> AppResult<usize> {
        books
            .iter()
            .position(|book| book.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))
    }

    /// Reject books with missing or zero required fields
    fn validate(book: &Book) -> AppResult<()> {
        if book.genres.is_empty() {
            return Err(AppError::Validation("genres must not be empty".to_string()));
        }
        if book.pages == 0 {
            return Err(AppError::Validation("pages must be positive".to_string()));
        }
        if book.price <= 0.0 {
            return Err(AppError::Validation("price must be positive".to_string()));
        }
        if book.title.is_empty() {
            return Err(AppError::Validation("title must not be empty".to_string()));
        }
        Ok(())
    }

    /// Return the whole collection in insertion order
    pub async fn get_books(&self) -> AppResult<Books> {
        let mut document = self.document.lock().await;
        Self::load_all(&mut document)
    }

    /// Get the book with the given identifier
    pub async fn get_book(&self, id: &str) -> AppResult<Book> {
        let mut document = self.document.lock().await;
        let books = Self::load_all(&mut document)?;
        books
            .into_iter()
            .find(|book| book.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))
    }

    /// Validate the book, assign a fresh identifier and append it to the
    /// collection. New records always go last.
    pub async fn create_book(&self, mut book: Book) -> AppResult<Book> {
        Self::validate(&book)?;
        book.prepare_to_create();

        let mut document = self.document.lock().await;
        let mut books = Self::load_all(&mut document)?;
        books.push(book.clone());
        Self::save_all(&mut document, &books)?;
        Ok(book)
    }

    /// Remove the book with the given identifier, preserving the relative
    /// order of the remaining records
    pub async fn remove_book(&self, id: &str) -> AppResult<()> {
        let mut document = self.document.lock().await;
        let mut books = Self::load_all(&mut document)?;
        let index = Self::wanted_index(id, &books)?;
        books.remove(index);
        Self::save_all(&mut document, &books)
    }

    /// Overwrite title, pages, price and genres of the record carrying the
    /// input's identifier. The identifier itself is never overwritten.
    /// This is a full-field replace, not a merge: zero or empty input
    /// values overwrite whatever is stored.
    pub async fn change_book(&self, changed: Book) -> AppResult<Book> {
        let mut document = self.document.lock().await;
        let mut books = Self::load_all(&mut document)?;
        let index = Self::wanted_index(&changed.id, &books)?;

        let book = &mut books[index];
        book.price = changed.price;
        book.title = changed.title;
        book.pages = changed.pages;
        book.genres = changed.genres;
        let updated = book.clone();

        Self::save_all(&mut document, &books)?;
        Ok(updated)
    }

    /// Return the books whose price strictly satisfies the filter
    /// expression. No match yields an empty sequence, not an error.
    pub async fn price_filter(&self, filter: &BookFilter) -> AppResult<Books> {
        let comparison = PriceComparison::parse(&filter.price)?;

        let mut document = self.document.lock().await;
        let books = Self::load_all(&mut document)?;
        Ok(books
            .into_iter()
            .filter(|book| comparison.matches(book.price))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: &str = r#"[
    {
        "id": "1",
        "title": "A",
        "pages": 100,
        "price": 9.99,
        "genres": ["sci-fi"]
    }
]"#;

    /// Repository over an anonymous temp file, plus a second handle onto
    /// the same file for inspecting the raw document from tests.
    fn seeded_repository(content: &str) -> (BooksRepository, File) {
        let mut file = tempfile::tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        let probe = file.try_clone().unwrap();
        (BooksRepository::new(file), probe)
    }

    fn raw_document(probe: &mut File) -> String {
        probe.seek(SeekFrom::Start(0)).unwrap();
        let mut raw = String::new();
        probe.read_to_string(&mut raw).unwrap();
        raw
    }

    fn valid_book() -> Book {
        Book {
            id: String::new(),
            title: "B".to_string(),
            pages: 50,
            price: 5.0,
            genres: vec!["drama".to_string()],
        }
    }

    #[tokio::test]
    async fn get_books_returns_initial_document() {
        let (repo, _) = seeded_repository(SEED);

        let books = repo.get_books().await.unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].id, "1");
        assert_eq!(books[0].title, "A");
        assert_eq!(books[0].pages, 100);
        assert_eq!(books[0].price, 9.99);
        assert_eq!(books[0].genres, vec!["sci-fi".to_string()]);
    }

    #[tokio::test]
    async fn load_is_idempotent() {
        let (repo, _) = seeded_repository(SEED);

        let first = repo.get_books().await.unwrap();
        let second = repo.get_books().await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn empty_document_is_a_decode_error() {
        let (repo, _) = seeded_repository("");

        let err = repo.get_books().await.unwrap_err();
        assert!(matches!(err, AppError::Decode(_)));
    }

    #[tokio::test]
    async fn malformed_document_is_a_decode_error() {
        let (repo, _) = seeded_repository("{not json");

        let err = repo.get_books().await.unwrap_err();
        assert!(matches!(err, AppError::Decode(_)));
    }

    #[tokio::test]
    async fn create_then_get_round_trip() {
        let (repo, _) = seeded_repository(SEED);

        let created = repo.create_book(valid_book()).await.unwrap();
        assert!(!created.id.is_empty());
        assert_ne!(created.id, "1");

        let fetched = repo.get_book(&created.id).await.unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.title, "B");
        assert_eq!(fetched.pages, 50);
        assert_eq!(fetched.price, 5.0);
    }

    #[tokio::test]
    async fn create_appends_last_and_assigns_unique_ids() {
        let (repo, _) = seeded_repository(SEED);

        let first = repo.create_book(valid_book()).await.unwrap();
        let mut other = valid_book();
        other.title = "C".to_string();
        let second = repo.create_book(other).await.unwrap();
        assert_ne!(first.id, second.id);

        let books = repo.get_books().await.unwrap();
        assert_eq!(books.len(), 3);
        assert_eq!(books[0].title, "A");
        assert_eq!(books[1].title, "B");
        assert_eq!(books[2].title, "C");
    }

    #[tokio::test]
    async fn create_rejects_incomplete_books() {
        let (repo, mut probe) = seeded_repository(SEED);
        let before = raw_document(&mut probe);

        let mut no_genres = valid_book();
        no_genres.genres.clear();
        let mut zero_pages = valid_book();
        zero_pages.pages = 0;
        let mut zero_price = valid_book();
        zero_price.price = 0.0;
        let mut empty_title = valid_book();
        empty_title.title.clear();

        for book in [no_genres, zero_pages, zero_price, empty_title] {
            let err = repo.create_book(book).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }

        // Rejected creates leave the persisted document untouched
        assert_eq!(raw_document(&mut probe), before);
    }

    #[tokio::test]
    async fn get_book_unknown_id_is_not_found() {
        let (repo, _) = seeded_repository(SEED);

        let err = repo.get_book("missing").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn remove_then_get_is_not_found() {
        let (repo, _) = seeded_repository(SEED);
        let created = repo.create_book(valid_book()).await.unwrap();

        repo.remove_book("1").await.unwrap();

        let err = repo.get_book("1").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let books = repo.get_books().await.unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].id, created.id);
    }

    #[tokio::test]
    async fn remove_preserves_order_of_remainder() {
        let (repo, _) = seeded_repository(SEED);
        let b = repo.create_book(valid_book()).await.unwrap();
        let mut third = valid_book();
        third.title = "C".to_string();
        let c = repo.create_book(third).await.unwrap();

        repo.remove_book(&b.id).await.unwrap();

        let books = repo.get_books().await.unwrap();
        assert_eq!(books.len(), 2);
        assert_eq!(books[0].id, "1");
        assert_eq!(books[1].id, c.id);
    }

    #[tokio::test]
    async fn remove_unknown_id_is_not_found() {
        let (repo, mut probe) = seeded_repository(SEED);
        let before = raw_document(&mut probe);

        let err = repo.remove_book("missing").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(raw_document(&mut probe), before);
    }

    #[tokio::test]
    async fn change_book_is_idempotent() {
        let (repo, _) = seeded_repository(SEED);

        let change = Book {
            id: "1".to_string(),
            title: "A, revised".to_string(),
            pages: 120,
            price: 12.5,
            genres: vec!["sci-fi".to_string(), "classic".to_string()],
        };

        let once = repo.change_book(change.clone()).await.unwrap();
        let twice = repo.change_book(change.clone()).await.unwrap();
        assert_eq!(once, twice);
        assert_eq!(once, change);
        assert_eq!(repo.get_book("1").await.unwrap(), change);
    }

    #[tokio::test]
    async fn change_book_replaces_all_fields_even_with_defaults() {
        let (repo, _) = seeded_repository(SEED);

        // Full-field replace: empty and zero inputs overwrite stored values
        let blanked = repo
            .change_book(Book {
                id: "1".to_string(),
                ..Book::default()
            })
            .await
            .unwrap();

        assert_eq!(blanked.id, "1");
        assert_eq!(blanked.title, "");
        assert_eq!(blanked.pages, 0);
        assert_eq!(blanked.price, 0.0);
        assert!(blanked.genres.is_empty());
    }

    #[tokio::test]
    async fn change_book_unknown_id_is_not_found() {
        let (repo, _) = seeded_repository(SEED);

        let mut change = valid_book();
        change.id = "missing".to_string();
        let err = repo.change_book(change).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn price_filter_is_strict() {
        let (repo, _) = seeded_repository(SEED);
        repo.create_book(valid_book()).await.unwrap();

        // Seeded prices are 9.99 and 5.0; equality never matches
        let above = repo
            .price_filter(&BookFilter { price: ">5".to_string() })
            .await
            .unwrap();
        assert_eq!(above.len(), 1);
        assert_eq!(above[0].price, 9.99);

        let below = repo
            .price_filter(&BookFilter { price: "<10".to_string() })
            .await
            .unwrap();
        assert_eq!(below.len(), 2);

        let none = repo
            .price_filter(&BookFilter { price: ">100".to_string() })
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn price_filter_rejects_short_expressions() {
        let (repo, _) = seeded_repository(SEED);

        for expr in ["", "x", "<"] {
            let err = repo
                .price_filter(&BookFilter { price: expr.to_string() })
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "expr {:?}", expr);
        }
    }

    #[tokio::test]
    async fn price_filter_rejects_unknown_operators() {
        let (repo, _) = seeded_repository(SEED);

        let err = repo
            .price_filter(&BookFilter { price: "=5".to_string() })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UnsupportedOperator(_)));
    }

    #[tokio::test]
    async fn price_filter_rejects_unparseable_numbers() {
        let (repo, _) = seeded_repository(SEED);

        let err = repo
            .price_filter(&BookFilter { price: ">abc".to_string() })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn save_discards_previous_content_entirely() {
        // Seed with trailing junk the decoder never sees again after a save
        let (repo, mut probe) = seeded_repository(SEED);
        repo.remove_book("1").await.unwrap();

        assert_eq!(raw_document(&mut probe), "[]");
        assert!(repo.get_books().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn document_is_pretty_printed_with_four_space_indent() {
        let (repo, mut probe) = seeded_repository("[]");
        repo.create_book(valid_book()).await.unwrap();

        let raw = raw_document(&mut probe);
        assert!(raw.starts_with("[\n    {\n"), "got: {}", raw);
    }

    #[tokio::test]
    async fn scenario_walkthrough() {
        // Store starts with one book; create, filter, remove per the
        // documented lifecycle
        let (repo, _) = seeded_repository(SEED);

        let created = repo.create_book(valid_book()).await.unwrap();
        assert_ne!(created.id, "1");

        let books = repo.get_books().await.unwrap();
        assert_eq!(books.len(), 2);
        assert_eq!(books[0].title, "A");

        let cheap = repo
            .price_filter(&BookFilter { price: "<10".to_string() })
            .await
            .unwrap();
        assert_eq!(cheap.len(), 2);

        repo.remove_book("1").await.unwrap();
        let books = repo.get_books().await.unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].title, "B");
    }
}
