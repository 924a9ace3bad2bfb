use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;
use uuid::Uuid;

use bookshelf_kernel::Clock;

use super::models::{Book, BookPayload, BookSummary};

/// Failures surfaced by shelf operations; handlers translate these into the
/// response envelope.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShelfError {
    #[error("book name is required")]
    MissingName,

    #[error("readPage must not be greater than pageCount")]
    ReadPageExceedsPageCount,

    #[error("no book matches the requested id")]
    NotFound,

    #[error("inserted book is missing from the collection")]
    InsertVerificationFailed,
}

/// Narrowing applied by [`Shelf::list`]. At most one dimension per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListFilter {
    All,
    Reading(bool),
    Finished(bool),
    /// Case-insensitive substring match on the book name.
    NameContains(String),
}

/// The book collection. Owns every record; handlers only hold a reference.
///
/// The mutex gives each operation full exclusivity over the collection for
/// its duration, matching the one-request-at-a-time discipline the service
/// promises even though axum serves requests from multiple threads.
pub struct Shelf {
    clock: Arc<dyn Clock>,
    books: Mutex<Vec<Book>>,
}

impl Shelf {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            books: Mutex::new(Vec::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Book>> {
        self.books.lock().expect("book collection mutex poisoned")
    }

    /// Shared payload validation for add and update. Runs before any lookup
    /// or mutation.
    fn validate(payload: &BookPayload) -> Result<String, ShelfError> {
        let name = payload.name.as_deref().unwrap_or_default();
        if name.is_empty() {
            return Err(ShelfError::MissingName);
        }
        if payload.read_page > payload.page_count {
            return Err(ShelfError::ReadPageExceedsPageCount);
        }
        Ok(name.to_string())
    }

    /// Append a new book and return its generated id.
    ///
    /// `finished` is derived from `read_page == page_count`; `inserted_at`
    /// and `updated_at` both take the current time.
    pub fn add(&self, payload: BookPayload) -> Result<String, ShelfError> {
        let name = Self::validate(&payload)?;

        let id = Uuid::new_v4().simple().to_string();
        let now = self.clock.now_utc();
        let book = Book {
            id: id.clone(),
            name,
            year: payload.year,
            author: payload.author,
            summary: payload.summary,
            publisher: payload.publisher,
            page_count: payload.page_count,
            read_page: payload.read_page,
            finished: payload.read_page == payload.page_count,
            reading: payload.reading,
            inserted_at: now,
            updated_at: now,
        };

        let mut books = self.lock();
        books.push(book);

        // Post-insert consistency check: the new id must be findable.
        if !books.iter().any(|book| book.id == id) {
            return Err(ShelfError::InsertVerificationFailed);
        }

        Ok(id)
    }

    /// Return `{id, name, publisher}` projections of every matching book, in
    /// insertion order. Zero matches is an ordinary empty result.
    pub fn list(&self, filter: &ListFilter) -> Vec<BookSummary> {
        let needle = match filter {
            ListFilter::NameContains(name) => name.to_lowercase(),
            _ => String::new(),
        };

        self.lock()
            .iter()
            .filter(|book| match filter {
                ListFilter::All => true,
                ListFilter::Reading(flag) => book.reading == *flag,
                ListFilter::Finished(flag) => book.finished == *flag,
                ListFilter::NameContains(_) => book.name.to_lowercase().contains(&needle),
            })
            .map(|book| BookSummary {
                id: book.id.clone(),
                name: book.name.clone(),
                publisher: book.publisher.clone(),
            })
            .collect()
    }

    /// Return the full record for `id`.
    pub fn get(&self, id: &str) -> Result<Book, ShelfError> {
        self.lock()
            .iter()
            .find(|book| book.id == id)
            .cloned()
            .ok_or(ShelfError::NotFound)
    }

    /// Replace the mutable fields of the book with `id` and refresh
    /// `updated_at`. `id` and `inserted_at` are never touched.
    ///
    /// Validation runs before the existence lookup, so an invalid payload for
    /// an unknown id reports the validation failure, not NotFound.
    pub fn update(&self, id: &str, payload: BookPayload) -> Result<(), ShelfError> {
        let name = Self::validate(&payload)?;
        let now = self.clock.now_utc();

        let mut books = self.lock();
        let book = books
            .iter_mut()
            .find(|book| book.id == id)
            .ok_or(ShelfError::NotFound)?;

        book.name = name;
        book.year = payload.year;
        book.author = payload.author;
        book.summary = payload.summary;
        book.publisher = payload.publisher;
        book.page_count = payload.page_count;
        book.read_page = payload.read_page;
        book.reading = payload.reading;
        // `finished` keeps its insert-time value on edits.
        book.updated_at = now;

        Ok(())
    }

    /// Remove the book with `id`.
    pub fn delete(&self, id: &str) -> Result<(), ShelfError> {
        let mut books = self.lock();
        let index = books
            .iter()
            .position(|book| book.id == id)
            .ok_or(ShelfError::NotFound)?;
        books.remove(index);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
