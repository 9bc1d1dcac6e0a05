//! Static in-process book catalog.
//!
//! Book metadata ships with the binary; ids are derived from title and
//! author so they stay stable across releases.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::error;

use crate::domain::catalog::{Book, BookCatalog, Chapter, book_id_from_metadata};
use crate::domain::ids::BookId;

/// [`BookCatalog`] over a fixed set of books loaded at startup.
#[derive(Debug, Default)]
pub struct StaticCatalog {
    books: Vec<Arc<Book>>,
    by_id: HashMap<BookId, Arc<Book>>,
}

impl StaticCatalog {
    /// Build a catalog from the given books.
    pub fn new(books: Vec<Book>) -> Self {
        let books: Vec<Arc<Book>> = books.into_iter().map(Arc::new).collect();
        let by_id = books
            .iter()
            .map(|book| (book.id().clone(), Arc::clone(book)))
            .collect();
        Self { books, by_id }
    }

    /// The built-in demo catalog.
    pub fn seeded() -> Self {
        Self::new(seed_books())
    }
}

impl BookCatalog for StaticCatalog {
    fn book(&self, id: &BookId) -> Option<Arc<Book>> {
        self.by_id.get(id).cloned()
    }

    fn books(&self) -> Vec<Arc<Book>> {
        self.books.clone()
    }
}

fn build_book(title: &str, author: &str, chapters: &[(&str, f64)]) -> Option<Book> {
    let id = book_id_from_metadata(title, Some(author));
    let mut start = 0.0;
    let mut built = Vec::with_capacity(chapters.len());
    for (index, (chapter_title, duration)) in chapters.iter().enumerate() {
        built.push(Chapter {
            index,
            title: (*chapter_title).to_owned(),
            start_seconds: start,
            duration_seconds: *duration,
        });
        start += duration;
    }
    match Book::new(id, title, author, start, built) {
        Ok(book) => Some(book),
        Err(err) => {
            // Seed data is compiled in; a failure here is a packaging bug.
            error!(error = %err, title, "dropping malformed seed book");
            None
        }
    }
}

fn seed_books() -> Vec<Book> {
    let mut books = Vec::new();
    books.extend(build_book(
        "Mage Tank",
        "Cornman",
        &[
            ("Prologue", 912.0),
            ("Welcome to the Crucible", 2130.0),
            ("The System Provides", 2544.0),
            ("Party of One", 2088.0),
            ("Delve Economics", 2460.0),
            ("A Wall With Opinions", 2310.0),
            ("Threat Assessment", 2676.0),
            ("The Long Ascent", 3054.0),
            ("Epilogue", 1326.0),
        ],
    ));
    books.extend(build_book(
        "Dungeon Crawler Carl",
        "Matt Dinniman",
        &[
            ("The Collapse", 1740.0),
            ("The Princess", 2220.0),
            ("Floor One", 2880.0),
            ("Goblins and Fine Print", 2520.0),
            ("The Stairwell", 2340.0),
            ("Showtime", 3120.0),
        ],
    ));
    books
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn seeded_catalog_is_well_formed() {
        let catalog = StaticCatalog::seeded();
        let books = catalog.books();
        assert_eq!(books.len(), 2);
        for book in &books {
            assert!(book.id().as_str().starts_with("book_"));
            assert!(book.total_duration_seconds() > 0.0);
            assert!(catalog.book(book.id()).is_some());
        }
    }

    #[rstest]
    fn ids_are_stable_across_builds() {
        let first = StaticCatalog::seeded();
        let second = StaticCatalog::seeded();
        let ids: Vec<_> = first.books().iter().map(|b| b.id().clone()).collect();
        let again: Vec<_> = second.books().iter().map(|b| b.id().clone()).collect();
        assert_eq!(ids, again);
    }
}
