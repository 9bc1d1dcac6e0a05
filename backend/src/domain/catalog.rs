//! Book catalog reference data.
//!
//! The engine never mutates catalog content; books are immutable records
//! whose chapters partition `[0, total_duration_seconds)` with no gaps and
//! strictly increasing starts. The partition invariant is enforced at
//! construction so the timeline math in [`crate::domain::timeline`] can rely
//! on it without re-checking.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use super::ids::BookId;

/// Tolerance for float comparisons on chapter boundaries.
const BOUNDARY_EPSILON: f64 = 1e-6;

/// A single chapter within a book.
#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    /// Zero-based position in the book's chapter sequence.
    pub index: usize,
    /// Display title, e.g. `Chapter 5` or `Epilogue`.
    pub title: String,
    /// Absolute start, in seconds from the beginning of the book.
    pub start_seconds: f64,
    /// Chapter length in seconds; always positive.
    pub duration_seconds: f64,
}

impl Chapter {
    /// Absolute end of the chapter (exclusive).
    #[must_use]
    pub fn end_seconds(&self) -> f64 {
        self.start_seconds + self.duration_seconds
    }
}

/// Validation failures for [`Book::new`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BookValidationError {
    /// A book must contain at least one chapter.
    #[error("book must have at least one chapter")]
    NoChapters,
    /// Chapter indices must run 0, 1, 2, … in order.
    #[error("chapter at position {position} has index {index}, expected {position}")]
    IndexOutOfOrder {
        /// Position in the supplied sequence.
        position: usize,
        /// Index recorded on the chapter.
        index: usize,
    },
    /// A chapter's duration must be positive.
    #[error("chapter {index} has non-positive duration")]
    NonPositiveDuration {
        /// Offending chapter index.
        index: usize,
    },
    /// Chapters must tile the book with no gap or overlap.
    #[error("chapter {index} starts at {actual}, expected {expected}")]
    Gap {
        /// Offending chapter index.
        index: usize,
        /// Expected start (end of the previous chapter).
        expected: f64,
        /// Recorded start.
        actual: f64,
    },
    /// The final chapter must end exactly at the book's total duration.
    #[error("chapters end at {chapters_end}, book duration is {total}")]
    DurationMismatch {
        /// End of the final chapter.
        chapters_end: f64,
        /// Declared total duration.
        total: f64,
    },
}

/// Immutable book record supplied by the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    id: BookId,
    title: String,
    author: String,
    total_duration_seconds: f64,
    chapters: Vec<Chapter>,
}

impl Book {
    /// Construct a book, validating the chapter partition invariant.
    pub fn new(
        id: BookId,
        title: impl Into<String>,
        author: impl Into<String>,
        total_duration_seconds: f64,
        chapters: Vec<Chapter>,
    ) -> Result<Self, BookValidationError> {
        if chapters.is_empty() {
            return Err(BookValidationError::NoChapters);
        }

        let mut expected_start = 0.0_f64;
        for (position, chapter) in chapters.iter().enumerate() {
            if chapter.index != position {
                return Err(BookValidationError::IndexOutOfOrder {
                    position,
                    index: chapter.index,
                });
            }
            if chapter.duration_seconds <= 0.0 {
                return Err(BookValidationError::NonPositiveDuration {
                    index: chapter.index,
                });
            }
            if (chapter.start_seconds - expected_start).abs() > BOUNDARY_EPSILON {
                return Err(BookValidationError::Gap {
                    index: chapter.index,
                    expected: expected_start,
                    actual: chapter.start_seconds,
                });
            }
            expected_start = chapter.end_seconds();
        }

        if (expected_start - total_duration_seconds).abs() > BOUNDARY_EPSILON {
            return Err(BookValidationError::DurationMismatch {
                chapters_end: expected_start,
                total: total_duration_seconds,
            });
        }

        Ok(Self {
            id,
            title: title.into(),
            author: author.into(),
            total_duration_seconds,
            chapters,
        })
    }

    /// Catalog identifier.
    #[must_use]
    pub fn id(&self) -> &BookId {
        &self.id
    }

    /// Display title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Author name.
    #[must_use]
    pub fn author(&self) -> &str {
        &self.author
    }

    /// Total running time in seconds.
    #[must_use]
    pub fn total_duration_seconds(&self) -> f64 {
        self.total_duration_seconds
    }

    /// Ordered chapter sequence; guaranteed non-empty and gap-free.
    #[must_use]
    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }
}

/// Driven port supplying immutable book records.
pub trait BookCatalog: Send + Sync {
    /// Look up a single book by id.
    fn book(&self, id: &BookId) -> Option<Arc<Book>>;

    /// All books in the catalog, in catalog order.
    fn books(&self) -> Vec<Arc<Book>>;
}

/// Derive a deterministic book id from title and author.
///
/// Normalizes both fields (lowercase, special characters stripped, whitespace
/// collapsed) and hashes `"title|author"` with djb2, rendered in base 36 and
/// prefixed `book_`, so the same book resolves to the same id on every
/// platform that shares the algorithm.
#[must_use]
pub fn book_id_from_metadata(title: &str, author: Option<&str>) -> BookId {
    let combined = format!(
        "{}|{}",
        normalize_for_hash(title),
        author.map(normalize_for_hash).unwrap_or_default()
    );
    // The alphabet of `book_<base36>` is a strict subset of what BookId
    // accepts.
    BookId::new_unchecked(format!("book_{}", to_base36(djb2_xor(&combined))))
}

fn normalize_for_hash(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut pending_space = false;
    for ch in value.trim().to_lowercase().chars() {
        if ch.is_whitespace() {
            pending_space = !out.is_empty();
        } else if ch.is_alphanumeric() || ch == '_' {
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            out.push(ch);
        }
    }
    out
}

fn djb2_xor(value: &str) -> u32 {
    let mut hash: u32 = 5381;
    for ch in value.chars() {
        hash = hash.wrapping_shl(5).wrapping_add(hash) ^ (ch as u32);
    }
    hash
}

fn to_base36(mut value: u32) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_owned();
    }
    let mut out = Vec::new();
    while value > 0 {
        let digit = (value % 36) as usize;
        out.push(DIGITS[digit]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn chapter(index: usize, start: f64, duration: f64) -> Chapter {
        Chapter {
            index,
            title: format!("Chapter {}", index + 1),
            start_seconds: start,
            duration_seconds: duration,
        }
    }

    fn book_id() -> BookId {
        BookId::new("book_test").expect("valid id")
    }

    #[rstest]
    fn accepts_gap_free_partition() {
        let book = Book::new(
            book_id(),
            "T",
            "A",
            300.0,
            vec![chapter(0, 0.0, 120.0), chapter(1, 120.0, 180.0)],
        )
        .expect("valid book");
        assert_eq!(book.chapters().len(), 2);
    }

    #[rstest]
    fn rejects_empty_chapter_list() {
        let err = Book::new(book_id(), "T", "A", 0.0, vec![]).expect_err("rejected");
        assert_eq!(err, BookValidationError::NoChapters);
    }

    #[rstest]
    fn rejects_gap_between_chapters() {
        let err = Book::new(
            book_id(),
            "T",
            "A",
            300.0,
            vec![chapter(0, 0.0, 100.0), chapter(1, 120.0, 180.0)],
        )
        .expect_err("rejected");
        assert!(matches!(err, BookValidationError::Gap { index: 1, .. }));
    }

    #[rstest]
    fn rejects_duration_mismatch() {
        let err = Book::new(book_id(), "T", "A", 400.0, vec![chapter(0, 0.0, 300.0)])
            .expect_err("rejected");
        assert!(matches!(err, BookValidationError::DurationMismatch { .. }));
    }

    #[rstest]
    fn rejects_out_of_order_indices() {
        let err = Book::new(
            book_id(),
            "T",
            "A",
            300.0,
            vec![chapter(1, 0.0, 300.0)],
        )
        .expect_err("rejected");
        assert!(matches!(
            err,
            BookValidationError::IndexOutOfOrder { position: 0, .. }
        ));
    }

    #[rstest]
    fn book_ids_are_deterministic_and_normalized() {
        let a = book_id_from_metadata("Mage Tank", Some("Cornman"));
        let b = book_id_from_metadata("  mage   tank! ", Some("CORNMAN"));
        assert_eq!(a, b);
        assert!(a.as_str().starts_with("book_"));
    }

    #[rstest]
    fn distinct_metadata_yields_distinct_ids() {
        let a = book_id_from_metadata("Mage Tank", Some("Cornman"));
        let b = book_id_from_metadata("Mage Tank 2", Some("Cornman"));
        assert_ne!(a, b);
    }
}
