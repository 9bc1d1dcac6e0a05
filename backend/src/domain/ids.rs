//! Strongly typed identifiers shared across the domain.
//!
//! All identifiers are opaque to callers: guild, user, and note ids are
//! UUIDs minted by this service, while book ids come from the catalog and
//! are deterministic content-derived tokens (see [`crate::domain::catalog`]).

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable opaque identifier for a reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Generate a fresh random identifier.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an identifier from its canonical string form.
    pub fn parse(raw: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(raw).map(Self)
    }

    /// Access the underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier of a guild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(transparent)]
pub struct GuildId(Uuid);

impl GuildId {
    /// Generate a fresh random identifier.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an identifier from its canonical string form.
    pub fn parse(raw: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(raw).map(Self)
    }
}

impl fmt::Display for GuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier of a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(transparent)]
pub struct NoteId(Uuid);

impl NoteId {
    /// Generate a fresh random identifier.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an identifier from its canonical string form.
    pub fn parse(raw: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(raw).map(Self)
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Validation failures for [`BookId`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BookIdValidationError {
    /// Identifier is empty after trimming.
    #[error("book id must not be empty")]
    Empty,
    /// Identifier contains a character outside `[A-Za-z0-9_-]`.
    #[error("book id contains unsupported character {0:?}")]
    UnsupportedCharacter(char),
    /// Identifier exceeds the maximum supported length.
    #[error("book id must be at most {max} characters")]
    TooLong {
        /// Maximum accepted length.
        max: usize,
    },
}

/// Maximum accepted length of a book identifier.
pub const BOOK_ID_MAX_LEN: usize = 64;

/// Catalog-assigned identifier of a book.
///
/// Book ids are URL-safe tokens such as `book_1k2xaz9`; the catalog derives
/// them deterministically from title and author so the same book resolves to
/// the same id across platforms.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(try_from = "String", into = "String")]
pub struct BookId(String);

impl BookId {
    /// Validate and construct a book id.
    pub fn new(raw: impl Into<String>) -> Result<Self, BookIdValidationError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(BookIdValidationError::Empty);
        }
        if raw.len() > BOOK_ID_MAX_LEN {
            return Err(BookIdValidationError::TooLong {
                max: BOOK_ID_MAX_LEN,
            });
        }
        if let Some(ch) = raw
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
        {
            return Err(BookIdValidationError::UnsupportedCharacter(ch));
        }
        Ok(Self(raw))
    }

    /// Construct without validation; the caller guarantees the token only
    /// contains `[A-Za-z0-9_-]` and fits the length bound.
    pub(crate) fn new_unchecked(raw: String) -> Self {
        Self(raw)
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for BookId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl From<BookId> for String {
    fn from(value: BookId) -> Self {
        value.0
    }
}

impl TryFrom<String> for BookId {
    type Error = BookIdValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("book_1k2xaz9")]
    #[case("mage-tank-1")]
    #[case("B00K")]
    fn accepts_url_safe_tokens(#[case] raw: &str) {
        let id = BookId::new(raw).expect("valid book id");
        assert_eq!(id.as_str(), raw);
    }

    #[rstest]
    #[case("", BookIdValidationError::Empty)]
    #[case("   ", BookIdValidationError::Empty)]
    #[case("book id", BookIdValidationError::UnsupportedCharacter(' '))]
    #[case("book/1", BookIdValidationError::UnsupportedCharacter('/'))]
    fn rejects_malformed_tokens(#[case] raw: &str, #[case] expected: BookIdValidationError) {
        assert_eq!(BookId::new(raw).expect_err("rejected"), expected);
    }

    #[rstest]
    fn rejects_overlong_tokens() {
        let raw = "b".repeat(BOOK_ID_MAX_LEN + 1);
        assert_eq!(
            BookId::new(raw).expect_err("rejected"),
            BookIdValidationError::TooLong {
                max: BOOK_ID_MAX_LEN
            }
        );
    }
}
