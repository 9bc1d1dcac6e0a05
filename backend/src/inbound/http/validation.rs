//! Path and payload validation helpers shared across handlers.

use serde_json::json;

use crate::domain::{BookId, Error, NoteId};

/// Parse a book id path segment into the validated newtype.
pub fn parse_book_id(raw: &str) -> Result<BookId, Error> {
    BookId::new(raw).map_err(|err| {
        Error::invalid_request(err.to_string())
            .with_details(json!({ "field": "bookId", "code": "book_id_invalid" }))
    })
}

/// Parse a note id path segment.
pub fn parse_note_id(raw: &str) -> Result<NoteId, Error> {
    NoteId::parse(raw).map_err(|_| {
        Error::invalid_request("note id must be a UUID")
            .with_details(json!({ "field": "noteId", "code": "note_id_invalid" }))
    })
}
