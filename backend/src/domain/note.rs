//! Social annotations ("notes") pinned to a position in a book.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{BookId, GuildId, NoteId, UserId};

/// Maximum note length in Unicode code points.
pub const NOTE_MAX_CHARS: usize = 280;

/// A note left by a guild member at a point in a book.
///
/// Append-only except author-initiated delete; `created_at` is
/// server-assigned while `position_seconds` is caller-supplied and may be
/// backdated relative to other notes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Note identifier.
    pub id: NoteId,
    /// Guild the note belongs to.
    pub guild_id: GuildId,
    /// Book the note is pinned to.
    pub book_id: BookId,
    /// Authoring reader; the only user allowed to delete the note.
    pub author_id: UserId,
    /// Author display name captured at post time.
    pub author_display_name: String,
    /// Pin position in seconds from book start; the spoiler-gate key.
    pub position_seconds: f64,
    /// Trimmed note text, at most [`NOTE_MAX_CHARS`] code points.
    pub text: String,
    /// Server-assigned creation instant.
    pub created_at: DateTime<Utc>,
}

/// The per-reader view of a book's note timeline.
///
/// Hidden notes are counted but never content-exposed: text, author, and
/// position of a gated note must not reach a reader whose progress has not
/// caught up.
#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NoteTimeline {
    /// Notes revealed to the requesting reader, in timeline order.
    pub visible: Vec<Note>,
    /// Number of notes still behind the spoiler gate.
    pub hidden_count: usize,
}

/// Timeline display order: `position_seconds` ascending, ties broken by
/// `created_at` ascending. Independent of insertion order.
pub fn timeline_order(notes: &mut [Note]) {
    notes.sort_by(|a, b| {
        a.position_seconds
            .total_cmp(&b.position_seconds)
            .then_with(|| a.created_at.cmp(&b.created_at))
    });
}
