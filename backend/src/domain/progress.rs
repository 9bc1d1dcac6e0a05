//! Per-reader playback progress records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{BookId, GuildId, UserId};

/// A reader's progress through one book, scoped to a guild.
///
/// One record per (guild, book, user); overwritten wholesale on update
/// (last-write-wins, no merge semantics). `percent` is always derived
/// server-side from the catalog's total duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    /// Guild the record is scoped to.
    pub guild_id: GuildId,
    /// Book being listened to.
    pub book_id: BookId,
    /// Owning reader; the only user allowed to mutate this record.
    pub user_id: UserId,
    /// Absolute position in seconds from book start.
    pub position_seconds: f64,
    /// Completion percentage, clamped to `[0, 100]`.
    pub percent: f64,
    /// Instant of the last write.
    pub last_updated_at: DateTime<Utc>,
    /// Whether the reader is actively listening to this book.
    pub is_active: bool,
}

impl Progress {
    /// Materialize the "never started" state for a reader.
    ///
    /// Absent progress is treated as position zero everywhere, so lookups
    /// never surface an absence to callers.
    #[must_use]
    pub fn never_started(guild_id: GuildId, book_id: BookId, user_id: UserId) -> Self {
        Self {
            guild_id,
            book_id,
            user_id,
            position_seconds: 0.0,
            percent: 0.0,
            last_updated_at: DateTime::UNIX_EPOCH,
            is_active: false,
        }
    }
}

/// A peer member's progress, rendered alongside the reader's own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GhostProgress {
    /// The peer's user id.
    pub user_id: UserId,
    /// The peer's roster display name.
    pub display_name: String,
    /// Completion percentage.
    pub percent: f64,
    /// Absolute position in seconds.
    pub position_seconds: f64,
}
