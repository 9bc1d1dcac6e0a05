//! Wire-level message definitions for the WebSocket adapter.
//!
//! The hub's change signals are content-free; these payloads are full
//! snapshots recomputed per reader before serialization, so a client never
//! receives data its own progress would not unlock.

use serde::Serialize;

use crate::domain::ids::BookId;
use crate::domain::note::NoteTimeline;
use crate::domain::ports::GuildOverview;
use crate::domain::progress::GhostProgress;

/// Outbound snapshot payloads, tagged by `type`.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// Current guild with its ordered roster.
    Guild {
        #[serde(flatten)]
        overview: GuildOverview,
    },
    /// Peer positions for the ghost markers.
    GhostProgress {
        book_id: BookId,
        ghosts: Vec<GhostProgress>,
    },
    /// The receiving reader's gated note timeline.
    Notes {
        book_id: BookId,
        timeline: NoteTimeline,
    },
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rstest::rstest;
    use serde_json::{Value, json};

    use super::*;
    use crate::domain::guild::{Guild, GuildName, InviteCode};
    use crate::domain::ids::{GuildId, UserId};

    #[rstest]
    fn payloads_are_tagged_and_camel_cased() {
        let message = ServerMessage::GhostProgress {
            book_id: BookId::new("book_abc").expect("book id"),
            ghosts: vec![GhostProgress {
                user_id: UserId::random(),
                display_name: "bo".into(),
                percent: 41.5,
                position_seconds: 900.0,
            }],
        };
        let value: Value = serde_json::to_value(&message).expect("serialize");
        assert_eq!(value["type"], json!("ghostProgress"));
        assert_eq!(value["bookId"], json!("book_abc"));
        assert_eq!(value["ghosts"][0]["displayName"], json!("bo"));
    }

    #[rstest]
    fn guild_snapshots_nest_the_overview() {
        let guild = Guild {
            id: GuildId::random(),
            name: GuildName::parse("Night Shift").expect("name"),
            owner_id: UserId::random(),
            invite_code: InviteCode::parse("AB23CD").expect("code"),
            member_count: 1,
            created_at: Utc::now(),
        };
        let message = ServerMessage::Guild {
            overview: GuildOverview {
                guild,
                members: vec![],
            },
        };
        let value: Value = serde_json::to_value(&message).expect("serialize");
        assert_eq!(value["type"], json!("guild"));
        assert_eq!(value["guild"]["memberCount"], json!(1));
        assert!(value["members"].as_array().expect("roster").is_empty());
    }
}
