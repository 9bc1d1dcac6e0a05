//! Domain model and services.
//!
//! Purpose: hold the group-listening rules (membership lifecycle, progress,
//! spoiler-gated notes, timeline math) behind driving ports, with driven
//! ports describing what the domain needs from storage and identity. Types
//! are strongly typed at the edges and document their invariants in Rustdoc.
//!
//! Public surface:
//! - `Error` / `ErrorCode`: transport-agnostic operation failure payload.
//! - Identifier newtypes (`UserId`, `GuildId`, `NoteId`, `BookId`).
//! - Aggregates: `Guild`, `Member`, `Progress`, `Note`, `Book`.
//! - Services implementing the driving ports in `ports`.
//! - `SyncHub`: in-process change fan-out for live readers.

pub mod catalog;
pub mod error;
pub mod guild;
pub mod ids;
pub mod membership_service;
pub mod note;
pub mod note_service;
pub mod ports;
pub mod progress;
pub mod progress_service;
pub mod sync;
pub mod timeline;

pub use self::catalog::{Book, BookCatalog, Chapter, book_id_from_metadata};
pub use self::error::{Error, ErrorCode};
pub use self::guild::{Guild, GuildName, InviteCode, Member, MemberRole};
pub use self::ids::{BookId, GuildId, NoteId, UserId};
pub use self::membership_service::MembershipService;
pub use self::note::{NOTE_MAX_CHARS, Note, NoteTimeline};
pub use self::note_service::NoteService;
pub use self::ports::{
    GuildOverview, GuildRepository, InvitePreview, MembershipCommand,
    MembershipQuery, NoteCommand, NoteQuery, NoteRepository, ProgressCommand, ProgressQuery,
    ProgressRepository, UserDirectory, UserProfile,
};
pub use self::progress::{GhostProgress, Progress};
pub use self::progress_service::ProgressService;
pub use self::sync::{Change, SyncHub, Topic};

/// Convenient API result alias.
pub type ApiResult<T> = Result<T, Error>;
