//! Domain ports defining the edges of the hexagon.
//!
//! Driven ports describe how the domain expects to interact with storage and
//! identity adapters; each trait exposes strongly typed `thiserror` errors so
//! adapters map their failures into predictable variants. Driving ports are
//! the use-case traits inbound adapters (HTTP, WebSocket) consume, returning
//! the transport-agnostic [`Error`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

use super::error::Error;
use super::guild::{Guild, InviteCode, Member};
use super::ids::{BookId, GuildId, NoteId, UserId};
use super::note::{Note, NoteTimeline};
use super::progress::{GhostProgress, Progress};

/// Errors surfaced by guild persistence adapters.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum GuildPersistenceError {
    /// Backend connectivity or transaction failures.
    #[error("guild repository unavailable: {message}")]
    Connection {
        /// Adapter-supplied failure description.
        message: String,
    },
    /// Query or mutation failed during execution.
    #[error("guild repository query failed: {message}")]
    Query {
        /// Adapter-supplied failure description.
        message: String,
    },
    /// Another guild already holds the invite code; the caller retries the
    /// whole creation with a fresh draw.
    #[error("invite code {code} is already taken")]
    InviteCodeTaken {
        /// The colliding code.
        code: String,
    },
    /// The referenced guild does not exist.
    #[error("guild {guild_id} not found")]
    GuildNotFound {
        /// Missing guild.
        guild_id: GuildId,
    },
    /// A member record already exists for this (guild, user).
    #[error("user {user_id} is already a member of guild {guild_id}")]
    AlreadyMember {
        /// Target guild.
        guild_id: GuildId,
        /// Already-joined user.
        user_id: UserId,
    },
    /// No member record exists for this (guild, user).
    #[error("user {user_id} is not a member of guild {guild_id}")]
    MemberNotFound {
        /// Target guild.
        guild_id: GuildId,
        /// Missing member.
        user_id: UserId,
    },
}

impl GuildPersistenceError {
    /// Helper for connection oriented failures.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for query failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Persistence port for guilds and their member rosters.
///
/// Counter semantics are part of the contract: `add_member` and
/// `remove_member` adjust `member_count` atomically with the roster change,
/// and `create_guild` makes the guild, its owner member, and the seeded
/// counter visible as one unit; a guild must never be observable without
/// its owner.
#[async_trait]
pub trait GuildRepository: Send + Sync {
    /// Create a guild with its owner member and `member_count == 1`,
    /// atomically. Fails with [`GuildPersistenceError::InviteCodeTaken`]
    /// when the code is not globally unique.
    async fn create_guild(&self, guild: &Guild, owner: &Member)
    -> Result<(), GuildPersistenceError>;

    /// Remove a guild and its roster; the membership service's compensating
    /// action when the profile pointer cannot be set.
    async fn delete_guild(&self, guild_id: &GuildId) -> Result<(), GuildPersistenceError>;

    /// Fetch a guild by id.
    async fn find_by_id(&self, guild_id: &GuildId)
    -> Result<Option<Guild>, GuildPersistenceError>;

    /// Case-insensitive invite-code lookup (codes are stored folded).
    async fn find_by_invite_code(
        &self,
        code: &InviteCode,
    ) -> Result<Option<Guild>, GuildPersistenceError>;

    /// Fetch one member record.
    async fn member(
        &self,
        guild_id: &GuildId,
        user_id: &UserId,
    ) -> Result<Option<Member>, GuildPersistenceError>;

    /// Fetch the full roster, in storage order.
    async fn members(&self, guild_id: &GuildId) -> Result<Vec<Member>, GuildPersistenceError>;

    /// Insert a member and increment the counter atomically.
    async fn add_member(&self, member: &Member) -> Result<(), GuildPersistenceError>;

    /// Remove a member and decrement the counter atomically.
    async fn remove_member(
        &self,
        guild_id: &GuildId,
        user_id: &UserId,
    ) -> Result<(), GuildPersistenceError>;
}

/// Errors surfaced by the identity directory adapter.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum DirectoryError {
    /// Backend connectivity failures.
    #[error("user directory unavailable: {message}")]
    Connection {
        /// Adapter-supplied failure description.
        message: String,
    },
    /// Query or mutation failed during execution.
    #[error("user directory query failed: {message}")]
    Query {
        /// Adapter-supplied failure description.
        message: String,
    },
    /// The supplied email cannot identify an account.
    #[error("invalid email: {message}")]
    InvalidEmail {
        /// Human-readable reason.
        message: String,
    },
}

impl DirectoryError {
    /// Helper for connection oriented failures.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for query failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// A reader's identity profile, including the single-active-guild pointer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Opaque stable identifier.
    pub user_id: UserId,
    /// Sign-in email.
    pub email: String,
    /// Server-derived display name (email local part).
    pub display_name: String,
    /// The guild the reader currently belongs to, if any. This pointer is
    /// the system-wide enforcement point for "one guild per user".
    pub current_guild: Option<GuildId>,
}

/// Identity provider port.
///
/// The engine treats `user_id` as opaque; the directory owns the mapping
/// from sign-in credentials to profiles and holds the current-guild pointer.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Resolve (or create) the profile for a signing-in email.
    async fn authenticate(&self, email: &str) -> Result<UserProfile, DirectoryError>;

    /// Fetch a profile by user id.
    async fn profile(&self, user_id: &UserId) -> Result<Option<UserProfile>, DirectoryError>;

    /// Point the profile at a guild, or clear the pointer.
    async fn set_current_guild(
        &self,
        user_id: &UserId,
        guild: Option<GuildId>,
    ) -> Result<(), DirectoryError>;
}

/// Errors surfaced by progress persistence adapters.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum ProgressPersistenceError {
    /// Backend connectivity failures.
    #[error("progress repository unavailable: {message}")]
    Connection {
        /// Adapter-supplied failure description.
        message: String,
    },
    /// Query or mutation failed during execution.
    #[error("progress repository query failed: {message}")]
    Query {
        /// Adapter-supplied failure description.
        message: String,
    },
}

/// Persistence port for progress records.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Overwrite the (guild, book, user) record wholesale.
    async fn upsert(&self, progress: &Progress) -> Result<(), ProgressPersistenceError>;

    /// Fetch one reader's record; `None` means never started.
    async fn find(
        &self,
        guild_id: &GuildId,
        book_id: &BookId,
        user_id: &UserId,
    ) -> Result<Option<Progress>, ProgressPersistenceError>;

    /// Fetch every reader's latest record for a book in a guild.
    async fn for_book(
        &self,
        guild_id: &GuildId,
        book_id: &BookId,
    ) -> Result<Vec<Progress>, ProgressPersistenceError>;
}

/// Errors surfaced by note persistence adapters.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum NotePersistenceError {
    /// Backend connectivity failures.
    #[error("note repository unavailable: {message}")]
    Connection {
        /// Adapter-supplied failure description.
        message: String,
    },
    /// Query or mutation failed during execution.
    #[error("note repository query failed: {message}")]
    Query {
        /// Adapter-supplied failure description.
        message: String,
    },
    /// The referenced note does not exist in this guild.
    #[error("note {note_id} not found")]
    NoteNotFound {
        /// Missing note.
        note_id: NoteId,
    },
}

/// Persistence port for notes.
#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// Append a note.
    async fn insert(&self, note: &Note) -> Result<(), NotePersistenceError>;

    /// Fetch a note by id, scoped to a guild.
    async fn find(
        &self,
        guild_id: &GuildId,
        note_id: &NoteId,
    ) -> Result<Option<Note>, NotePersistenceError>;

    /// Delete a note by id, scoped to a guild.
    async fn delete(
        &self,
        guild_id: &GuildId,
        note_id: &NoteId,
    ) -> Result<(), NotePersistenceError>;

    /// Fetch every note for a book in a guild, unordered.
    async fn for_book(
        &self,
        guild_id: &GuildId,
        book_id: &BookId,
    ) -> Result<Vec<Note>, NotePersistenceError>;
}

/// A guild plus its presentation-ordered roster.
#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GuildOverview {
    /// The guild record.
    pub guild: Guild,
    /// Roster ordered owner-first, then by display name.
    pub members: Vec<Member>,
}

/// Public preview of a guild resolved from an invite code.
///
/// Deliberately excludes the guild's internal id: invite codes are the only
/// externally shareable identifier.
#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvitePreview {
    /// Guild display name.
    pub guild_name: String,
    /// Current member count.
    pub member_count: u32,
    /// The canonical (case-folded) invite code.
    pub invite_code: InviteCode,
}

/// Driving port: membership mutations.
#[async_trait]
pub trait MembershipCommand: Send + Sync {
    /// Create a guild owned by `actor`: guild record, owner member, seeded
    /// counter, and profile pointer as one unit of work.
    async fn create_guild(&self, actor: &UserId, name: &str) -> Result<Guild, Error>;

    /// Join the guild matching `invite_code`.
    async fn join_guild(&self, actor: &UserId, invite_code: &str) -> Result<Guild, Error>;

    /// Leave the actor's current guild.
    async fn leave_guild(&self, actor: &UserId) -> Result<(), Error>;
}

/// Driving port: membership queries.
#[async_trait]
pub trait MembershipQuery: Send + Sync {
    /// The actor's current guild with its ordered roster.
    async fn overview(&self, actor: &UserId) -> Result<GuildOverview, Error>;

    /// Pre-auth invite-code resolution.
    async fn invite_preview(&self, code: &str) -> Result<InvitePreview, Error>;
}

/// Driving port: progress mutations.
#[async_trait]
pub trait ProgressCommand: Send + Sync {
    /// Record the actor's position in a book; last-write-wins.
    async fn update_progress(
        &self,
        actor: &UserId,
        book_id: &BookId,
        position_seconds: f64,
    ) -> Result<Progress, Error>;
}

/// Driving port: progress queries.
#[async_trait]
pub trait ProgressQuery: Send + Sync {
    /// The actor's own progress; never-started materializes as zero.
    async fn progress(&self, actor: &UserId, book_id: &BookId) -> Result<Progress, Error>;

    /// Peer progress for ghost markers, furthest-behind first.
    async fn ghost_progress(
        &self,
        actor: &UserId,
        book_id: &BookId,
    ) -> Result<Vec<GhostProgress>, Error>;
}

/// Driving port: note mutations.
#[async_trait]
pub trait NoteCommand: Send + Sync {
    /// Post a note at a position in a book.
    async fn post_note(
        &self,
        actor: &UserId,
        book_id: &BookId,
        text: &str,
        position_seconds: f64,
    ) -> Result<Note, Error>;

    /// Delete one of the actor's own notes.
    async fn delete_note(&self, actor: &UserId, note_id: &NoteId) -> Result<(), Error>;
}

/// Driving port: the spoiler-gated note timeline.
#[async_trait]
pub trait NoteQuery: Send + Sync {
    /// The actor's view of a book's notes: visible notes in timeline order
    /// plus a count of gated ones.
    async fn timeline(&self, actor: &UserId, book_id: &BookId) -> Result<NoteTimeline, Error>;
}
