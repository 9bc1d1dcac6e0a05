//! Guild aggregate: identity, invite codes, and the member roster.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ids::{GuildId, UserId};

/// Number of characters in an invite code.
pub const INVITE_CODE_LEN: usize = 6;

/// The 32-symbol unambiguous alphabet: uppercase letters and digits minus
/// the visually confusable `0 O I 1`.
pub const INVITE_CODE_ALPHABET: &[u8; 32] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Parse failures for [`InviteCode`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InviteCodeParseError {
    /// Codes are exactly [`INVITE_CODE_LEN`] characters.
    #[error("invite code must be exactly {INVITE_CODE_LEN} characters")]
    WrongLength,
    /// A character falls outside the unambiguous alphabet.
    #[error("invite code contains unsupported character {0:?}")]
    UnsupportedCharacter(char),
}

/// Shareable 6-character invite code resolving to exactly one guild.
///
/// Codes are stored and compared uppercase; [`InviteCode::parse`] folds case
/// so lookups are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(try_from = "String", into = "String")]
pub struct InviteCode(String);

impl InviteCode {
    /// Draw a fresh code, each character uniform over the alphabet.
    ///
    /// Uniqueness is *not* guaranteed here; the membership service detects
    /// collisions against existing guilds and retries with a new draw.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let code = (0..INVITE_CODE_LEN)
            .map(|_| {
                let index = rng.gen_range(0..INVITE_CODE_ALPHABET.len());
                char::from(INVITE_CODE_ALPHABET[index])
            })
            .collect();
        Self(code)
    }

    /// Parse user-supplied input, folding case and validating the alphabet.
    pub fn parse(raw: &str) -> Result<Self, InviteCodeParseError> {
        let folded = raw.trim().to_uppercase();
        if folded.chars().count() != INVITE_CODE_LEN {
            return Err(InviteCodeParseError::WrongLength);
        }
        if let Some(ch) = folded
            .chars()
            .find(|c| !c.is_ascii() || !INVITE_CODE_ALPHABET.contains(&(*c as u8)))
        {
            return Err(InviteCodeParseError::UnsupportedCharacter(ch));
        }
        Ok(Self(folded))
    }

    /// Borrow the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for InviteCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<InviteCode> for String {
    fn from(value: InviteCode) -> Self {
        value.0
    }
}

impl TryFrom<String> for InviteCode {
    type Error = InviteCodeParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

/// Maximum accepted length of a guild name.
pub const GUILD_NAME_MAX: usize = 64;

/// Validation failures for [`GuildName`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuildNameValidationError {
    /// Name is empty after trimming.
    #[error("guild name must not be empty")]
    Empty,
    /// Name exceeds [`GUILD_NAME_MAX`] characters.
    #[error("guild name must be at most {GUILD_NAME_MAX} characters")]
    TooLong,
}

/// Validated, trimmed guild display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(try_from = "String", into = "String")]
pub struct GuildName(String);

impl GuildName {
    /// Trim and validate a guild name.
    pub fn parse(raw: &str) -> Result<Self, GuildNameValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(GuildNameValidationError::Empty);
        }
        if trimmed.chars().count() > GUILD_NAME_MAX {
            return Err(GuildNameValidationError::TooLong);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for GuildName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<GuildName> for String {
    fn from(value: GuildName) -> Self {
        value.0
    }
}

impl TryFrom<String> for GuildName {
    type Error = GuildNameValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

/// Role of a member within a guild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    /// The single owner; cannot leave without transferring ownership.
    Owner,
    /// A regular member.
    Member,
}

/// A guild record.
///
/// Invariants maintained by the membership service and repository:
/// `member_count` equals the live cardinality of the member set, and
/// `owner_id` always references a current member with [`MemberRole::Owner`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Guild {
    /// Guild identifier.
    pub id: GuildId,
    /// Display name.
    pub name: GuildName,
    /// The owning member's user id.
    pub owner_id: UserId,
    /// Shareable invite code; globally unique lookup key.
    pub invite_code: InviteCode,
    /// Live member count; mutated only through atomic counter updates.
    pub member_count: u32,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
}

/// A member record; at most one per (guild, user).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    /// Owning guild.
    pub guild_id: GuildId,
    /// The member's user id.
    pub user_id: UserId,
    /// Server-derived display name (identity provider, not client input).
    pub display_name: String,
    /// Role within the guild.
    pub role: MemberRole,
    /// Join instant.
    pub joined_at: DateTime<Utc>,
}

/// Order a roster for presentation: owner first, then lexicographically by
/// display name. A presentation contract, not a storage order.
pub fn roster_order(members: &mut [Member]) {
    members.sort_by(|a, b| {
        let rank = |member: &Member| match member.role {
            MemberRole::Owner => 0_u8,
            MemberRole::Member => 1,
        };
        rank(a)
            .cmp(&rank(b))
            .then_with(|| a.display_name.to_lowercase().cmp(&b.display_name.to_lowercase()))
            .then_with(|| a.display_name.cmp(&b.display_name))
    });
}
