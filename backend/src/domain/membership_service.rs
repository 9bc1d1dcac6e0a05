//! Membership domain service.
//!
//! Implements the guild lifecycle driving ports. Guild creation is a
//! four-part unit of work (guild record, owner member, seeded counter,
//! profile pointer): the repository applies the first three atomically and
//! this service compensates and retries the *whole* operation when the
//! pointer write fails, so a guild is never visible without its owner.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, error, warn};

use super::error::Error;
use super::guild::{Guild, GuildName, InviteCode, Member, MemberRole, roster_order};
use super::ids::{GuildId, UserId};
use super::ports::{
    DirectoryError, GuildOverview, GuildPersistenceError, GuildRepository, InvitePreview,
    MembershipCommand, MembershipQuery, UserDirectory, UserProfile,
};
use super::sync::{SyncHub, Topic};

/// Attempts for the whole create/join unit of work, covering both invite
/// code collisions and pointer-write failures.
const UNIT_OF_WORK_ATTEMPTS: usize = 3;

/// Membership service implementing the driving ports.
#[derive(Clone)]
pub struct MembershipService<G, D> {
    guilds: Arc<G>,
    directory: Arc<D>,
    hub: SyncHub,
}

impl<G, D> MembershipService<G, D> {
    /// Create a new service over the given adapters.
    pub fn new(guilds: Arc<G>, directory: Arc<D>, hub: SyncHub) -> Self {
        Self {
            guilds,
            directory,
            hub,
        }
    }
}

/// Map directory adapter failures into domain errors.
pub(crate) fn map_directory_error(error: DirectoryError) -> Error {
    match error {
        DirectoryError::Connection { message } => {
            Error::operation_failed(format!("user directory unavailable: {message}"))
        }
        DirectoryError::Query { message } => {
            Error::internal(format!("user directory error: {message}"))
        }
        DirectoryError::InvalidEmail { message } => {
            Error::invalid_request(message).with_code_detail("email_invalid")
        }
    }
}

/// Map guild repository failures into domain errors.
///
/// Variants with operation-specific meaning (`InviteCodeTaken`,
/// `AlreadyMember`) are handled at their call sites; reaching this mapping
/// with one of them indicates an adapter contract violation.
pub(crate) fn map_guild_error(error: GuildPersistenceError) -> Error {
    match error {
        GuildPersistenceError::Connection { message } => {
            Error::operation_failed(format!("guild repository unavailable: {message}"))
        }
        other => Error::internal(format!("guild repository error: {other}")),
    }
}

/// Resolve the actor's profile or fail with `Unauthorized`.
pub(crate) async fn require_profile<D: UserDirectory>(
    directory: &D,
    actor: &UserId,
) -> Result<UserProfile, Error> {
    directory
        .profile(actor)
        .await
        .map_err(map_directory_error)?
        .ok_or_else(|| Error::unauthorized("unknown user"))
}

/// Resolve the actor's current member record or fail with `NotMember`.
///
/// Used by the progress and note services, whose every operation requires
/// current membership.
pub(crate) async fn require_member<G: GuildRepository, D: UserDirectory>(
    guilds: &G,
    directory: &D,
    actor: &UserId,
) -> Result<Member, Error> {
    let profile = require_profile(directory, actor).await?;
    let Some(guild_id) = profile.current_guild else {
        return Err(not_member());
    };
    guilds
        .member(&guild_id, actor)
        .await
        .map_err(map_guild_error)?
        .ok_or_else(not_member)
}

fn not_member() -> Error {
    Error::forbidden("guild membership required").with_code_detail("not_member")
}

fn invite_code_invalid() -> Error {
    // Lookup errors disclose nothing about why the code failed.
    Error::not_found("invite code does not match any guild").with_code_detail("invite_code_invalid")
}

#[async_trait]
impl<G, D> MembershipCommand for MembershipService<G, D>
where
    G: GuildRepository,
    D: UserDirectory,
{
    async fn create_guild(&self, actor: &UserId, name: &str) -> Result<Guild, Error> {
        let profile = require_profile(self.directory.as_ref(), actor).await?;
        if profile.current_guild.is_some() {
            return Err(
                Error::conflict("already a member of a guild").with_code_detail("already_in_guild")
            );
        }
        let name = GuildName::parse(name)
            .map_err(|err| Error::invalid_request(err.to_string()).with_code_detail("guild_name_invalid"))?;

        for attempt in 1..=UNIT_OF_WORK_ATTEMPTS {
            let invite_code = InviteCode::generate(&mut rand::thread_rng());
            let now = Utc::now();
            let guild = Guild {
                id: GuildId::random(),
                name: name.clone(),
                owner_id: *actor,
                invite_code,
                member_count: 1,
                created_at: now,
            };
            let owner = Member {
                guild_id: guild.id,
                user_id: *actor,
                display_name: profile.display_name.clone(),
                role: MemberRole::Owner,
                joined_at: now,
            };

            match self.guilds.create_guild(&guild, &owner).await {
                Ok(()) => {}
                Err(GuildPersistenceError::InviteCodeTaken { code }) => {
                    debug!(attempt, code = %code, "invite code collision, retrying with a fresh draw");
                    continue;
                }
                Err(err) => return Err(map_guild_error(err)),
            }

            match self
                .directory
                .set_current_guild(actor, Some(guild.id))
                .await
            {
                Ok(()) => {
                    self.hub.publish(Topic::Roster(guild.id));
                    return Ok(guild);
                }
                Err(err) => {
                    // The guild must not remain visible without the
                    // pointer; roll back and retry the whole unit of work.
                    warn!(attempt, error = %err, guild_id = %guild.id, "profile pointer write failed, rolling back guild");
                    if let Err(cleanup) = self.guilds.delete_guild(&guild.id).await {
                        error!(error = %cleanup, guild_id = %guild.id, "rollback of partially created guild failed");
                    }
                }
            }
        }

        Err(Error::operation_failed("could not create guild").with_code_detail("create_guild_failed"))
    }

    async fn join_guild(&self, actor: &UserId, invite_code: &str) -> Result<Guild, Error> {
        let profile = require_profile(self.directory.as_ref(), actor).await?;
        let code = InviteCode::parse(invite_code).map_err(|_| invite_code_invalid())?;
        let guild = self
            .guilds
            .find_by_invite_code(&code)
            .await
            .map_err(map_guild_error)?
            .ok_or_else(invite_code_invalid)?;

        if self
            .guilds
            .member(&guild.id, actor)
            .await
            .map_err(map_guild_error)?
            .is_some()
        {
            return Err(
                Error::conflict("already a member of this guild").with_code_detail("already_member")
            );
        }
        if profile.current_guild.is_some() {
            return Err(Error::conflict("already a member of another guild")
                .with_code_detail("already_in_guild"));
        }

        let member = Member {
            guild_id: guild.id,
            user_id: *actor,
            display_name: profile.display_name.clone(),
            role: MemberRole::Member,
            joined_at: Utc::now(),
        };
        match self.guilds.add_member(&member).await {
            Ok(()) => {}
            Err(GuildPersistenceError::AlreadyMember { .. }) => {
                // Lost a race against ourselves (double-submit).
                return Err(Error::conflict("already a member of this guild")
                    .with_code_detail("already_member"));
            }
            Err(err) => return Err(map_guild_error(err)),
        }

        if let Err(err) = self
            .directory
            .set_current_guild(actor, Some(guild.id))
            .await
        {
            warn!(error = %err, guild_id = %guild.id, "profile pointer write failed, rolling back join");
            if let Err(cleanup) = self.guilds.remove_member(&guild.id, actor).await {
                error!(error = %cleanup, guild_id = %guild.id, "rollback of membership failed");
            }
            return Err(Error::operation_failed("could not join guild")
                .with_code_detail("join_guild_failed"));
        }

        self.hub.publish(Topic::Roster(guild.id));

        // Re-read for a fresh member count; fall back to the prior record
        // when the read fails.
        Ok(self
            .guilds
            .find_by_id(&guild.id)
            .await
            .ok()
            .flatten()
            .unwrap_or(guild))
    }

    async fn leave_guild(&self, actor: &UserId) -> Result<(), Error> {
        let profile = require_profile(self.directory.as_ref(), actor).await?;
        let Some(guild_id) = profile.current_guild else {
            return Err(Error::conflict("not currently in a guild").with_code_detail("not_in_guild"));
        };

        let member = self
            .guilds
            .member(&guild_id, actor)
            .await
            .map_err(map_guild_error)?;
        let Some(member) = member else {
            // Dangling pointer with no member record; repair the profile.
            warn!(guild_id = %guild_id, user_id = %actor, "profile pointed at a guild without a member record");
            self.directory
                .set_current_guild(actor, None)
                .await
                .map_err(map_directory_error)?;
            return Ok(());
        };
        if member.role == MemberRole::Owner {
            return Err(Error::forbidden("owners must transfer ownership before leaving")
                .with_code_detail("owner_cannot_leave"));
        }

        match self.guilds.remove_member(&guild_id, actor).await {
            Ok(()) | Err(GuildPersistenceError::MemberNotFound { .. }) => {}
            Err(err) => return Err(map_guild_error(err)),
        }

        if let Err(err) = self.directory.set_current_guild(actor, None).await {
            // Keep the invariant: restore the membership and fail the whole
            // operation rather than leaving a half-applied leave.
            warn!(error = %err, guild_id = %guild_id, "profile pointer clear failed, restoring membership");
            if let Err(cleanup) = self.guilds.add_member(&member).await {
                error!(error = %cleanup, guild_id = %guild_id, "rollback of leave failed");
            }
            return Err(Error::operation_failed("could not leave guild")
                .with_code_detail("leave_guild_failed"));
        }

        self.hub.publish(Topic::Roster(guild_id));
        Ok(())
    }
}

#[async_trait]
impl<G, D> MembershipQuery for MembershipService<G, D>
where
    G: GuildRepository,
    D: UserDirectory,
{
    async fn overview(&self, actor: &UserId) -> Result<GuildOverview, Error> {
        let profile = require_profile(self.directory.as_ref(), actor).await?;
        let Some(guild_id) = profile.current_guild else {
            return Err(Error::not_found("not currently in a guild")
                .with_code_detail("guild_not_found"));
        };
        let guild = self
            .guilds
            .find_by_id(&guild_id)
            .await
            .map_err(map_guild_error)?
            .ok_or_else(|| {
                Error::not_found("not currently in a guild").with_code_detail("guild_not_found")
            })?;
        let mut members = self
            .guilds
            .members(&guild_id)
            .await
            .map_err(map_guild_error)?;
        roster_order(&mut members);
        Ok(GuildOverview { guild, members })
    }

    async fn invite_preview(&self, code: &str) -> Result<InvitePreview, Error> {
        let code = InviteCode::parse(code).map_err(|_| invite_code_invalid())?;
        let guild = self
            .guilds
            .find_by_invite_code(&code)
            .await
            .map_err(map_guild_error)?
            .ok_or_else(invite_code_invalid)?;
        Ok(InvitePreview {
            guild_name: guild.name.to_string(),
            member_count: guild.member_count,
            invite_code: guild.invite_code,
        })
    }
}

#[cfg(test)]
#[path = "membership_service_tests.rs"]
mod membership_service_tests;
