//! In-memory guild repository.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::domain::guild::{Guild, InviteCode, Member};
use crate::domain::ids::{GuildId, UserId};
use crate::domain::ports::{GuildPersistenceError, GuildRepository};

#[derive(Debug, Default)]
struct GuildTables {
    guilds: HashMap<GuildId, Guild>,
    /// Canonical (folded) invite code to guild id.
    codes: HashMap<String, GuildId>,
    /// Rosters in insertion order.
    members: HashMap<GuildId, Vec<Member>>,
}

/// [`GuildRepository`] backed by process memory.
#[derive(Debug, Default)]
pub struct InMemoryGuildRepository {
    tables: Mutex<GuildTables>,
}

impl InMemoryGuildRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, GuildTables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of guilds currently stored.
    pub fn guild_count(&self) -> usize {
        self.lock().guilds.len()
    }
}

#[async_trait]
impl GuildRepository for InMemoryGuildRepository {
    async fn create_guild(
        &self,
        guild: &Guild,
        owner: &Member,
    ) -> Result<(), GuildPersistenceError> {
        let mut tables = self.lock();
        let code = guild.invite_code.as_str().to_owned();
        if tables.codes.contains_key(&code) {
            return Err(GuildPersistenceError::InviteCodeTaken { code });
        }
        let mut stored = guild.clone();
        stored.member_count = 1;
        tables.codes.insert(code, guild.id);
        tables.members.insert(guild.id, vec![owner.clone()]);
        tables.guilds.insert(guild.id, stored);
        Ok(())
    }

    async fn delete_guild(&self, guild_id: &GuildId) -> Result<(), GuildPersistenceError> {
        let mut tables = self.lock();
        let Some(guild) = tables.guilds.remove(guild_id) else {
            return Err(GuildPersistenceError::GuildNotFound {
                guild_id: *guild_id,
            });
        };
        tables.codes.remove(guild.invite_code.as_str());
        tables.members.remove(guild_id);
        Ok(())
    }

    async fn find_by_id(
        &self,
        guild_id: &GuildId,
    ) -> Result<Option<Guild>, GuildPersistenceError> {
        Ok(self.lock().guilds.get(guild_id).cloned())
    }

    async fn find_by_invite_code(
        &self,
        code: &InviteCode,
    ) -> Result<Option<Guild>, GuildPersistenceError> {
        let tables = self.lock();
        Ok(tables
            .codes
            .get(code.as_str())
            .and_then(|id| tables.guilds.get(id))
            .cloned())
    }

    async fn member(
        &self,
        guild_id: &GuildId,
        user_id: &UserId,
    ) -> Result<Option<Member>, GuildPersistenceError> {
        Ok(self
            .lock()
            .members
            .get(guild_id)
            .and_then(|roster| roster.iter().find(|m| m.user_id == *user_id))
            .cloned())
    }

    async fn members(&self, guild_id: &GuildId) -> Result<Vec<Member>, GuildPersistenceError> {
        Ok(self.lock().members.get(guild_id).cloned().unwrap_or_default())
    }

    async fn add_member(&self, member: &Member) -> Result<(), GuildPersistenceError> {
        let mut tables = self.lock();
        if !tables.guilds.contains_key(&member.guild_id) {
            return Err(GuildPersistenceError::GuildNotFound {
                guild_id: member.guild_id,
            });
        }
        let roster = tables.members.entry(member.guild_id).or_default();
        if roster.iter().any(|m| m.user_id == member.user_id) {
            return Err(GuildPersistenceError::AlreadyMember {
                guild_id: member.guild_id,
                user_id: member.user_id,
            });
        }
        roster.push(member.clone());
        if let Some(guild) = tables.guilds.get_mut(&member.guild_id) {
            guild.member_count = guild.member_count.saturating_add(1);
        }
        Ok(())
    }

    async fn remove_member(
        &self,
        guild_id: &GuildId,
        user_id: &UserId,
    ) -> Result<(), GuildPersistenceError> {
        let mut tables = self.lock();
        let Some(roster) = tables.members.get_mut(guild_id) else {
            return Err(GuildPersistenceError::GuildNotFound {
                guild_id: *guild_id,
            });
        };
        let Some(index) = roster.iter().position(|m| m.user_id == *user_id) else {
            return Err(GuildPersistenceError::MemberNotFound {
                guild_id: *guild_id,
                user_id: *user_id,
            });
        };
        roster.remove(index);
        if let Some(guild) = tables.guilds.get_mut(guild_id) {
            guild.member_count = guild.member_count.saturating_sub(1);
        }
        Ok(())
    }
}
