//! Progress domain service.
//!
//! Progress is an overwrite, not an accumulator: whatever position the
//! reader's player last reported becomes the record, including seeks
//! backwards. Percent is always derived server-side from the catalog's
//! running time so clients cannot fabricate completion.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use super::catalog::BookCatalog;
use super::error::Error;
use super::ids::{BookId, UserId};
use super::membership_service::{map_guild_error, require_member};
use super::ports::{
    GuildRepository, ProgressCommand, ProgressPersistenceError, ProgressQuery, ProgressRepository,
    UserDirectory,
};
use super::progress::{GhostProgress, Progress};
use super::sync::{SyncHub, Topic};
use super::timeline;

/// Progress service implementing the driving ports.
#[derive(Clone)]
pub struct ProgressService<G, D, P, C> {
    guilds: Arc<G>,
    directory: Arc<D>,
    progress: Arc<P>,
    catalog: Arc<C>,
    hub: SyncHub,
}

impl<G, D, P, C> ProgressService<G, D, P, C> {
    /// Create a new service over the given adapters.
    pub fn new(
        guilds: Arc<G>,
        directory: Arc<D>,
        progress: Arc<P>,
        catalog: Arc<C>,
        hub: SyncHub,
    ) -> Self {
        Self {
            guilds,
            directory,
            progress,
            catalog,
            hub,
        }
    }
}

pub(crate) fn map_progress_error(error: ProgressPersistenceError) -> Error {
    match error {
        ProgressPersistenceError::Connection { message } => {
            Error::operation_failed(format!("progress repository unavailable: {message}"))
        }
        ProgressPersistenceError::Query { message } => {
            Error::internal(format!("progress repository error: {message}"))
        }
    }
}

fn unknown_book(book_id: &BookId) -> Error {
    Error::not_found(format!("book {book_id} is not in the catalog"))
        .with_code_detail("unknown_book")
}

#[async_trait]
impl<G, D, P, C> ProgressCommand for ProgressService<G, D, P, C>
where
    G: GuildRepository,
    D: UserDirectory,
    P: ProgressRepository,
    C: BookCatalog,
{
    async fn update_progress(
        &self,
        actor: &UserId,
        book_id: &BookId,
        position_seconds: f64,
    ) -> Result<Progress, Error> {
        let member = require_member(self.guilds.as_ref(), self.directory.as_ref(), actor).await?;
        let book = self.catalog.book(book_id).ok_or_else(|| unknown_book(book_id))?;
        if !position_seconds.is_finite() || position_seconds < 0.0 {
            return Err(
                Error::invalid_request("position must be a non-negative number of seconds")
                    .with_code_detail("invalid_position"),
            );
        }

        let record = Progress {
            guild_id: member.guild_id,
            book_id: book_id.clone(),
            user_id: *actor,
            position_seconds,
            percent: timeline::percent(position_seconds, book.total_duration_seconds()),
            last_updated_at: Utc::now(),
            is_active: true,
        };
        self.progress
            .upsert(&record)
            .await
            .map_err(map_progress_error)?;
        self.hub
            .publish(Topic::Progress(member.guild_id, book_id.clone()));
        Ok(record)
    }
}

#[async_trait]
impl<G, D, P, C> ProgressQuery for ProgressService<G, D, P, C>
where
    G: GuildRepository,
    D: UserDirectory,
    P: ProgressRepository,
    C: BookCatalog,
{
    async fn progress(&self, actor: &UserId, book_id: &BookId) -> Result<Progress, Error> {
        let member = require_member(self.guilds.as_ref(), self.directory.as_ref(), actor).await?;
        let found = self
            .progress
            .find(&member.guild_id, book_id, actor)
            .await
            .map_err(map_progress_error)?;
        Ok(found.unwrap_or_else(|| {
            Progress::never_started(member.guild_id, book_id.clone(), *actor)
        }))
    }

    async fn ghost_progress(
        &self,
        actor: &UserId,
        book_id: &BookId,
    ) -> Result<Vec<GhostProgress>, Error> {
        let member = require_member(self.guilds.as_ref(), self.directory.as_ref(), actor).await?;
        let roster = self
            .guilds
            .members(&member.guild_id)
            .await
            .map_err(map_guild_error)?;
        let rows = self
            .progress
            .for_book(&member.guild_id, book_id)
            .await
            .map_err(map_progress_error)?;

        // Departed members keep their rows but drop out of the ghost view.
        let mut ghosts: Vec<GhostProgress> = rows
            .into_iter()
            .filter(|row| row.user_id != *actor)
            .filter_map(|row| {
                roster
                    .iter()
                    .find(|m| m.user_id == row.user_id)
                    .map(|m| GhostProgress {
                        user_id: row.user_id,
                        display_name: m.display_name.clone(),
                        percent: row.percent,
                        position_seconds: row.position_seconds,
                    })
            })
            .collect();
        ghosts.sort_by(|a, b| a.percent.total_cmp(&b.percent));
        Ok(ghosts)
    }
}

#[cfg(test)]
#[path = "progress_service_tests.rs"]
mod progress_service_tests;
