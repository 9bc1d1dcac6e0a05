//! Note domain service.
//!
//! The spoiler gate lives here and nowhere closer to the client: a note is
//! visible to a requester only when the requester wrote it or has listened
//! at least up to its position. Gated notes surface as a count so readers
//! know conversation is waiting ahead without learning what it says.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use super::error::Error;
use super::ids::{BookId, NoteId, UserId};
use super::membership_service::{require_member, require_profile};
use super::note::{NOTE_MAX_CHARS, Note, NoteTimeline, timeline_order};
use super::ports::{
    GuildRepository, NoteCommand, NotePersistenceError, NoteQuery, NoteRepository,
    ProgressRepository, UserDirectory,
};
use super::progress_service::map_progress_error;
use super::sync::{SyncHub, Topic};

/// Note service implementing the driving ports.
#[derive(Clone)]
pub struct NoteService<G, D, N, P> {
    guilds: Arc<G>,
    directory: Arc<D>,
    notes: Arc<N>,
    progress: Arc<P>,
    hub: SyncHub,
}

impl<G, D, N, P> NoteService<G, D, N, P> {
    /// Create a new service over the given adapters.
    pub fn new(
        guilds: Arc<G>,
        directory: Arc<D>,
        notes: Arc<N>,
        progress: Arc<P>,
        hub: SyncHub,
    ) -> Self {
        Self {
            guilds,
            directory,
            notes,
            progress,
            hub,
        }
    }
}

fn note_not_found() -> Error {
    Error::not_found("note not found").with_code_detail("note_not_found")
}

fn map_note_error(error: NotePersistenceError) -> Error {
    match error {
        NotePersistenceError::Connection { message } => {
            Error::operation_failed(format!("note repository unavailable: {message}"))
        }
        NotePersistenceError::Query { message } => {
            Error::internal(format!("note repository error: {message}"))
        }
        NotePersistenceError::NoteNotFound { .. } => note_not_found(),
    }
}

#[async_trait]
impl<G, D, N, P> NoteCommand for NoteService<G, D, N, P>
where
    G: GuildRepository,
    D: UserDirectory,
    N: NoteRepository,
    P: ProgressRepository,
{
    async fn post_note(
        &self,
        actor: &UserId,
        book_id: &BookId,
        text: &str,
        position_seconds: f64,
    ) -> Result<Note, Error> {
        let member = require_member(self.guilds.as_ref(), self.directory.as_ref(), actor).await?;

        let text = text.trim();
        if text.is_empty() {
            return Err(Error::invalid_request("note text must not be empty")
                .with_code_detail("empty_note"));
        }
        // Limit counts Unicode scalar values, not bytes.
        if text.chars().count() > NOTE_MAX_CHARS {
            return Err(Error::invalid_request(format!(
                "note text must be at most {NOTE_MAX_CHARS} characters"
            ))
            .with_code_detail("note_too_long"));
        }
        if !position_seconds.is_finite() || position_seconds < 0.0 {
            return Err(
                Error::invalid_request("position must be a non-negative number of seconds")
                    .with_code_detail("invalid_position"),
            );
        }

        let note = Note {
            id: NoteId::random(),
            guild_id: member.guild_id,
            book_id: book_id.clone(),
            author_id: *actor,
            author_display_name: member.display_name,
            position_seconds,
            text: text.to_owned(),
            created_at: Utc::now(),
        };
        self.notes.insert(&note).await.map_err(map_note_error)?;
        self.hub
            .publish(Topic::Notes(member.guild_id, book_id.clone()));
        Ok(note)
    }

    async fn delete_note(&self, actor: &UserId, note_id: &NoteId) -> Result<(), Error> {
        let profile = require_profile(self.directory.as_ref(), actor).await?;
        // Outside a guild there is no note the actor could own; report the
        // same not-found as a genuinely missing note.
        let guild_id = profile.current_guild.ok_or_else(note_not_found)?;

        let note = self
            .notes
            .find(&guild_id, note_id)
            .await
            .map_err(map_note_error)?
            .ok_or_else(note_not_found)?;
        if note.author_id != *actor {
            return Err(Error::forbidden("only the author may delete a note")
                .with_code_detail("not_author"));
        }

        self.notes
            .delete(&guild_id, note_id)
            .await
            .map_err(map_note_error)?;
        self.hub.publish(Topic::Notes(guild_id, note.book_id));
        Ok(())
    }
}

#[async_trait]
impl<G, D, N, P> NoteQuery for NoteService<G, D, N, P>
where
    G: GuildRepository,
    D: UserDirectory,
    N: NoteRepository,
    P: ProgressRepository,
{
    async fn timeline(&self, actor: &UserId, book_id: &BookId) -> Result<NoteTimeline, Error> {
        let member = require_member(self.guilds.as_ref(), self.directory.as_ref(), actor).await?;
        // The gate reads the requester's position at call time, so a
        // just-written progress update immediately widens the view.
        let gate_position = self
            .progress
            .find(&member.guild_id, book_id, actor)
            .await
            .map_err(map_progress_error)?
            .map_or(0.0, |row| row.position_seconds);

        let mut all = self
            .notes
            .for_book(&member.guild_id, book_id)
            .await
            .map_err(map_note_error)?;
        timeline_order(&mut all);

        let mut visible = Vec::new();
        let mut hidden_count = 0_usize;
        for note in all {
            if note.author_id == *actor || note.position_seconds <= gate_position {
                visible.push(note);
            } else {
                hidden_count += 1;
            }
        }
        Ok(NoteTimeline {
            visible,
            hidden_count,
        })
    }
}

#[cfg(test)]
#[path = "note_service_tests.rs"]
mod note_service_tests;
