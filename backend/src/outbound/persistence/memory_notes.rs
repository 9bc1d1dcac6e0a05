//! In-memory note repository.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::domain::ids::{BookId, GuildId, NoteId};
use crate::domain::note::Note;
use crate::domain::ports::{NotePersistenceError, NoteRepository};

/// [`NoteRepository`] backed by process memory. All lookups are scoped to a
/// guild so one guild's notes can never leak into another's timeline.
#[derive(Debug, Default)]
pub struct InMemoryNoteRepository {
    rows: Mutex<HashMap<NoteId, Note>>,
}

impl InMemoryNoteRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<NoteId, Note>> {
        self.rows.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl NoteRepository for InMemoryNoteRepository {
    async fn insert(&self, note: &Note) -> Result<(), NotePersistenceError> {
        self.lock().insert(note.id, note.clone());
        Ok(())
    }

    async fn find(
        &self,
        guild_id: &GuildId,
        note_id: &NoteId,
    ) -> Result<Option<Note>, NotePersistenceError> {
        Ok(self
            .lock()
            .get(note_id)
            .filter(|note| note.guild_id == *guild_id)
            .cloned())
    }

    async fn delete(
        &self,
        guild_id: &GuildId,
        note_id: &NoteId,
    ) -> Result<(), NotePersistenceError> {
        let mut rows = self.lock();
        match rows.get(note_id) {
            Some(note) if note.guild_id == *guild_id => {
                rows.remove(note_id);
                Ok(())
            }
            _ => Err(NotePersistenceError::NoteNotFound { note_id: *note_id }),
        }
    }

    async fn for_book(
        &self,
        guild_id: &GuildId,
        book_id: &BookId,
    ) -> Result<Vec<Note>, NotePersistenceError> {
        Ok(self
            .lock()
            .values()
            .filter(|note| note.guild_id == *guild_id && note.book_id == *book_id)
            .cloned()
            .collect())
    }
}
