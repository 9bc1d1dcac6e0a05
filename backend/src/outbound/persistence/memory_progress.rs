//! In-memory progress repository.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::domain::ids::{BookId, GuildId, UserId};
use crate::domain::ports::{ProgressPersistenceError, ProgressRepository};
use crate::domain::progress::Progress;

type Key = (GuildId, BookId, UserId);

/// [`ProgressRepository`] backed by process memory. Upserts replace the
/// whole record, so the latest accepted write wins.
#[derive(Debug, Default)]
pub struct InMemoryProgressRepository {
    rows: Mutex<HashMap<Key, Progress>>,
}

impl InMemoryProgressRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Key, Progress>> {
        self.rows.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ProgressRepository for InMemoryProgressRepository {
    async fn upsert(&self, progress: &Progress) -> Result<(), ProgressPersistenceError> {
        let key = (
            progress.guild_id,
            progress.book_id.clone(),
            progress.user_id,
        );
        self.lock().insert(key, progress.clone());
        Ok(())
    }

    async fn find(
        &self,
        guild_id: &GuildId,
        book_id: &BookId,
        user_id: &UserId,
    ) -> Result<Option<Progress>, ProgressPersistenceError> {
        let key = (*guild_id, book_id.clone(), *user_id);
        Ok(self.lock().get(&key).cloned())
    }

    async fn for_book(
        &self,
        guild_id: &GuildId,
        book_id: &BookId,
    ) -> Result<Vec<Progress>, ProgressPersistenceError> {
        Ok(self
            .lock()
            .values()
            .filter(|row| row.guild_id == *guild_id && row.book_id == *book_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rstest::rstest;

    use super::*;

    fn record(guild: GuildId, book: &BookId, user: UserId, position: f64) -> Progress {
        Progress {
            guild_id: guild,
            book_id: book.clone(),
            user_id: user,
            position_seconds: position,
            percent: position / 10.0,
            last_updated_at: Utc::now(),
            is_active: true,
        }
    }

    #[rstest]
    #[actix_rt::test]
    async fn upsert_replaces_the_record() {
        let repo = InMemoryProgressRepository::new();
        let guild = GuildId::random();
        let book = BookId::new("book_abc").expect("book id");
        let user = UserId::random();

        repo.upsert(&record(guild, &book, user, 100.0)).await.expect("first");
        repo.upsert(&record(guild, &book, user, 50.0)).await.expect("second");

        let found = repo
            .find(&guild, &book, &user)
            .await
            .expect("find")
            .expect("present");
        assert!((found.position_seconds - 50.0).abs() < f64::EPSILON);
    }

    #[rstest]
    #[actix_rt::test]
    async fn for_book_scopes_by_guild_and_book() {
        let repo = InMemoryProgressRepository::new();
        let guild = GuildId::random();
        let other_guild = GuildId::random();
        let book = BookId::new("book_abc").expect("book id");
        let other_book = BookId::new("book_def").expect("book id");

        repo.upsert(&record(guild, &book, UserId::random(), 10.0))
            .await
            .expect("row");
        repo.upsert(&record(guild, &other_book, UserId::random(), 20.0))
            .await
            .expect("row");
        repo.upsert(&record(other_guild, &book, UserId::random(), 30.0))
            .await
            .expect("row");

        let rows = repo.for_book(&guild, &book).await.expect("rows");
        assert_eq!(rows.len(), 1);
    }
}
