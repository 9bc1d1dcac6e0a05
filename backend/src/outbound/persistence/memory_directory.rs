//! In-memory identity directory.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::domain::ids::{GuildId, UserId};
use crate::domain::ports::{DirectoryError, UserDirectory, UserProfile};

#[derive(Debug, Default)]
struct DirectoryTables {
    profiles: HashMap<UserId, UserProfile>,
    /// Folded email to user id.
    by_email: HashMap<String, UserId>,
}

/// [`UserDirectory`] backed by process memory.
///
/// Profiles are created on first sign-in; the display name is derived from
/// the email local part and never taken from client input.
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    tables: Mutex<DirectoryTables>,
}

impl InMemoryUserDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, DirectoryTables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn normalize_email(raw: &str) -> Result<(String, String), DirectoryError> {
    let email = raw.trim().to_lowercase();
    let Some((local, domain)) = email.split_once('@') else {
        return Err(DirectoryError::InvalidEmail {
            message: "email must contain an @".into(),
        });
    };
    if local.is_empty() || domain.is_empty() {
        return Err(DirectoryError::InvalidEmail {
            message: "email must have a local part and a domain".into(),
        });
    }
    Ok((email.clone(), local.to_owned()))
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn authenticate(&self, email: &str) -> Result<UserProfile, DirectoryError> {
        let (email, display_name) = normalize_email(email)?;
        let mut tables = self.lock();
        if let Some(existing) = tables
            .by_email
            .get(&email)
            .and_then(|id| tables.profiles.get(id))
        {
            return Ok(existing.clone());
        }
        let profile = UserProfile {
            user_id: UserId::random(),
            email: email.clone(),
            display_name,
            current_guild: None,
        };
        tables.by_email.insert(email, profile.user_id);
        tables.profiles.insert(profile.user_id, profile.clone());
        Ok(profile)
    }

    async fn profile(&self, user_id: &UserId) -> Result<Option<UserProfile>, DirectoryError> {
        Ok(self.lock().profiles.get(user_id).cloned())
    }

    async fn set_current_guild(
        &self,
        user_id: &UserId,
        guild: Option<GuildId>,
    ) -> Result<(), DirectoryError> {
        let mut tables = self.lock();
        let Some(profile) = tables.profiles.get_mut(user_id) else {
            return Err(DirectoryError::query(format!("unknown user {user_id}")));
        };
        profile.current_guild = guild;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[actix_rt::test]
    async fn first_sign_in_creates_a_profile_with_local_part_name() {
        let directory = InMemoryUserDirectory::new();
        let profile = directory
            .authenticate("Maya.Reads@example.com")
            .await
            .expect("authenticate");
        assert_eq!(profile.email, "maya.reads@example.com");
        assert_eq!(profile.display_name, "maya.reads");
        assert!(profile.current_guild.is_none());
    }

    #[rstest]
    #[actix_rt::test]
    async fn repeat_sign_in_is_stable() {
        let directory = InMemoryUserDirectory::new();
        let first = directory.authenticate("ana@example.com").await.expect("first");
        let second = directory
            .authenticate("  ANA@EXAMPLE.COM ")
            .await
            .expect("second");
        assert_eq!(first.user_id, second.user_id);
    }

    #[rstest]
    #[case::missing_at("readers.example.com")]
    #[case::empty_local("@example.com")]
    #[case::empty_domain("ana@")]
    #[actix_rt::test]
    async fn malformed_emails_are_rejected(#[case] email: &str) {
        let directory = InMemoryUserDirectory::new();
        let err = directory.authenticate(email).await.expect_err("rejected");
        assert!(matches!(err, DirectoryError::InvalidEmail { .. }));
    }
}
