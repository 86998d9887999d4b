use crate::database::models::UserRecord;
use crate::database::repositories::{FollowRepository, PostRepository, UserRepository};
use crate::database::Database;
use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Clone)]
pub struct ProfileService {
    database: Database,
}

impl ProfileService {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    pub fn get_profile(&self, user_id: &str) -> Result<Option<ProfileView>> {
        self.database.with_repositories(|repos| {
            let Some(user) = repos.users().get(user_id)? else {
                return Ok(None);
            };
            // Counts only, no row bodies.
            let post_count = repos.posts().count_for_author(user_id)?;
            let follower_count = repos.follows().follower_count(user_id)?;
            let following_count = repos.follows().following_count(user_id)?;
            Ok(Some(ProfileView::from_record(
                user,
                post_count,
                follower_count,
                following_count,
            )))
        })
    }

    pub fn update_settings(&self, user_id: &str, input: UpdateSettingsInput) -> Result<ProfileView> {
        self.database.with_repositories(|repos| {
            repos.users().update_settings(
                user_id,
                input.display_name.as_deref(),
                input.bio.as_deref(),
                input.is_private,
                input.share_location,
            )?;
            Ok(())
        })?;
        self.get_profile(user_id)?
            .ok_or_else(|| anyhow::anyhow!("settings update lost user row"))
    }

    pub fn set_avatar(&self, user_id: &str, photo_id: &str) -> Result<()> {
        self.database
            .with_repositories(|repos| repos.users().set_avatar(user_id, photo_id))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSettingsInput {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub is_private: Option<bool>,
    #[serde(default)]
    pub share_location: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileView {
    pub id: String,
    pub username: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_photo_id: Option<String>,
    pub is_private: bool,
    pub share_location: bool,
    pub post_count: usize,
    pub follower_count: usize,
    pub following_count: usize,
}

impl ProfileView {
    fn from_record(
        record: UserRecord,
        post_count: usize,
        follower_count: usize,
        following_count: usize,
    ) -> Self {
        Self {
            id: record.id,
            username: record.username,
            display_name: record.display_name,
            bio: record.bio,
            avatar_photo_id: record.avatar_photo_id,
            is_private: record.is_private,
            share_location: record.share_location,
            post_count,
            follower_count,
            following_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthService, RegisterInput};
    use rusqlite::Connection;

    fn setup() -> (ProfileService, String) {
        let conn = Connection::open_in_memory().expect("in-memory db");
        let db = Database::from_connection(conn, true);
        db.ensure_migrations().expect("migrations");
        let session = AuthService::new(db.clone())
            .register(RegisterInput {
                username: "amelia".into(),
                password: "pw".into(),
            })
            .expect("register");
        (ProfileService::new(db), session.user_id)
    }

    #[test]
    fn settings_mutation_round_trips() {
        let (service, user_id) = setup();
        let updated = service
            .update_settings(
                &user_id,
                UpdateSettingsInput {
                    display_name: Some("Amelia W.".into()),
                    bio: Some("Chasing trains and trails".into()),
                    is_private: Some(true),
                    share_location: Some(true),
                },
            )
            .expect("update settings");
        assert_eq!(updated.display_name.as_deref(), Some("Amelia W."));
        assert!(updated.is_private);
        assert!(updated.share_location);

        // Partial updates leave the other fields alone.
        let again = service
            .update_settings(
                &user_id,
                UpdateSettingsInput {
                    is_private: Some(false),
                    ..Default::default()
                },
            )
            .expect("partial update");
        assert_eq!(again.display_name.as_deref(), Some("Amelia W."));
        assert!(!again.is_private);
        assert!(again.share_location);
    }

    #[test]
    fn missing_profile_is_none() {
        let (service, _) = setup();
        assert!(service.get_profile("ghost").unwrap().is_none());
    }
}
