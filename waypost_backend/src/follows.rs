use crate::database::repositories::{FollowRepository, UserRepository};
use crate::database::Database;
use crate::utils::now_utc_iso;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FollowError {
    #[error("cannot follow yourself")]
    SelfFollow,
    #[error("user not found")]
    UnknownUser,
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

#[derive(Clone)]
pub struct FollowService {
    database: Database,
}

impl FollowService {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    /// Idempotent: a repeated follow of the same user leaves exactly one
    /// edge in place.
    pub fn follow(&self, follower_id: &str, followed_id: &str) -> Result<(), FollowError> {
        if follower_id == followed_id {
            return Err(FollowError::SelfFollow);
        }
        let created = self.database.with_repositories(|repos| {
            if repos.users().get(followed_id)?.is_none() {
                return Ok(None);
            }
            let created = repos
                .follows()
                .follow(follower_id, followed_id, &now_utc_iso())?;
            Ok(Some(created))
        })?;
        match created {
            None => Err(FollowError::UnknownUser),
            Some(true) => {
                tracing::info!(follower = %follower_id, followed = %followed_id, "follow edge created");
                Ok(())
            }
            Some(false) => Ok(()),
        }
    }

    pub fn unfollow(&self, follower_id: &str, followed_id: &str) -> Result<()> {
        self.database
            .with_repositories(|repos| repos.follows().unfollow(follower_id, followed_id))
    }

    pub fn is_following(&self, follower_id: &str, followed_id: &str) -> Result<bool> {
        self.database
            .with_repositories(|repos| repos.follows().exists(follower_id, followed_id))
    }

    pub fn counts(&self, user_id: &str) -> Result<FollowCounts> {
        self.database.with_repositories(|repos| {
            Ok(FollowCounts {
                followers: repos.follows().follower_count(user_id)?,
                following: repos.follows().following_count(user_id)?,
            })
        })
    }

    pub fn suggestions(&self, for_user: &str, limit: usize) -> Result<Vec<SuggestedUserView>> {
        self.database.with_repositories(|repos| {
            let users = repos.follows().suggestions(for_user, limit)?;
            Ok(users
                .into_iter()
                .map(|u| SuggestedUserView {
                    id: u.id,
                    username: u.username,
                    display_name: u.display_name,
                    avatar_photo_id: u.avatar_photo_id,
                })
                .collect())
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowCounts {
    pub followers: usize,
    pub following: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestedUserView {
    pub id: String,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_photo_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthService, RegisterInput};
    use rusqlite::Connection;

    fn setup() -> (FollowService, String, String) {
        let conn = Connection::open_in_memory().expect("in-memory db");
        let db = Database::from_connection(conn, true);
        db.ensure_migrations().expect("migrations");
        let auth = AuthService::new(db.clone());
        let a = auth
            .register(RegisterInput {
                username: "amelia".into(),
                password: "pw".into(),
            })
            .unwrap();
        let b = auth
            .register(RegisterInput {
                username: "bruno".into(),
                password: "pw".into(),
            })
            .unwrap();
        (FollowService::new(db), a.user_id, b.user_id)
    }

    #[test]
    fn follow_then_unfollow_restores_prior_state() {
        let (service, a, b) = setup();
        service.follow(&a, &b).expect("follow");
        assert!(service.is_following(&a, &b).unwrap());
        assert_eq!(service.counts(&b).unwrap().followers, 1);

        service.unfollow(&a, &b).expect("unfollow");
        assert!(!service.is_following(&a, &b).unwrap());
        assert_eq!(service.counts(&b).unwrap().followers, 0);
    }

    #[test]
    fn double_follow_keeps_one_edge() {
        let (service, a, b) = setup();
        service.follow(&a, &b).unwrap();
        service.follow(&a, &b).unwrap();
        assert_eq!(service.counts(&b).unwrap().followers, 1);
    }

    #[test]
    fn self_follow_is_rejected() {
        let (service, a, _) = setup();
        let err = service.follow(&a, &a).unwrap_err();
        assert!(matches!(err, FollowError::SelfFollow));
    }

    #[test]
    fn following_unknown_user_fails() {
        let (service, a, _) = setup();
        let err = service.follow(&a, "ghost").unwrap_err();
        assert!(matches!(err, FollowError::UnknownUser));
    }
}
