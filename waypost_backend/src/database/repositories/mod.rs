mod challenge_completions;
mod follows;
mod locations;
mod photos;
mod posts;
mod sessions;
mod tours;
mod users;

use super::models::{
    ChallengeCompletionRecord, LocationSampleRecord, PhotoRecord, PostRecord, SessionRecord,
    TourGuideRecord, TourPackageRecord, UserRecord,
};
use anyhow::Result;
use rusqlite::Connection;

pub trait UserRepository {
    fn create(&self, record: &UserRecord) -> Result<()>;
    fn get(&self, id: &str) -> Result<Option<UserRecord>>;
    fn get_by_username(&self, username: &str) -> Result<Option<UserRecord>>;
    fn update_settings(
        &self,
        id: &str,
        display_name: Option<&str>,
        bio: Option<&str>,
        is_private: Option<bool>,
        share_location: Option<bool>,
    ) -> Result<()>;
    fn set_avatar(&self, id: &str, photo_id: &str) -> Result<()>;
}

pub trait SessionRepository {
    fn create(&self, record: &SessionRecord) -> Result<()>;
    fn user_id_for_token(&self, token: &str) -> Result<Option<String>>;
    fn delete(&self, token: &str) -> Result<()>;
}

pub trait PostRepository {
    fn create(&self, record: &PostRecord) -> Result<()>;
    fn get(&self, id: &str) -> Result<Option<PostRecord>>;
    fn list_recent(&self, limit: usize) -> Result<Vec<PostRecord>>;
    fn list_for_author(&self, author_id: &str, limit: usize) -> Result<Vec<PostRecord>>;
    fn count_for_author(&self, author_id: &str) -> Result<usize>;
}

pub trait PhotoRepository {
    fn attach(&self, record: &PhotoRecord) -> Result<()>;
    fn get(&self, id: &str) -> Result<Option<PhotoRecord>>;
    fn list_for_post(&self, post_id: &str) -> Result<Vec<PhotoRecord>>;
}

pub trait FollowRepository {
    /// Idempotent insert. Returns true when a new edge was created.
    fn follow(&self, follower_id: &str, followed_id: &str, created_at: &str) -> Result<bool>;
    fn unfollow(&self, follower_id: &str, followed_id: &str) -> Result<()>;
    fn exists(&self, follower_id: &str, followed_id: &str) -> Result<bool>;
    fn follower_count(&self, user_id: &str) -> Result<usize>;
    fn following_count(&self, user_id: &str) -> Result<usize>;
    /// Public users the caller does not yet follow, caller excluded in SQL.
    fn suggestions(&self, for_user: &str, limit: usize) -> Result<Vec<UserRecord>>;
}

pub trait LocationRepository {
    fn append(&self, record: &LocationSampleRecord) -> Result<()>;
    /// Samples of every sharing user except the caller, strictly newest
    /// first. Callers depend on this ordering for latest-per-user
    /// aggregation, so it lives in the SQL, not in Rust.
    fn friend_samples(&self, excluding_user: &str, limit: usize)
        -> Result<Vec<LocationSampleRecord>>;
}

pub trait TourRepository {
    fn list_packages(&self) -> Result<Vec<TourPackageRecord>>;
    fn list_guides(&self) -> Result<Vec<TourGuideRecord>>;
}

pub trait ChallengeCompletionRepository {
    /// Idempotent. Returns true when the completion was newly recorded.
    fn complete(&self, record: &ChallengeCompletionRecord) -> Result<bool>;
    fn completed_ids(&self, user_id: &str) -> Result<Vec<String>>;
}

pub struct SqliteRepositories<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRepositories<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn users(&self) -> impl UserRepository + '_ {
        users::SqliteUserRepository { conn: self.conn }
    }

    pub fn sessions(&self) -> impl SessionRepository + '_ {
        sessions::SqliteSessionRepository { conn: self.conn }
    }

    pub fn posts(&self) -> impl PostRepository + '_ {
        posts::SqlitePostRepository { conn: self.conn }
    }

    pub fn photos(&self) -> impl PhotoRepository + '_ {
        photos::SqlitePhotoRepository { conn: self.conn }
    }

    pub fn follows(&self) -> impl FollowRepository + '_ {
        follows::SqliteFollowRepository { conn: self.conn }
    }

    pub fn locations(&self) -> impl LocationRepository + '_ {
        locations::SqliteLocationRepository { conn: self.conn }
    }

    pub fn tours(&self) -> impl TourRepository + '_ {
        tours::SqliteTourRepository { conn: self.conn }
    }

    pub fn challenge_completions(&self) -> impl ChallengeCompletionRepository + '_ {
        challenge_completions::SqliteChallengeCompletionRepository { conn: self.conn }
    }

}
