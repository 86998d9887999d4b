use crate::database::models::PostRecord;
use crate::database::repositories::{PhotoRepository, PostRepository, UserRepository};
use crate::database::Database;
use crate::photos::PhotoView;
use crate::utils::now_utc_iso;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone)]
pub struct PostService {
    database: Database,
}

impl PostService {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    pub fn create_post(&self, input: CreatePostInput) -> Result<PostView> {
        if input.caption.trim().is_empty() && input.location_text.is_none() {
            anyhow::bail!("post caption may not be empty");
        }
        let record = PostRecord {
            id: Uuid::new_v4().to_string(),
            author_id: input.author_id.clone(),
            caption: input.caption,
            location_text: input.location_text,
            like_count: 0,
            comment_count: 0,
            created_at: now_utc_iso(),
        };

        let (record, author_username) = self.database.with_repositories(|repos| {
            let author = repos
                .users()
                .get(&record.author_id)?
                .ok_or_else(|| anyhow::anyhow!("author not found"))?;
            repos.posts().create(&record)?;
            Ok((record.clone(), author.username))
        })?;

        Ok(PostView::from_record(record, author_username, Vec::new()))
    }

    /// Feed listing, newest first. An optional author filter is applied in
    /// SQL rather than over the fetched rows.
    pub fn list_feed(&self, author_id: Option<&str>, limit: usize) -> Result<Vec<PostView>> {
        self.database.with_repositories(|repos| {
            let records = match author_id {
                Some(author) => repos.posts().list_for_author(author, limit)?,
                None => repos.posts().list_recent(limit)?,
            };
            let mut views = Vec::with_capacity(records.len());
            for record in records {
                let username = repos
                    .users()
                    .get(&record.author_id)?
                    .map(|u| u.username)
                    .unwrap_or_else(|| "unknown".to_string());
                let photos = repos
                    .photos()
                    .list_for_post(&record.id)?
                    .into_iter()
                    .map(PhotoView::from_record)
                    .collect();
                views.push(PostView::from_record(record, username, photos));
            }
            Ok(views)
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePostInput {
    #[serde(default)]
    pub author_id: String,
    pub caption: String,
    #[serde(default)]
    pub location_text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostView {
    pub id: String,
    pub author_id: String,
    pub author_username: String,
    pub caption: String,
    pub location_text: Option<String>,
    pub like_count: i64,
    pub comment_count: i64,
    pub created_at: String,
    pub photos: Vec<PhotoView>,
}

impl PostView {
    fn from_record(record: PostRecord, author_username: String, photos: Vec<PhotoView>) -> Self {
        Self {
            id: record.id,
            author_id: record.author_id,
            author_username,
            caption: record.caption,
            location_text: record.location_text,
            like_count: record.like_count,
            comment_count: record.comment_count,
            created_at: record.created_at,
            photos,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::UserRecord;
    use rusqlite::Connection;

    fn setup() -> (PostService, Database) {
        let conn = Connection::open_in_memory().expect("in-memory db");
        let db = Database::from_connection(conn, true);
        db.ensure_migrations().expect("migrations");
        db.with_repositories(|repos| {
            repos.users().create(&UserRecord {
                id: "user-1".into(),
                username: "amelia".into(),
                display_name: None,
                bio: None,
                avatar_photo_id: None,
                password_hash: "h".into(),
                password_salt: "s".into(),
                is_private: false,
                share_location: false,
                created_at: now_utc_iso(),
            })
        })
        .unwrap();
        (PostService::new(db.clone()), db)
    }

    #[test]
    fn create_post_appears_in_feed() {
        let (service, _db) = setup();
        let post = service
            .create_post(CreatePostInput {
                author_id: "user-1".into(),
                caption: "Night market in Taipei".into(),
                location_text: Some("Taipei".into()),
            })
            .expect("create post");
        assert_eq!(post.author_username, "amelia");
        assert_eq!(post.like_count, 0);

        let feed = service.list_feed(None, 50).expect("feed");
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].caption, "Night market in Taipei");

        let filtered = service.list_feed(Some("user-1"), 50).expect("filtered");
        assert_eq!(filtered.len(), 1);
        assert!(service.list_feed(Some("user-2"), 50).unwrap().is_empty());
    }

    #[test]
    fn empty_post_is_rejected() {
        let (service, _db) = setup();
        let err = service
            .create_post(CreatePostInput {
                author_id: "user-1".into(),
                caption: "   ".into(),
                location_text: None,
            })
            .unwrap_err();
        assert!(err.to_string().contains("may not be empty"));
    }

    #[test]
    fn unknown_author_is_rejected() {
        let (service, _db) = setup();
        let err = service
            .create_post(CreatePostInput {
                author_id: "ghost".into(),
                caption: "hi".into(),
                location_text: None,
            })
            .unwrap_err();
        assert!(err.to_string().contains("author not found"));
    }
}
