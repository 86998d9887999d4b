use crate::database::models::UserRecord;
use anyhow::Result;
use rusqlite::{params, Connection};

pub(super) struct SqliteFollowRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

impl<'conn> super::FollowRepository for SqliteFollowRepository<'conn> {
    fn follow(&self, follower_id: &str, followed_id: &str, created_at: &str) -> Result<bool> {
        let inserted = self.conn.execute(
            r#"
            INSERT OR IGNORE INTO follows (follower_id, followed_id, created_at)
            VALUES (?1, ?2, ?3)
            "#,
            params![follower_id, followed_id, created_at],
        )?;
        Ok(inserted > 0)
    }

    fn unfollow(&self, follower_id: &str, followed_id: &str) -> Result<()> {
        self.conn.execute(
            "DELETE FROM follows WHERE follower_id = ?1 AND followed_id = ?2",
            params![follower_id, followed_id],
        )?;
        Ok(())
    }

    fn exists(&self, follower_id: &str, followed_id: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM follows WHERE follower_id = ?1 AND followed_id = ?2",
            params![follower_id, followed_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn follower_count(&self, user_id: &str) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM follows WHERE followed_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn following_count(&self, user_id: &str) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM follows WHERE follower_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn suggestions(&self, for_user: &str, limit: usize) -> Result<Vec<UserRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, username, display_name, bio, avatar_photo_id,
                   password_hash, password_salt, is_private, share_location, created_at
            FROM users
            WHERE is_private = 0
              AND id != ?1
              AND id NOT IN (SELECT followed_id FROM follows WHERE follower_id = ?1)
            ORDER BY datetime(created_at) DESC
            LIMIT ?2
            "#,
        )?;
        let rows = stmt.query_map(params![for_user, limit], |row| {
            Ok(UserRecord {
                id: row.get(0)?,
                username: row.get(1)?,
                display_name: row.get(2)?,
                bio: row.get(3)?,
                avatar_photo_id: row.get(4)?,
                password_hash: row.get(5)?,
                password_salt: row.get(6)?,
                is_private: row.get(7)?,
                share_location: row.get(8)?,
                created_at: row.get(9)?,
            })
        })?;
        let mut users = Vec::new();
        for row in rows {
            users.push(row?);
        }
        Ok(users)
    }
}
