use crate::database::models::UserRecord;
use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension, Row};

pub(super) struct SqliteUserRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

fn map_user(row: &Row<'_>) -> rusqlite::Result<UserRecord> {
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
}

const USER_COLUMNS: &str = "id, username, display_name, bio, avatar_photo_id, \
     password_hash, password_salt, is_private, share_location, created_at";

impl<'conn> super::UserRepository for SqliteUserRepository<'conn> {
    fn create(&self, record: &UserRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO users (id, username, display_name, bio, avatar_photo_id,
                               password_hash, password_salt, is_private, share_location, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                record.id,
                record.username,
                record.display_name,
                record.bio,
                record.avatar_photo_id,
                record.password_hash,
                record.password_salt,
                record.is_private,
                record.share_location,
                record.created_at
            ],
        )?;
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<UserRecord>> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id],
                map_user,
            )
            .optional()?)
    }

    fn get_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
                params![username],
                map_user,
            )
            .optional()?)
    }

    fn update_settings(
        &self,
        id: &str,
        display_name: Option<&str>,
        bio: Option<&str>,
        is_private: Option<bool>,
        share_location: Option<bool>,
    ) -> Result<()> {
        self.conn.execute(
            r#"
            UPDATE users SET
                display_name = COALESCE(?2, display_name),
                bio = COALESCE(?3, bio),
                is_private = COALESCE(?4, is_private),
                share_location = COALESCE(?5, share_location)
            WHERE id = ?1
            "#,
            params![id, display_name, bio, is_private, share_location],
        )?;
        Ok(())
    }

    fn set_avatar(&self, id: &str, photo_id: &str) -> Result<()> {
        self.conn.execute(
            "UPDATE users SET avatar_photo_id = ?2 WHERE id = ?1",
            params![id, photo_id],
        )?;
        Ok(())
    }
}
