use crate::database::models::SessionRecord;
use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};

pub(super) struct SqliteSessionRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

impl<'conn> super::SessionRepository for SqliteSessionRepository<'conn> {
    fn create(&self, record: &SessionRecord) -> Result<()> {
        self.conn.execute(
            "INSERT INTO sessions (token, user_id, created_at) VALUES (?1, ?2, ?3)",
            params![record.token, record.user_id, record.created_at],
        )?;
        Ok(())
    }

    fn user_id_for_token(&self, token: &str) -> Result<Option<String>> {
        Ok(self
            .conn
            .query_row(
                "SELECT user_id FROM sessions WHERE token = ?1",
                params![token],
                |row| row.get(0),
            )
            .optional()?)
    }

    fn delete(&self, token: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
        Ok(())
    }
}
