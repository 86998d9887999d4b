use crate::database::models::ChallengeCompletionRecord;
use anyhow::Result;
use rusqlite::{params, Connection};

pub(super) struct SqliteChallengeCompletionRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

impl<'conn> super::ChallengeCompletionRepository for SqliteChallengeCompletionRepository<'conn> {
    fn complete(&self, record: &ChallengeCompletionRecord) -> Result<bool> {
        let inserted = self.conn.execute(
            r#"
            INSERT OR IGNORE INTO challenge_completions (user_id, challenge_id, completed_at)
            VALUES (?1, ?2, ?3)
            "#,
            params![record.user_id, record.challenge_id, record.completed_at],
        )?;
        Ok(inserted > 0)
    }

    fn completed_ids(&self, user_id: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT challenge_id
            FROM challenge_completions
            WHERE user_id = ?1
            ORDER BY datetime(completed_at) ASC
            "#,
        )?;
        let rows = stmt.query_map(params![user_id], |row| row.get::<_, String>(0))?;
        let mut ids = Vec::new();
        for row in rows {
            ids.push(row?);
        }
        Ok(ids)
    }
}
