use crate::database::models::PostRecord;
use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension, Row};

pub(super) struct SqlitePostRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

fn map_post(row: &Row<'_>) -> rusqlite::Result<PostRecord> {
    Ok(PostRecord {
        id: row.get(0)?,
        author_id: row.get(1)?,
        caption: row.get(2)?,
        location_text: row.get(3)?,
        like_count: row.get(4)?,
        comment_count: row.get(5)?,
        created_at: row.get(6)?,
    })
}

const POST_COLUMNS: &str =
    "id, author_id, caption, location_text, like_count, comment_count, created_at";

impl<'conn> super::PostRepository for SqlitePostRepository<'conn> {
    fn create(&self, record: &PostRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO posts (id, author_id, caption, location_text, like_count, comment_count, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                record.id,
                record.author_id,
                record.caption,
                record.location_text,
                record.like_count,
                record.comment_count,
                record.created_at
            ],
        )?;
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<PostRecord>> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?1"),
                params![id],
                map_post,
            )
            .optional()?)
    }

    fn list_recent(&self, limit: usize) -> Result<Vec<PostRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts
            ORDER BY datetime(created_at) DESC
            LIMIT ?1
            "#
        ))?;
        let rows = stmt.query_map(params![limit], map_post)?;
        let mut posts = Vec::new();
        for row in rows {
            posts.push(row?);
        }
        Ok(posts)
    }

    fn list_for_author(&self, author_id: &str, limit: usize) -> Result<Vec<PostRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts
            WHERE author_id = ?1
            ORDER BY datetime(created_at) DESC
            LIMIT ?2
            "#
        ))?;
        let rows = stmt.query_map(params![author_id, limit], map_post)?;
        let mut posts = Vec::new();
        for row in rows {
            posts.push(row?);
        }
        Ok(posts)
    }

    fn count_for_author(&self, author_id: &str) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM posts WHERE author_id = ?1",
            params![author_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}
