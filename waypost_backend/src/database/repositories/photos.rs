use crate::database::models::PhotoRecord;
use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension, Row};

pub(super) struct SqlitePhotoRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

fn map_photo(row: &Row<'_>) -> rusqlite::Result<PhotoRecord> {
    Ok(PhotoRecord {
        id: row.get(0)?,
        post_id: row.get(1)?,
        path: row.get(2)?,
        original_name: row.get(3)?,
        mime: row.get(4)?,
        size_bytes: row.get(5)?,
        checksum: row.get(6)?,
    })
}

impl<'conn> super::PhotoRepository for SqlitePhotoRepository<'conn> {
    fn attach(&self, record: &PhotoRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO photos (id, post_id, path, original_name, mime, size_bytes, checksum)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                record.id,
                record.post_id,
                record.path,
                record.original_name,
                record.mime,
                record.size_bytes,
                record.checksum
            ],
        )?;
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<PhotoRecord>> {
        Ok(self
            .conn
            .query_row(
                r#"
                SELECT id, post_id, path, original_name, mime, size_bytes, checksum
                FROM photos
                WHERE id = ?1
                "#,
                params![id],
                map_photo,
            )
            .optional()?)
    }

    fn list_for_post(&self, post_id: &str) -> Result<Vec<PhotoRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, post_id, path, original_name, mime, size_bytes, checksum
            FROM photos
            WHERE post_id = ?1
            ORDER BY id ASC
            "#,
        )?;
        let rows = stmt.query_map(params![post_id], map_photo)?;
        let mut photos = Vec::new();
        for row in rows {
            photos.push(row?);
        }
        Ok(photos)
    }
}
