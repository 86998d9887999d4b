use crate::database::models::LocationSampleRecord;
use anyhow::Result;
use rusqlite::{params, Connection, Row};

pub(super) struct SqliteLocationRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

fn map_sample(row: &Row<'_>) -> rusqlite::Result<LocationSampleRecord> {
    Ok(LocationSampleRecord {
        id: row.get(0)?,
        user_id: row.get(1)?,
        latitude: row.get(2)?,
        longitude: row.get(3)?,
        accuracy: row.get(4)?,
        recorded_at: row.get(5)?,
    })
}

impl<'conn> super::LocationRepository for SqliteLocationRepository<'conn> {
    fn append(&self, record: &LocationSampleRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO location_samples (id, user_id, latitude, longitude, accuracy, recorded_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                record.id,
                record.user_id,
                record.latitude,
                record.longitude,
                record.accuracy,
                record.recorded_at
            ],
        )?;
        Ok(())
    }

    fn friend_samples(
        &self,
        excluding_user: &str,
        limit: usize,
    ) -> Result<Vec<LocationSampleRecord>> {
        // The DESC ordering here is load-bearing: clients keep the first
        // sample they see per user, so "first" must mean "most recent".
        let mut stmt = self.conn.prepare(
            r#"
            SELECT s.id, s.user_id, s.latitude, s.longitude, s.accuracy, s.recorded_at
            FROM location_samples s
            INNER JOIN users u ON u.id = s.user_id
            WHERE s.user_id != ?1
              AND u.share_location = 1
            ORDER BY datetime(s.recorded_at) DESC
            LIMIT ?2
            "#,
        )?;
        let rows = stmt.query_map(params![excluding_user, limit], map_sample)?;
        let mut samples = Vec::new();
        for row in rows {
            samples.push(row?);
        }
        Ok(samples)
    }
}
