use crate::database::models::{TourGuideRecord, TourPackageRecord};
use anyhow::Result;
use rusqlite::{params, Connection};

pub(super) struct SqliteTourRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

impl<'conn> super::TourRepository for SqliteTourRepository<'conn> {
    fn list_packages(&self) -> Result<Vec<TourPackageRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, title, description, destination, duration_days, price_cents, image_url
            FROM tour_packages
            ORDER BY title ASC
            "#,
        )?;
        let rows = stmt.query_map(params![], |row| {
            Ok(TourPackageRecord {
                id: row.get(0)?,
                title: row.get(1)?,
                description: row.get(2)?,
                destination: row.get(3)?,
                duration_days: row.get(4)?,
                price_cents: row.get(5)?,
                image_url: row.get(6)?,
            })
        })?;
        let mut packages = Vec::new();
        for row in rows {
            packages.push(row?);
        }
        Ok(packages)
    }

    fn list_guides(&self) -> Result<Vec<TourGuideRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, name, region, languages, rating, phone, photo_url
            FROM tour_guides
            ORDER BY name ASC
            "#,
        )?;
        let rows = stmt.query_map(params![], |row| {
            Ok(TourGuideRecord {
                id: row.get(0)?,
                name: row.get(1)?,
                region: row.get(2)?,
                languages: row.get(3)?,
                rating: row.get(4)?,
                phone: row.get(5)?,
                photo_url: row.get(6)?,
            })
        })?;
        let mut guides = Vec::new();
        for row in rows {
            guides.push(row?);
        }
        Ok(guides)
    }
}
