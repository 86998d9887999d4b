use crate::database::models::{TourGuideRecord, TourPackageRecord};
use crate::database::repositories::TourRepository;
use crate::database::Database;
use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Clone)]
pub struct TourService {
    database: Database,
}

impl TourService {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    pub fn list_packages(&self) -> Result<Vec<TourPackageView>> {
        self.database.with_repositories(|repos| {
            let packages = repos.tours().list_packages()?;
            Ok(packages.into_iter().map(TourPackageView::from_record).collect())
        })
    }

    /// Guide contact details are gated on having a session: anonymous
    /// callers get the row with the phone field blanked, decided here at
    /// fetch time rather than left to clients.
    pub fn list_guides(&self, authenticated: bool) -> Result<Vec<TourGuideView>> {
        self.database.with_repositories(|repos| {
            let guides = repos.tours().list_guides()?;
            Ok(guides
                .into_iter()
                .map(|g| TourGuideView::from_record(g, authenticated))
                .collect())
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TourPackageView {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub destination: String,
    pub duration_days: i64,
    pub price_cents: i64,
    pub image_url: Option<String>,
}

impl TourPackageView {
    fn from_record(record: TourPackageRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            description: record.description,
            destination: record.destination,
            duration_days: record.duration_days,
            price_cents: record.price_cents,
            image_url: record.image_url,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TourGuideView {
    pub id: String,
    pub name: String,
    pub region: String,
    pub languages: Option<String>,
    pub rating: Option<f64>,
    pub phone: String,
    pub photo_url: Option<String>,
}

impl TourGuideView {
    fn from_record(record: TourGuideRecord, authenticated: bool) -> Self {
        let phone = if authenticated {
            record.phone
        } else {
            String::new()
        };
        Self {
            id: record.id,
            name: record.name,
            region: record.region,
            languages: record.languages,
            rating: record.rating,
            phone,
            photo_url: record.photo_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn setup() -> TourService {
        let conn = Connection::open_in_memory().expect("in-memory db");
        let db = Database::from_connection(conn, true);
        db.ensure_migrations().expect("migrations");
        TourService::new(db)
    }

    #[test]
    fn guide_phone_is_redacted_for_anonymous_callers() {
        let service = setup();
        let anonymous = service.list_guides(false).expect("anonymous guides");
        assert!(!anonymous.is_empty());
        assert!(anonymous.iter().all(|g| g.phone.is_empty()));

        let authenticated = service.list_guides(true).expect("authenticated guides");
        assert!(authenticated.iter().all(|g| !g.phone.is_empty()));

        // Same rows either way, only the phone differs.
        assert_eq!(anonymous.len(), authenticated.len());
        assert_eq!(anonymous[0].id, authenticated[0].id);
    }

    #[test]
    fn packages_come_from_the_seeded_catalog() {
        let service = setup();
        let packages = service.list_packages().expect("packages");
        assert!(packages.iter().any(|p| p.destination.contains("Japan")));
    }
}
