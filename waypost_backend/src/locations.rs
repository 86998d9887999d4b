use crate::database::models::LocationSampleRecord;
use crate::database::repositories::{LocationRepository, UserRepository};
use crate::database::Database;
use crate::utils::now_utc_iso;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum LocationError {
    #[error("latitude out of range")]
    LatitudeOutOfRange,
    #[error("longitude out of range")]
    LongitudeOutOfRange,
    #[error("location sharing is disabled for this account")]
    SharingDisabled,
    #[error("user not found")]
    UnknownUser,
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// How many raw samples a friends query returns at most. Samples are
/// append-only, so the newest-first window is what matters.
const FRIEND_SAMPLE_LIMIT: usize = 500;

#[derive(Clone)]
pub struct LocationService {
    database: Database,
}

impl LocationService {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    pub fn record_sample(
        &self,
        input: RecordLocationInput,
    ) -> Result<LocationSampleView, LocationError> {
        if !(-90.0..=90.0).contains(&input.latitude) {
            return Err(LocationError::LatitudeOutOfRange);
        }
        if !(-180.0..=180.0).contains(&input.longitude) {
            return Err(LocationError::LongitudeOutOfRange);
        }

        let user = self
            .database
            .with_repositories(|repos| repos.users().get(&input.user_id))?
            .ok_or(LocationError::UnknownUser)?;
        if !user.share_location {
            return Err(LocationError::SharingDisabled);
        }

        let record = LocationSampleRecord {
            id: Uuid::new_v4().to_string(),
            user_id: input.user_id.clone(),
            latitude: input.latitude,
            longitude: input.longitude,
            accuracy: input.accuracy,
            recorded_at: input.recorded_at.unwrap_or_else(now_utc_iso),
        };
        self.database
            .with_repositories(|repos| repos.locations().append(&record))?;

        Ok(LocationSampleView::from_record(record, user.username))
    }

    /// Raw newest-first samples for every sharing user except the caller.
    /// The latest-per-user aggregation happens client-side over this
    /// ordering.
    pub fn friend_samples(&self, caller_id: &str) -> Result<Vec<LocationSampleView>> {
        self.database.with_repositories(|repos| {
            let samples = repos
                .locations()
                .friend_samples(caller_id, FRIEND_SAMPLE_LIMIT)?;
            let mut views = Vec::with_capacity(samples.len());
            for sample in samples {
                let username = repos
                    .users()
                    .get(&sample.user_id)?
                    .map(|u| u.username)
                    .unwrap_or_else(|| "unknown".to_string());
                views.push(LocationSampleView::from_record(sample, username));
            }
            Ok(views)
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordLocationInput {
    #[serde(default)]
    pub user_id: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub accuracy: Option<f64>,
    #[serde(default)]
    pub recorded_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationSampleView {
    pub id: String,
    pub user_id: String,
    pub username: String,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Option<f64>,
    pub recorded_at: String,
}

impl LocationSampleView {
    fn from_record(record: LocationSampleRecord, username: String) -> Self {
        Self {
            id: record.id,
            user_id: record.user_id,
            username,
            latitude: record.latitude,
            longitude: record.longitude,
            accuracy: record.accuracy,
            recorded_at: record.recorded_at,
        }
    }
}
