use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_photo_id: Option<String>,
    pub password_hash: String,
    pub password_salt: String,
    pub is_private: bool,
    pub share_location: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub token: String,
    pub user_id: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostRecord {
    pub id: String,
    pub author_id: String,
    pub caption: String,
    pub location_text: Option<String>,
    pub like_count: i64,
    pub comment_count: i64,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoRecord {
    pub id: String,
    /// None for avatar photos, which hang off the user row instead.
    pub post_id: Option<String>,
    pub path: String,
    pub original_name: Option<String>,
    pub mime: Option<String>,
    pub size_bytes: Option<i64>,
    pub checksum: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowRecord {
    pub follower_id: String,
    pub followed_id: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationSampleRecord {
    pub id: String,
    pub user_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Option<f64>,
    pub recorded_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TourPackageRecord {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub destination: String,
    pub duration_days: i64,
    pub price_cents: i64,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TourGuideRecord {
    pub id: String,
    pub name: String,
    pub region: String,
    pub languages: Option<String>,
    pub rating: Option<f64>,
    pub phone: String,
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeCompletionRecord {
    pub user_id: String,
    pub challenge_id: String,
    pub completed_at: String,
}
