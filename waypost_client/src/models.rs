use serde::{Deserialize, Serialize};

/// Bearer token handed back by register/login. Passed explicitly into
/// every call that needs one; there is no ambient global session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken(pub String);

impl SessionToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user_id: String,
    pub username: String,
}

impl Session {
    pub fn token(&self) -> SessionToken {
        SessionToken(self.token.clone())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub username: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_photo_id: Option<String>,
    pub is_private: bool,
    pub share_location: bool,
    pub post_count: usize,
    pub follower_count: usize,
    pub following_count: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SettingsUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_private: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_location: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Photo {
    pub id: String,
    pub post_id: Option<String>,
    pub original_name: Option<String>,
    pub mime: Option<String>,
    pub size_bytes: Option<i64>,
    pub checksum: Option<String>,
    pub download_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub author_id: String,
    pub author_username: String,
    pub caption: String,
    pub location_text: Option<String>,
    pub like_count: i64,
    pub comment_count: i64,
    pub created_at: String,
    pub photos: Vec<Photo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewPost {
    pub caption: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_text: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FollowCounts {
    pub followers: usize,
    pub following: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestedUser {
    pub id: String,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_photo_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationSample {
    pub id: String,
    pub user_id: String,
    pub username: String,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Option<f64>,
    pub recorded_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LocationUpdate {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TourPackage {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub destination: String,
    pub duration_days: i64,
    pub price_cents: i64,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TourGuide {
    pub id: String,
    pub name: String,
    pub region: String,
    pub languages: Option<String>,
    pub rating: Option<f64>,
    /// Empty string when the call was made without a session.
    pub phone: String,
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Challenge {
    pub id: String,
    pub title: String,
    pub description: String,
    pub points: u32,
    pub category: String,
    pub difficulty: String,
    pub proof: String,
    pub quiz: Option<ChallengeQuiz>,
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeQuiz {
    pub question: String,
    pub options: Vec<String>,
    pub answer_index: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeCompletion {
    pub challenge_id: String,
    pub newly_completed: bool,
}
