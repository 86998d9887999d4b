pub mod api;
pub mod follow_toggle;
pub mod friend_locations;
pub mod models;
pub mod prefs;
pub mod resource;
pub mod retry;
