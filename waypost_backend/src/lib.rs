pub mod api;
pub mod auth;
pub mod challenges;
pub mod config;
pub mod database;
pub mod follows;
pub mod geocode;
pub mod locations;
pub mod photos;
pub mod posts;
pub mod profiles;
pub mod telemetry;
pub mod tours;
pub mod utils;
