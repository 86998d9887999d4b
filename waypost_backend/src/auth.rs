use crate::database::models::{SessionRecord, UserRecord};
use crate::database::repositories::{SessionRepository, UserRepository};
use crate::database::Database;
use crate::utils::now_utc_iso;
use anyhow::Result;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("username and password are required")]
    MissingFields,
    #[error("username already taken")]
    UsernameTaken,
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

#[derive(Clone)]
pub struct AuthService {
    database: Database,
}

impl AuthService {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    pub fn register(&self, input: RegisterInput) -> Result<SessionView, AuthError> {
        let username = input.username.trim().to_string();
        if username.is_empty() || input.password.is_empty() {
            return Err(AuthError::MissingFields);
        }

        let taken = self
            .database
            .with_repositories(|repos| repos.users().get_by_username(&username))?
            .is_some();
        if taken {
            return Err(AuthError::UsernameTaken);
        }

        let salt = random_salt();
        let record = UserRecord {
            id: Uuid::new_v4().to_string(),
            username: username.clone(),
            display_name: None,
            bio: None,
            avatar_photo_id: None,
            password_hash: hash_password(&input.password, &salt),
            password_salt: salt,
            is_private: false,
            share_location: false,
            created_at: now_utc_iso(),
        };
        self.database
            .with_repositories(|repos| repos.users().create(&record))?;
        tracing::info!(user_id = %record.id, username = %record.username, "registered user");

        self.open_session(&record)
    }

    pub fn login(&self, input: LoginInput) -> Result<SessionView, AuthError> {
        let user = self
            .database
            .with_repositories(|repos| repos.users().get_by_username(input.username.trim()))?
            .ok_or(AuthError::InvalidCredentials)?;

        let candidate = hash_password(&input.password, &user.password_salt);
        if candidate != user.password_hash {
            return Err(AuthError::InvalidCredentials);
        }
        self.open_session(&user)
    }

    pub fn logout(&self, token: &str) -> Result<()> {
        self.database
            .with_repositories(|repos| repos.sessions().delete(token))
    }

    /// Resolves a bearer token to the owning user id, or None for
    /// unknown/expired-by-deletion tokens.
    pub fn resolve_token(&self, token: &str) -> Result<Option<String>> {
        self.database
            .with_repositories(|repos| repos.sessions().user_id_for_token(token))
    }

    fn open_session(&self, user: &UserRecord) -> Result<SessionView, AuthError> {
        let session = SessionRecord {
            token: Uuid::new_v4().to_string(),
            user_id: user.id.clone(),
            created_at: now_utc_iso(),
        };
        self.database
            .with_repositories(|repos| repos.sessions().create(&session))?;
        Ok(SessionView {
            token: session.token,
            user_id: user.id.clone(),
            username: user.username.clone(),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterInput {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionView {
    pub token: String,
    pub user_id: String,
    pub username: String,
}

fn random_salt() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    hex_string(&bytes)
}

fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex_string(&hasher.finalize())
}

fn hex_string(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
