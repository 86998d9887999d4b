pub mod models;
pub mod repositories;

use crate::config::WaypostPaths;
use anyhow::{anyhow, Result};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

pub(crate) const MIGRATIONS: &str = r#"
    PRAGMA journal_mode = WAL;
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        display_name TEXT,
        bio TEXT,
        avatar_photo_id TEXT,
        password_hash TEXT NOT NULL,
        password_salt TEXT NOT NULL,
        is_private INTEGER DEFAULT 0,
        share_location INTEGER DEFAULT 0,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS sessions (
        token TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        created_at TEXT NOT NULL,
        FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS posts (
        id TEXT PRIMARY KEY,
        author_id TEXT NOT NULL,
        caption TEXT NOT NULL,
        location_text TEXT,
        like_count INTEGER DEFAULT 0,
        comment_count INTEGER DEFAULT 0,
        created_at TEXT NOT NULL,
        FOREIGN KEY (author_id) REFERENCES users(id)
    );

    CREATE TABLE IF NOT EXISTS photos (
        id TEXT PRIMARY KEY,
        post_id TEXT,
        path TEXT NOT NULL,
        original_name TEXT,
        mime TEXT,
        size_bytes INTEGER,
        checksum TEXT,
        FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS follows (
        follower_id TEXT NOT NULL,
        followed_id TEXT NOT NULL,
        created_at TEXT NOT NULL,
        PRIMARY KEY (follower_id, followed_id),
        FOREIGN KEY (follower_id) REFERENCES users(id) ON DELETE CASCADE,
        FOREIGN KEY (followed_id) REFERENCES users(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS location_samples (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        latitude REAL NOT NULL,
        longitude REAL NOT NULL,
        accuracy REAL,
        recorded_at TEXT NOT NULL,
        FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS tour_packages (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        description TEXT,
        destination TEXT NOT NULL,
        duration_days INTEGER NOT NULL,
        price_cents INTEGER NOT NULL,
        image_url TEXT
    );

    CREATE TABLE IF NOT EXISTS tour_guides (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        region TEXT NOT NULL,
        languages TEXT,
        rating REAL,
        phone TEXT NOT NULL,
        photo_url TEXT
    );

    CREATE TABLE IF NOT EXISTS challenge_completions (
        user_id TEXT NOT NULL,
        challenge_id TEXT NOT NULL,
        completed_at TEXT NOT NULL,
        PRIMARY KEY (user_id, challenge_id),
        FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
    );

    CREATE INDEX IF NOT EXISTS idx_posts_author ON posts(author_id);
    CREATE INDEX IF NOT EXISTS idx_photos_post ON photos(post_id);
    CREATE INDEX IF NOT EXISTS idx_follows_followed ON follows(followed_id);
    CREATE INDEX IF NOT EXISTS idx_location_samples_recorded
        ON location_samples(recorded_at DESC);
    CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id);
"#;

/// Starter catalog rows. `INSERT OR IGNORE` keeps re-running migrations
/// from duplicating them and leaves operator edits alone.
pub(crate) const SEED_CATALOG: &str = r#"
    INSERT OR IGNORE INTO tour_packages (id, title, description, destination, duration_days, price_cents, image_url) VALUES
        ('pkg-kyoto-5d', 'Kyoto Temples & Tea', 'Five days of temples, gardens, and a tea ceremony.', 'Kyoto, Japan', 5, 129900, NULL),
        ('pkg-cusco-4d', 'Sacred Valley Explorer', 'Cusco, Pisac market, and the Sacred Valley.', 'Cusco, Peru', 4, 89900, NULL),
        ('pkg-lisbon-3d', 'Lisbon Weekend', 'Alfama, Belem, and a day trip to Sintra.', 'Lisbon, Portugal', 3, 59900, NULL);

    INSERT OR IGNORE INTO tour_guides (id, name, region, languages, rating, phone, photo_url) VALUES
        ('guide-akiko', 'Akiko Tanaka', 'Kansai', 'ja,en', 4.9, '+81-75-555-0142', NULL),
        ('guide-mateo', 'Mateo Quispe', 'Cusco', 'es,en,qu', 4.8, '+51-84-555-0199', NULL),
        ('guide-ines', 'Ines Almeida', 'Lisbon', 'pt,en,fr', 4.7, '+351-21-555-0117', NULL);
"#;

#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    newly_created: bool,
}

impl Database {
    pub fn connect(paths: &WaypostPaths) -> Result<Self> {
        if let Some(parent) = paths.db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let newly_created = !paths.db_path.exists();
        let conn = Connection::open(&paths.db_path)?;
        Ok(Self::from_connection(conn, newly_created))
    }

    pub fn from_connection(conn: Connection, newly_created: bool) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            newly_created,
        }
    }

    pub fn ensure_migrations(&self) -> Result<bool> {
        self.with_conn(|conn| {
            conn.execute_batch(MIGRATIONS)?;
            conn.execute_batch(SEED_CATALOG)?;
            Ok(())
        })?;
        Ok(self.newly_created)
    }

    pub fn with_repositories<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(repositories::SqliteRepositories<'_>) -> Result<T>,
    {
        self.with_conn(|conn| {
            let repos = repositories::SqliteRepositories::new(conn);
            f(repos)
        })
    }

    fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let guard = self
            .conn
            .lock()
            .map_err(|_| anyhow!("database mutex poisoned"))?;
        f(&guard)
    }
}
