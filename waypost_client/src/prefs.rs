use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tokio::sync::watch;

pub const IS_LOGGED_IN: &str = "isLoggedIn";
pub const USERNAME: &str = "username";
pub const REDIRECT_AFTER_LOGIN: &str = "redirectAfterLogin";
pub const FEMALE_EXPERIENCE: &str = "femaleExperience";

const PREFS_FILE: &str = "prefs.json";

/// Flat string key/value store persisted as a JSON file. Writes land on
/// disk before `set` returns, and every change is published on a watch
/// channel so dependents update without re-reading the file.
pub struct PrefStore {
    path: PathBuf,
    state: Mutex<HashMap<String, String>>,
    tx: watch::Sender<HashMap<String, String>>,
}

impl PrefStore {
    pub fn open<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref();
        std::fs::create_dir_all(base_dir)
            .with_context(|| format!("failed to create {}", base_dir.display()))?;
        let path = base_dir.join(PREFS_FILE);

        let values: HashMap<String, String> = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw)
                .with_context(|| format!("malformed preference file {}", path.display()))?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to read {}", path.display()));
            }
        };

        let (tx, _) = watch::channel(values.clone());
        Ok(Self {
            path,
            state: Mutex::new(values),
            tx,
        })
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.state.lock().expect("prefs lock").get(key).cloned()
    }

    pub fn set(&self, key: &str, value: impl Into<String>) -> Result<()> {
        let mut state = self.state.lock().expect("prefs lock");
        state.insert(key.to_string(), value.into());
        self.flush_locked(&state)
    }

    pub fn remove(&self, key: &str) -> Result<()> {
        let mut state = self.state.lock().expect("prefs lock");
        state.remove(key);
        self.flush_locked(&state)
    }

    // Runs with the state lock held: the disk write and the watch send
    // happen in mutation order, so a later write can never be clobbered
    // by an earlier one still in flight.
    fn flush_locked(&self, state: &HashMap<String, String>) -> Result<()> {
        self.persist(state)?;
        let _ = self.tx.send(state.clone());
        Ok(())
    }

    /// Dependents hold a receiver and react to changes; nothing reloads.
    pub fn subscribe(&self) -> watch::Receiver<HashMap<String, String>> {
        self.tx.subscribe()
    }

    pub fn is_logged_in(&self) -> bool {
        self.get(IS_LOGGED_IN).as_deref() == Some("true")
    }

    pub fn set_logged_in(&self, value: bool) -> Result<()> {
        self.set(IS_LOGGED_IN, if value { "true" } else { "false" })
    }

    pub fn female_experience(&self) -> bool {
        self.get(FEMALE_EXPERIENCE).as_deref() == Some("true")
    }

    pub fn set_female_experience(&self, value: bool) -> Result<()> {
        self.set(FEMALE_EXPERIENCE, if value { "true" } else { "false" })
    }

    fn persist(&self, values: &HashMap<String, String>) -> Result<()> {
        let raw = serde_json::to_string_pretty(values)?;
        std::fs::write(&self.path, raw)
            .with_context(|| format!("failed to write {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn values_survive_reopening_the_store() {
        let temp = tempdir().expect("tempdir");
        {
            let store = PrefStore::open(temp.path()).expect("open");
            store.set(USERNAME, "amelia").expect("set username");
            store
                .set(REDIRECT_AFTER_LOGIN, "/profile")
                .expect("set redirect");
            store.set_logged_in(true).expect("set flag");
        }

        let reopened = PrefStore::open(temp.path()).expect("reopen");
        assert_eq!(reopened.get(USERNAME).as_deref(), Some("amelia"));
        assert_eq!(
            reopened.get(REDIRECT_AFTER_LOGIN).as_deref(),
            Some("/profile")
        );
        assert!(reopened.is_logged_in());
        assert!(!reopened.female_experience());
    }

    #[test]
    fn concurrent_writers_serialize_onto_disk() {
        let temp = tempdir().expect("tempdir");
        let store = std::sync::Arc::new(PrefStore::open(temp.path()).expect("open"));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = std::sync::Arc::clone(&store);
                std::thread::spawn(move || {
                    store.set(&format!("key-{i}"), format!("value-{i}")).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        // Every write must survive on disk; no flush may clobber another.
        let reopened = PrefStore::open(temp.path()).expect("reopen");
        for i in 0..8 {
            assert_eq!(
                reopened.get(&format!("key-{i}")).as_deref(),
                Some(format!("value-{i}").as_str())
            );
        }
    }

    #[test]
    fn removal_deletes_the_key() {
        let temp = tempdir().expect("tempdir");
        let store = PrefStore::open(temp.path()).expect("open");
        store.set(REDIRECT_AFTER_LOGIN, "/tours").expect("set");
        store.remove(REDIRECT_AFTER_LOGIN).expect("remove");
        assert_eq!(store.get(REDIRECT_AFTER_LOGIN), None);

        let reopened = PrefStore::open(temp.path()).expect("reopen");
        assert_eq!(reopened.get(REDIRECT_AFTER_LOGIN), None);
    }

    #[tokio::test]
    async fn toggling_a_flag_notifies_subscribers() {
        let temp = tempdir().expect("tempdir");
        let store = PrefStore::open(temp.path()).expect("open");
        let mut rx = store.subscribe();

        store.set_female_experience(true).expect("toggle");
        rx.changed().await.expect("change notification");
        assert_eq!(
            rx.borrow().get(FEMALE_EXPERIENCE).map(String::as_str),
            Some("true")
        );

        store.set_female_experience(false).expect("toggle back");
        rx.changed().await.expect("change notification");
        assert_eq!(
            rx.borrow().get(FEMALE_EXPERIENCE).map(String::as_str),
            Some("false")
        );
    }
}
