use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};

use crate::api::ApiClient;
use crate::models::{FollowCounts, SessionToken};
use crate::resource::MutationGuard;

/// Optimistic follow button state for one target profile. The flip is
/// applied locally before the request goes out and reverted if the
/// request fails; overlapping toggles are rejected outright.
pub struct FollowToggle {
    client: ApiClient,
    target_id: String,
    guard: MutationGuard,
    state: Arc<Mutex<ToggleState>>,
}

#[derive(Debug, Clone, Copy)]
struct ToggleState {
    following: bool,
    counts: FollowCounts,
}

impl FollowToggle {
    pub fn new(client: ApiClient, target_id: impl Into<String>, following: bool, counts: FollowCounts) -> Self {
        Self {
            client,
            target_id: target_id.into(),
            guard: MutationGuard::new(),
            state: Arc::new(Mutex::new(ToggleState { following, counts })),
        }
    }

    pub fn following(&self) -> bool {
        self.state.lock().expect("toggle lock").following
    }

    pub fn counts(&self) -> FollowCounts {
        self.state.lock().expect("toggle lock").counts
    }

    pub async fn toggle(&self, session: &SessionToken) -> Result<bool> {
        let _permit = self
            .guard
            .begin()
            .ok_or_else(|| anyhow!("a follow request is already in flight"))?;

        // Flip locally first so the caller sees the new state right away.
        let now_following = {
            let mut state = self.state.lock().expect("toggle lock");
            state.following = !state.following;
            if state.following {
                state.counts.followers += 1;
            } else {
                state.counts.followers = state.counts.followers.saturating_sub(1);
            }
            state.following
        };

        let result = if now_following {
            self.client.follow(session, &self.target_id).await
        } else {
            self.client.unfollow(session, &self.target_id).await
        };

        if let Err(err) = result {
            let mut state = self.state.lock().expect("toggle lock");
            state.following = !now_following;
            if now_following {
                state.counts.followers = state.counts.followers.saturating_sub(1);
            } else {
                state.counts.followers += 1;
            }
            tracing::warn!(target = %self.target_id, error = %err, "follow toggle reverted");
            return Err(err);
        }
        Ok(now_following)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_toggle(following: bool) -> FollowToggle {
        // Nothing listens on port 1; the request fails fast.
        let client = ApiClient::new("http://127.0.0.1:1").expect("client");
        FollowToggle::new(
            client,
            "user-1",
            following,
            FollowCounts {
                followers: 3,
                following: 5,
            },
        )
    }

    #[tokio::test]
    async fn failed_follow_reverts_the_optimistic_flip() {
        let toggle = unreachable_toggle(false);
        let err = toggle
            .toggle(&SessionToken("token".into()))
            .await
            .unwrap_err();
        assert!(!err.to_string().is_empty());
        assert!(!toggle.following());
        assert_eq!(toggle.counts().followers, 3);
    }

    #[tokio::test]
    async fn failed_unfollow_reverts_too() {
        let toggle = unreachable_toggle(true);
        let _ = toggle.toggle(&SessionToken("token".into())).await;
        assert!(toggle.following());
        assert_eq!(toggle.counts().followers, 3);
    }
}
