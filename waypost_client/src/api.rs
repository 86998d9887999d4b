use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

use crate::models::{
    Challenge, ChallengeCompletion, Credentials, FollowCounts, LocationSample, LocationUpdate,
    NewPost, Post, Profile, Session, SessionToken, SettingsUpdate, SuggestedUser, TourGuide,
    TourPackage,
};
use crate::retry::{send_with_retry, DEFAULT_READ_ATTEMPTS};

/// Non-success reply from the server, with the body's error message when
/// one was present. Carried inside `anyhow::Error` so callers can
/// downcast for the status code.
#[derive(Debug, Error)]
#[error("{message} (status {status})")]
pub struct ApiError {
    pub status: u16,
    pub message: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    client: Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base = sanitize_base_url(base_url.into())?;
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            base_url: base,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn set_base_url(&mut self, base_url: impl Into<String>) -> Result<()> {
        self.base_url = sanitize_base_url(base_url.into())?;
        Ok(())
    }

    // -- auth --

    pub async fn register(&self, credentials: &Credentials) -> Result<Session> {
        let url = self.url("/auth/register")?;
        let response = self.client.post(url).json(credentials).send().await?;
        expect_json(response).await
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<Session> {
        let url = self.url("/auth/login")?;
        let response = self.client.post(url).json(credentials).send().await?;
        expect_json(response).await
    }

    pub async fn logout(&self, session: &SessionToken) -> Result<()> {
        let url = self.url("/auth/logout")?;
        let response = self.authorized(self.client.post(url), Some(session)).send().await?;
        expect_ok(response).await
    }

    // -- profiles --

    pub async fn profile(&self, user_id: &str) -> Result<Profile> {
        let url = self.url(&format!("/profile/{user_id}"))?;
        let response = self.get_with_retry(url).await?;
        expect_json(response).await
    }

    pub async fn update_settings(
        &self,
        session: &SessionToken,
        update: &SettingsUpdate,
    ) -> Result<Profile> {
        let url = self.url("/profile")?;
        let response = self
            .authorized(self.client.post(url), Some(session))
            .json(update)
            .send()
            .await?;
        expect_json(response).await
    }

    pub async fn upload_avatar(
        &self,
        session: &SessionToken,
        file_name: &str,
        data: Vec<u8>,
    ) -> Result<Profile> {
        let url = self.url("/profile/avatar")?;
        let form = reqwest::multipart::Form::new().part(
            "photo",
            reqwest::multipart::Part::bytes(data).file_name(file_name.to_string()),
        );
        let response = self
            .authorized(self.client.post(url), Some(session))
            .multipart(form)
            .send()
            .await?;
        expect_json(response).await
    }

    // -- posts --

    pub async fn feed(&self, user_id: Option<&str>, limit: usize) -> Result<Vec<Post>> {
        let mut url = self.url("/posts")?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("limit", &limit.to_string());
            if let Some(user_id) = user_id {
                pairs.append_pair("user_id", user_id);
            }
        }
        let response = self.get_with_retry(url).await?;
        expect_json(response).await
    }

    /// The post and its photo land together; there is no photo-less post.
    pub async fn create_post(
        &self,
        session: &SessionToken,
        input: &NewPost,
        photo_name: &str,
        photo_data: Vec<u8>,
    ) -> Result<Post> {
        let url = self.url("/posts")?;
        let form = reqwest::multipart::Form::new()
            .text("json", serde_json::to_string(input)?)
            .part(
                "photo",
                reqwest::multipart::Part::bytes(photo_data).file_name(photo_name.to_string()),
            );
        let response = self
            .authorized(self.client.post(url), Some(session))
            .multipart(form)
            .send()
            .await?;
        expect_json(response).await
    }

    pub fn photo_url(&self, photo_id: &str) -> String {
        format!("{}/photos/{}", self.base_url, photo_id)
    }

    // -- follows --

    pub async fn follow(&self, session: &SessionToken, user_id: &str) -> Result<()> {
        let url = self.url(&format!("/follows/{user_id}"))?;
        let response = self.authorized(self.client.post(url), Some(session)).send().await?;
        expect_ok(response).await
    }

    pub async fn unfollow(&self, session: &SessionToken, user_id: &str) -> Result<()> {
        let url = self.url(&format!("/follows/{user_id}"))?;
        let response = self
            .authorized(self.client.delete(url), Some(session))
            .send()
            .await?;
        expect_ok(response).await
    }

    pub async fn follow_counts(&self, user_id: &str) -> Result<FollowCounts> {
        let url = self.url(&format!("/follows/counts/{user_id}"))?;
        let response = self.get_with_retry(url).await?;
        expect_json(response).await
    }

    pub async fn suggestions(&self, session: &SessionToken) -> Result<Vec<SuggestedUser>> {
        let url = self.url("/follows/suggestions")?;
        let response = self
            .authorized(self.client.get(url), Some(session))
            .send()
            .await?;
        expect_json(response).await
    }

    // -- locations --

    pub async fn record_location(
        &self,
        session: &SessionToken,
        update: &LocationUpdate,
    ) -> Result<LocationSample> {
        let url = self.url("/locations")?;
        let response = self
            .authorized(self.client.post(url), Some(session))
            .json(update)
            .send()
            .await?;
        expect_json(response).await
    }

    /// Raw samples, newest first. Feed them to
    /// `friend_locations::latest_per_user` for the one-pin-per-friend
    /// view.
    pub async fn friend_locations(&self, session: &SessionToken) -> Result<Vec<LocationSample>> {
        let url = self.url("/locations/friends")?;
        let session = session.clone();
        let client = self.client.clone();
        let response = send_with_retry(
            || authorized_builder(client.get(url.clone()), Some(&session)),
            DEFAULT_READ_ATTEMPTS,
        )
        .await?;
        expect_json(response).await
    }

    // -- tours --

    pub async fn tour_packages(&self) -> Result<Vec<TourPackage>> {
        let url = self.url("/tours/packages")?;
        let response = self.get_with_retry(url).await?;
        expect_json(response).await
    }

    /// Guide phone numbers come back blank without a session.
    pub async fn tour_guides(&self, session: Option<&SessionToken>) -> Result<Vec<TourGuide>> {
        let url = self.url("/tours/guides")?;
        let session = session.cloned();
        let client = self.client.clone();
        let response = send_with_retry(
            || authorized_builder(client.get(url.clone()), session.as_ref()),
            DEFAULT_READ_ATTEMPTS,
        )
        .await?;
        expect_json(response).await
    }

    // -- challenges --

    pub async fn challenges(&self, session: Option<&SessionToken>) -> Result<Vec<Challenge>> {
        let url = self.url("/challenges")?;
        let session = session.cloned();
        let client = self.client.clone();
        let response = send_with_retry(
            || authorized_builder(client.get(url.clone()), session.as_ref()),
            DEFAULT_READ_ATTEMPTS,
        )
        .await?;
        expect_json(response).await
    }

    pub async fn complete_challenge(
        &self,
        session: &SessionToken,
        challenge_id: &str,
    ) -> Result<ChallengeCompletion> {
        let url = self.url(&format!("/challenges/{challenge_id}/complete"))?;
        let response = self.authorized(self.client.post(url), Some(session)).send().await?;
        expect_json(response).await
    }

    // -- geocoding --

    /// Asks the server-side proxy to reverse-geocode a coordinate. The
    /// reply is the upstream Mapbox document, relayed verbatim.
    pub async fn reverse_geocode(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<serde_json::Value> {
        let url = self.url("/geocode")?;
        let response = self
            .client
            .post(url)
            .json(&serde_json::json!({ "latitude": latitude, "longitude": longitude }))
            .send()
            .await?;
        expect_json(response).await
    }

    async fn get_with_retry(&self, url: Url) -> Result<Response> {
        let client = self.client.clone();
        send_with_retry(|| client.get(url.clone()), DEFAULT_READ_ATTEMPTS).await
    }

    fn authorized(
        &self,
        builder: RequestBuilder,
        session: Option<&SessionToken>,
    ) -> RequestBuilder {
        authorized_builder(builder, session)
    }

    fn url(&self, path: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).context("invalid base URL")?;
        url.set_path(path.trim_start_matches('/'));
        Ok(url)
    }
}

fn authorized_builder(
    builder: RequestBuilder,
    session: Option<&SessionToken>,
) -> RequestBuilder {
    match session {
        Some(token) => builder.bearer_auth(token.as_str()),
        None => builder,
    }
}

/// Pulls the first place name out of a relayed Mapbox reply.
pub fn place_name(reply: &serde_json::Value) -> Option<&str> {
    reply
        .get("features")?
        .get(0)?
        .get("place_name")?
        .as_str()
}

async fn expect_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        return Err(error_from(status, response).await.into());
    }
    Ok(response.json().await?)
}

async fn expect_ok(response: Response) -> Result<()> {
    let status = response.status();
    if !status.is_success() {
        return Err(error_from(status, response).await.into());
    }
    Ok(())
}

async fn error_from(status: reqwest::StatusCode, response: Response) -> ApiError {
    let message = match response.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
    };
    ApiError {
        status: status.as_u16(),
        message,
    }
}

fn sanitize_base_url(mut base: String) -> Result<String> {
    if !base.starts_with("http://") && !base.starts_with("https://") {
        base = format!("http://{base}");
    }
    // Remove trailing slash for consistency
    while base.ends_with('/') {
        base.pop();
    }
    // Validate once
    let _ = Url::parse(&base).context("invalid base URL")?;
    Ok(base)
}
