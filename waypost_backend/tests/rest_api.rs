use axum::routing::get;
use axum::{Json, Router};
use tempfile::{tempdir, TempDir};
use tokio::time::{sleep, Duration};
use waypost_backend::api;
use waypost_backend::config::{GeocodeConfig, WaypostConfig, WaypostPaths};
use waypost_backend::database::Database;

// Smallest valid PNG header; the upload path only sniffs the magic bytes.
const PNG_BYTES: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D,
];

struct TestServer {
    _dir: TempDir,
    server: tokio::task::JoinHandle<()>,
    base_url: String,
}

impl TestServer {
    async fn shutdown(self) {
        self.server.abort();
        let _ = self.server.await;
    }
}

fn next_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .expect("bind ephemeral port")
        .local_addr()
        .unwrap()
        .port()
}

async fn wait_for_health(base_url: &str) {
    let client = reqwest::Client::new();
    for _ in 0..50 {
        if let Ok(resp) = client.get(format!("{base_url}/health")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        sleep(Duration::from_millis(100)).await;
    }
    panic!("server did not become healthy in time");
}

async fn start_server(geocode: GeocodeConfig) -> TestServer {
    let temp = tempdir().expect("tempdir");
    let port = next_port();
    let paths = WaypostPaths::from_base_dir(temp.path()).expect("paths");
    let config = WaypostConfig::with_geocode(port, paths, geocode);

    let database = Database::connect(&config.paths).expect("open database");
    database.ensure_migrations().expect("migrations");

    let server_config = config.clone();
    let server = tokio::spawn(async move {
        let _ = api::serve_http(server_config, database).await;
    });

    let base_url = format!("http://127.0.0.1:{port}");
    wait_for_health(&base_url).await;

    TestServer {
        _dir: temp,
        server,
        base_url,
    }
}

async fn register(client: &reqwest::Client, base_url: &str, username: &str) -> (String, String) {
    let session: serde_json::Value = client
        .post(format!("{base_url}/auth/register"))
        .json(&serde_json::json!({ "username": username, "password": "correct-horse" }))
        .send()
        .await
        .expect("register response")
        .json()
        .await
        .expect("session json");
    (
        session["token"].as_str().expect("token").to_string(),
        session["user_id"].as_str().expect("user id").to_string(),
    )
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn rest_roundtrip_with_photo_upload() {
    let server = start_server(GeocodeConfig::default()).await;
    let client = reqwest::Client::new();

    let (token, user_id) = register(&client, &server.base_url, "amelia").await;

    let login: serde_json::Value = client
        .post(format!("{}/auth/login", server.base_url))
        .json(&serde_json::json!({ "username": "amelia", "password": "correct-horse" }))
        .send()
        .await
        .expect("login response")
        .json()
        .await
        .expect("login json");
    assert_eq!(login["user_id"].as_str(), Some(user_id.as_str()));

    let form = reqwest::multipart::Form::new()
        .text(
            "json",
            serde_json::json!({ "caption": "Golden hour at Fushimi Inari", "location_text": "Kyoto" })
                .to_string(),
        )
        .part(
            "photo",
            reqwest::multipart::Part::bytes(PNG_BYTES.to_vec())
                .file_name("shrine.png")
                .mime_str("image/png")
                .unwrap(),
        );

    let post_resp = client
        .post(format!("{}/posts", server.base_url))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await
        .expect("create post response");
    assert_eq!(post_resp.status(), reqwest::StatusCode::CREATED);
    let post: serde_json::Value = post_resp.json().await.expect("post json");
    assert_eq!(post["author_username"].as_str(), Some("amelia"));
    let photo_id = post["photos"][0]["id"].as_str().expect("photo id");

    let feed: serde_json::Value = client
        .get(format!("{}/posts?user_id={user_id}", server.base_url))
        .send()
        .await
        .expect("feed response")
        .json()
        .await
        .expect("feed json");
    assert_eq!(feed.as_array().map(|a| a.len()), Some(1));

    let download = client
        .get(format!("{}/photos/{photo_id}", server.base_url))
        .send()
        .await
        .expect("photo download");
    assert_eq!(download.status(), reqwest::StatusCode::OK);
    assert_eq!(
        download
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok()),
        Some("image/png")
    );
    let bytes = download.bytes().await.expect("photo bytes");
    assert_eq!(&bytes[..], PNG_BYTES);

    // Posting without a session is rejected.
    let anonymous = client
        .post(format!("{}/posts", server.base_url))
        .multipart(reqwest::multipart::Form::new().text("json", "{}"))
        .send()
        .await
        .expect("anonymous post response");
    assert_eq!(anonymous.status(), reqwest::StatusCode::UNAUTHORIZED);

    server.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn rejected_photo_leaves_no_post_behind() {
    let server = start_server(GeocodeConfig::default()).await;
    let client = reqwest::Client::new();

    let (token, user_id) = register(&client, &server.base_url, "amelia").await;

    let form = reqwest::multipart::Form::new()
        .text(
            "json",
            serde_json::json!({ "caption": "not really a photo" }).to_string(),
        )
        .part(
            "photo",
            reqwest::multipart::Part::bytes(b"plain text, not an image".to_vec())
                .file_name("notes.txt")
                .mime_str("text/plain")
                .unwrap(),
        );

    let resp = client
        .post(format!("{}/posts", server.base_url))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await
        .expect("create post response");
    assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);

    // The rejected upload must not have written a post row.
    let feed: serde_json::Value = client
        .get(format!("{}/posts?user_id={user_id}", server.base_url))
        .send()
        .await
        .expect("feed response")
        .json()
        .await
        .expect("feed json");
    assert_eq!(feed.as_array().map(|a| a.len()), Some(0));

    server.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn follow_endpoints_are_idempotent() {
    let server = start_server(GeocodeConfig::default()).await;
    let client = reqwest::Client::new();

    let (token_a, user_a) = register(&client, &server.base_url, "amelia").await;
    let (_token_b, user_b) = register(&client, &server.base_url, "bruno").await;

    for _ in 0..2 {
        let resp = client
            .post(format!("{}/follows/{user_b}", server.base_url))
            .bearer_auth(&token_a)
            .send()
            .await
            .expect("follow response");
        assert_eq!(resp.status(), reqwest::StatusCode::NO_CONTENT);
    }

    let counts: serde_json::Value = client
        .get(format!("{}/follows/counts/{user_b}", server.base_url))
        .send()
        .await
        .expect("counts response")
        .json()
        .await
        .expect("counts json");
    assert_eq!(counts["followers"].as_u64(), Some(1));

    let unfollow = client
        .delete(format!("{}/follows/{user_b}", server.base_url))
        .bearer_auth(&token_a)
        .send()
        .await
        .expect("unfollow response");
    assert_eq!(unfollow.status(), reqwest::StatusCode::NO_CONTENT);

    let counts_after: serde_json::Value = client
        .get(format!("{}/follows/counts/{user_b}", server.base_url))
        .send()
        .await
        .expect("counts response")
        .json()
        .await
        .expect("counts json");
    assert_eq!(counts_after["followers"].as_u64(), Some(0));

    let self_follow = client
        .post(format!("{}/follows/{user_a}", server.base_url))
        .bearer_auth(&token_a)
        .send()
        .await
        .expect("self follow response");
    assert_eq!(self_follow.status(), reqwest::StatusCode::BAD_REQUEST);

    server.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn guide_phone_requires_a_session() {
    let server = start_server(GeocodeConfig::default()).await;
    let client = reqwest::Client::new();

    let anonymous: serde_json::Value = client
        .get(format!("{}/tours/guides", server.base_url))
        .send()
        .await
        .expect("guides response")
        .json()
        .await
        .expect("guides json");
    let guides = anonymous.as_array().expect("guides array");
    assert!(!guides.is_empty());
    assert!(guides.iter().all(|g| g["phone"].as_str() == Some("")));

    let (token, _) = register(&client, &server.base_url, "amelia").await;
    let authed: serde_json::Value = client
        .get(format!("{}/tours/guides", server.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .expect("guides response")
        .json()
        .await
        .expect("guides json");
    assert!(authed
        .as_array()
        .expect("guides array")
        .iter()
        .all(|g| !g["phone"].as_str().unwrap_or("").is_empty()));

    server.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn challenge_completion_round_trip() {
    let server = start_server(GeocodeConfig::default()).await;
    let client = reqwest::Client::new();

    let (token, _) = register(&client, &server.base_url, "amelia").await;

    let complete: serde_json::Value = client
        .post(format!(
            "{}/challenges/street-food-five/complete",
            server.base_url
        ))
        .bearer_auth(&token)
        .send()
        .await
        .expect("complete response")
        .json()
        .await
        .expect("complete json");
    assert_eq!(complete["newly_completed"].as_bool(), Some(true));

    let listed: serde_json::Value = client
        .get(format!("{}/challenges", server.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .expect("challenges response")
        .json()
        .await
        .expect("challenges json");
    let entry = listed
        .as_array()
        .expect("challenge array")
        .iter()
        .find(|c| c["id"].as_str() == Some("street-food-five"))
        .expect("catalog entry");
    assert_eq!(entry["completed"].as_bool(), Some(true));

    let unknown = client
        .post(format!("{}/challenges/nope/complete", server.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .expect("unknown challenge response");
    assert_eq!(unknown.status(), reqwest::StatusCode::NOT_FOUND);

    server.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn geocode_validates_input_and_token() {
    let server = start_server(GeocodeConfig::default()).await;
    let client = reqwest::Client::new();

    let missing = client
        .post(format!("{}/geocode", server.base_url))
        .json(&serde_json::json!({}))
        .send()
        .await
        .expect("geocode response");
    assert_eq!(missing.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: serde_json::Value = missing.json().await.expect("error json");
    assert_eq!(
        body["error"].as_str(),
        Some("Latitude and longitude are required")
    );

    // Token unset: the endpoint fails before any upstream call.
    let no_token = client
        .post(format!("{}/geocode", server.base_url))
        .json(&serde_json::json!({ "latitude": 35.0116, "longitude": 135.7681 }))
        .send()
        .await
        .expect("geocode response");
    assert_eq!(
        no_token.status(),
        reqwest::StatusCode::INTERNAL_SERVER_ERROR
    );
    let body: serde_json::Value = no_token.json().await.expect("error json");
    assert_eq!(body["error"].as_str(), Some("Mapbox token not configured"));

    server.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn geocode_relays_the_upstream_body_verbatim() {
    // Stand-in for the Mapbox API so the proxy has something to relay.
    let upstream_listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind upstream");
    let upstream_addr = upstream_listener.local_addr().unwrap();
    let upstream = Router::new().route(
        "/geocoding/v5/mapbox.places/:pair",
        get(|| async {
            Json(serde_json::json!({
                "features": [{ "place_name": "Kyoto, Japan" }]
            }))
        }),
    );
    let upstream_server = tokio::spawn(async move {
        let _ = axum::serve(upstream_listener, upstream).await;
    });

    let geocode = GeocodeConfig {
        mapbox_token: Some("test-token".into()),
        api_base: format!("http://{upstream_addr}"),
    };
    let server = start_server(geocode).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/geocode", server.base_url))
        .json(&serde_json::json!({ "latitude": 35.0116, "longitude": 135.7681 }))
        .send()
        .await
        .expect("geocode response");
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    let body: serde_json::Value = resp.json().await.expect("relayed json");
    assert_eq!(
        body["features"][0]["place_name"].as_str(),
        Some("Kyoto, Japan")
    );

    server.shutdown().await;
    upstream_server.abort();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn cors_preflight_allows_browser_clients() {
    let server = start_server(GeocodeConfig::default()).await;
    let client = reqwest::Client::new();

    let preflight = client
        .request(
            reqwest::Method::OPTIONS,
            format!("{}/geocode", server.base_url),
        )
        .header("Origin", "http://localhost:5173")
        .header("Access-Control-Request-Method", "POST")
        .header(
            "Access-Control-Request-Headers",
            "authorization, content-type",
        )
        .send()
        .await
        .expect("preflight response");
    assert!(preflight.status().is_success());
    assert_eq!(
        preflight
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
    let allowed_headers = preflight
        .headers()
        .get("access-control-allow-headers")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_ascii_lowercase();
    assert!(allowed_headers.contains("authorization"));
    assert!(allowed_headers.contains("x-client-info"));

    server.shutdown().await;
}
