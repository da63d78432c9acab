use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use serde_json::{json, Value};
use video_search_proxy::config::Secret;
use video_search_proxy::server::{routes, MAX_BODY_BYTES};
use video_search_proxy::{Config, HttpUpstream, SearchProxy};
use warp::http::StatusCode;
use warp::Filter;

const SEARCH_KEY: &str = "it-search-key";
const LOOKUP_KEY: &str = "it-lookup-key";

/// Minimal stand-in for the YouTube Data API on an ephemeral port.
fn spawn_stub_upstream() -> SocketAddr {
    let search = warp::path!("youtube" / "v3" / "search")
        .and(warp::query::<HashMap<String, String>>())
        .map(|params: HashMap<String, String>| {
            let authorized = params.get("key").map(String::as_str) == Some(SEARCH_KEY);
            warp::reply::json(&json!({
                "kind": "youtube#searchListResponse",
                "authorized": authorized,
                "items": [{ "snippet": { "title": params.get("q") } }],
            }))
        });

    let videos = warp::path!("youtube" / "v3" / "videos").map(|| {
        warp::reply::with_status(
            warp::reply::json(&json!({ "error": { "code": 404, "message": "not found" } })),
            StatusCode::NOT_FOUND,
        )
    });

    let channels = warp::path!("youtube" / "v3" / "channels").map(|| "<html>oops</html>");

    let (addr, server) = warp::serve(search.or(videos).or(channels)).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);
    addr
}

fn proxy_for(addr: SocketAddr) -> Arc<SearchProxy<HttpUpstream>> {
    let mut config = Config::default();
    config.upstream.base_url = format!("http://{}/youtube/v3", addr);
    config.credentials.search = Secret::new(SEARCH_KEY);
    config.credentials.lookup = Secret::new(LOOKUP_KEY);
    // Ignore any HTTP(S)_PROXY in the test environment; the stub is local
    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    Arc::new(SearchProxy::new(config, HttpUpstream::with_client(client)))
}

fn json_body(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap()
}

#[tokio::test]
async fn test_search_round_trip_through_http_upstream() {
    let api = routes(proxy_for(spawn_stub_upstream()));

    let response = warp::test::request()
        .method("GET")
        .path("/api/youtube-search?q=lofi%20beats&type=search")
        .reply(&api)
        .await;

    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
    let body = json_body(response.body());
    assert_eq!(body["authorized"], json!(true));
    assert_eq!(body["items"][0]["snippet"]["title"], json!("lofi beats"));
}

#[tokio::test]
async fn test_upstream_status_is_relayed() {
    let api = routes(proxy_for(spawn_stub_upstream()));

    let response = warp::test::request()
        .method("POST")
        .path("/")
        .body(r#"{"query":"abc123","type":"video"}"#)
        .reply(&api)
        .await;

    assert_eq!(response.status(), 404);
    assert_eq!(
        json_body(response.body()),
        json!({
            "error": "YouTube API error",
            "details": { "error": { "code": 404, "message": "not found" } }
        })
    );
}

#[tokio::test]
async fn test_undecodable_upstream_body_does_not_leak_key() {
    let api = routes(proxy_for(spawn_stub_upstream()));

    let response = warp::test::request()
        .method("POST")
        .path("/")
        .body(r#"{"query":"UC123","type":"channel"}"#)
        .reply(&api)
        .await;

    assert_eq!(response.status(), 500);
    let body = json_body(response.body());
    assert_eq!(body["error"], json!("Server error"));
    assert!(!body.to_string().contains(LOOKUP_KEY));
}

#[tokio::test]
async fn test_preflight_and_health() {
    let api = routes(proxy_for(spawn_stub_upstream()));

    let response = warp::test::request()
        .method("OPTIONS")
        .path("/api/youtube-search")
        .reply(&api)
        .await;
    assert_eq!(response.status(), 200);
    assert!(response.body().is_empty());
    assert_eq!(
        response.headers()["access-control-allow-methods"],
        "GET, POST, OPTIONS"
    );

    let response = warp::test::request()
        .method("GET")
        .path("/health")
        .reply(&api)
        .await;
    assert_eq!(response.status(), 200);
    let body = json_body(response.body());
    assert_eq!(body["data"]["credentials"], json!({ "search": true, "lookup": true }));
}

#[tokio::test]
async fn test_oversized_body_is_refused_unread() {
    let api = routes(proxy_for(spawn_stub_upstream()));

    let padding = "x".repeat(MAX_BODY_BYTES as usize);
    let response = warp::test::request()
        .method("POST")
        .path("/")
        .body(format!(r#"{{"query":"cats","pad":"{}"}}"#, padding))
        .reply(&api)
        .await;

    assert_eq!(response.status(), 413);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
    assert_eq!(json_body(response.body()), json!({ "error": "Request body too large" }));

    let response = warp::test::request()
        .method("POST")
        .path("/")
        .header("transfer-encoding", "chunked")
        .reply(&api)
        .await;
    assert_eq!(response.status(), 411);

    // A body within the limit still goes through
    let response = warp::test::request()
        .method("POST")
        .path("/")
        .body(format!(r#"{{"query":"cats","pad":"{}"}}"#, "x".repeat(1024)))
        .reply(&api)
        .await;
    assert_eq!(response.status(), 200);
}
