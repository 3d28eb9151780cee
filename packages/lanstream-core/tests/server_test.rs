// Integration test for the MediaServer over a real socket.

use std::net::Ipv4Addr;
use std::path::Path;
use std::sync::Arc;

use reqwest::{header, StatusCode};
use tempfile::TempDir;

use lanstream_core::{Config, DirectoryCatalog, LocalFileAccess, MediaServer, StaticIpDetector};

const SONG_SIZE: usize = 100_000;
const ART: &[u8] = b"\xff\xd8\xff\xe0 not really a jpeg";

/// Generate deterministic test content.
fn generate_content(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

/// Media directory with one song that has art and one that has none.
fn media_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "track.mp3", &generate_content(SONG_SIZE));
    write(dir.path(), "track.jpg", ART);
    write(dir.path(), "bare.flac", &generate_content(1_000));
    dir
}

fn write(dir: &Path, name: &str, data: &[u8]) {
    std::fs::write(dir.join(name), data).unwrap();
}

/// Starts a server on an ephemeral port; returns it with its base URL.
async fn start_server(dir: &TempDir) -> (MediaServer, String) {
    let catalog = DirectoryCatalog::scan(dir.path(), false).unwrap();
    let server = MediaServer::new(
        Config {
            port: 0,
            shutdown_grace_secs: 1,
            ..Default::default()
        },
        Arc::new(catalog),
        Arc::new(LocalFileAccess::new()),
        Arc::new(StaticIpDetector::new(Ipv4Addr::LOCALHOST)),
    );
    let url = server.start().await.unwrap();
    (server, url)
}

fn header_str<'a>(resp: &'a reqwest::Response, name: header::HeaderName) -> Option<&'a str> {
    resp.headers().get(name).and_then(|v| v.to_str().ok())
}

#[tokio::test]
async fn full_song_is_served_whole() {
    let dir = media_dir();
    let (server, url) = start_server(&dir).await;

    let resp = reqwest::get(format!("{}/song/track", url)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(header_str(&resp, header::CONTENT_TYPE), Some("audio/mpeg"));
    assert_eq!(header_str(&resp, header::ACCEPT_RANGES), Some("bytes"));
    assert_eq!(header_str(&resp, header::CONTENT_LENGTH), Some("100000"));
    assert!(resp.headers().get(header::CONTENT_RANGE).is_none());

    let body = resp.bytes().await.unwrap();
    assert_eq!(body.as_ref(), generate_content(SONG_SIZE).as_slice());

    server.stop().await;
}

#[tokio::test]
async fn range_requests_return_partial_content() {
    let dir = media_dir();
    let (server, url) = start_server(&dir).await;
    let client = reqwest::Client::new();
    let content = generate_content(SONG_SIZE);

    // Leading bytes
    let resp = client
        .get(format!("{}/song/track", url))
        .header(header::RANGE, "bytes=0-99")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(header_str(&resp, header::CONTENT_RANGE), Some("bytes 0-99/100000"));
    assert_eq!(header_str(&resp, header::CONTENT_LENGTH), Some("100"));
    let body = resp.bytes().await.unwrap();
    assert_eq!(body.as_ref(), &content[..100]);

    // Suffix
    let resp = client
        .get(format!("{}/song/track", url))
        .header(header::RANGE, "bytes=-500")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        header_str(&resp, header::CONTENT_RANGE),
        Some("bytes 99500-99999/100000")
    );
    let body = resp.bytes().await.unwrap();
    assert_eq!(body.as_ref(), &content[99_500..]);

    // Open-ended from the middle
    let resp = client
        .get(format!("{}/song/track", url))
        .header(header::RANGE, "bytes=50000-")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        header_str(&resp, header::CONTENT_RANGE),
        Some("bytes 50000-99999/100000")
    );
    assert_eq!(resp.bytes().await.unwrap().len(), 50_000);

    server.stop().await;
}

#[tokio::test]
async fn bad_ranges_are_rejected() {
    let dir = media_dir();
    let (server, url) = start_server(&dir).await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{}/song/track", url))
        .header(header::RANGE, "bytes=200000-")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::RANGE_NOT_SATISFIABLE);
    assert_eq!(header_str(&resp, header::CONTENT_RANGE), Some("bytes */100000"));

    let resp = client
        .get(format!("{}/song/track", url))
        .header(header::RANGE, "bytes=abc")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["status"], 400);

    server.stop().await;
}

#[tokio::test]
async fn unknown_ids_and_missing_art_are_not_found() {
    let dir = media_dir();
    let (server, url) = start_server(&dir).await;

    let resp = reqwest::get(format!("{}/song/abc", url)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = reqwest::get(format!("{}/art/bare", url)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = reqwest::get(format!("{}/song/", url)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    server.stop().await;
}

#[tokio::test]
async fn art_is_served_whole() {
    let dir = media_dir();
    let (server, url) = start_server(&dir).await;

    let resp = reqwest::get(format!("{}/art/track", url)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(header_str(&resp, header::CONTENT_TYPE), Some("image/jpeg"));
    assert_eq!(resp.bytes().await.unwrap().as_ref(), ART);

    server.stop().await;
}

#[tokio::test]
async fn health_reports_advertised_address() {
    let dir = media_dir();
    let (server, url) = start_server(&dir).await;

    let resp = reqwest::get(format!("{}/health", url)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["address"], url.as_str());

    server.stop().await;
    assert!(reqwest::get(format!("{}/health", url)).await.is_err());
}
