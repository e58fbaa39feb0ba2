//! Asset server behaviour, through the router and over real sockets.

use std::fs;
use std::path::Path;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use statdesk_axum::{AssetServerError, asset_router, start_asset_server};
use statdesk_core::AssetConfig;
use tempfile::TempDir;
use tower::ServiceExt;

const INDEX: &str = "<!doctype html><div id=\"app\"></div>";
const APP_JS: &str = "console.log('statdesk');";

/// `<temp>/dist` document root plus a secret file next to it.
fn fixture() -> (TempDir, AssetConfig) {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("dist");
    fs::create_dir_all(root.join("assets")).unwrap();
    fs::write(root.join("index.html"), INDEX).unwrap();
    fs::write(root.join("app.js"), APP_JS).unwrap();
    fs::write(root.join("assets").join("style.css"), "body{}").unwrap();
    fs::write(root.join("assets").join("logo.png"), [0x89, b'P', b'N', b'G']).unwrap();
    fs::write(root.join("my file.json"), "{}").unwrap();
    fs::write(root.join("notes.xyz"), "not served").unwrap();
    fs::write(temp.path().join("secret.js"), "leaked").unwrap();

    let mut config = AssetConfig::new(&root);
    config.port = 0;
    (temp, config)
}

async fn get(config: &AssetConfig, uri: &str) -> (StatusCode, Option<String>, Vec<u8>) {
    request(config, "GET", uri).await
}

async fn request(
    config: &AssetConfig,
    method: &str,
    uri: &str,
) -> (StatusCode, Option<String>, Vec<u8>) {
    let response = asset_router(config)
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string());
    let body = response.into_body().collect().await.unwrap().to_bytes().to_vec();
    (status, content_type, body)
}

#[tokio::test]
async fn existing_script_is_served_verbatim() {
    let (_temp, config) = fixture();
    let (status, content_type, body) = get(&config, "/app.js").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("text/javascript"));
    assert_eq!(body, APP_JS.as_bytes());
}

#[tokio::test]
async fn nested_assets_get_their_content_types() {
    let (_temp, config) = fixture();

    let (status, content_type, _) = get(&config, "/assets/style.css").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("text/css"));

    let (status, content_type, body) = get(&config, "/assets/logo.png").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("image/png"));
    assert_eq!(body, [0x89, b'P', b'N', b'G']);
}

#[tokio::test]
async fn client_side_route_gets_entry_document() {
    let (_temp, config) = fixture();
    let (status, content_type, body) = get(&config, "/dashboard").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("text/html"));
    assert_eq!(body, INDEX.as_bytes());
}

#[tokio::test]
async fn root_gets_entry_document() {
    let (_temp, config) = fixture();
    let (status, _, body) = get(&config, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, INDEX.as_bytes());
}

#[tokio::test]
async fn missing_file_with_extension_falls_back() {
    let (_temp, config) = fixture();
    let (status, content_type, body) = get(&config, "/missing.png").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("text/html"));
    assert_eq!(body, INDEX.as_bytes());
}

#[tokio::test]
async fn unknown_extension_falls_back_even_if_file_exists() {
    let (_temp, config) = fixture();
    let (status, content_type, body) = get(&config, "/notes.xyz").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("text/html"));
    assert_eq!(body, INDEX.as_bytes());
}

#[tokio::test]
async fn percent_encoded_names_are_served() {
    let (_temp, config) = fixture();
    let (status, content_type, body) = get(&config, "/my%20file.json").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    assert_eq!(body, b"{}");
}

#[tokio::test]
async fn traversal_never_leaves_document_root() {
    let (_temp, config) = fixture();
    for uri in ["/../secret.js", "/%2e%2e/secret.js", "/assets/%2E%2E/%2E%2E/secret.js"] {
        let (status, content_type, body) = get(&config, uri).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(content_type.as_deref(), Some("text/html"), "{uri}");
        assert_eq!(body, INDEX.as_bytes(), "{uri}");
    }
}

#[tokio::test]
async fn unreadable_entry_document_is_a_500_with_error_text() {
    let temp = TempDir::new().unwrap();
    let mut config = AssetConfig::new(temp.path().join("empty-dist"));
    config.port = 0;

    let (status, _, body) = get(&config, "/dashboard").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let text = String::from_utf8(body).unwrap();
    assert!(text.contains("index.html"), "body was: {text}");
}

#[cfg(unix)]
#[tokio::test]
async fn unreadable_asset_is_a_500_naming_the_file() {
    use std::os::unix::fs::PermissionsExt;

    let (_temp, config) = fixture();
    let script = config.document_root.join("app.js");
    fs::set_permissions(&script, fs::Permissions::from_mode(0o000)).unwrap();
    if fs::read(&script).is_ok() {
        // Privileged users read through file modes
        return;
    }

    let (status, _, body) = get(&config, "/app.js").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let text = String::from_utf8(body).unwrap();
    assert!(text.contains(&script.display().to_string()), "body was: {text}");
}

#[cfg(unix)]
#[tokio::test]
async fn looping_symlink_asset_is_a_500_naming_the_file() {
    let (_temp, config) = fixture();
    let link = config.document_root.join("loop.js");
    std::os::unix::fs::symlink(&link, &link).unwrap();

    let (status, _, body) = get(&config, "/loop.js").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let text = String::from_utf8(body).unwrap();
    assert!(text.contains("loop.js"), "body was: {text}");
}

#[tokio::test]
async fn range_requests_get_partial_content() {
    let (_temp, config) = fixture();
    let clip: Vec<u8> = (0..4096u32).map(|i| u8::try_from(i % 251).unwrap()).collect();
    fs::write(config.document_root.join("clip.mp4"), &clip).unwrap();

    let response = asset_router(&config)
        .oneshot(
            Request::builder()
                .uri("/clip.mp4")
                .header(header::RANGE, "bytes=0-3")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "video/mp4");
    assert_eq!(response.headers()[header::CONTENT_RANGE], "bytes 0-3/4096");
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], &clip[..4]);
}

#[tokio::test]
async fn unchanged_asset_answers_not_modified() {
    let (_temp, config) = fixture();
    let first = asset_router(&config)
        .oneshot(Request::builder().uri("/app.js").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let last_modified = first.headers()[header::LAST_MODIFIED].clone();

    let second = asset_router(&config)
        .oneshot(
            Request::builder()
                .uri("/app.js")
                .header(header::IF_MODIFIED_SINCE, last_modified)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::NOT_MODIFIED);
}

#[tokio::test]
async fn only_get_and_head_are_allowed() {
    let (_temp, config) = fixture();

    let (status, _, _) = request(&config, "POST", "/app.js").await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

    let (status, content_type, _) = request(&config, "HEAD", "/app.js").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("text/javascript"));
}

#[tokio::test]
async fn concurrent_requests_get_their_own_content() {
    let (_temp, config) = fixture();
    let root = config.document_root.clone();
    let big_a = "a".repeat(512 * 1024);
    let big_b = "b".repeat(512 * 1024);
    fs::write(root.join("a.js"), &big_a).unwrap();
    fs::write(root.join("b.css"), &big_b).unwrap();

    let mut binding = start_asset_server(&config).await.unwrap();
    let client = reqwest::Client::new();
    let url = binding.url();

    let mut tasks = Vec::new();
    for _ in 0..4 {
        for name in ["a.js", "b.css"] {
            let client = client.clone();
            let url = format!("{url}{name}");
            tasks.push(tokio::spawn(async move {
                let response = client.get(&url).send().await.unwrap();
                assert_eq!(response.status(), reqwest::StatusCode::OK);
                (name, response.text().await.unwrap())
            }));
        }
    }

    for task in tasks {
        let (name, body) = task.await.unwrap();
        let expected = if name == "a.js" { &big_a } else { &big_b };
        assert_eq!(body.len(), expected.len(), "{name}");
        assert!(&body == expected, "{name} content was interleaved");
    }

    binding.shutdown().await.unwrap();
}

#[tokio::test]
async fn binds_loopback_and_reports_real_port() {
    let (_temp, config) = fixture();
    let mut binding = start_asset_server(&config).await.unwrap();

    assert!(binding.local_addr().ip().is_loopback());
    assert_ne!(binding.local_addr().port(), 0);
    assert!(binding.is_serving());
    assert_eq!(binding.document_root(), Path::new(&config.document_root));

    binding.shutdown().await.unwrap();
}

#[tokio::test]
async fn occupied_port_is_a_bind_failure() {
    let (_temp, mut config) = fixture();
    let blocker = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    config.port = blocker.local_addr().unwrap().port();

    match start_asset_server(&config).await {
        Err(AssetServerError::BindFailed { address, .. }) => {
            assert_eq!(address.port(), config.port);
        }
        other => panic!("expected BindFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn shutdown_frees_the_port_and_is_idempotent() {
    let (_temp, config) = fixture();
    let mut binding = start_asset_server(&config).await.unwrap();
    let addr = binding.local_addr();

    // Serve one request so a connection has existed
    let response = reqwest::get(binding.url()).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    drop(response);

    binding.shutdown().await.unwrap();
    assert!(!binding.is_serving());
    binding.shutdown().await.unwrap();

    let rebound = tokio::net::TcpListener::bind(addr).await;
    assert!(rebound.is_ok(), "port {} still held", addr.port());
}
