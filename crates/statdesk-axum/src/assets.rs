//! Static asset routing with SPA fallback.
//!
//! A request is served from the document root only when its path has a
//! recognized extension and names an existing file. Everything else gets the
//! entry document, so client-side routes like `/dashboard` load the shell.
//! The chosen file is streamed by `ServeFile`, which also answers range and
//! conditional requests; the content type always comes from the fixed table.

use std::fmt;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use statdesk_core::AssetConfig;
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

use crate::mime::content_type_for;

const ENTRY_CONTENT_TYPE: &str = "text/html";

#[derive(Debug)]
struct AssetState {
    root: PathBuf,
    entry: PathBuf,
}

/// Router serving `config.document_root`.
pub fn asset_router(config: &AssetConfig) -> Router {
    let state = Arc::new(AssetState {
        root: config.document_root.clone(),
        entry: config.entry_path(),
    });

    Router::new()
        .fallback(serve_asset)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn serve_asset(State(state): State<Arc<AssetState>>, request: Request) -> Response {
    let method = request.method();
    if method != Method::GET && method != Method::HEAD {
        return (
            StatusCode::METHOD_NOT_ALLOWED,
            [(header::ALLOW, HeaderValue::from_static("GET, HEAD"))],
        )
            .into_response();
    }

    let url_path = request.uri().path().to_string();
    if let Some(path) = resolve_request_path(&state.root, &url_path) {
        if let Some(content_type) = content_type_for(&path) {
            match tokio::fs::metadata(&path).await {
                Ok(meta) if meta.is_file() => {
                    return serve_file(&path, content_type, request).await;
                }
                Ok(_) => {}
                Err(e) if is_absent(&e) => {}
                Err(e) => return read_failure(&path, &e),
            }
        }
    }

    debug!(path = %url_path, "Serving entry document");
    serve_file(&state.entry, ENTRY_CONTENT_TYPE, request).await
}

/// Map a URL path onto the document root.
///
/// Returns `None` for the root path, undecodable paths, and anything that
/// would leave the document root.
fn resolve_request_path(root: &Path, url_path: &str) -> Option<PathBuf> {
    let decoded = urlencoding::decode(url_path).ok()?;
    let relative = Path::new(decoded.trim_start_matches('/'));

    let mut resolved = root.to_path_buf();
    let mut depth = 0usize;
    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                resolved.push(part);
                depth += 1;
            }
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    (depth > 0).then_some(resolved)
}

fn is_absent(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}

async fn serve_file(path: &Path, content_type: &'static str, request: Request) -> Response {
    match ServeFile::new(path).oneshot(request).await {
        Ok(response)
            if matches!(
                response.status(),
                StatusCode::NOT_FOUND | StatusCode::INTERNAL_SERVER_ERROR
            ) =>
        {
            // ServeFile answers open and read errors without their cause
            match tokio::fs::File::open(path).await {
                Err(e) => read_failure(path, &e),
                Ok(_) => read_failure(path, &response.status()),
            }
        }
        Ok(mut response) => {
            if response.status().is_success() {
                response
                    .headers_mut()
                    .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
            }
            response.map(Body::new)
        }
        Err(e) => read_failure(path, &e),
    }
}

fn read_failure(path: &Path, cause: &dyn fmt::Display) -> Response {
    error!(path = %path.display(), error = %cause, "Failed to read asset");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("Failed to read {}: {cause}", path.display()),
    )
        .into_response()
}
