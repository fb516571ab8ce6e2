use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Method, StatusCode, Uri},
    middleware,
    response::{IntoResponse, Response},
    Router,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::AppError;

const INDEX_FILE: &str = "index.html";

/// Serves the client bundle from a directory. No API routes.
pub struct StaticServer {
    port: u16,
    root: PathBuf,
}

impl StaticServer {
    pub fn new(port: u16, root: impl Into<PathBuf>) -> Self {
        Self {
            port,
            root: root.into(),
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .fallback(serve_asset)
            .layer(middleware::map_response(allow_any_origin))
            .with_state(Arc::new(self.root.clone()))
    }

    pub async fn start(&self, cancel: CancellationToken) -> Result<(), AppError> {
        info!(
            "Serving {} on port {}",
            self.root.display(),
            self.port
        );
        let listener = TcpListener::bind(("0.0.0.0", self.port))
            .await
            .map_err(|e| AppError::Bind(e, self.port))?;

        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move { cancel.cancelled().await })
            .await?;
        info!("Static server stopped");
        Ok(())
    }
}

async fn allow_any_origin(mut response: Response) -> Response {
    response.headers_mut().insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    response
}

async fn serve_asset(State(root): State<Arc<PathBuf>>, method: Method, uri: Uri) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return (
            StatusCode::METHOD_NOT_ALLOWED,
            [(header::ALLOW, "GET, HEAD")],
        )
            .into_response();
    }

    let Some(relative) = resolve(uri.path()) else {
        warn!("Rejected path outside static root: {}", uri.path());
        return StatusCode::FORBIDDEN.into_response();
    };

    let mut path = root.join(relative);
    if tokio::fs::metadata(&path).await.is_ok_and(|m| m.is_dir()) {
        path.push(INDEX_FILE);
    }

    match tokio::fs::read(&path).await {
        Ok(contents) => {
            debug!("{} {}", method, uri.path());
            let length = contents.len();
            let body = if method == Method::HEAD {
                Body::empty()
            } else {
                Body::from(contents)
            };
            (
                [
                    (header::CONTENT_TYPE, content_type(&path).to_string()),
                    (header::CONTENT_LENGTH, length.to_string()),
                ],
                body,
            )
                .into_response()
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            warn!("Failed to read {}: {}", path.display(), e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Maps a request path to a path relative to the static root. Returns `None`
/// for anything that would climb out of it.
fn resolve(request_path: &str) -> Option<PathBuf> {
    let mut relative = PathBuf::new();
    for segment in request_path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return None,
            s if s.contains('\\') || s.contains('\0') => return None,
            s => relative.push(s),
        }
    }
    if relative.as_os_str().is_empty() {
        relative.push(INDEX_FILE);
    }
    Some(relative)
}

fn content_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match extension.as_deref() {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("js") | Some("mjs") => "text/javascript; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("wasm") => "application/wasm",
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use tower::ServiceExt;

    fn site() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("hoop-coach-site-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(dir.join("js")).unwrap();
        std::fs::write(dir.join("index.html"), "<html>coach</html>").unwrap();
        std::fs::write(dir.join("js").join("app.js"), "console.log(1);").unwrap();
        dir
    }

    async fn send(router: Router, method: Method, uri: &str) -> Response {
        router
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_root_serves_index_with_cors() {
        let dir = site();
        let router = StaticServer::new(0, &dir).router();

        let response = send(router, Method::GET, "/").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/html; charset=utf-8"
        );
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"<html>coach</html>");

        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn test_nested_asset_and_head() {
        let dir = site();
        let server = StaticServer::new(0, &dir);

        let response = send(server.router(), Method::GET, "/js/app.js").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/javascript; charset=utf-8"
        );

        let response = send(server.router(), Method::HEAD, "/js/app.js").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "15");
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(body.is_empty());

        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn test_missing_traversal_and_method() {
        let dir = site();
        let server = StaticServer::new(0, &dir);

        let missing = send(server.router(), Method::GET, "/nope.css").await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        assert_eq!(missing.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");

        let escape = send(server.router(), Method::GET, "/js/../../secret").await;
        assert_eq!(escape.status(), StatusCode::FORBIDDEN);

        let post = send(server.router(), Method::POST, "/").await;
        assert_eq!(post.status(), StatusCode::METHOD_NOT_ALLOWED);

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_resolve() {
        assert_eq!(resolve("/"), Some(PathBuf::from("index.html")));
        assert_eq!(resolve("/a/./b.png"), Some(PathBuf::from("a/b.png")));
        assert_eq!(resolve("/../etc/passwd"), None);
        assert_eq!(content_type(Path::new("clip.WEBM")), "video/webm");
        assert_eq!(content_type(Path::new("model.bin")), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_start_reports_bind_failure_and_stops_on_cancel() {
        let occupied = std::net::TcpListener::bind("0.0.0.0:0").unwrap();
        let port = occupied.local_addr().unwrap().port();
        let server = StaticServer::new(port, std::env::temp_dir());
        let err = server.start(CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, AppError::Bind(_, p) if p == port));
        drop(occupied);

        let cancel = CancellationToken::new();
        cancel.cancel();
        let server = StaticServer::new(0, std::env::temp_dir());
        assert!(server.start(cancel).await.is_ok());
    }
}
