// edge.rs - Edge routing surface
//
// The routing the CDN edge performs in front of the single-page app:
// - "/" redirects (302) to a freshly generated board path "/w/{uuid}"
// - "/w/*" serves the SPA index while the browser-visible path stays
//   on the board URL
// - everything else passes through to the static root unchanged

use axum::{
    extract::State,
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

struct EdgeState {
    static_root: PathBuf,
}

/// Build the edge router over a static file root
pub fn build_router(static_root: PathBuf) -> Router {
    let state = Arc::new(EdgeState { static_root });
    Router::new()
        .route("/", get(redirect_to_new_board))
        .route("/w/*board", get(serve_app))
        .fallback(static_passthrough)
        .with_state(state)
}

/// GET / - mint a board identifier and send the browser to it
async fn redirect_to_new_board() -> Response {
    let identifier = Uuid::new_v4();
    debug!(%identifier, "redirecting to new board");
    (StatusCode::FOUND, [(header::LOCATION, format!("/w/{}", identifier))]).into_response()
}

/// GET /w/* - rewrite to the SPA index, path untouched in the browser
async fn serve_app(State(state): State<Arc<EdgeState>>) -> Response {
    serve_file(&state.static_root, "index.html").await
}

/// Any other path - static file passthrough
async fn static_passthrough(State(state): State<Arc<EdgeState>>, uri: Uri) -> Response {
    let relative = uri.path().trim_start_matches('/');
    if relative.is_empty() || relative.split('/').any(|segment| segment == "..") {
        return (StatusCode::NOT_FOUND, "not found").into_response();
    }
    serve_file(&state.static_root, relative).await
}

async fn serve_file(root: &Path, relative: &str) -> Response {
    let path = root.join(relative);
    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            ([(header::CONTENT_TYPE, content_type_for(relative))], bytes).into_response()
        }
        Err(_) => (StatusCode::NOT_FOUND, "not found").into_response(),
    }
}

fn content_type_for(path: &str) -> &'static str {
    match path.rsplit('.').next() {
        Some("html") => "text/html; charset=utf-8",
        Some("js") => "application/javascript",
        Some("css") => "text/css",
        Some("json") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    async fn spawn_edge() -> (String, tempfile::TempDir) {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("index.html"), "<html>slateboard app</html>").unwrap();
        std::fs::create_dir(root.path().join("static")).unwrap();
        std::fs::write(root.path().join("static/app.js"), "console.log('app');").unwrap();

        let router = build_router(root.path().to_path_buf());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        (format!("http://{}", addr), root)
    }

    fn no_redirect_client() -> reqwest::Client {
        reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_root_redirects_to_uuid_board_path() {
        let (endpoint, _root) = spawn_edge().await;
        let response = no_redirect_client().get(&endpoint).send().await.unwrap();
        assert_eq!(response.status(), 302);

        let location = response.headers()[header::LOCATION].to_str().unwrap();
        assert!(location.starts_with("/w/"));
        let identifier = &location[3..];
        assert_eq!(identifier.len(), 36);
        assert!(Uuid::parse_str(identifier).is_ok());
    }

    #[tokio::test]
    async fn test_board_paths_serve_the_app_index() {
        let (endpoint, _root) = spawn_edge().await;
        let response = no_redirect_client()
            .get(format!("{}/w/anything-goes-here", endpoint))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        assert!(response.text().await.unwrap().contains("slateboard app"));
    }

    #[tokio::test]
    async fn test_static_files_pass_through_unmodified() {
        let (endpoint, _root) = spawn_edge().await;
        let response = no_redirect_client()
            .get(format!("{}/static/app.js", endpoint))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/javascript");
        assert_eq!(response.text().await.unwrap(), "console.log('app');");
    }

    #[tokio::test]
    async fn test_missing_static_file_is_404() {
        let (endpoint, _root) = spawn_edge().await;
        let response = no_redirect_client()
            .get(format!("{}/static/missing.js", endpoint))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 404);
    }

    #[tokio::test]
    async fn test_parent_traversal_rejected() {
        // reqwest normalizes dot segments client-side, so speak raw HTTP
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        let (endpoint, _root) = spawn_edge().await;
        let addr = endpoint.trim_start_matches("http://").to_string();

        let mut stream = tokio::net::TcpStream::connect(&addr).await.unwrap();
        stream
            .write_all(
                b"GET /static/../index.html HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
            )
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        assert!(response.starts_with("HTTP/1.1 404"), "got: {}", response);
    }
}
