//! Axum route handlers for the companion HTTP server.
//!
//! # Routes
//!
//! - `GET  /health`           : Returns `{"status": "ok", "version": ..., "service": ...}`
//! - `GET  /characters`       : List character cards
//! - `GET  /characters/:id`   : Card record plus full card JSON
//! - `GET  /lorebooks`        : List lorebook summaries
//! - `GET  /lorebooks/*id`    : Lorebook with normalized entries
//! - `GET  /groups`           : List groups
//! - `GET  /groups/:id`       : Group with resolved members
//! - `GET  /personas`         : Persona names
//! - `POST /set-chat`         : Store the extension's chat history
//! - `GET  /get-chat`         : Last stored chat history
//! - `POST /queue-message`    : Queue a message for the extension
//! - `GET  /queued-messages`  : Drain queued messages
//! - `GET  /assets/*path`     : Published files (cards, avatars, group images)

use std::sync::Arc;

use axum::{
    extract::{Path, Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use tower_http::cors::CorsLayer;
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::error::LibraryError;
use crate::library::Library;
use crate::relay::ChatRelay;

/// Shared application state for the HTTP server.
#[derive(Clone)]
pub struct AppState {
    /// Read-only view over the data directory.
    pub library: Arc<Library>,
    /// Chat history and outbound queue shared with the extension.
    pub relay: Arc<ChatRelay>,
}

impl AppState {
    pub fn new(library: Library) -> Self {
        Self {
            library: Arc::new(library),
            relay: Arc::new(ChatRelay::new()),
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(Library::new(config.asset_resolver()))
    }
}

/// Build the axum router with all routes.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/characters", get(list_characters_handler))
        .route("/characters/:id", get(get_character_handler))
        .route("/lorebooks", get(list_lorebooks_handler))
        .route("/lorebooks/*id", get(get_lorebook_handler))
        .route("/groups", get(list_groups_handler))
        .route("/groups/:id", get(get_group_handler))
        .route("/personas", get(list_personas_handler))
        .route("/set-chat", post(set_chat_handler))
        .route("/get-chat", get(get_chat_handler))
        .route("/queue-message", post(queue_message_handler))
        .route("/queued-messages", get(queued_messages_handler))
        .route("/assets/*path", get(asset_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

type ApiError = (StatusCode, Json<Value>);

fn library_error(error: LibraryError) -> ApiError {
    let status = match &error {
        LibraryError::BadPath(_) => StatusCode::BAD_REQUEST,
        LibraryError::NotFound(_) => StatusCode::NOT_FOUND,
        LibraryError::BadJson { .. } | LibraryError::NoEmbeddedData(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        LibraryError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(serde_json::json!({
            "error": error.to_string(),
            "kind": error.kind(),
        })),
    )
}

/// Run a synchronous library call on the blocking pool.
async fn with_library<T, F>(state: &AppState, call: F) -> Result<Json<T>, ApiError>
where
    T: Serialize + Send + 'static,
    F: FnOnce(&Library) -> crate::error::Result<T> + Send + 'static,
{
    let library = state.library.clone();
    match tokio::task::spawn_blocking(move || call(library.as_ref())).await {
        Ok(Ok(value)) => Ok(Json(value)),
        Ok(Err(error)) => Err(library_error(error)),
        Err(join_error) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({
                "error": format!("Library call panicked: {}", join_error),
                "kind": "internal",
            })),
        )),
    }
}

/// GET /health: liveness probe.
async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION,
        "service": "tavern-companion",
    }))
}

// ---------------------------------------------------------------------------
// Library handlers
// ---------------------------------------------------------------------------

async fn list_characters_handler(State(state): State<AppState>) -> impl IntoResponse {
    with_library(&state, |library| library.list_characters()).await
}

async fn get_character_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    with_library(&state, move |library| library.get_character(&id)).await
}

async fn list_lorebooks_handler(State(state): State<AppState>) -> impl IntoResponse {
    with_library(&state, |library| library.list_lorebooks()).await
}

/// GET /lorebooks/*id: `id` may contain a slash (`Foo/lorebook.json`).
async fn get_lorebook_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    with_library(&state, move |library| library.get_lorebook(&id)).await
}

async fn list_groups_handler(State(state): State<AppState>) -> impl IntoResponse {
    with_library(&state, |library| library.list_groups()).await
}

async fn get_group_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    with_library(&state, move |library| library.get_group(&id)).await
}

async fn list_personas_handler(State(state): State<AppState>) -> impl IntoResponse {
    with_library(&state, |library| library.list_personas()).await
}

/// GET /assets/*path: serve one published file.
///
/// Only files the asset resolver would publish are reachable; everything
/// else under the data root is a 404.
async fn asset_handler(
    State(state): State<AppState>,
    Path(path): Path<String>,
    request: Request,
) -> Response {
    let library = state.library.clone();
    let file = tokio::task::spawn_blocking(move || library.assets().published_file(&path))
        .await
        .ok()
        .flatten();
    match file {
        Some(file) => ServeFile::new(file).oneshot(request).await.into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

// ---------------------------------------------------------------------------
// Relay handlers
// ---------------------------------------------------------------------------

/// POST /set-chat: replace the stored chat history with the request body.
async fn set_chat_handler(State(state): State<AppState>, Json(chat): Json<Value>) -> &'static str {
    state.relay.set_chat(chat);
    "Chat history received and stored successfully"
}

async fn get_chat_handler(State(state): State<AppState>) -> Json<Value> {
    Json(state.relay.chat())
}

/// POST /queue-message: body is typically `{"name": ..., "message": ...}`.
async fn queue_message_handler(
    State(state): State<AppState>,
    Json(message): Json<Value>,
) -> &'static str {
    log::info!("Queued message: {}", message);
    state.relay.enqueue(message);
    "Message queued successfully"
}

/// GET /queued-messages: returns and clears the queue.
async fn queued_messages_handler(State(state): State<AppState>) -> Json<Vec<Value>> {
    Json(state.relay.drain())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetResolver;
    use crate::png::testing::{png, text};
    use axum::body::Body;
    use axum::http::Request;
    use std::fs;

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("characters")).unwrap();
        fs::create_dir_all(root.join("worlds").join("Foo")).unwrap();
        fs::write(
            root.join("characters").join("bob.json"),
            r#"{"name":"Bob","tags":["a"],"description":"d"}"#,
        )
        .unwrap();
        fs::write(
            root.join("characters").join("ann.png"),
            png(&[text("chara", r#"{"name":"Ann"}"#)]),
        )
        .unwrap();
        fs::write(root.join("characters").join("blank.png"), png(&[])).unwrap();
        fs::write(
            root.join("worlds").join("Foo").join("lorebook.json"),
            r#"{"entries":[{"key":["x"]}]}"#,
        )
        .unwrap();
        fs::write(root.join("settings.json"), r#"{"power_user":{"personas":{"u.png":"User"}}}"#)
            .unwrap();
        dir
    }

    fn app(root: &std::path::Path) -> (AppState, Router) {
        let state = AppState::new(Library::new(AssetResolver::new(root)));
        (state.clone(), app_router(state))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let dir = fixture();
        let (_, app) = app(dir.path());
        let (status, json) = get_json(app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert_eq!(json["version"], crate::VERSION);
        assert_eq!(json["service"], "tavern-companion");
    }

    #[tokio::test]
    async fn test_list_characters() {
        let dir = fixture();
        let (_, app) = app(dir.path());
        let (status, json) = get_json(app, "/characters").await;
        assert_eq!(status, StatusCode::OK);
        let list = json.as_array().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0]["name"], "Ann");
        assert_eq!(list[0]["avatar"], "/assets/characters/ann.png");
        assert_eq!(
            list[1],
            serde_json::json!({
                "id": "bob.json",
                "kind": "json",
                "name": "Bob",
                "tags": ["a"],
                "description": "d",
                "avatar": null,
            })
        );
    }

    #[tokio::test]
    async fn test_character_error_statuses() {
        let dir = fixture();
        let (_, app) = app(dir.path());

        let (status, json) = get_json(app.clone(), "/characters/nobody.json").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["kind"], "not_found");

        let (status, json) = get_json(app.clone(), "/characters/blank.png").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json["kind"], "no_embedded_data");

        let (status, json) = get_json(app, "/characters/..%2Fsettings.json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["kind"], "bad_path");
    }

    #[tokio::test]
    async fn test_get_nested_lorebook() {
        let dir = fixture();
        let (_, app) = app(dir.path());
        let (status, json) = get_json(app, "/lorebooks/Foo/lorebook.json").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["id"], "Foo/lorebook.json");
        assert_eq!(json["entries"][0]["keys"], serde_json::json!(["x"]));
    }

    #[tokio::test]
    async fn test_personas_endpoint() {
        let dir = fixture();
        let (_, app) = app(dir.path());
        let (status, json) = get_json(app, "/personas").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, serde_json::json!(["User"]));
    }

    #[tokio::test]
    async fn test_queue_is_drained_on_read() {
        let dir = fixture();
        let (state, app) = app(dir.path());

        for text in ["one", "two"] {
            let request = post_json(
                "/queue-message",
                serde_json::json!({"name": "Ann", "message": text}),
            );
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let (_, json) = get_json(app.clone(), "/queued-messages").await;
        assert_eq!(json.as_array().unwrap().len(), 2);
        assert_eq!(json[1]["message"], "two");

        let (_, json) = get_json(app, "/queued-messages").await;
        assert_eq!(json, serde_json::json!([]));
        assert!(state.relay.drain().is_empty());
    }

    #[tokio::test]
    async fn test_chat_history_round_trip() {
        let dir = fixture();
        let (_, app) = app(dir.path());

        let (_, json) = get_json(app.clone(), "/get-chat").await;
        assert_eq!(json, serde_json::json!([]));

        let chat = serde_json::json!([{"name": "Ann", "mes": "Hello"}]);
        let response = app
            .clone()
            .oneshot(post_json("/set-chat", chat.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let (_, json) = get_json(app, "/get-chat").await;
        assert_eq!(json, chat);
    }

    async fn get_status(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn test_assets_are_served() {
        let dir = fixture();
        let (_, app) = app(dir.path());
        let (status, body) = get_status(app, "/assets/characters/ann.png").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, fs::read(dir.path().join("characters").join("ann.png")).unwrap());
    }

    #[tokio::test]
    async fn test_private_data_files_are_not_served() {
        let dir = fixture();
        fs::write(dir.path().join("secrets.json"), r#"{"api_key_openai":"sk-test"}"#).unwrap();
        let (_, app) = app(dir.path());

        for uri in [
            "/assets/settings.json",
            "/assets/secrets.json",
            "/assets/worlds/Foo/lorebook.json",
            "/assets/characters/..%2Fsecrets.json",
            "/assets/characters/nobody.png",
        ] {
            let (status, body) = get_status(app.clone(), uri).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
            assert!(!String::from_utf8_lossy(&body).contains("sk-test"));
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlinked_asset_outside_root_is_not_served() {
        let dir = fixture();
        let outside = tempfile::tempdir().unwrap();
        fs::write(outside.path().join("secret.txt"), "s3").unwrap();
        std::os::unix::fs::symlink(
            outside.path().join("secret.txt"),
            dir.path().join("characters").join("leak.png"),
        )
        .unwrap();
        let (_, app) = app(dir.path());

        let (status, _) = get_status(app, "/assets/characters/leak.png").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
