//! Common code for tests: an in-memory stand-in for the storage provider's contents API, and a
//! configuration pointing at it.

use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use crate::{
    config::{Config, RemoteLocation, Secret, UpstreamConfig},
    document::{self, Document, VersionToken},
    AppState,
};

/// The shared secret requests must present in tests.
pub(crate) const PASSWORD: &str = "correct horse battery staple";

/// The token the mock provider accepts.
pub(crate) const TOKEN: &str = "test-token";

/// The commit message configured in tests.
pub(crate) const COMMIT_MESSAGE: &str = "Update Pour Decisions data";

/// Returns a configuration for a document stored on the provider at `api_url`.
pub(crate) fn config(api_url: &str) -> Config {
    Config {
        address: "127.0.0.1:0".to_owned(),
        password: Secret::from(PASSWORD),
        upstream: UpstreamConfig {
            api_url: api_url.to_owned(),
            token: Secret::from(TOKEN),
            location: RemoteLocation {
                owner: "owner".to_owned(),
                repo: "repo".to_owned(),
                path: "data.json".to_owned(),
            },
            commit_message: COMMIT_MESSAGE.to_owned(),
        },
    }
}

/// Returns an [`AppState`] for a document stored on the provider at `api_url`.
///
/// # Errors
///
/// Fails if the HTTP client can't be built.
pub(crate) fn state(api_url: &str) -> anyhow::Result<AppState> {
    Ok(AppState::new(config(api_url))?)
}

/// The body the mock provider sends when a write's sha doesn't match the stored file.
pub(crate) fn conflict_body(sha: &VersionToken) -> String {
    json!({
        "message": format!("data.json does not match {sha}"),
        "status": "409",
    })
    .to_string()
}

/// The body the mock provider sends when a write omits the sha of an existing file.
pub(crate) fn missing_sha_body() -> String {
    json!({
        "message": "Invalid request.\n\n\"sha\" wasn't supplied.",
        "status": "422",
    })
    .to_string()
}

/// An in-memory contents API holding at most one file, with the provider's version checks.
#[derive(Clone, Default, Debug)]
pub(crate) struct MockContents {
    /// The mock's state, shared with its server.
    inner: Arc<Mutex<MockState>>,
}

/// See [`MockContents`].
#[derive(Default, Debug)]
struct MockState {
    /// The stored file's Base64 content and version, if it exists.
    file: Option<(String, VersionToken)>,

    /// How many versions have been written, for generating unique shas.
    versions: usize,

    /// How many requests the mock has received.
    requests: usize,

    /// The body of the most recent write request.
    last_write: Option<Value>,

    /// Whether reads should fail with a server error.
    failing_reads: bool,

    /// Whether successful writes should leave the new sha out of their responses.
    omitting_written_sha: bool,
}

impl MockState {
    /// Stores new Base64 content, returning its new version.
    fn store(&mut self, content: String) -> VersionToken {
        self.versions += 1;
        let sha = VersionToken::from(format!("sha-{}", self.versions));

        self.file = Some((content, sha.clone()));
        sha
    }
}

impl MockContents {
    /// Starts serving a new mock on an ephemeral local port, returning it with its API origin.
    ///
    /// # Errors
    ///
    /// Fails if no local port can be bound.
    pub(crate) async fn serve() -> anyhow::Result<(Self, String)> {
        let mock = Self::default();

        let router = Router::new()
            .route(
                "/repos/:owner/:repo/contents/*path",
                get(read_file).put(write_file),
            )
            .with_state(mock.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let address = listener.local_addr()?;

        tokio::spawn(async move { axum::serve(listener, router).await });

        Ok((mock, format!("http://{address}")))
    }

    /// Locks the mock's state.
    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.inner
            .lock()
            .expect("mock state shouldn't be poisoned")
    }

    /// Stores a document directly, returning its version.
    pub(crate) fn set_document(&self, document: &Document) -> VersionToken {
        self.lock().store(document::encode(document))
    }

    /// Stores raw file content directly, valid or not, returning its version.
    pub(crate) fn set_content(&self, content: &str) -> VersionToken {
        self.lock().store(content.to_owned())
    }

    /// Makes all subsequent successful writes respond without the new file's sha.
    pub(crate) fn omit_written_sha(&self) {
        self.lock().omitting_written_sha = true;
    }

    /// Makes all subsequent reads fail with `500 Internal Server Error`.
    pub(crate) fn fail_reads(&self) {
        self.lock().failing_reads = true;
    }

    /// Gets how many requests the mock has received.
    pub(crate) fn request_count(&self) -> usize {
        self.lock().requests
    }

    /// Gets the body of the most recent write request.
    pub(crate) fn last_write(&self) -> Option<Value> {
        self.lock().last_write.clone()
    }

    /// Gets the version of the stored file, if it exists.
    pub(crate) fn current_sha(&self) -> Option<VersionToken> {
        self.lock().file.as_ref().map(|(_, sha)| sha.clone())
    }
}

/// Returns whether a request carries the token the mock accepts.
fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(AUTHORIZATION)
        .is_some_and(|value| value == format!("token {TOKEN}").as_str())
}

/// Returns the response the provider sends for a bad token.
fn bad_credentials() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "message": "Bad credentials", "status": "401" })),
    )
        .into_response()
}

/// Handles a request to read the file.
async fn read_file(State(mock): State<MockContents>, headers: HeaderMap) -> Response {
    let mut state = mock.lock();
    state.requests += 1;

    if !authorized(&headers) {
        return bad_credentials();
    }

    if state.failing_reads {
        return (StatusCode::INTERNAL_SERVER_ERROR, "Server Error").into_response();
    }

    let Some((content, sha)) = &state.file else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "Not Found", "status": "404" })),
        )
            .into_response();
    };

    // The provider breaks Base64 content into lines of 60 characters.
    let wrapped: String = content
        .as_bytes()
        .chunks(60)
        .map(|line| format!("{}\n", String::from_utf8_lossy(line)))
        .collect();

    Json(json!({
        "type": "file",
        "encoding": "base64",
        "name": "data.json",
        "path": "data.json",
        "content": wrapped,
        "sha": sha,
    }))
    .into_response()
}

/// Handles a request to create or update the file.
async fn write_file(
    State(mock): State<MockContents>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut state = mock.lock();
    state.requests += 1;
    state.last_write = Some(body.clone());

    if !authorized(&headers) {
        return bad_credentials();
    }

    let Some(content) = body["content"].as_str() else {
        return (StatusCode::UNPROCESSABLE_ENTITY, "content wasn't supplied").into_response();
    };

    let current_sha = state.file.as_ref().map(|(_, sha)| sha.clone());

    match (body["sha"].as_str(), current_sha) {
        (None, Some(_)) => {
            return (StatusCode::UNPROCESSABLE_ENTITY, missing_sha_body()).into_response();
        }
        (Some(supplied), current) if current.as_deref().map(String::as_str) != Some(supplied) => {
            let supplied = VersionToken::from(supplied.to_owned());
            return (StatusCode::CONFLICT, conflict_body(&supplied)).into_response();
        }
        _ => {}
    }

    let status = if state.file.is_some() {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };

    let sha = state.store(content.to_owned());

    if state.omitting_written_sha {
        return (
            status,
            Json(json!({
                "content": { "name": "data.json", "path": "data.json" },
                "commit": { "message": body["message"] },
            })),
        )
            .into_response();
    }

    (
        status,
        Json(json!({
            "content": { "name": "data.json", "path": "data.json", "sha": sha },
            "commit": { "message": body["message"] },
        })),
    )
        .into_response()
}
