//! The stored document, which is always read and overwritten as a whole.

use axum::{
    extract::{FromRequest, Request, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response as AxumResponse},
};
use axum_macros::debug_handler;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    api::{self, auth::authenticate, Json, Response},
    document::{Document, VersionToken},
    upstream::Fetched,
    AppState,
};

/// Handles every request to this API route, dispatching on its method.
///
/// Preflight requests succeed without authentication. Any other request must carry the shared
/// secret before its method is even considered.
#[debug_handler(state = AppState)]
pub(crate) async fn handler(State(state): State<AppState>, request: Request) -> AxumResponse {
    if request.method() == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }

    match dispatch(&state, request).await {
        Ok(response) => response,
        Err(error) => error.into_response(),
    }
}

/// Authenticates a non-preflight request and routes it to the handler for its method.
///
/// # Errors
///
/// See [`crate::api::Error`].
async fn dispatch(state: &AppState, request: Request) -> Result<AxumResponse, api::Error> {
    authenticate(request.headers(), &state.config.password)?;

    match *request.method() {
        Method::GET => Ok(get(state).await.into_response()),
        Method::PUT => {
            let Json(body) = Json::<PutRequest>::from_request(request, state).await?;

            Ok(put(state, body).await.into_response())
        }
        _ => Err(api::Error::MethodNotAllowed),
    }
}

/// Reads the stored document. If none has been written yet, both fields of the response are null.
///
/// # Errors
///
/// See [`crate::api::Error`].
async fn get(state: &AppState) -> Response<GetResponse> {
    let fetched = state.contents.get_file().await.map_err(|error| {
        warn!(%error, "failed to load document");
        api::Error::UpstreamRead
    })?;

    let body = match fetched {
        Fetched::Found(file) => GetResponse {
            data: file.document,
            sha: Some(file.sha),
        },
        Fetched::Empty => GetResponse {
            data: Document::Null,
            sha: None,
        },
    };

    Ok((StatusCode::OK, Json(body)))
}

/// A `GET` response body for this API route.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GetResponse {
    /// The stored document, or null if there isn't one.
    pub(crate) data: Document,

    /// The stored document's version, or null if there isn't one.
    pub(crate) sha: Option<VersionToken>,
}

/// A `PUT` request body for this API route.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PutRequest {
    /// The document to store.
    pub(crate) data: Document,

    /// The version of the document this one replaces. Omitted, null, or empty if the client
    /// believes no document has been stored yet.
    #[serde(default)]
    pub(crate) sha: Option<VersionToken>,
}

/// Overwrites the stored document, as long as it hasn't changed since the version the client
/// last saw.
///
/// # Errors
///
/// See [`crate::api::Error`].
async fn put(state: &AppState, body: PutRequest) -> Response<PutResponse> {
    let sha = body.sha.filter(|sha| !sha.is_empty());

    let sha = state
        .contents
        .put_file(&body.data, sha.as_ref())
        .await
        .map_err(|error| {
            warn!(%error, "failed to save document");
            api::Error::UpstreamWrite(error.into_upstream_text())
        })?;

    Ok((StatusCode::OK, Json(PutResponse { sha })))
}

/// A `PUT` response body for this API route.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PutResponse {
    /// The version of the newly stored document, to send with the next write.
    pub(crate) sha: VersionToken,
}
