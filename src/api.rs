//! The HTTP API the front-end uses to load and save its document.

pub(crate) mod auth;
pub(crate) mod routes;

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response as AxumResponse},
};
use axum_macros::FromRequest;
use serde::Serialize;
use thiserror::Error;

/// An API error. Its response has a JSON body with an `error` message.
#[derive(Error, Debug)]
pub(crate) enum Error {
    /// The request's shared secret was missing or incorrect.
    #[error("Invalid password")]
    Unauthorized,

    /// The request body couldn't be parsed.
    #[error("{0}")]
    BadRequest(String),

    /// No route matches the request's path.
    #[error("Route not found")]
    RouteNotFound,

    /// The route doesn't support the request's method.
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// The document couldn't be read from the storage provider. The cause is only logged.
    #[error("Failed to load data")]
    UpstreamRead,

    /// The storage provider didn't accept the document write. Contains the provider's own error
    /// text, so the client can see why (e.g. a version conflict).
    #[error("{0}")]
    UpstreamWrite(String),
}

impl Error {
    /// Gets the response status code corresponding to the API error.
    pub(crate) fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::RouteNotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::UpstreamRead | Self::UpstreamWrite(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// An API error response body.
#[derive(Serialize, Debug)]
struct ErrorBody {
    /// The error message.
    error: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> AxumResponse {
        (
            self.status(),
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// Equivalent to [`axum::Json`], but rejects with an [`Error`] instead, so malformed request
/// bodies get the same JSON error responses as everything else.
#[derive(FromRequest, Clone, Copy, Default, Debug)]
#[from_request(via(axum::Json), rejection(Error))]
pub(crate) struct Json<T>(pub(crate) T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> AxumResponse {
        axum::Json(self.0).into_response()
    }
}

/// The result of an API handler.
pub(crate) type Response<T> = Result<(StatusCode, Json<T>), Error>;
