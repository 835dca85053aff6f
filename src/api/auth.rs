//! Shared-secret authentication for API requests.

use axum::http::HeaderMap;

use crate::{api, config::Secret, crypto::secrets_match};

/// The request header carrying the shared secret.
pub(crate) const PASSWORD_HEADER: &str = "x-app-password";

/// Checks that a request's headers carry the configured shared secret.
///
/// # Errors
///
/// Returns [`api::Error::Unauthorized`] if the header is missing, empty, or doesn't match.
pub(crate) fn authenticate(headers: &HeaderMap, password: &Secret) -> Result<(), api::Error> {
    let supplied = headers
        .get(PASSWORD_HEADER)
        .map(|value| value.as_bytes())
        .filter(|value| !value.is_empty());

    match supplied {
        Some(supplied) if secrets_match(supplied, password.expose()) => Ok(()),
        _ => Err(api::Error::Unauthorized),
    }
}
