//! See [`Config`].

use std::{
    env::VarError,
    fmt::{self, Debug, Formatter},
};

use thiserror::Error;

/// The address the server listens on if `ADDRESS` isn't set.
const DEFAULT_ADDRESS: &str = "127.0.0.1:3000";

/// The storage provider's API origin if `GITHUB_API_URL` isn't set.
const DEFAULT_API_URL: &str = "https://api.github.com";

/// The document's path in the repository if `DOCUMENT_PATH` isn't set.
const DEFAULT_DOCUMENT_PATH: &str = "data.json";

/// The commit message for document writes if `COMMIT_MESSAGE` isn't set.
const DEFAULT_COMMIT_MESSAGE: &str = "Update Pour Decisions data";

/// The server's configuration. Read from the environment once at startup and never changed after.
#[derive(Clone, Debug)]
pub(crate) struct Config {
    /// The socket address to listen on.
    pub(crate) address: String,

    /// The shared secret every non-preflight request must present.
    pub(crate) password: Secret,

    /// How to reach the document on the storage provider.
    pub(crate) upstream: UpstreamConfig,
}

/// The storage provider's side of the [`Config`].
#[derive(Clone, Debug)]
pub(crate) struct UpstreamConfig {
    /// The origin of the contents API, without a trailing slash.
    pub(crate) api_url: String,

    /// The token authorizing requests to the contents API.
    pub(crate) token: Secret,

    /// Where the document is stored.
    pub(crate) location: RemoteLocation,

    /// The commit message attached to every document write.
    pub(crate) commit_message: String,
}

/// The one file on the storage provider that holds the document.
#[derive(Clone, PartialEq, Eq, Debug)]
pub(crate) struct RemoteLocation {
    /// The user or organization owning the repository.
    pub(crate) owner: String,

    /// The repository's name.
    pub(crate) repo: String,

    /// The file's path within the repository.
    pub(crate) path: String,
}

/// A string that never shows up in logs or [`Debug`] output.
#[derive(Clone, PartialEq, Eq)]
pub(crate) struct Secret(String);

impl Secret {
    /// Gets the secret's value.
    pub(crate) fn expose(&self) -> &str {
        &self.0
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl Debug for Secret {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(..)")
    }
}

/// An error reading the [`Config`] from the environment.
#[derive(Error, Debug)]
#[error("environment variable `{key}` should be set: {source}")]
pub(crate) struct ConfigError {
    /// The environment variable that couldn't be read.
    key: &'static str,

    /// Why it couldn't be read.
    source: dotenvy::Error,
}

impl Config {
    /// Reads the configuration from the environment, loading a `.env` file first if one exists.
    ///
    /// # Errors
    ///
    /// Fails if a required environment variable is unset, or if any variable isn't valid Unicode.
    pub(crate) fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            address: optional_var("ADDRESS", DEFAULT_ADDRESS)?,
            password: required_var("APP_PASSWORD")?.into(),
            upstream: UpstreamConfig {
                api_url: optional_var("GITHUB_API_URL", DEFAULT_API_URL)?
                    .trim_end_matches('/')
                    .to_owned(),
                token: required_var("GITHUB_TOKEN")?.into(),
                location: RemoteLocation {
                    owner: required_var("GITHUB_OWNER")?,
                    repo: required_var("GITHUB_REPO")?,
                    path: optional_var("DOCUMENT_PATH", DEFAULT_DOCUMENT_PATH)?,
                },
                commit_message: optional_var("COMMIT_MESSAGE", DEFAULT_COMMIT_MESSAGE)?,
            },
        })
    }
}

/// Reads an environment variable that must be set.
fn required_var(key: &'static str) -> Result<String, ConfigError> {
    dotenvy::var(key).map_err(|source| ConfigError { key, source })
}

/// Reads an environment variable, falling back to `default` if it's unset.
fn optional_var(key: &'static str, default: &str) -> Result<String, ConfigError> {
    match dotenvy::var(key) {
        Err(dotenvy::Error::EnvVar(VarError::NotPresent)) => Ok(default.to_owned()),
        result => result.map_err(|source| ConfigError { key, source }),
    }
}
