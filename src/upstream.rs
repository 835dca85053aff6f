//! A client for the storage provider's repository contents API, which holds the document as one
//! file in one repository.

use reqwest::{
    header::{ACCEPT, AUTHORIZATION},
    StatusCode,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::{
    config::{Secret, UpstreamConfig},
    document::{self, DecodeError, Document, VersionToken},
    percent_encoding::{encode_file_path, encode_segment},
};

/// The media type the contents API is asked to respond with.
const ACCEPT_MEDIA_TYPE: &str = "application/vnd.github+json";

/// The `User-Agent` sent with every request. The provider refuses requests without one.
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// A client for the one file holding the document.
#[derive(Debug)]
pub(crate) struct ContentsClient {
    /// The underlying HTTP client, which pools connections across requests.
    http: reqwest::Client,

    /// The contents API URL of the document's file.
    url: String,

    /// The token authorizing requests.
    token: Secret,

    /// The commit message attached to every write.
    commit_message: String,
}

/// The outcome of a successful read of the document's file.
#[derive(Clone, PartialEq, Debug)]
pub(crate) enum Fetched {
    /// The file exists.
    Found(RemoteFile),

    /// The file doesn't exist yet, since no document has ever been written.
    Empty,
}

/// The document's file as currently stored.
#[derive(Clone, PartialEq, Debug)]
pub(crate) struct RemoteFile {
    /// The decoded document.
    pub(crate) document: Document,

    /// The version of the stored content.
    pub(crate) sha: VersionToken,
}

/// An error communicating with the contents API.
#[derive(Error, Debug)]
pub(crate) enum Error {
    /// The request couldn't be sent, or its response couldn't be received.
    #[error("request to storage provider failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider responded with an unsuccessful status.
    #[error("storage provider responded with {status}: {body}")]
    Status {
        /// The response's status code.
        status: StatusCode,

        /// The response's body, exactly as received.
        body: String,
    },

    /// The provider's response didn't have the expected shape.
    #[error("storage provider sent an unexpected response: {0}")]
    UnexpectedResponse(#[from] serde_json::Error),

    /// The stored file doesn't hold a valid document.
    #[error(transparent)]
    Content(#[from] DecodeError),
}

impl Error {
    /// Consumes the error, returning the provider's own error text if it sent any, or else a
    /// description of the error.
    pub(crate) fn into_upstream_text(self) -> String {
        match self {
            Self::Status { body, .. } => body,
            error => error.to_string(),
        }
    }
}

/// A response body from reading the file.
#[derive(Deserialize, Debug)]
struct GetFileResponse {
    /// The file's content in Base64, possibly broken into lines.
    content: String,

    /// The version of the file's content.
    sha: VersionToken,
}

/// A request body for creating or updating the file.
#[derive(Serialize, Debug)]
struct PutFileRequest<'a> {
    /// The commit message.
    message: &'a str,

    /// The file's new content in Base64.
    content: String,

    /// The version being replaced. Omitting this creates the file, failing if it already exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a VersionToken>,
}

/// A response body from creating or updating the file.
#[derive(Deserialize, Debug)]
struct PutFileResponse {
    /// The file as written.
    content: WrittenFile,
}

/// The file as written, in a [`PutFileResponse`].
#[derive(Deserialize, Debug)]
struct WrittenFile {
    /// The version of the newly written content.
    sha: VersionToken,
}

impl ContentsClient {
    /// Constructs a client for the file configured in `config`.
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client's TLS backend can't be initialized.
    pub(crate) fn new(config: &UpstreamConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;

        let location = &config.location;
        let url = format!(
            "{}/repos/{}/{}/contents/{}",
            config.api_url,
            encode_segment(&location.owner),
            encode_segment(&location.repo),
            encode_file_path(&location.path),
        );

        Ok(Self {
            http,
            url,
            token: config.token.clone(),
            commit_message: config.commit_message.clone(),
        })
    }

    /// Gets the contents API URL of the document's file.
    pub(crate) fn url(&self) -> &str {
        &self.url
    }

    /// Reads the document and its version from the provider.
    ///
    /// # Errors
    ///
    /// Fails if the request fails, if the provider responds with an error other than `404 Not
    /// Found`, or if the file doesn't hold a valid document.
    pub(crate) async fn get_file(&self) -> Result<Fetched, Error> {
        debug!(url = %self.url, "reading document");

        let response = self
            .http
            .get(&self.url)
            .header(AUTHORIZATION, self.authorization())
            .header(ACCEPT, ACCEPT_MEDIA_TYPE)
            .send()
            .await?;

        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Ok(Fetched::Empty);
        }

        if !status.is_success() {
            return Err(Error::Status {
                status,
                body: response.text().await?,
            });
        }

        let file: GetFileResponse = serde_json::from_slice(&response.bytes().await?)?;

        Ok(Fetched::Found(RemoteFile {
            document: document::decode(&file.content)?,
            sha: file.sha,
        }))
    }

    /// Overwrites the document on the provider, returning the version of the written content.
    ///
    /// If `sha` is `None`, the file is created, and the provider rejects the write if it already
    /// exists. Otherwise, the provider rejects the write unless `sha` is the current version.
    ///
    /// # Errors
    ///
    /// Fails if the request fails, if the provider rejects the write (including for a version
    /// conflict), or if the provider's response doesn't include the new version.
    pub(crate) async fn put_file(
        &self,
        document: &Document,
        sha: Option<&VersionToken>,
    ) -> Result<VersionToken, Error> {
        debug!(url = %self.url, sha = ?sha, "writing document");

        let response = self
            .http
            .put(&self.url)
            .header(AUTHORIZATION, self.authorization())
            .header(ACCEPT, ACCEPT_MEDIA_TYPE)
            .json(&PutFileRequest {
                message: &self.commit_message,
                content: document::encode(document),
                sha,
            })
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            return Err(Error::Status {
                status,
                body: response.text().await?,
            });
        }

        let written: PutFileResponse = serde_json::from_slice(&response.bytes().await?)?;

        Ok(written.content.sha)
    }

    /// Gets the `Authorization` header value for requests.
    fn authorization(&self) -> String {
        format!("token {}", self.token.expose())
    }
}
