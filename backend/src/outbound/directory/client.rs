//! Shared HTTP plumbing for the directory adapters.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};

use crate::domain::TRACE_ID_HEADER;
use crate::domain::TraceId;
use crate::domain::ports::DirectoryError;

/// Base URL plus a client whose every request is bounded by one timeout.
pub(super) struct DirectoryHttpClient {
    client: Client,
    base_url: Url,
}

impl DirectoryHttpClient {
    pub(super) fn new(mut base_url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    pub(super) fn endpoint(&self, path: &str) -> Result<Url, DirectoryError> {
        self.base_url.join(path).map_err(|error| {
            DirectoryError::unavailable(format!("invalid directory endpoint {path}: {error}"))
        })
    }

    /// Start a JSON request carrying the trace id in scope, if any.
    pub(super) fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self
            .client
            .request(method, url)
            .header(reqwest::header::ACCEPT, "application/json");
        match TraceId::current() {
            Some(trace_id) => builder.header(TRACE_ID_HEADER, trace_id.to_string()),
            None => builder,
        }
    }
}

pub(super) fn map_transport_error(error: reqwest::Error) -> DirectoryError {
    if error.is_timeout() {
        DirectoryError::timeout(error.to_string())
    } else {
        DirectoryError::unavailable(error.to_string())
    }
}

pub(super) fn status_message(status: StatusCode, body: &[u8]) -> String {
    let preview = body_preview(body);
    if preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {}", status.as_u16(), preview)
    }
}

pub(super) fn decode<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, DirectoryError> {
    serde_json::from_slice(body).map_err(|error| DirectoryError::decode(error.to_string()))
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
