//! Customer directory reached over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, StatusCode, Url};

use super::client::{DirectoryHttpClient, decode, map_transport_error, status_message};
use crate::domain::ports::{CustomerDirectory, CustomerRegistry, DirectoryError};
use crate::domain::{Customer, CustomerDraft, CustomerId};

/// Customer directory adapter calling `GET /api/v1/customers/{id}` and
/// `POST /api/v1/customers`.
pub struct HttpCustomerDirectory {
    http: DirectoryHttpClient,
}

impl HttpCustomerDirectory {
    /// Build an adapter whose requests are bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            http: DirectoryHttpClient::new(base_url, timeout)?,
        })
    }
}

#[async_trait]
impl CustomerDirectory for HttpCustomerDirectory {
    async fn get_by_id(&self, id: CustomerId) -> Result<Option<Customer>, DirectoryError> {
        let url = self.http.endpoint(&format!("api/v1/customers/{id}"))?;
        let response = self
            .http
            .request(Method::GET, url)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        match status {
            StatusCode::NOT_FOUND => Ok(None),
            _ if status.is_success() => decode(body.as_ref()).map(Some),
            _ => Err(DirectoryError::unavailable(status_message(status, body.as_ref()))),
        }
    }
}

#[async_trait]
impl CustomerRegistry for HttpCustomerDirectory {
    async fn register(&self, draft: CustomerDraft) -> Result<Customer, DirectoryError> {
        let url = self.http.endpoint("api/v1/customers")?;
        let response = self
            .http
            .request(Method::POST, url)
            .json(&draft)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if status.is_success() {
            decode(body.as_ref())
        } else {
            Err(DirectoryError::unavailable(status_message(status, body.as_ref())))
        }
    }
}
