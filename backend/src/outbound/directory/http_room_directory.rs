//! Room directory reached over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, StatusCode, Url};

use super::client::{DirectoryHttpClient, decode, map_transport_error, status_message};
use super::dto::{ConflictDetailsDto, ErrorBodyDto, TransitionDetailsDto};
use crate::domain::ports::{DirectoryError, RoomDirectory, RoomStatusError, SetRoomStatusRequest};
use crate::domain::{Room, RoomId, RoomStatusChange};

/// Room directory adapter calling `GET /api/v1/rooms/{id}` and
/// `PUT /api/v1/rooms/{id}/status`.
pub struct HttpRoomDirectory {
    http: DirectoryHttpClient,
}

impl HttpRoomDirectory {
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
impl RoomDirectory for HttpRoomDirectory {
    async fn get_by_id(&self, id: RoomId) -> Result<Option<Room>, DirectoryError> {
        let url = self.http.endpoint(&format!("api/v1/rooms/{id}"))?;
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

    async fn set_status(&self, change: &RoomStatusChange) -> Result<Room, RoomStatusError> {
        let url = self
            .http
            .endpoint(&format!("api/v1/rooms/{}/status", change.room_id))?;
        let payload = SetRoomStatusRequest {
            expected: change.expected,
            status: change.target,
        };
        let response = self
            .http
            .request(Method::PUT, url)
            .json(&payload)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if status.is_success() {
            return decode(body.as_ref()).map_err(RoomStatusError::from);
        }
        Err(map_status_refusal(change.room_id, status, body.as_ref()))
    }
}

fn map_status_refusal(room_id: RoomId, status: StatusCode, body: &[u8]) -> RoomStatusError {
    match status {
        StatusCode::NOT_FOUND => RoomStatusError::not_found(room_id),
        StatusCode::CONFLICT => match ErrorBodyDto::details_as::<ConflictDetailsDto>(body) {
            Some(details) => RoomStatusError::conflict(room_id, details.current_status),
            None => RoomStatusError::unavailable(format!(
                "conflict without a current status ({})",
                status_message(status, body)
            )),
        },
        StatusCode::UNPROCESSABLE_ENTITY => {
            match ErrorBodyDto::details_as::<TransitionDetailsDto>(body) {
                Some(details) => {
                    RoomStatusError::invalid_transition(room_id, details.from, details.to)
                }
                None => RoomStatusError::unavailable(format!(
                    "refused transition without details ({})",
                    status_message(status, body)
                )),
            }
        }
        _ => RoomStatusError::unavailable(status_message(status, body)),
    }
}
