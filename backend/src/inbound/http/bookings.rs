//! Booking HTTP handlers.
//!
//! ```text
//! POST   /api/v1/bookings               Create a booking (books the room)
//! GET    /api/v1/bookings               List bookings
//! GET    /api/v1/bookings/{id}          Fetch a booking
//! PUT    /api/v1/bookings/{id}          Edit a booking, possibly moving rooms
//! PUT    /api/v1/bookings/{id}/status   Cancel or complete a booking
//! DELETE /api/v1/bookings/{id}          Delete a booking
//! ```
//!
//! The listing accepts one of `customerId`, `roomId` or `status`, or a
//! search by `bookingId` optionally narrowed by `customerId`.

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::Deserialize;

use crate::domain::ports::{BookingFilter, BookingView, CreateBookingRequest, UpdateBookingRequest};
use crate::domain::{BookingId, BookingStatus, CustomerId, Error, RoomId};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::{ApiResult, StatusBody, at_most_one_filter};

/// Query accepted by the booking listing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingListQuery {
    /// Customer to match.
    #[serde(default)]
    pub customer_id: Option<CustomerId>,
    /// Room to match.
    #[serde(default)]
    pub room_id: Option<RoomId>,
    /// Status to match.
    #[serde(default)]
    pub status: Option<BookingStatus>,
    /// Booking to match.
    #[serde(default)]
    pub booking_id: Option<BookingId>,
}

impl BookingListQuery {
    fn into_filter(self) -> Result<BookingFilter, Error> {
        if let Some(booking_id) = self.booking_id {
            return Ok(BookingFilter::Search {
                customer_id: self.customer_id,
                booking_id: Some(booking_id),
            });
        }
        at_most_one_filter(&[
            ("customerId", self.customer_id.is_some()),
            ("roomId", self.room_id.is_some()),
            ("status", self.status.is_some()),
        ])?;
        Ok(match (self.customer_id, self.room_id, self.status) {
            (Some(customer_id), _, _) => BookingFilter::Customer(customer_id),
            (_, Some(room_id), _) => BookingFilter::Room(room_id),
            (_, _, Some(status)) => BookingFilter::Status(status),
            (None, None, None) => BookingFilter::All,
        })
    }
}

/// Create a booking; the room moves from Available to Booked.
#[post("/bookings")]
pub async fn create_booking(
    state: web::Data<HttpState>,
    payload: web::Json<CreateBookingRequest>,
) -> ApiResult<HttpResponse> {
    let view = state.bookings.create_booking(payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(view))
}

/// List bookings, optionally filtered.
#[get("/bookings")]
pub async fn list_bookings(
    state: web::Data<HttpState>,
    query: web::Query<BookingListQuery>,
) -> ApiResult<web::Json<Vec<BookingView>>> {
    let filter = query.into_inner().into_filter()?;
    Ok(web::Json(state.bookings.list_bookings(filter).await?))
}

/// Fetch one booking by id.
#[get("/bookings/{id}")]
pub async fn get_booking(
    state: web::Data<HttpState>,
    id: web::Path<BookingId>,
) -> ApiResult<web::Json<BookingView>> {
    Ok(web::Json(state.bookings.get_booking(id.into_inner()).await?))
}

/// Amend a booking; a new room must be Available.
#[put("/bookings/{id}")]
pub async fn update_booking(
    state: web::Data<HttpState>,
    id: web::Path<BookingId>,
    payload: web::Json<UpdateBookingRequest>,
) -> ApiResult<web::Json<BookingView>> {
    let view = state
        .bookings
        .update_booking(id.into_inner(), payload.into_inner())
        .await?;
    Ok(web::Json(view))
}

/// Cancel or complete a booking.
#[put("/bookings/{id}/status")]
pub async fn update_booking_status(
    state: web::Data<HttpState>,
    id: web::Path<BookingId>,
    payload: web::Json<StatusBody<BookingStatus>>,
) -> ApiResult<web::Json<BookingView>> {
    let view = state
        .bookings
        .update_booking_status(id.into_inner(), payload.status)
        .await?;
    Ok(web::Json(view))
}

/// Delete a booking, releasing a room it still holds.
#[delete("/bookings/{id}")]
pub async fn delete_booking(
    state: web::Data<HttpState>,
    id: web::Path<BookingId>,
) -> ApiResult<HttpResponse> {
    state.bookings.delete_booking(id.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
