//! Check-in HTTP handlers.
//!
//! ```text
//! POST   /api/v1/check-ins/from-booking/{bookingId}  Convert a booking
//! POST   /api/v1/check-ins                           Walk-in check-in
//! GET    /api/v1/check-ins                           List check-ins
//! GET    /api/v1/check-ins/{id}                      Fetch a check-in
//! PUT    /api/v1/check-ins/{id}                      Edit a check-in
//! PUT    /api/v1/check-ins/{id}/status               Check out
//! DELETE /api/v1/check-ins/{id}                      Delete a check-in
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::Deserialize;

use crate::domain::ports::{
    CheckInFilter, CheckInView, CreateCheckInRequest, UpdateCheckInRequest,
};
use crate::domain::{BookingId, CheckInId, CheckInStatus, CustomerId, Error, RoomId};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::{ApiResult, StatusBody, at_most_one_filter};

/// Query accepted by the check-in listing; at most one field may be set.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInListQuery {
    /// Customer to match.
    #[serde(default)]
    pub customer_id: Option<CustomerId>,
    /// Room to match.
    #[serde(default)]
    pub room_id: Option<RoomId>,
    /// Status to match.
    #[serde(default)]
    pub status: Option<CheckInStatus>,
    /// Booking to match.
    #[serde(default)]
    pub booking_id: Option<BookingId>,
}

impl CheckInListQuery {
    fn into_filter(self) -> Result<CheckInFilter, Error> {
        at_most_one_filter(&[
            ("customerId", self.customer_id.is_some()),
            ("roomId", self.room_id.is_some()),
            ("status", self.status.is_some()),
            ("bookingId", self.booking_id.is_some()),
        ])?;
        let filter = if let Some(customer_id) = self.customer_id {
            CheckInFilter::Customer(customer_id)
        } else if let Some(room_id) = self.room_id {
            CheckInFilter::Room(room_id)
        } else if let Some(status) = self.status {
            CheckInFilter::Status(status)
        } else if let Some(booking_id) = self.booking_id {
            CheckInFilter::Booking(booking_id)
        } else {
            CheckInFilter::All
        };
        Ok(filter)
    }
}

/// Convert a pending booking into an active check-in; the room becomes Occupied.
#[post("/check-ins/from-booking/{booking_id}")]
pub async fn create_check_in_from_booking(
    state: web::Data<HttpState>,
    booking_id: web::Path<BookingId>,
) -> ApiResult<HttpResponse> {
    let view = state
        .check_ins
        .create_check_in_from_booking(booking_id.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(view))
}

/// Check in a walk-in customer.
#[post("/check-ins")]
pub async fn create_check_in(
    state: web::Data<HttpState>,
    payload: web::Json<CreateCheckInRequest>,
) -> ApiResult<HttpResponse> {
    let view = state.check_ins.create_check_in(payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(view))
}

/// List check-ins, optionally filtered.
#[get("/check-ins")]
pub async fn list_check_ins(
    state: web::Data<HttpState>,
    query: web::Query<CheckInListQuery>,
) -> ApiResult<web::Json<Vec<CheckInView>>> {
    let filter = query.into_inner().into_filter()?;
    Ok(web::Json(state.check_ins.list_check_ins(filter).await?))
}

/// Fetch one check-in by id.
#[get("/check-ins/{id}")]
pub async fn get_check_in(
    state: web::Data<HttpState>,
    id: web::Path<CheckInId>,
) -> ApiResult<web::Json<CheckInView>> {
    Ok(web::Json(state.check_ins.get_check_in(id.into_inner()).await?))
}

/// Amend a check-in; moving rooms swaps occupancy.
#[put("/check-ins/{id}")]
pub async fn update_check_in(
    state: web::Data<HttpState>,
    id: web::Path<CheckInId>,
    payload: web::Json<UpdateCheckInRequest>,
) -> ApiResult<web::Json<CheckInView>> {
    let view = state
        .check_ins
        .update_check_in(id.into_inner(), payload.into_inner())
        .await?;
    Ok(web::Json(view))
}

/// Check out, freeing the room.
#[put("/check-ins/{id}/status")]
pub async fn update_check_in_status(
    state: web::Data<HttpState>,
    id: web::Path<CheckInId>,
    payload: web::Json<StatusBody<CheckInStatus>>,
) -> ApiResult<web::Json<CheckInView>> {
    let view = state
        .check_ins
        .update_check_in_status(id.into_inner(), payload.status)
        .await?;
    Ok(web::Json(view))
}

/// Delete a check-in.
#[delete("/check-ins/{id}")]
pub async fn delete_check_in(
    state: web::Data<HttpState>,
    id: web::Path<CheckInId>,
) -> ApiResult<HttpResponse> {
    state.check_ins.delete_check_in(id.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    //! Handler coverage over the in-memory rig.
    use super::*;
    use crate::domain::RoomStatus;
    use crate::inbound::http::test_utils::{TestRig, rig};
    use actix_web::http::StatusCode;
    use actix_web::test;
    use rstest::rstest;
    use serde_json::{Value, json};

    #[rstest]
    #[actix_web::test]
    async fn a_booking_converts_once(rig: TestRig) {
        let app = test::init_service(rig.app()).await;
        let booking: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/bookings")
                .set_json(json!({"customerId": 1, "roomId": 10, "checkInDate": "2025-06-01"}))
                .to_request(),
        )
        .await;
        let uri = format!("/api/v1/check-ins/from-booking/{}", booking["id"]);

        let first =
            test::call_service(&app, test::TestRequest::post().uri(&uri).to_request()).await;
        let second =
            test::call_service(&app, test::TestRequest::post().uri(&uri).to_request()).await;

        assert_eq!(first.status(), StatusCode::CREATED);
        let check_in: Value = test::read_body_json(first).await;
        assert_eq!(check_in["status"], "ACTIVE");
        assert_eq!(check_in["expectedCheckOutDate"], "2025-07-01");
        assert_eq!(second.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let refused: Value = test::read_body_json(second).await;
        assert_eq!(refused["code"], "already_checked_in");
        assert_eq!(
            rig.rentals.room_status(RoomId::new(10)).await.expect("status"),
            Some(RoomStatus::Occupied)
        );
    }

    #[rstest]
    #[actix_web::test]
    async fn checking_out_a_walk_in_frees_the_room(rig: TestRig) {
        let app = test::init_service(rig.app()).await;
        let check_in: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/check-ins")
                .set_json(json!({"customerId": 1, "roomId": 11}))
                .to_request(),
        )
        .await;
        assert_eq!(
            rig.rentals.room_status(RoomId::new(11)).await.expect("status"),
            Some(RoomStatus::Occupied)
        );

        let res = test::call_service(
            &app,
            test::TestRequest::put()
                .uri(&format!("/api/v1/check-ins/{}/status", check_in["id"]))
                .set_json(json!({"status": "CHECKED_OUT"}))
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["status"], "CHECKED_OUT");
        assert_eq!(
            rig.rentals.room_status(RoomId::new(11)).await.expect("status"),
            Some(RoomStatus::Available)
        );
    }

    #[rstest]
    #[actix_web::test]
    async fn unknown_bookings_cannot_be_converted(rig: TestRig) {
        let app = test::init_service(rig.app()).await;

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/check-ins/from-booking/77")
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[rstest]
    #[actix_web::test]
    async fn two_filters_are_refused(rig: TestRig) {
        let app = test::init_service(rig.app()).await;

        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/v1/check-ins?customerId=1&roomId=10")
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["details"]["filters"], json!(["customerId", "roomId"]));
    }
}
