//! Operator endpoints over pending room-status intents.
//!
//! ```text
//! GET    /api/v1/reconciliation/intents        List recorded intents
//! POST   /api/v1/reconciliation/sweep          Run one reconciliation pass now
//! DELETE /api/v1/reconciliation/intents/{id}   Discard an intent after manual repair
//! ```

use actix_web::{HttpResponse, delete, get, post, web};

use crate::domain::ports::SweepReport;
use crate::domain::{IntentId, RoomStatusIntent};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;

/// Pending and flagged room-status intents.
#[get("/reconciliation/intents")]
pub async fn list_intents(
    state: web::Data<HttpState>,
) -> ApiResult<web::Json<Vec<RoomStatusIntent>>> {
    Ok(web::Json(state.reconciliation.list_intents().await?))
}

/// Run one reconciliation sweep immediately.
#[post("/reconciliation/sweep")]
pub async fn sweep_now(state: web::Data<HttpState>) -> ApiResult<web::Json<SweepReport>> {
    Ok(web::Json(state.reconciliation.sweep_now().await?))
}

/// Discard an intent after manual repair.
#[delete("/reconciliation/intents/{id}")]
pub async fn resolve_intent(
    state: web::Data<HttpState>,
    id: web::Path<IntentId>,
) -> ApiResult<HttpResponse> {
    state.reconciliation.resolve_intent(id.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    //! Handler coverage over the in-memory rig.
    use super::*;
    use crate::domain::{RoomId, RoomStatus};
    use crate::inbound::http::test_utils::{TestRig, rig};
    use actix_web::http::StatusCode;
    use actix_web::test;
    use rstest::rstest;
    use serde_json::{Value, json};

    #[rstest]
    #[actix_web::test]
    async fn a_lost_release_is_listed_and_swept(rig: TestRig) {
        let app = test::init_service(rig.app()).await;
        let booking: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/bookings")
                .set_json(json!({"customerId": 1, "roomId": 10, "checkInDate": "2025-06-01"}))
                .to_request(),
        )
        .await;
        rig.rentals.room_directory.fail_writes();

        let cancelled = test::call_service(
            &app,
            test::TestRequest::put()
                .uri(&format!("/api/v1/bookings/{}/status", booking["id"]))
                .set_json(json!({"status": "CANCELLED"}))
                .to_request(),
        )
        .await;
        assert_eq!(cancelled.status(), StatusCode::OK);

        let intents: Vec<RoomStatusIntent> = test::call_and_read_body_json(
            &app,
            test::TestRequest::get()
                .uri("/api/v1/reconciliation/intents")
                .to_request(),
        )
        .await;
        assert_eq!(intents.len(), 1);
        assert_eq!(intents[0].target, RoomStatus::Available);

        rig.rentals.room_directory.restore();
        let report: SweepReport = test::call_and_read_body_json(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/reconciliation/sweep")
                .to_request(),
        )
        .await;

        assert_eq!(report.applied, 1);
        assert_eq!(
            rig.rentals.room_status(RoomId::new(10)).await.expect("status"),
            Some(RoomStatus::Available)
        );
    }

    #[rstest]
    #[actix_web::test]
    async fn resolving_an_unknown_intent_is_not_found(rig: TestRig) {
        let app = test::init_service(rig.app()).await;

        let res = test::call_service(
            &app,
            test::TestRequest::delete()
                .uri("/api/v1/reconciliation/intents/9")
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
}
