//! Tests for the domain error payload.

use super::*;
use rstest::{fixture, rstest};
use serde_json::json;

const TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

#[fixture]
fn expected_trace_id() -> String {
    TRACE_ID.to_owned()
}

#[rstest]
fn invalid_request_constructor_sets_code() {
    let err = Error::invalid_request("bad");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[rstest]
fn try_new_rejects_empty_messages() {
    let result = Error::try_new(ErrorCode::InvalidRequest, "   ");
    assert!(matches!(result, Err(ErrorValidationError::EmptyMessage)));
}

#[rstest]
fn new_substitutes_a_description_for_blank_messages() {
    let err = Error::new(ErrorCode::AlreadyPaid, "  ");
    assert_eq!(err.message(), "invoice is already paid");
}

#[rstest]
fn try_with_trace_id_rejects_empty_values() {
    let result = Error::internal("boom").try_with_trace_id("   ");
    assert!(matches!(result, Err(ErrorValidationError::EmptyTraceId)));
}

#[rstest]
fn new_returns_no_trace_id_out_of_scope() {
    assert!(Error::internal("boom").trace_id().is_none());
}

#[rstest]
#[tokio::test]
async fn new_captures_trace_id_in_scope(expected_trace_id: String) {
    let trace_id: TraceId = expected_trace_id.parse().expect("valid UUID");
    let error = TraceId::scope(trace_id, async move { Error::conflict("lost race") }).await;
    assert_eq!(error.trace_id(), Some(expected_trace_id.as_str()));
}

#[rstest]
#[case(ErrorCode::Conflict, true)]
#[case(ErrorCode::RoomAlreadyHeld, true)]
#[case(ErrorCode::DuplicateInvoice, true)]
#[case(ErrorCode::AlreadyPaid, true)]
#[case(ErrorCode::InvalidTransition, false)]
#[case(ErrorCode::ServiceUnavailable, false)]
fn conflict_family_membership(#[case] code: ErrorCode, #[case] expected: bool) {
    assert_eq!(code.is_conflict(), expected);
}

#[rstest]
fn serialises_to_camel_case_envelope(expected_trace_id: String) {
    let err = Error::room_already_held("room 10 is BOOKED")
        .with_details(json!({ "roomId": 10, "currentStatus": "BOOKED" }))
        .with_trace_id(expected_trace_id.clone());
    let value = serde_json::to_value(&err).expect("serialise error");
    assert_eq!(
        value,
        json!({
            "code": "room_already_held",
            "message": "room 10 is BOOKED",
            "details": { "roomId": 10, "currentStatus": "BOOKED" },
            "traceId": expected_trace_id,
        })
    );
}

#[rstest]
fn omits_absent_optional_fields() {
    let value = serde_json::to_value(Error::not_found("missing")).expect("serialise error");
    assert_eq!(value, json!({ "code": "not_found", "message": "missing" }));
}

#[rstest]
fn deserialisation_rejects_blank_messages() {
    let result: Result<Error, _> =
        serde_json::from_value(json!({ "code": "conflict", "message": " " }));
    assert!(result.is_err());
}

#[rstest]
#[tokio::test]
async fn deserialisation_ignores_ambient_trace(expected_trace_id: String) {
    let trace_id: TraceId = expected_trace_id.parse().expect("valid UUID");
    let error = TraceId::scope(trace_id, async move {
        serde_json::from_value::<Error>(json!({ "code": "conflict", "message": "stale" }))
            .expect("valid payload")
    })
    .await;
    assert!(error.trace_id().is_none());
}
