//! Domain primitives, aggregates and orchestrators.
//!
//! Purpose: model the rental lifecycle (rooms, customers, bookings,
//! check-ins, invoices and payments) and coordinate the cross-service room
//! status updates each operation implies. Everything here is transport
//! agnostic; adapters in `inbound` and `outbound` plug into [`ports`].
//!
//! Public surface:
//! - Error / ErrorCode: failure payload shared by every port.
//! - Room / Booking / CheckIn / Invoice / Payment: aggregates.
//! - BookingService / CheckInService / BillingService: orchestrators.
//! - RoomSync / Reconciler: room-status delivery and repair.

pub mod ports;

mod billing_service;
mod booking;
mod booking_service;
mod check_in;
mod check_in_service;
mod customer;
mod directories;
mod enrichment;
pub mod error;
mod ids;
mod intent;
mod invoice;
mod money;
mod payment;
mod reconciler;
mod room;
mod room_directory_service;
mod room_sync;
pub mod trace_id;

pub use self::billing_service::BillingService;
pub use self::booking::{Booking, BookingDraft, BookingStatus, WALK_IN_NOTE};
pub use self::booking_service::BookingService;
pub use self::check_in::{CheckIn, CheckInDraft, CheckInStatus, StayPolicy};
pub use self::check_in_service::CheckInService;
pub use self::customer::{Customer, CustomerDraft};
pub use self::directories::Directories;
pub use self::enrichment::{DisplayFields, Enricher, Enrichment, EnrichmentIssue};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::ids::{
    BookingId, CheckInId, CustomerId, IntentId, InvoiceId, PaymentId, RoomId,
};
pub use self::intent::{IntentOrigin, IntentState, RoomStatusIntent, RoomStatusIntentDraft};
pub use self::invoice::{
    Invoice, InvoiceDraft, InvoiceNumber, InvoiceNumberSource, InvoiceStatus, MonthYear,
    MonthYearParseError, PaymentRefusal, RandomInvoiceNumbers,
};
pub use self::money::Amount;
pub use self::payment::{Payment, PaymentDraft, PaymentMethod};
pub use self::reconciler::{
    BackoffJitter, RandomJitter, Reconciler, ReconcilerConfig, ReconcilerPorts,
    ReconcilerRuntime, Sleeper, TokioSleeper,
};
pub use self::room::{
    evaluate_status_change, Room, RoomDraft, RoomStatus, RoomStatusChange, RoomStatusParseError,
    StatusDecision, StatusRejection,
};
pub use self::room_directory_service::{room_status_error_to_domain, RoomDirectoryService};
pub use self::room_sync::{OnRejection, RoomLanes, RoomSync, SyncOutcome};
pub use self::trace_id::{TraceId, TRACE_ID_HEADER};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use rentals::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::not_found("no such room"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
