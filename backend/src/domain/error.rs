//! Domain-level error types.
//!
//! These errors are transport agnostic. Inbound adapters map them to HTTP
//! responses; outbound HTTP adapters decode them from peer services.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::trace_id::TraceId;

/// Stable machine-readable error code describing the failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The request is malformed or fails validation.
    InvalidRequest,
    /// The requested resource does not exist.
    NotFound,
    /// A concurrent change won; the caller may retry.
    Conflict,
    /// The room is already held by another booking or check-in.
    RoomAlreadyHeld,
    /// The booking has already been checked in.
    AlreadyCheckedIn,
    /// The booking was cancelled.
    BookingCancelled,
    /// An open invoice already exists for the customer, room and month.
    DuplicateInvoice,
    /// The invoice has already been paid.
    AlreadyPaid,
    /// The requested lifecycle transition is not permitted.
    InvalidTransition,
    /// A collaborating service could not be reached.
    ServiceUnavailable,
    /// An unexpected error occurred inside the domain.
    InternalError,
}

impl ErrorCode {
    /// True for the user-retryable conflict family.
    #[must_use]
    pub const fn is_conflict(self) -> bool {
        matches!(
            self,
            Self::Conflict | Self::RoomAlreadyHeld | Self::DuplicateInvoice | Self::AlreadyPaid
        )
    }

    const fn fallback_message(self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid request",
            Self::NotFound => "not found",
            Self::Conflict => "conflicting update",
            Self::RoomAlreadyHeld => "room is already held",
            Self::AlreadyCheckedIn => "booking is already checked in",
            Self::BookingCancelled => "booking is cancelled",
            Self::DuplicateInvoice => "an open invoice already exists",
            Self::AlreadyPaid => "invoice is already paid",
            Self::InvalidTransition => "transition not permitted",
            Self::ServiceUnavailable => "service unavailable",
            Self::InternalError => "internal error",
        }
    }
}

/// Domain error payload.
///
/// ## Invariants
/// - `message` is non-empty once trimmed of whitespace.
/// - `trace_id`, when present, is non-empty.
///
/// # Examples
/// ```
/// use rentals::domain::{Error, ErrorCode};
///
/// let err = Error::not_found("booking 7 not found");
/// assert_eq!(err.code(), ErrorCode::NotFound);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(try_from = "ErrorDto", into = "ErrorDto")]
pub struct Error {
    code: ErrorCode,
    message: String,
    details: Option<Value>,
    trace_id: Option<String>,
}

/// Validation errors emitted by the fallible constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorValidationError {
    /// Message was empty after trimming.
    #[error("error message must not be empty")]
    EmptyMessage,
    /// Trace identifier was empty after trimming.
    #[error("trace identifier must not be empty")]
    EmptyTraceId,
}

impl Error {
    /// Create a new error, capturing the trace identifier in scope.
    ///
    /// Blank messages are replaced by a generic description of `code`.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            code.fallback_message().to_owned()
        } else {
            message
        };
        Self {
            code,
            message,
            details: None,
            trace_id: TraceId::current().map(|id| id.to_string()),
        }
    }

    /// Fallible constructor that validates the message content.
    pub fn try_new(code: ErrorCode, message: impl Into<String>) -> Result<Self, ErrorValidationError> {
        let message = message.into();
        if message.trim().is_empty() {
            return Err(ErrorValidationError::EmptyMessage);
        }
        Ok(Self::new(code, message))
    }

    /// Stable machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        self.code
    }

    /// Human-readable message returned to adapters.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Supplementary error details for adapters.
    #[must_use]
    pub const fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    /// Trace identifier captured when the error was created.
    #[must_use]
    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    /// Attach structured details to the error.
    ///
    /// # Examples
    /// ```
    /// use rentals::domain::Error;
    /// use serde_json::json;
    ///
    /// let err = Error::invalid_request("bad").with_details(json!({ "field": "amount" }));
    /// assert!(err.details().is_some());
    /// ```
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Override the trace identifier; blank values clear it.
    #[must_use]
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        let trace_id = trace_id.into();
        self.trace_id = (!trace_id.trim().is_empty()).then_some(trace_id);
        self
    }

    /// Fallible variant of [`Error::with_trace_id`].
    pub fn try_with_trace_id(self, trace_id: impl Into<String>) -> Result<Self, ErrorValidationError> {
        let trace_id = trace_id.into();
        if trace_id.trim().is_empty() {
            return Err(ErrorValidationError::EmptyTraceId);
        }
        Ok(self.with_trace_id(trace_id))
    }

    /// Convenience constructor for [`ErrorCode::InvalidRequest`].
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    /// Convenience constructor for [`ErrorCode::NotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Convenience constructor for [`ErrorCode::Conflict`].
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    /// Convenience constructor for [`ErrorCode::RoomAlreadyHeld`].
    pub fn room_already_held(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::RoomAlreadyHeld, message)
    }

    /// Convenience constructor for [`ErrorCode::AlreadyCheckedIn`].
    pub fn already_checked_in(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AlreadyCheckedIn, message)
    }

    /// Convenience constructor for [`ErrorCode::BookingCancelled`].
    pub fn booking_cancelled(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BookingCancelled, message)
    }

    /// Convenience constructor for [`ErrorCode::DuplicateInvoice`].
    pub fn duplicate_invoice(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DuplicateInvoice, message)
    }

    /// Convenience constructor for [`ErrorCode::AlreadyPaid`].
    pub fn already_paid(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AlreadyPaid, message)
    }

    /// Convenience constructor for [`ErrorCode::InvalidTransition`].
    pub fn invalid_transition(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidTransition, message)
    }

    /// Convenience constructor for [`ErrorCode::ServiceUnavailable`].
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }

    /// Convenience constructor for [`ErrorCode::InternalError`].
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorDto {
    code: ErrorCode,
    message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    trace_id: Option<String>,
}

impl From<Error> for ErrorDto {
    fn from(value: Error) -> Self {
        Self {
            code: value.code,
            message: value.message,
            details: value.details,
            trace_id: value.trace_id,
        }
    }
}

impl TryFrom<ErrorDto> for Error {
    type Error = ErrorValidationError;

    fn try_from(value: ErrorDto) -> Result<Self, Self::Error> {
        let ErrorDto {
            code,
            message,
            details,
            trace_id,
        } = value;
        if message.trim().is_empty() {
            return Err(ErrorValidationError::EmptyMessage);
        }
        Ok(Self {
            code,
            message,
            details,
            trace_id: trace_id.filter(|id| !id.trim().is_empty()),
        })
    }
}

#[cfg(test)]
mod tests;
