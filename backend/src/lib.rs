//! Room-rental lifecycle orchestration.
//!
//! Bookings, check-ins and billing are coordinated against independently
//! owned room and customer directories. Room status changes go through a
//! compare-and-set, and updates lost after a local commit are recorded as
//! intents that a background reconciler re-issues.

pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod settings;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use middleware::Trace;
