//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    BookingLifecycle, CheckInLifecycle, CustomerDirectory, CustomerRegistry, InvoiceLifecycle,
    PaymentLifecycle, ReconciliationControl, RoomAdministration,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Room administration backing `/rooms`.
    pub rooms: Arc<dyn RoomAdministration>,
    /// Customer lookups.
    pub customers: Arc<dyn CustomerDirectory>,
    /// Customer registration.
    pub customer_registry: Arc<dyn CustomerRegistry>,
    /// Booking use-cases.
    pub bookings: Arc<dyn BookingLifecycle>,
    /// Check-in use-cases.
    pub check_ins: Arc<dyn CheckInLifecycle>,
    /// Invoice use-cases.
    pub invoices: Arc<dyn InvoiceLifecycle>,
    /// Payment use-cases.
    pub payments: Arc<dyn PaymentLifecycle>,
    /// Operator access to pending room-status intents.
    pub reconciliation: Arc<dyn ReconciliationControl>,
}
