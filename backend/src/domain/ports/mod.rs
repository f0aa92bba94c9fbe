//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (`*Repository`, `*Store`, `*Directory`) describe what the
//! domain needs from storage and from peer services. Driving ports
//! (`*Lifecycle`, `RoomAdministration`, `ReconciliationControl`) are what
//! inbound adapters call.

mod macros;
pub(crate) use macros::define_port_error;

mod billing_repository;
mod booking_lifecycle;
mod booking_repository;
mod check_in_lifecycle;
mod check_in_repository;
mod customer_directory;
mod directory_error;
mod invoice_lifecycle;
mod payment_lifecycle;
mod reconciliation_control;
mod room_administration;
mod room_directory;
mod room_intent_store;
mod room_repository;

#[cfg(test)]
pub use billing_repository::MockBillingRepository;
pub use billing_repository::{
    BillingRepository, BillingRepositoryError, InvoiceFilter, PaymentFilter, RemovedPayment,
};
#[cfg(test)]
pub use booking_lifecycle::MockBookingLifecycle;
pub use booking_lifecycle::{
    BookingLifecycle, BookingView, CreateBookingRequest, UpdateBookingRequest,
};
#[cfg(test)]
pub use booking_repository::MockBookingRepository;
pub use booking_repository::{BookingFilter, BookingRepository, BookingRepositoryError};
#[cfg(test)]
pub use check_in_lifecycle::MockCheckInLifecycle;
pub use check_in_lifecycle::{
    CheckInLifecycle, CheckInView, CreateCheckInRequest, UpdateCheckInRequest,
};
#[cfg(test)]
pub use check_in_repository::MockCheckInRepository;
pub use check_in_repository::{CheckInFilter, CheckInRepository, CheckInRepositoryError};
pub use customer_directory::{CustomerDirectory, CustomerRegistry};
#[cfg(test)]
pub use customer_directory::{MockCustomerDirectory, MockCustomerRegistry};
pub use directory_error::DirectoryError;
#[cfg(test)]
pub use invoice_lifecycle::MockInvoiceLifecycle;
pub use invoice_lifecycle::{
    CreateInvoiceRequest, InvoiceLifecycle, InvoiceQuery, InvoiceView, UpdateInvoiceRequest,
};
#[cfg(test)]
pub use payment_lifecycle::MockPaymentLifecycle;
pub use payment_lifecycle::{
    CreatePaymentRequest, PayInvoiceRequest, PaymentLifecycle, PaymentView, UpdatePaymentRequest,
};
#[cfg(test)]
pub use reconciliation_control::MockReconciliationControl;
pub use reconciliation_control::{ReconciliationControl, SweepReport};
#[cfg(test)]
pub use room_administration::MockRoomAdministration;
pub use room_administration::{RoomAdministration, RoomFilter, SetRoomStatusRequest};
#[cfg(test)]
pub use room_directory::MockRoomDirectory;
pub use room_directory::{RoomDirectory, RoomStatusError};
#[cfg(test)]
pub use room_intent_store::MockRoomIntentStore;
pub use room_intent_store::{RoomIntentStore, RoomIntentStoreError};
#[cfg(test)]
pub use room_repository::MockRoomRepository;
pub use room_repository::{RoomRepository, RoomRepositoryError, StatusSwap};
