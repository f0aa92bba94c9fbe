//! HTTP inbound adapter exposing REST endpoints.
//!
//! ```text
//! /api/v1/rooms            room directory and status compare-and-set
//! /api/v1/customers        customer lookup and registration
//! /api/v1/bookings         booking lifecycle
//! /api/v1/check-ins        check-in lifecycle
//! /api/v1/invoices         invoices and invoice payment
//! /api/v1/payments         payments
//! /api/v1/reconciliation   pending room-status intents
//! ```

pub mod bookings;
pub mod check_ins;
pub mod customers;
pub mod error;
pub mod health;
pub mod invoices;
pub mod payments;
pub mod reconciliation;
pub mod rooms;
pub mod state;
#[cfg(test)]
pub(crate) mod test_utils;

use actix_web::web;
use serde::Deserialize;
use serde_json::json;

use crate::domain::Error;

pub use error::ApiResult;

/// Body of every `PUT .../status` endpoint.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct StatusBody<S> {
    /// Requested status.
    pub status: S,
}

/// Refuse a query that sets more than one mutually exclusive filter.
pub(crate) fn at_most_one_filter(filters: &[(&'static str, bool)]) -> Result<(), Error> {
    let set: Vec<&str> = filters
        .iter()
        .filter(|(_, present)| *present)
        .map(|(name, _)| *name)
        .collect();
    if set.len() > 1 {
        return Err(
            Error::invalid_request("only one list filter may be given at a time")
                .with_details(json!({ "filters": set })),
        );
    }
    Ok(())
}

/// Register the `/api/v1` surface and the extractor error handlers.
///
/// Specific paths are registered before `{id}` patterns so `/rooms/available`
/// is never parsed as a room id.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(error::extractor_error))
        .app_data(web::QueryConfig::default().error_handler(error::extractor_error))
        .app_data(web::PathConfig::default().error_handler(error::extractor_error))
        .service(
            web::scope("/api/v1")
                .service(rooms::list_available_rooms)
                .service(rooms::get_room_by_number)
                .service(rooms::list_rooms)
                .service(rooms::register_room)
                .service(rooms::get_room)
                .service(rooms::set_room_status)
                .service(rooms::start_maintenance)
                .service(rooms::finish_maintenance)
                .service(customers::register_customer)
                .service(customers::get_customer)
                .service(bookings::create_booking)
                .service(bookings::list_bookings)
                .service(bookings::get_booking)
                .service(bookings::update_booking)
                .service(bookings::update_booking_status)
                .service(bookings::delete_booking)
                .service(check_ins::create_check_in_from_booking)
                .service(check_ins::create_check_in)
                .service(check_ins::list_check_ins)
                .service(check_ins::get_check_in)
                .service(check_ins::update_check_in)
                .service(check_ins::update_check_in_status)
                .service(check_ins::delete_check_in)
                .service(invoices::get_invoice_by_number)
                .service(invoices::create_invoice)
                .service(invoices::list_invoices)
                .service(invoices::get_invoice)
                .service(invoices::update_invoice)
                .service(invoices::update_invoice_status)
                .service(invoices::delete_invoice)
                .service(invoices::pay_invoice)
                .service(payments::create_payment)
                .service(payments::list_payments)
                .service(payments::get_payment)
                .service(payments::update_payment)
                .service(payments::delete_payment)
                .service(reconciliation::list_intents)
                .service(reconciliation::sweep_now)
                .service(reconciliation::resolve_intent),
        );
}
