//! Test helpers for inbound HTTP components.

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, web};
use chrono::{TimeZone, Utc};
use rstest::fixture;

use crate::middleware::Trace;
use crate::test_support::rig::Rentals;

/// In-memory deployment seeded with customer 1 and rooms 10 ("101") and 11 ("102").
pub(crate) struct TestRig {
    pub(crate) rentals: Rentals,
}

impl TestRig {
    /// Build the full `/api/v1` application over the rig.
    pub(crate) fn app(
        &self,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        > + use<>,
    > {
        App::new()
            .app_data(web::Data::new(self.rentals.http_state()))
            .wrap(Trace)
            .configure(super::configure)
    }
}

#[fixture]
pub(crate) fn rig() -> TestRig {
    let now = Utc
        .with_ymd_and_hms(2025, 6, 1, 9, 0, 0)
        .single()
        .expect("valid instant");
    let rentals = Rentals::new(now);
    rentals.seed_customer(1, "Ada Lovelace").expect("seed customer");
    rentals.seed_room(10, "101", 450_000).expect("seed room");
    rentals.seed_room(11, "102", 475_000).expect("seed room");
    TestRig { rentals }
}
