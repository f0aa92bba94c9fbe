//! Server construction and middleware wiring.

mod config;
mod state_builders;

pub use config::ServerConfig;
pub use state_builders::build_deployment;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};

use rentals::Trace;
use rentals::inbound::http::configure;
use rentals::inbound::http::health::{HealthState, live, ready};
use rentals::inbound::http::state::HttpState;

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
    } = deps;

    App::new()
        .app_data(health_state)
        .app_data(http_state)
        .wrap(Trace)
        .configure(configure)
        .service(ready)
        .service(live)
}

/// Construct an Actix HTTP server over the given driving ports.
///
/// # Parameters
/// - `health_state`: shared readiness state updated once the server is initialised.
/// - `http_state`: driving ports served under `/api/v1`.
/// - `config`: pre-built [`ServerConfig`] containing the bind address.
///
/// # Returns
/// A spawned [`Server`] that must be awaited to drive the listener.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket or starting the server fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    http_state: HttpState,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let server_health_state = health_state.clone();
    let http_state = web::Data::new(http_state);

    let server = HttpServer::new(move || {
        build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
        })
    })
    .bind(config.bind_addr())?
    .run();

    health_state.mark_ready();
    Ok(server)
}

#[cfg(test)]
mod tests {
    //! Application wiring checks.

    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use chrono::{TimeZone, Utc};
    use rentals::test_support::rig::Rentals;

    #[actix_rt::test]
    async fn health_probes_and_the_api_share_one_app() {
        let now = Utc
            .with_ymd_and_hms(2025, 6, 1, 9, 0, 0)
            .single()
            .expect("valid instant");
        let rentals = Rentals::new(now);
        let health_state = web::Data::new(HealthState::new());
        health_state.mark_ready();
        let app = test::init_service(build_app(AppDependencies {
            health_state,
            http_state: web::Data::new(rentals.http_state()),
        }))
        .await;

        let ready_response = test::call_service(
            &app,
            test::TestRequest::get().uri("/health/ready").to_request(),
        )
        .await;
        let rooms = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/v1/rooms").to_request(),
        )
        .await;

        assert_eq!(ready_response.status(), StatusCode::OK);
        assert_eq!(rooms.status(), StatusCode::OK);
        assert!(rooms.headers().contains_key("trace-id"));
    }
}
