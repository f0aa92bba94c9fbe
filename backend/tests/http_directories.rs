//! The reqwest directory adapters against a real rentals server.
//!
//! One process plays the remote room and customer directories by serving
//! the `/api/v1` surface over a socket; the adapters under test talk to it
//! exactly as a second deployment would.

use std::net::TcpListener;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use actix_web::dev::ServerHandle;
use actix_web::{App, HttpRequest, HttpResponse, HttpServer, web};
use chrono::{TimeZone, Utc};
use rentals::Trace;
use rentals::domain::ports::{
    CustomerDirectory, CustomerRegistry, DirectoryError, RoomDirectory, RoomStatusError,
};
use rentals::domain::{
    CustomerDraft, CustomerId, RoomId, RoomStatus, RoomStatusChange, TRACE_ID_HEADER, TraceId,
};
use rentals::inbound::http::configure;
use rentals::outbound::directory::{HttpCustomerDirectory, HttpRoomDirectory};
use rentals::test_support::rig::Rentals;
use rstest::rstest;
use url::Url;

const TIMEOUT: Duration = Duration::from_secs(2);
const ROOM: RoomId = RoomId::new(10);

struct RemoteDirectories {
    base_url: Url,
    handle: ServerHandle,
}

impl RemoteDirectories {
    fn start() -> Self {
        let now = Utc
            .with_ymd_and_hms(2025, 6, 1, 9, 0, 0)
            .single()
            .expect("valid instant");
        let rentals = Rentals::new(now);
        rentals.seed_customer(1, "Ada Lovelace").expect("seed customer");
        rentals.seed_room(10, "101", 450_000).expect("seed room");
        let state = web::Data::new(rentals.http_state());

        let listener = TcpListener::bind("127.0.0.1:0").expect("bind listener");
        let port = listener.local_addr().expect("local addr").port();
        let server = HttpServer::new(move || {
            App::new()
                .app_data(state.clone())
                .wrap(Trace)
                .configure(configure)
        })
        .workers(1)
        .listen(listener)
        .expect("listen")
        .run();
        let handle = server.handle();
        actix_web::rt::spawn(server);

        Self {
            base_url: Url::parse(&format!("http://127.0.0.1:{port}/")).expect("base url"),
            handle,
        }
    }

    fn rooms(&self) -> HttpRoomDirectory {
        HttpRoomDirectory::new(self.base_url.clone(), TIMEOUT).expect("room client")
    }

    fn customers(&self) -> HttpCustomerDirectory {
        HttpCustomerDirectory::new(self.base_url.clone(), TIMEOUT).expect("customer client")
    }

    async fn stop(self) {
        self.handle.stop(true).await;
    }
}

#[rstest]
#[actix_web::test]
async fn rooms_are_read_and_acquired_remotely() {
    let remote = RemoteDirectories::start();
    let rooms = remote.rooms();

    let found = rooms.get_by_id(ROOM).await.expect("lookup");
    let missing = rooms.get_by_id(RoomId::new(404)).await.expect("lookup");
    let booked = rooms
        .set_status(&RoomStatusChange::acquire(
            ROOM,
            RoomStatus::Available,
            RoomStatus::Booked,
        ))
        .await
        .expect("acquire");

    assert_eq!(found.map(|room| room.room_number), Some("101".to_owned()));
    assert!(missing.is_none());
    assert_eq!(booked.status, RoomStatus::Booked);
    remote.stop().await;
}

#[rstest]
#[actix_web::test]
async fn refusals_come_back_as_typed_port_errors() {
    let remote = RemoteDirectories::start();
    let rooms = remote.rooms();
    rooms
        .set_status(&RoomStatusChange::acquire(
            ROOM,
            RoomStatus::Available,
            RoomStatus::Occupied,
        ))
        .await
        .expect("occupy");

    let stale = rooms
        .set_status(&RoomStatusChange::acquire(
            ROOM,
            RoomStatus::Available,
            RoomStatus::Booked,
        ))
        .await;
    let invalid = rooms
        .set_status(&RoomStatusChange {
            room_id: ROOM,
            expected: None,
            target: RoomStatus::Booked,
        })
        .await;
    let missing = rooms.set_status(&RoomStatusChange::release(RoomId::new(404))).await;

    assert_eq!(
        stale,
        Err(RoomStatusError::conflict(ROOM, RoomStatus::Occupied))
    );
    assert_eq!(
        invalid,
        Err(RoomStatusError::invalid_transition(
            ROOM,
            RoomStatus::Occupied,
            RoomStatus::Booked
        ))
    );
    assert!(matches!(missing, Err(RoomStatusError::NotFound { .. })));
    remote.stop().await;
}

#[rstest]
#[actix_web::test]
async fn customers_are_registered_and_read_remotely() {
    let remote = RemoteDirectories::start();
    let customers = remote.customers();

    let known = customers.get_by_id(CustomerId::new(1)).await.expect("lookup");
    let registered = customers
        .register(CustomerDraft {
            full_name: "Grace Hopper".to_owned(),
            phone_number: None,
            email: None,
        })
        .await
        .expect("register");
    let fetched = customers.get_by_id(registered.id).await.expect("lookup");

    assert_eq!(known.map(|c| c.full_name), Some("Ada Lovelace".to_owned()));
    assert_eq!(fetched, Some(registered));
    remote.stop().await;
}

#[rstest]
#[actix_web::test]
async fn an_unreachable_directory_is_unavailable() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind listener");
        listener.local_addr().expect("local addr").port()
    };
    let base_url = Url::parse(&format!("http://127.0.0.1:{port}/")).expect("base url");
    let rooms = HttpRoomDirectory::new(base_url, TIMEOUT).expect("room client");

    let read = rooms.get_by_id(ROOM).await;
    let write = rooms.set_status(&RoomStatusChange::release(ROOM)).await;

    assert!(matches!(
        read,
        Err(DirectoryError::Unavailable { .. } | DirectoryError::Timeout { .. })
    ));
    assert!(write.is_err_and(|error| error.is_retryable()));
}

#[rstest]
#[actix_web::test]
async fn the_trace_id_in_scope_travels_with_the_request() {
    let seen: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));
    let recorder = seen.clone();
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind listener");
    let port = listener.local_addr().expect("local addr").port();
    let server = HttpServer::new(move || {
        let recorder = recorder.clone();
        App::new().default_service(web::to(move |req: HttpRequest| {
            let header = req
                .headers()
                .get(TRACE_ID_HEADER)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned);
            *recorder.lock().unwrap_or_else(PoisonError::into_inner) = header;
            async { HttpResponse::NotFound().finish() }
        }))
    })
    .workers(1)
    .listen(listener)
    .expect("listen")
    .run();
    let handle = server.handle();
    actix_web::rt::spawn(server);
    let base_url = Url::parse(&format!("http://127.0.0.1:{port}/")).expect("base url");
    let rooms = HttpRoomDirectory::new(base_url, TIMEOUT).expect("room client");
    let trace_id = TraceId::generate();

    let found = TraceId::scope(trace_id, rooms.get_by_id(ROOM)).await;

    assert_eq!(found, Ok(None));
    assert_eq!(
        seen.lock().unwrap_or_else(PoisonError::into_inner).clone(),
        Some(trace_id.to_string())
    );
    handle.stop(true).await;
}
