//! Builders wiring settings into services, directories and stores.
//!
//! This process always hosts the room and customer directories over
//! in-memory stores. The orchestrators talk to remote directories instead
//! when their base URLs are configured.

use std::sync::Arc;

use mockable::{Clock, DefaultClock};
use tracing::info;

use rentals::domain::ports::{
    CustomerDirectory, CustomerRegistry, RoomDirectory, RoomIntentStore,
};
use rentals::domain::{
    Amount, BillingService, BookingService, CheckInService, Customer, CustomerId, Directories,
    RandomInvoiceNumbers, Reconciler, ReconcilerPorts, Room, RoomDirectoryService, RoomId,
    RoomLanes, RoomStatus, RoomSync,
};
use rentals::inbound::http::state::HttpState;
use rentals::outbound::directory::{HttpCustomerDirectory, HttpRoomDirectory};
use rentals::outbound::memory::{
    InMemoryBillingRepository, InMemoryBookingRepository, InMemoryCheckInRepository,
    InMemoryCustomerDirectory, InMemoryRoomIntentStore, InMemoryRoomRepository,
};
use rentals::settings::RentalSettings;

/// Everything the server and the background reconciler share.
pub struct Deployment {
    /// Driving ports handed to the HTTP layer.
    pub http_state: HttpState,
    /// Reconciler re-issuing deferred room-status changes.
    pub reconciler: Arc<Reconciler>,
}

/// The customer lookup and registration ports, backed by one directory.
type CustomerPorts = (Arc<dyn CustomerDirectory>, Arc<dyn CustomerRegistry>);

fn remote_error(directory: &str, error: &reqwest::Error) -> std::io::Error {
    std::io::Error::other(format!("failed to build {directory} directory client: {error}"))
}

fn room_directory(
    settings: &RentalSettings,
    local: &Arc<RoomDirectoryService>,
) -> std::io::Result<Arc<dyn RoomDirectory>> {
    match &settings.room_directory_url {
        Some(url) => {
            let remote = HttpRoomDirectory::new(url.clone(), settings.remote_timeout())
                .map_err(|error| remote_error("room", &error))?;
            info!(url = %url, "orchestrators use the remote room directory");
            let directory: Arc<dyn RoomDirectory> = Arc::new(remote);
            Ok(directory)
        }
        None => {
            let directory: Arc<dyn RoomDirectory> = local.clone();
            Ok(directory)
        }
    }
}

fn customer_directory(
    settings: &RentalSettings,
    local: &Arc<InMemoryCustomerDirectory>,
) -> std::io::Result<CustomerPorts> {
    match &settings.customer_directory_url {
        Some(url) => {
            let remote = Arc::new(
                HttpCustomerDirectory::new(url.clone(), settings.remote_timeout())
                    .map_err(|error| remote_error("customer", &error))?,
            );
            info!(url = %url, "orchestrators use the remote customer directory");
            let directory: Arc<dyn CustomerDirectory> = remote.clone();
            let registry: Arc<dyn CustomerRegistry> = remote;
            Ok((directory, registry))
        }
        None => {
            let directory: Arc<dyn CustomerDirectory> = local.clone();
            let registry: Arc<dyn CustomerRegistry> = local.clone();
            Ok((directory, registry))
        }
    }
}

/// Build the full deployment described by `settings`.
///
/// # Errors
///
/// Returns [`std::io::Error`] when a remote directory client cannot be built
/// or demo seeding fails.
pub fn build_deployment(settings: &RentalSettings) -> std::io::Result<Deployment> {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let timeout = settings.remote_timeout();

    let room_store = Arc::new(InMemoryRoomRepository::default());
    let customer_store = Arc::new(InMemoryCustomerDirectory::default());
    if settings.seed_demo {
        seed_demo_data(&room_store, &customer_store)?;
    }
    let local_rooms = Arc::new(RoomDirectoryService::new(room_store));
    let rooms = room_directory(settings, &local_rooms)?;
    let (customers, customer_registry) = customer_directory(settings, &customer_store)?;
    let intents: Arc<dyn RoomIntentStore> = Arc::new(InMemoryRoomIntentStore::default());

    let directories = Directories::new(customers.clone(), rooms.clone(), timeout);
    let lanes = RoomLanes::default();
    let room_sync = RoomSync::new(
        rooms.clone(),
        intents.clone(),
        lanes.clone(),
        clock.clone(),
        timeout,
    );
    let bookings = Arc::new(InMemoryBookingRepository::default());

    let booking_service = BookingService::new(
        bookings.clone(),
        directories.clone(),
        room_sync.clone(),
        clock.clone(),
    );
    let check_in_service = CheckInService::new(
        Arc::new(InMemoryCheckInRepository::default()),
        bookings,
        directories.clone(),
        room_sync,
        clock.clone(),
        settings.stay_policy(),
    );
    let billing_service = Arc::new(BillingService::new(
        Arc::new(InMemoryBillingRepository::default()),
        directories,
        Arc::new(RandomInvoiceNumbers),
        clock.clone(),
    ));
    let reconciler = Arc::new(Reconciler::new(
        ReconcilerPorts::new(rooms, intents, lanes),
        clock,
        settings.reconciler_config(),
    ));

    let http_state = HttpState {
        rooms: local_rooms,
        customers: customers.clone(),
        customer_registry,
        bookings: Arc::new(booking_service),
        check_ins: Arc::new(check_in_service),
        invoices: billing_service.clone(),
        payments: billing_service,
        reconciliation: reconciler.clone(),
    };
    Ok(Deployment {
        http_state,
        reconciler,
    })
}

const DEMO_ROOMS: [(u64, &str, u64); 4] = [
    (1, "101", 450_000),
    (2, "102", 450_000),
    (3, "201", 520_000),
    (4, "202", 520_000),
];

const DEMO_CUSTOMERS: [(u64, &str); 2] = [(1, "Ada Lovelace"), (2, "Grace Hopper")];

fn seed_demo_data(
    rooms: &InMemoryRoomRepository,
    customers: &InMemoryCustomerDirectory,
) -> std::io::Result<()> {
    for (id, room_number, price) in DEMO_ROOMS {
        rooms
            .seed(Room {
                id: RoomId::new(id),
                room_number: room_number.to_owned(),
                monthly_price: Amount::new(price),
                status: RoomStatus::Available,
                description: None,
            })
            .map_err(std::io::Error::other)?;
    }
    for (id, full_name) in DEMO_CUSTOMERS {
        customers
            .seed(Customer {
                id: CustomerId::new(id),
                full_name: full_name.to_owned(),
                phone_number: None,
                email: None,
            })
            .map_err(std::io::Error::other)?;
    }
    info!(
        rooms = DEMO_ROOMS.len(),
        customers = DEMO_CUSTOMERS.len(),
        "demo data seeded"
    );
    Ok(())
}
