//! Test utilities for the backend crate.
//!
//! This module provides shared helpers for both unit tests (in `src/`) and
//! integration tests (in `tests/`). It is only compiled for tests or with the
//! `test-support` feature.

mod directories;
mod reconciliation;

pub use directories::SwitchableRoomDirectory;
pub use reconciliation::{ImmediateSleeper, MutableClock, NoJitter, RecordingSleeper};

pub mod invoice_numbers {
    //! Deterministic invoice numbering.

    use std::collections::VecDeque;
    use std::sync::{Mutex, PoisonError};

    use chrono::NaiveDate;

    use crate::domain::{InvoiceNumber, InvoiceNumberSource};

    /// Hands out scripted suffixes in order, then `ZZ00`, `ZZ01`, ...
    pub struct ScriptedInvoiceNumbers {
        suffixes: Mutex<VecDeque<String>>,
        fallback: Mutex<u32>,
    }

    impl ScriptedInvoiceNumbers {
        /// Script the suffixes returned by successive calls.
        pub fn new<I, S>(suffixes: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            Self {
                suffixes: Mutex::new(suffixes.into_iter().map(Into::into).collect()),
                fallback: Mutex::new(0),
            }
        }
    }

    impl InvoiceNumberSource for ScriptedInvoiceNumbers {
        fn next_number(&self, issue_date: NaiveDate) -> InvoiceNumber {
            let scripted = self
                .suffixes
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .pop_front();
            let suffix = scripted.unwrap_or_else(|| {
                let mut counter = self.fallback.lock().unwrap_or_else(PoisonError::into_inner);
                let suffix = format!("ZZ{:02}", *counter % 100);
                *counter += 1;
                suffix
            });
            InvoiceNumber::compose(issue_date, &suffix)
        }
    }
}

pub mod rig {
    //! A complete in-process rental stack over in-memory stores.

    use std::sync::Arc;
    use std::time::Duration;

    use chrono::{DateTime, Utc};

    use super::{MutableClock, NoJitter, RecordingSleeper, SwitchableRoomDirectory};
    use crate::domain::ports::{
        CustomerRegistry, DirectoryError, RoomRepository, RoomRepositoryError,
    };
    use crate::domain::{
        Amount, BillingService, BookingService, CheckInService, Customer, CustomerDraft,
        CustomerId, Directories, InvoiceNumberSource, Reconciler, ReconcilerConfig,
        ReconcilerPorts, ReconcilerRuntime, Room, RoomDirectoryService, RoomId, RoomStatus,
        RandomInvoiceNumbers, RoomLanes, RoomSync, StayPolicy,
    };
    use crate::inbound::http::state::HttpState;
    use crate::outbound::memory::{
        InMemoryBillingRepository, InMemoryBookingRepository, InMemoryCheckInRepository,
        InMemoryCustomerDirectory, InMemoryRoomIntentStore, InMemoryRoomRepository,
    };

    /// Remote call bound used by the rig.
    pub const RIG_TIMEOUT: Duration = Duration::from_secs(2);

    /// Every store and directory of one rental deployment, in memory.
    pub struct Rentals {
        /// Shared clock.
        pub clock: Arc<MutableClock>,
        /// Room store behind the room directory.
        pub rooms: Arc<InMemoryRoomRepository>,
        /// Room directory as the orchestrators see it.
        pub room_directory: Arc<SwitchableRoomDirectory>,
        /// Customer directory.
        pub customers: Arc<InMemoryCustomerDirectory>,
        /// Booking store.
        pub bookings: Arc<InMemoryBookingRepository>,
        /// Check-in store.
        pub check_ins: Arc<InMemoryCheckInRepository>,
        /// Invoice and payment store.
        pub billing: Arc<InMemoryBillingRepository>,
        /// Room-status intents.
        pub intents: Arc<InMemoryRoomIntentStore>,
        /// Per-room delivery ordering shared by room sync and the reconciler.
        pub lanes: RoomLanes,
    }

    impl Rentals {
        /// Build an empty deployment whose clock reads `now`.
        pub fn new(now: DateTime<Utc>) -> Self {
            let rooms = Arc::new(InMemoryRoomRepository::default());
            let service = Arc::new(RoomDirectoryService::new(rooms.clone()));
            Self {
                clock: Arc::new(MutableClock::new(now)),
                room_directory: Arc::new(SwitchableRoomDirectory::new(service)),
                rooms,
                customers: Arc::new(InMemoryCustomerDirectory::default()),
                bookings: Arc::new(InMemoryBookingRepository::default()),
                check_ins: Arc::new(InMemoryCheckInRepository::default()),
                billing: Arc::new(InMemoryBillingRepository::default()),
                intents: Arc::new(InMemoryRoomIntentStore::default()),
                lanes: RoomLanes::default(),
            }
        }

        /// Room administration over the same store, bypassing the switch.
        pub fn room_admin(&self) -> RoomDirectoryService {
            RoomDirectoryService::new(self.rooms.clone())
        }

        /// Both directories as the orchestrators read them.
        pub fn directories(&self) -> Directories {
            Directories::new(self.customers.clone(), self.room_directory.clone(), RIG_TIMEOUT)
        }

        /// Room sync writing intents to the shared store.
        pub fn room_sync(&self) -> RoomSync {
            RoomSync::new(
                self.room_directory.clone(),
                self.intents.clone(),
                self.lanes.clone(),
                self.clock.clone(),
                RIG_TIMEOUT,
            )
        }

        /// Booking orchestrator.
        pub fn booking_service(&self) -> BookingService {
            BookingService::new(
                self.bookings.clone(),
                self.directories(),
                self.room_sync(),
                self.clock.clone(),
            )
        }

        /// Check-in orchestrator with the given stay policy.
        pub fn check_in_service(&self, stay: StayPolicy) -> CheckInService {
            CheckInService::new(
                self.check_ins.clone(),
                self.bookings.clone(),
                self.directories(),
                self.room_sync(),
                self.clock.clone(),
                stay,
            )
        }

        /// Billing orchestrator drawing numbers from `numbers`.
        pub fn billing_service(&self, numbers: Arc<dyn InvoiceNumberSource>) -> BillingService {
            BillingService::new(
                self.billing.clone(),
                self.directories(),
                numbers,
                self.clock.clone(),
            )
        }

        /// Reconciler with recorded sleeps and no jitter.
        pub fn reconciler(&self, config: ReconcilerConfig) -> Reconciler {
            Reconciler::with_runtime(
                ReconcilerPorts::new(
                    self.room_directory.clone(),
                    self.intents.clone(),
                    self.lanes.clone(),
                ),
                self.clock.clone(),
                ReconcilerRuntime {
                    sleeper: Arc::new(RecordingSleeper::default()),
                    jitter: Arc::new(NoJitter),
                },
                config,
            )
        }

        /// Every driving port wired over this deployment, as the HTTP layer sees it.
        pub fn http_state(&self) -> HttpState {
            let booking_service = Arc::new(self.booking_service());
            let check_in_service = Arc::new(self.check_in_service(StayPolicy::default()));
            let billing_service = Arc::new(self.billing_service(Arc::new(RandomInvoiceNumbers)));
            HttpState {
                rooms: Arc::new(self.room_admin()),
                customers: self.customers.clone(),
                customer_registry: self.customers.clone(),
                bookings: booking_service,
                check_ins: check_in_service,
                invoices: billing_service.clone(),
                payments: billing_service,
                reconciliation: Arc::new(self.reconciler(ReconcilerConfig::default())),
            }
        }

        /// Store a customer under a fixed id.
        ///
        /// # Errors
        ///
        /// Fails when the customer store lock is poisoned.
        pub fn seed_customer(&self, id: u64, full_name: &str) -> Result<Customer, DirectoryError> {
            let customer = Customer {
                id: CustomerId::new(id),
                full_name: full_name.to_owned(),
                phone_number: None,
                email: None,
            };
            self.customers.seed(customer.clone())?;
            Ok(customer)
        }

        /// Register a customer through the registry.
        ///
        /// # Errors
        ///
        /// Fails when the customer store lock is poisoned.
        pub async fn register_customer(&self, full_name: &str) -> Result<Customer, DirectoryError> {
            self.customers
                .register(CustomerDraft {
                    full_name: full_name.to_owned(),
                    phone_number: None,
                    email: None,
                })
                .await
        }

        /// Store an Available room under a fixed id.
        ///
        /// # Errors
        ///
        /// Fails when the room store lock is poisoned.
        pub fn seed_room(
            &self,
            id: u64,
            room_number: &str,
            monthly_price: u64,
        ) -> Result<Room, RoomRepositoryError> {
            let room = Room {
                id: RoomId::new(id),
                room_number: room_number.to_owned(),
                monthly_price: Amount::new(monthly_price),
                status: RoomStatus::Available,
                description: None,
            };
            self.rooms.seed(room.clone())?;
            Ok(room)
        }

        /// Current status of a room straight from the store.
        ///
        /// # Errors
        ///
        /// Fails when the room store lock is poisoned.
        pub async fn room_status(&self, id: RoomId) -> Result<Option<RoomStatus>, RoomRepositoryError> {
            Ok(self.rooms.find_by_id(id).await?.map(|room| room.status))
        }
    }
}
