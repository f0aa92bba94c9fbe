//! In-process store adapters.
//!
//! Each adapter keeps its records in a `BTreeMap` keyed by the numeric id
//! behind a `std::sync::Mutex`. Locks are only held for the duration of a
//! synchronous critical section and never across an `.await`. Ids are
//! assigned in creation order, so iteration order is creation order.

mod billing;
mod bookings;
mod check_ins;
mod customers;
mod intents;
mod rooms;

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

pub use billing::InMemoryBillingRepository;
pub use bookings::InMemoryBookingRepository;
pub use check_ins::InMemoryCheckInRepository;
pub use customers::InMemoryCustomerDirectory;
pub use intents::InMemoryRoomIntentStore;
pub use rooms::InMemoryRoomRepository;

const POISONED: &str = "store lock poisoned by a panicking writer";

/// Rows plus the id counter guarding them.
struct TableState<T> {
    last_id: u64,
    rows: BTreeMap<u64, T>,
}

impl<T> TableState<T> {
    fn allocate(&mut self) -> u64 {
        self.last_id = self.last_id.saturating_add(1);
        self.last_id
    }

    /// Store a row under a caller-chosen id, keeping later allocations above it.
    fn seed(&mut self, id: u64, row: T) {
        self.last_id = self.last_id.max(id);
        self.rows.insert(id, row);
    }
}

struct Table<T> {
    state: Mutex<TableState<T>>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            state: Mutex::new(TableState {
                last_id: 0,
                rows: BTreeMap::new(),
            }),
        }
    }
}

impl<T> Table<T> {
    /// Lock the table, mapping a poisoned lock onto the adapter's
    /// connection error.
    fn lock<E, C>(&self, connection: C) -> Result<MutexGuard<'_, TableState<T>>, E>
    where
        C: FnOnce(&'static str) -> E,
    {
        self.state.lock().map_err(|_| connection(POISONED))
    }
}
