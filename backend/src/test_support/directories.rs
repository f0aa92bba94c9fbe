//! Room directory double that can be taken offline.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::domain::ports::{DirectoryError, RoomDirectory, RoomStatusError};
use crate::domain::{Room, RoomId, RoomStatusChange};

/// Wraps a real room directory and simulates outages on demand.
///
/// Reads and status writes fail independently so a test can let
/// precondition reads through while the post-commit update is lost.
pub struct SwitchableRoomDirectory {
    inner: Arc<dyn RoomDirectory>,
    reads_online: AtomicBool,
    writes_online: AtomicBool,
    set_status_calls: AtomicUsize,
}

impl SwitchableRoomDirectory {
    /// Start online in front of `inner`.
    pub fn new(inner: Arc<dyn RoomDirectory>) -> Self {
        Self {
            inner,
            reads_online: AtomicBool::new(true),
            writes_online: AtomicBool::new(true),
            set_status_calls: AtomicUsize::new(0),
        }
    }

    /// Fail status writes while reads keep working.
    pub fn fail_writes(&self) {
        self.writes_online.store(false, Ordering::SeqCst);
    }

    /// Fail reads and writes.
    pub fn take_offline(&self) {
        self.reads_online.store(false, Ordering::SeqCst);
        self.writes_online.store(false, Ordering::SeqCst);
    }

    /// Bring reads and writes back.
    pub fn restore(&self) {
        self.reads_online.store(true, Ordering::SeqCst);
        self.writes_online.store(true, Ordering::SeqCst);
    }

    /// Status writes attempted so far, including failed ones.
    pub fn set_status_calls(&self) -> usize {
        self.set_status_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RoomDirectory for SwitchableRoomDirectory {
    async fn get_by_id(&self, id: RoomId) -> Result<Option<Room>, DirectoryError> {
        if !self.reads_online.load(Ordering::SeqCst) {
            return Err(DirectoryError::unavailable("simulated room directory outage"));
        }
        self.inner.get_by_id(id).await
    }

    async fn set_status(&self, change: &RoomStatusChange) -> Result<Room, RoomStatusError> {
        self.set_status_calls.fetch_add(1, Ordering::SeqCst);
        if !self.writes_online.load(Ordering::SeqCst) {
            return Err(RoomStatusError::unavailable(
                "simulated room directory outage",
            ));
        }
        self.inner.set_status(change).await
    }
}
