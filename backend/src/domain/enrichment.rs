//! Best-effort display enrichment.
//!
//! Views returned by the orchestrators carry a customer name and room number
//! looked up from the directories after the primary operation has finished.
//! Lookup failures are collected as [`EnrichmentIssue`]s and logged; they
//! never change the outcome of the operation being decorated.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::ports::{CustomerDirectory, DirectoryError, RoomDirectory};
use super::{CustomerId, InvoiceNumber, RoomId};

/// Display-only fields attached to views.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayFields {
    /// Customer full name, when the customer directory answered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    /// Room number, when the room directory answered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_number: Option<String>,
    /// Number of the linked invoice, for payments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_number: Option<InvoiceNumber>,
}

/// A lookup that did not contribute to the display fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrichmentIssue {
    /// The customer directory failed.
    CustomerLookup(DirectoryError),
    /// The customer directory had no such customer.
    CustomerMissing(CustomerId),
    /// The room directory failed.
    RoomLookup(DirectoryError),
    /// The room directory had no such room.
    RoomMissing(RoomId),
}

/// Display fields plus whatever went wrong collecting them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Enrichment {
    /// Fields that could be resolved.
    pub display: DisplayFields,
    /// Lookups that failed or found nothing.
    pub issues: Vec<EnrichmentIssue>,
}

impl Enrichment {
    /// Log any issues at debug level and keep the display fields.
    #[must_use]
    pub fn into_display(self) -> DisplayFields {
        for issue in &self.issues {
            debug!(?issue, "display enrichment incomplete");
        }
        self.display
    }
}

/// Resolves display fields from the customer and room directories.
#[derive(Clone)]
pub struct Enricher {
    customers: Arc<dyn CustomerDirectory>,
    rooms: Arc<dyn RoomDirectory>,
    timeout: Duration,
}

impl Enricher {
    /// Build an enricher whose lookups are each bounded by `timeout`.
    pub fn new(
        customers: Arc<dyn CustomerDirectory>,
        rooms: Arc<dyn RoomDirectory>,
        timeout: Duration,
    ) -> Self {
        Self {
            customers,
            rooms,
            timeout,
        }
    }

    /// Look up the customer name and room number.
    pub async fn describe(&self, customer_id: CustomerId, room_id: RoomId) -> Enrichment {
        let mut enrichment = Enrichment::default();
        let (customer, room) = tokio::join!(
            self.bounded(self.customers.get_by_id(customer_id)),
            self.bounded(self.rooms.get_by_id(room_id)),
        );
        match customer {
            Ok(Some(found)) => enrichment.display.customer_name = Some(found.full_name),
            Ok(None) => enrichment
                .issues
                .push(EnrichmentIssue::CustomerMissing(customer_id)),
            Err(error) => enrichment
                .issues
                .push(EnrichmentIssue::CustomerLookup(error)),
        }
        match room {
            Ok(Some(found)) => enrichment.display.room_number = Some(found.room_number),
            Ok(None) => enrichment.issues.push(EnrichmentIssue::RoomMissing(room_id)),
            Err(error) => enrichment.issues.push(EnrichmentIssue::RoomLookup(error)),
        }
        enrichment
    }

    async fn bounded<T, F>(&self, lookup: F) -> Result<T, DirectoryError>
    where
        F: Future<Output = Result<T, DirectoryError>>,
    {
        tokio::time::timeout(self.timeout, lookup)
            .await
            .unwrap_or_else(|_| {
                Err(DirectoryError::timeout(format!(
                    "display lookup exceeded {}ms",
                    self.timeout.as_millis()
                )))
            })
    }
}
