//! Customer records as seen through the customer directory.

use serde::{Deserialize, Serialize};

use super::CustomerId;

/// A customer known to the customer directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    /// Directory-assigned identifier.
    pub id: CustomerId,
    /// Display name used for enrichment.
    pub full_name: String,
    /// Optional contact number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    /// Optional contact email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Registration payload for a new customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDraft {
    /// Display name; must not be blank.
    pub full_name: String,
    /// Optional contact number.
    #[serde(default)]
    pub phone_number: Option<String>,
    /// Optional contact email.
    #[serde(default)]
    pub email: Option<String>,
}
