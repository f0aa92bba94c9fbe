//! Store-assigned entity identifiers.
//!
//! Every owning store hands out positive 64-bit identifiers in creation
//! order. Wrapping them in distinct newtypes keeps a booking id from being
//! passed where a room id is expected.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! define_entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Wrap a raw identifier.
            #[must_use]
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            /// Raw numeric value.
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }
    };
}

define_entity_id!(
    /// Identifier of a customer record held by the customer directory.
    CustomerId
);
define_entity_id!(
    /// Identifier of a room held by the room directory.
    RoomId
);
define_entity_id!(
    /// Identifier of a booking.
    BookingId
);
define_entity_id!(
    /// Identifier of a check-in.
    CheckInId
);
define_entity_id!(
    /// Identifier of an invoice.
    InvoiceId
);
define_entity_id!(
    /// Identifier of a payment.
    PaymentId
);
define_entity_id!(
    /// Identifier of a recorded room-status intent.
    IntentId
);
