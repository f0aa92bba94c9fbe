//! Reqwest-backed clients for the remote customer and room directories.
//!
//! These adapters own transport details only: URL building, timeouts,
//! trace-id forwarding and mapping HTTP statuses onto the directory port
//! errors.

mod client;
mod dto;
mod http_customer_directory;
mod http_room_directory;

pub use http_customer_directory::HttpCustomerDirectory;
pub use http_room_directory::HttpRoomDirectory;
