//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! This module follows the hexagonal architecture pattern, providing concrete
//! implementations of the driven ports:
//!
//! - **memory**: in-process stores for rooms, customers, bookings,
//!   check-ins, billing and room-status intents
//! - **directory**: reqwest clients for remote room and customer directories
//!
//! Adapters are thin translators between domain types and their transport or
//! storage representation. They contain no business logic.

pub mod directory;
pub mod memory;
