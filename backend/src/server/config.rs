//! HTTP server configuration object and helpers.

use std::net::SocketAddr;

use rentals::settings::RentalSettings;

/// Configuration for creating the HTTP server.
#[derive(Debug, Clone, Copy)]
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
}

impl ServerConfig {
    /// Construct a server configuration bound to `bind_addr`.
    #[must_use]
    pub const fn new(bind_addr: SocketAddr) -> Self {
        Self { bind_addr }
    }

    /// Derive the server configuration from loaded settings.
    #[must_use]
    pub fn from_settings(settings: &RentalSettings) -> Self {
        Self::new(settings.bind_addr())
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub const fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
