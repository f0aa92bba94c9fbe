//! Service configuration loaded via OrthoConfig.
//!
//! Every value can come from the command line, a `RENTALS_*` environment
//! variable or a configuration file. Unset values fall back to the defaults
//! exposed by the accessors below.

use std::net::SocketAddr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

use crate::domain::{ReconcilerConfig, StayPolicy};

const DEFAULT_BIND_ADDR: ([u8; 4], u16) = ([0, 0, 0, 0], 8080);
const DEFAULT_REMOTE_TIMEOUT_MS: u64 = 3_000;
const DEFAULT_STAY_MONTHS: u32 = 1;

/// Configuration values for one rentals deployment.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "RENTALS")]
pub struct RentalSettings {
    /// Socket address the HTTP server binds to.
    pub bind_addr: Option<SocketAddr>,
    /// Base URL of a remote room directory; rooms are served in-process when unset.
    pub room_directory_url: Option<Url>,
    /// Base URL of a remote customer directory; customers are served in-process when unset.
    pub customer_directory_url: Option<Url>,
    /// Bound on each call to a directory, in milliseconds.
    pub remote_timeout_ms: Option<u64>,
    /// Length of a stay in calendar months.
    pub stay_months: Option<u32>,
    /// Pause between reconciliation sweeps, in milliseconds.
    pub reconcile_interval_ms: Option<u64>,
    /// Delay after the first failed re-delivery, in milliseconds.
    pub reconcile_initial_backoff_ms: Option<u64>,
    /// Cap on the re-delivery delay, in milliseconds.
    pub reconcile_max_backoff_ms: Option<u64>,
    /// Failed re-deliveries after which an intent needs an operator.
    pub reconcile_max_attempts: Option<u32>,
    /// Seed demo rooms and customers into the in-process directories.
    #[ortho_config(default = false)]
    pub seed_demo: bool,
}

impl RentalSettings {
    /// Socket address to bind, defaulting to `0.0.0.0:8080`.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
            .unwrap_or_else(|| SocketAddr::from(DEFAULT_BIND_ADDR))
    }

    /// Bound on each directory call.
    #[must_use]
    pub fn remote_timeout(&self) -> Duration {
        Duration::from_millis(
            self.remote_timeout_ms
                .unwrap_or(DEFAULT_REMOTE_TIMEOUT_MS),
        )
    }

    /// Stay policy used for check-ins.
    #[must_use]
    pub fn stay_policy(&self) -> StayPolicy {
        StayPolicy::months(self.stay_months.unwrap_or(DEFAULT_STAY_MONTHS))
    }

    /// Reconciler settings layered over [`ReconcilerConfig::default`].
    ///
    /// Directory calls made while reconciling share the remote timeout.
    #[must_use]
    pub fn reconciler_config(&self) -> ReconcilerConfig {
        let defaults = ReconcilerConfig::default();
        ReconcilerConfig {
            sweep_interval: self
                .reconcile_interval_ms
                .map_or(defaults.sweep_interval, Duration::from_millis),
            initial_backoff: self
                .reconcile_initial_backoff_ms
                .map_or(defaults.initial_backoff, Duration::from_millis),
            max_backoff: self
                .reconcile_max_backoff_ms
                .map_or(defaults.max_backoff, Duration::from_millis),
            max_attempts: self.reconcile_max_attempts.or(defaults.max_attempts),
            call_timeout: self.remote_timeout(),
            ..defaults
        }
    }
}
