//! Configuration for CompassKV
//!
//! Centralized configuration with sensible defaults.

use std::time::Duration;

/// Main configuration for a CompassKV client
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Server Configuration
    // -------------------------------------------------------------------------
    /// Address of the shard service (host:port)
    pub server_addr: String,

    /// Namespace whose shard assignments the client routes against
    pub namespace: String,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// Connect timeout
    pub connect_timeout: Duration,

    /// Socket read timeout
    pub read_timeout: Duration,

    /// Socket write timeout
    pub write_timeout: Duration,

    /// Grace period for in-flight operations to drain on close
    pub shutdown_grace: Duration,

    // -------------------------------------------------------------------------
    // Retry Configuration
    // -------------------------------------------------------------------------
    /// Retry policy applied to per-operation remote calls
    pub retry: RetryPolicy,
}

/// Retry policy for remote operations
///
/// The default is a single attempt (no retry); anything more is opt-in.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts per operation, including the first
    pub max_attempts: u32,

    /// Delay schedule between attempts
    pub backoff: BackoffStrategy,
}

/// Backoff schedule between retry attempts
#[derive(Debug, Clone, Copy)]
pub enum BackoffStrategy {
    /// Retry immediately
    None,

    /// Fixed delay between attempts
    Fixed { delay: Duration },

    /// Delay doubles after each attempt, capped
    Exponential { base: Duration, cap: Duration },
}

impl RetryPolicy {
    /// Single attempt, no retry
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            backoff: BackoffStrategy::None,
        }
    }

    /// Delay to sleep before the given retry attempt (1-based)
    pub fn delay_before(&self, attempt: u32) -> Duration {
        match self.backoff {
            BackoffStrategy::None => Duration::ZERO,
            BackoffStrategy::Fixed { delay } => delay,
            BackoffStrategy::Exponential { base, cap } => {
                let exp = attempt.saturating_sub(1).min(16);
                base.saturating_mul(1u32 << exp).min(cap)
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::no_retry()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: "127.0.0.1:6648".to_string(),
            namespace: "default".to_string(),
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(5),
            write_timeout: Duration::from_secs(5),
            shutdown_grace: Duration::from_secs(5),
            retry: RetryPolicy::no_retry(),
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the server address (host:port)
    pub fn server_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.server_addr = addr.into();
        self
    }

    /// Set the namespace to route against
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.config.namespace = namespace.into();
        self
    }

    /// Set the connect timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set the socket read timeout
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout = timeout;
        self
    }

    /// Set the socket write timeout
    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.config.write_timeout = timeout;
        self
    }

    /// Set the shutdown grace period
    pub fn shutdown_grace(mut self, grace: Duration) -> Self {
        self.config.shutdown_grace = grace;
        self
    }

    /// Set the retry policy for remote operations
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.config.retry = policy;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
