//! Reconnection with bounded exponential backoff and jitter.
//!
//! [`RetryingConnection`] composes a [`ManagedConnection`] with a
//! [`RetryPolicy`] and per-instance [`RetryState`] - there is no shared
//! registry; every connection owns its own backoff history. The driver loop
//! in [`run`](RetryingConnection::run) observes the `Connected ->
//! Disconnected` transition synchronously and schedules the next attempt.
//!
//! Backoff grows by the golden ratio and is capped; jitter redraws each delay
//! from a normal distribution so that many instances losing the same peer do
//! not reconnect in lockstep. Both constants are configuration, not
//! structure.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rand_distr::{Distribution, Normal};

use super::managed::{ConnectionConfig, ConnectionState, ManagedConnection};
use super::ConnectionHandler;
use crate::error::{FramewireError, Result};

/// Backoff growth factor: the golden ratio.
pub const GOLDEN_RATIO_FACTOR: f64 = 1.6180339887498948;

/// Default jitter fraction (standard deviation as a fraction of the delay).
pub const DEFAULT_JITTER_FRACTION: f64 = 0.119626565582;

/// Default delay before the first retry.
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(1);

/// Default backoff ceiling.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(3600);

/// Floor applied after jitter so a redraw can never schedule an immediate or
/// negative retry.
const MIN_DELAY_SECS: f64 = 0.001;

/// Tuning for the retry loop. All fields have the reference defaults.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Delay the backoff restarts from after a successful connect.
    pub initial_delay: Duration,
    /// Ceiling the growing delay is clamped to.
    pub max_delay: Duration,
    /// Multiplier applied to the delay before each attempt.
    pub factor: f64,
    /// Jitter fraction; `None` disables jitter.
    pub jitter: Option<f64>,
    /// Give up after this many consecutive failed attempts; `None` retries
    /// forever.
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay: DEFAULT_INITIAL_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            factor: GOLDEN_RATIO_FACTOR,
            jitter: Some(DEFAULT_JITTER_FRACTION),
            max_attempts: None,
        }
    }
}

/// Outcome of one retry-policy step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum RetryStep {
    /// Schedule the next attempt after this delay.
    Wait(Duration),
    /// The kill-switch was flipped; stop permanently.
    Cancelled,
    /// The attempt cap was exceeded; stop permanently.
    Exhausted(u32),
}

/// Mutable backoff state, owned by one connection instance.
#[derive(Debug)]
pub(crate) struct RetryState {
    /// Current delay in seconds. The jittered value is stored back, so it
    /// feeds the next multiplication.
    delay: f64,
    /// Consecutive failed attempts since the last successful connect.
    attempts: u32,
    /// Cooperative kill-switch, shared with [`CancelHandle`]s.
    continue_trying: Arc<AtomicBool>,
}

impl RetryState {
    pub(crate) fn new(policy: &RetryPolicy) -> Self {
        Self {
            delay: policy.initial_delay.as_secs_f64(),
            attempts: 0,
            continue_trying: Arc::new(AtomicBool::new(true)),
        }
    }

    /// A full recovery clears backoff history.
    pub(crate) fn reset(&mut self, policy: &RetryPolicy) {
        self.delay = policy.initial_delay.as_secs_f64();
        self.attempts = 0;
    }

    pub(crate) fn continue_trying(&self) -> bool {
        self.continue_trying.load(Ordering::SeqCst)
    }

    pub(crate) fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.continue_trying)
    }

    /// Apply one step of the retry policy and compute the next delay.
    pub(crate) fn next_step(&mut self, policy: &RetryPolicy) -> RetryStep {
        if !self.continue_trying() {
            return RetryStep::Cancelled;
        }

        self.attempts += 1;
        if let Some(max) = policy.max_attempts {
            if self.attempts > max {
                return RetryStep::Exhausted(self.attempts);
            }
        }

        self.delay = (self.delay * policy.factor).min(policy.max_delay.as_secs_f64());
        if let Some(fraction) = policy.jitter {
            if let Ok(normal) = Normal::new(self.delay, self.delay * fraction) {
                self.delay = normal.sample(&mut rand::thread_rng());
            }
            self.delay = self.delay.max(MIN_DELAY_SECS);
        }

        RetryStep::Wait(Duration::from_secs_f64(self.delay))
    }
}

/// Kill-switch for a [`RetryingConnection`]'s reconnect loop.
///
/// Cancellation is cooperative: a connect attempt already in flight completes
/// and its outcome is discarded, and a pending retry timer re-checks the flag
/// when it fires before reconnecting.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    continue_trying: Arc<AtomicBool>,
}

impl CancelHandle {
    /// Stop retrying permanently. No future scheduled attempt will connect.
    pub fn cancel(&self) {
        self.continue_trying.store(false, Ordering::SeqCst);
    }

    /// Whether the loop has been told to stop.
    pub fn is_cancelled(&self) -> bool {
        !self.continue_trying.load(Ordering::SeqCst)
    }
}

/// A [`ManagedConnection`] that re-establishes itself after loss.
///
/// Constructed through [`builder`](Self::builder) for tuning, or
/// [`new`](Self::new) for the defaults.
pub struct RetryingConnection<H: ConnectionHandler> {
    inner: ManagedConnection<H>,
    policy: RetryPolicy,
    retry: RetryState,
}

impl<H: ConnectionHandler> RetryingConnection<H> {
    /// Create a retrying connection with default policy and configuration.
    pub fn new(host: impl Into<String>, port: u16, handler: H) -> Self {
        Self::builder(host, port).build(handler)
    }

    /// Start building a retrying connection for the given peer.
    pub fn builder(host: impl Into<String>, port: u16) -> RetryingConnectionBuilder {
        RetryingConnectionBuilder::new(host, port)
    }

    /// Obtain the cooperative kill-switch for this connection's retry loop.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            continue_trying: self.retry.cancel_flag(),
        }
    }

    /// Drive the connection: connect, deliver events until loss, back off,
    /// reconnect. Returns when retrying stops - through cancellation or an
    /// exceeded attempt cap - leaving the connection `Disconnected`.
    /// Abandonment is reported via log diagnostics, not as an error.
    pub async fn run(&mut self) -> Result<()> {
        loop {
            if !self.retry.continue_trying() {
                tracing::info!(
                    peer = %self.inner.peer_addr(),
                    "abandoning on explicit request"
                );
                break;
            }

            match self.inner.connect().await {
                Ok(()) => {
                    self.retry.reset(&self.policy);
                    // Pump until the transport ends the connection; the
                    // handler is notified inside.
                    self.inner.pump().await?;
                }
                Err(FramewireError::Io(_)) | Err(FramewireError::ConnectTimeout) => {
                    // Failed attempt, already logged by connect.
                }
                Err(e) => return Err(e),
            }

            match self.retry.next_step(&self.policy) {
                RetryStep::Wait(delay) => {
                    self.inner.set_state(ConnectionState::Retrying);
                    tracing::debug!(
                        peer = %self.inner.peer_addr(),
                        "retrying in {:.2} s",
                        delay.as_secs_f64()
                    );
                    tokio::time::sleep(delay).await;
                    // The flag is re-checked at the top of the loop before
                    // the attempt actually connects.
                    self.inner.set_state(ConnectionState::Disconnected);
                }
                RetryStep::Cancelled => {
                    tracing::info!(
                        peer = %self.inner.peer_addr(),
                        "abandoning on explicit request"
                    );
                    break;
                }
                RetryStep::Exhausted(attempts) => {
                    tracing::warn!(
                        peer = %self.inner.peer_addr(),
                        "abandoning after {} attempts",
                        attempts
                    );
                    break;
                }
            }
        }
        Ok(())
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.inner.state()
    }

    /// Whether a socket is currently established.
    pub fn is_connected(&self) -> bool {
        self.inner.is_connected()
    }

    /// Borrow the underlying managed connection.
    pub fn connection(&self) -> &ManagedConnection<H> {
        &self.inner
    }

    /// Mutably borrow the underlying managed connection.
    pub fn connection_mut(&mut self) -> &mut ManagedConnection<H> {
        &mut self.inner
    }
}

/// Fluent builder for [`RetryingConnection`].
pub struct RetryingConnectionBuilder {
    host: String,
    port: u16,
    policy: RetryPolicy,
    config: ConnectionConfig,
}

impl RetryingConnectionBuilder {
    fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            policy: RetryPolicy::default(),
            config: ConnectionConfig::default(),
        }
    }

    /// Delay before the first retry. Default: 1 s.
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.policy.initial_delay = delay;
        self
    }

    /// Backoff ceiling. Default: 3600 s.
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.policy.max_delay = delay;
        self
    }

    /// Backoff growth factor. Default: the golden ratio.
    pub fn factor(mut self, factor: f64) -> Self {
        self.policy.factor = factor;
        self
    }

    /// Jitter fraction, or `None` to disable jitter.
    pub fn jitter(mut self, fraction: Option<f64>) -> Self {
        self.policy.jitter = fraction;
        self
    }

    /// Give up after this many consecutive failed attempts.
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.policy.max_attempts = Some(attempts);
        self
    }

    /// Bound each connect attempt by a timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = Some(timeout);
        self
    }

    /// Read buffer size for the pump loop.
    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.config.read_buffer_size = size;
        self
    }

    /// Outbound channel capacity (chunks).
    pub fn outbound_capacity(mut self, capacity: usize) -> Self {
        self.config.outbound_capacity = capacity;
        self
    }

    /// Build the connection with the given handler.
    pub fn build<H: ConnectionHandler>(self, handler: H) -> RetryingConnection<H> {
        let retry = RetryState::new(&self.policy);
        RetryingConnection {
            inner: ManagedConnection::with_config(self.host, self.port, handler, self.config),
            policy: self.policy,
            retry,
        }
    }
}
