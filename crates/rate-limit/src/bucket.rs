//! The token bucket shared by every request handler.

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use config::RateLimitConfig;

use crate::clock::{Clock, SystemClock};
use crate::error::ConfigurationError;

/// A single global token bucket.
///
/// The bucket starts full. Every admitted call takes one token, and one token comes back for
/// each whole refill interval that passed since the last refill, up to the capacity.
///
/// Refills are counted in whole intervals only, and the refill mark jumps to the time of the
/// call that observed them. Progress toward the next token is dropped at that point: with a one
/// second interval, a call at 1.5s gets a token and the next one is not available before 2.5s.
#[derive(Debug)]
pub struct TokenBucket<C = SystemClock> {
    capacity: u32,
    refill_interval: Duration,
    clock: C,
    state: Mutex<BucketState>,
}

#[derive(Debug)]
struct BucketState {
    tokens: u32,
    last_refill: Instant,
}

impl TokenBucket {
    /// Create a full bucket reading the system clock.
    pub fn new(capacity: u32, refill_interval: Duration) -> Result<Self, ConfigurationError> {
        Self::with_clock(capacity, refill_interval, SystemClock)
    }

    /// Create a full bucket from the server configuration.
    pub fn from_config(config: &RateLimitConfig) -> Result<Self, ConfigurationError> {
        Self::new(config.capacity, config.refill_interval)
    }
}

impl<C: Clock> TokenBucket<C> {
    /// Create a full bucket reading time from `clock`.
    pub fn with_clock(capacity: u32, refill_interval: Duration, clock: C) -> Result<Self, ConfigurationError> {
        if capacity == 0 {
            return Err(ConfigurationError::ZeroCapacity);
        }

        if refill_interval.is_zero() {
            return Err(ConfigurationError::ZeroRefillInterval);
        }

        log::debug!("Creating token bucket with capacity {capacity}, one token every {refill_interval:?}");

        let state = BucketState {
            tokens: capacity,
            last_refill: clock.now(),
        };

        Ok(Self {
            capacity,
            refill_interval,
            clock,
            state: Mutex::new(state),
        })
    }

    /// Decide whether one unit of work may proceed.
    ///
    /// Never blocks beyond the short critical section and never fails. A `false` means the
    /// caller must reject the work without calling again for it.
    pub fn allow(&self) -> bool {
        // Nothing below can panic mid-update, so a poisoned lock still guards valid state.
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        let now = self.clock.now();
        let intervals = whole_intervals(now.saturating_duration_since(state.last_refill), self.refill_interval);

        if intervals > 0 {
            state.tokens = state.tokens.saturating_add(intervals).min(self.capacity);
            state.last_refill = now;
        }

        if state.tokens == 0 {
            log::debug!("Request rejected, token bucket is empty");
            return false;
        }

        state.tokens -= 1;
        log::trace!("Request admitted, {} tokens left", state.tokens);

        true
    }

    /// Maximum number of tokens, i.e. the largest burst admitted with no time passing.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Time needed to regenerate one token.
    pub fn refill_interval(&self) -> Duration {
        self.refill_interval
    }
}

fn whole_intervals(elapsed: Duration, interval: Duration) -> u32 {
    let count = elapsed.as_nanos() / interval.as_nanos();
    u32::try_from(count).unwrap_or(u32::MAX)
}
