//! Admission control for the Gatekeeper server.
//!
//! A single [`TokenBucket`] sits in front of every inbound request and answers one question:
//! may this request proceed? The bucket holds up to `capacity` tokens and regenerates one token
//! per refill interval. Time is read through the [`Clock`] trait so tests can drive it by hand.

#![deny(missing_docs)]

mod bucket;
mod clock;
mod error;

pub use bucket::TokenBucket;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::ConfigurationError;
