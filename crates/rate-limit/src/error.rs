//! Error types for rate limiting.

/// Invalid rate limiter configuration.
///
/// Only construction of a [`TokenBucket`](crate::TokenBucket) can fail. Deciding whether a request
/// is admitted never produces an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    /// The bucket must hold at least one token.
    #[error("Rate limit capacity must be greater than zero")]
    ZeroCapacity,

    /// Tokens must take a non-zero amount of time to regenerate.
    #[error("Rate limit refill interval must be greater than zero")]
    ZeroRefillInterval,
}
