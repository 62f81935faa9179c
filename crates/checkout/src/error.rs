//! Checkout error taxonomy.

use thiserror::Error;

use bindery_core::DomainError;

use crate::quote::RateError;

/// Errors surfaced by quoting and checkout submission.
///
/// Every variant maps to a structured, human-readable response; the progress
/// channel is never the authoritative failure signal.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    /// Malformed input, rejected before any side effect.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The quote's validity window has passed; a new quote must be issued.
    #[error("quote expired")]
    QuoteExpired,

    /// The quote token was already consumed by an earlier submission.
    #[error("quote already used")]
    QuoteAlreadyUsed,

    /// The presented token does not match any issued quote.
    #[error("unknown quote token")]
    UnknownQuoteToken,

    /// The selected shipping level is not among the quote's options.
    #[error("shipping level not offered by this quote")]
    UnknownShippingLevel,

    /// Downstream rate lookup failed; retryable, no quote issued.
    #[error("rate lookup unavailable: {0}")]
    RateUnavailable(String),

    /// A step inside `Processing` failed; the session moves to `Failed`.
    #[error("checkout step '{step}' failed: {message}")]
    StepFailed { step: &'static str, message: String },

    /// The session was asked to do something its current stage forbids.
    #[error("invalid checkout stage: {0}")]
    InvalidStage(String),
}

impl CheckoutError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn step_failed(step: &'static str, message: impl Into<String>) -> Self {
        Self::StepFailed {
            step,
            message: message.into(),
        }
    }
}

impl From<DomainError> for CheckoutError {
    fn from(err: DomainError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<RateError> for CheckoutError {
    fn from(err: RateError) -> Self {
        match err {
            RateError::Unavailable(msg) => Self::RateUnavailable(msg),
        }
    }
}
