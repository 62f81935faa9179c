//! Checkout domain: time-limited quotes, the client-held checkout state
//! machine, and the server-side processing pipeline that streams progress.
//!
//! Rate lookup, order persistence, and payment capture are external
//! collaborators behind [`RateSource`], [`OrderGateway`], and
//! [`PaymentGateway`]. The progress channel is behind [`ProgressSink`] so the
//! pipeline never depends on delivery.

pub mod address;
pub mod error;
pub mod processor;
pub mod progress;
pub mod quote;
pub mod session;

pub use address::ShippingAddress;
pub use error::CheckoutError;
pub use processor::{
    CheckoutOutcome, CheckoutProcessor, OrderGateway, PaymentGateway, PaymentSession, TOTAL_STEPS,
};
pub use progress::{NullSink, ProgressEvent, ProgressSink};
pub use quote::{
    FlatRateSource, Quote, QuoteIssuer, QuoteRegistry, QuoteToken, RateError, RateSource,
    ShippingLevel, ShippingOption,
};
pub use session::{CheckoutSession, CheckoutStage};
