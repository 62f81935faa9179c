//! Server-side body of the `Processing` state: order creation, payment
//! session creation, external handoff.
//!
//! Each step publishes a progress event *before* it starts, strictly in
//! execution order. The synchronous return value is the authoritative
//! success/failure signal; the channel is UX only.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use bindery_core::{BookId, OrderId};

use crate::error::CheckoutError;
use crate::progress::{ProgressEvent, ProgressSink};
use crate::quote::{Quote, QuoteRegistry, QuoteToken, ShippingLevel};

/// Number of sub-steps inside `Processing`.
pub const TOTAL_STEPS: u32 = 3;

/// External order persistence.
pub trait OrderGateway: Send + Sync {
    fn create_order(
        &self,
        book_id: BookId,
        quote: &Quote,
        level: ShippingLevel,
    ) -> Result<OrderId, String>;
}

/// Hosted payment session as returned by the processor's gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentSession {
    pub session_id: String,
    pub redirect_url: String,
}

/// External payment processor.
pub trait PaymentGateway: Send + Sync {
    fn create_payment_session(
        &self,
        order_id: OrderId,
        amount: u64,
        currency: &str,
    ) -> Result<PaymentSession, String>;
}

/// Result of a successfully processed checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutOutcome {
    pub order_id: OrderId,
    pub redirect_url: String,
}

pub struct CheckoutProcessor {
    quotes: Arc<QuoteRegistry>,
    orders: Arc<dyn OrderGateway>,
    payments: Arc<dyn PaymentGateway>,
    progress: Arc<dyn ProgressSink>,
}

impl CheckoutProcessor {
    pub fn new(
        quotes: Arc<QuoteRegistry>,
        orders: Arc<dyn OrderGateway>,
        payments: Arc<dyn PaymentGateway>,
        progress: Arc<dyn ProgressSink>,
    ) -> Self {
        Self {
            quotes,
            orders,
            payments,
            progress,
        }
    }

    /// Run the checkout sequence for a submitted token.
    ///
    /// Validity is checked before any side effect; the token is consumed the
    /// moment processing begins, so a concurrent or repeated submission with
    /// the same token is rejected. On step failure exactly one error event is
    /// published before returning.
    pub fn process(
        &self,
        book_id: BookId,
        token: QuoteToken,
        level: ShippingLevel,
        now: DateTime<Utc>,
    ) -> Result<CheckoutOutcome, CheckoutError> {
        let quote = self.quotes.resolve(token, now)?;

        if quote.book_id != book_id {
            return Err(CheckoutError::validation(
                "quote was issued for a different book",
            ));
        }
        if quote.is_expired(now) {
            return Err(CheckoutError::QuoteExpired);
        }
        let option = quote
            .option(level)
            .ok_or(CheckoutError::UnknownShippingLevel)?
            .clone();

        // Single-use: consuming here means a retry after failure needs a
        // fresh quote, which is exactly the stale-price protection we want.
        self.quotes.consume(token, now)?;

        let total = quote.total(&option);
        debug!(%book_id, %token, ?level, total, "checkout processing started");

        self.run_steps(book_id, &quote, level, total)
            .inspect_err(|err| {
                // Exactly one error event per aborted processing run.
                self.progress
                    .publish(book_id, ProgressEvent::error(err.to_string()));
                warn!(%book_id, error = %err, "checkout processing failed");
            })
    }

    fn run_steps(
        &self,
        book_id: BookId,
        quote: &Quote,
        level: ShippingLevel,
        total: u64,
    ) -> Result<CheckoutOutcome, CheckoutError> {
        self.announce(book_id, 1, "creating order");
        let order_id = self
            .orders
            .create_order(book_id, quote, level)
            .map_err(|e| CheckoutError::step_failed("order_creation", e))?;

        self.announce(book_id, 2, "creating payment session");
        let session = self
            .payments
            .create_payment_session(order_id, total, &quote.currency)
            .map_err(|e| CheckoutError::step_failed("payment_session", e))?;

        self.announce(book_id, 3, "redirecting to payment");
        debug!(%book_id, %order_id, "checkout processing complete");

        Ok(CheckoutOutcome {
            order_id,
            redirect_url: session.redirect_url,
        })
    }

    fn announce(&self, book_id: BookId, step: u32, message: &str) {
        self.progress
            .publish(book_id, ProgressEvent::step(step, TOTAL_STEPS, message));
    }
}
