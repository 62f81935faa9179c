//! Quote issuance: priced shipping options behind an opaque, time-limited
//! token.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bindery_core::BookId;

use crate::address::ShippingAddress;
use crate::error::CheckoutError;

/// Opaque, unguessable quote token.
///
/// Random (UUIDv4) rather than time-ordered: the token is a capability, not
/// an index key.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuoteToken(Uuid);

impl QuoteToken {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for QuoteToken {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for QuoteToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl core::str::FromStr for QuoteToken {
    type Err = CheckoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::from_str(s)
            .map(Self)
            .map_err(|_| CheckoutError::UnknownQuoteToken)
    }
}

/// Shipping service level.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShippingLevel {
    Standard,
    Express,
    Overnight,
}

/// One priced shipping option inside a quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingOption {
    pub level: ShippingLevel,
    pub name: String,
    /// Cost in minor currency units (e.g. cents).
    pub cost: u64,
    pub estimated_delivery: String,
}

/// An issued, immutable price quote.
///
/// Invalid after `expires_at` and after first consumption; never mutated or
/// extended once issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub token: QuoteToken,
    pub book_id: BookId,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Base price of the book itself, in minor currency units.
    pub base_price: u64,
    pub currency: String,
    /// Sorted ascending by cost; the first entry is the recommended default.
    pub shipping_options: Vec<ShippingOption>,
}

impl Quote {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn option(&self, level: ShippingLevel) -> Option<&ShippingOption> {
        self.shipping_options.iter().find(|o| o.level == level)
    }

    /// Cheapest option, the recommended UI default.
    pub fn recommended(&self) -> Option<&ShippingOption> {
        self.shipping_options.first()
    }

    /// Total charge for a selected option.
    pub fn total(&self, option: &ShippingOption) -> u64 {
        self.base_price + option.cost
    }
}

/// Rate lookup failure (downstream carrier API). Retryable.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum RateError {
    #[error("rate lookup unavailable: {0}")]
    Unavailable(String),
}

/// External shipping-rate lookup.
pub trait RateSource: Send + Sync {
    fn rates(&self, address: &ShippingAddress) -> Result<Vec<ShippingOption>, RateError>;
}

/// Fixed-table rate source for dev and tests.
#[derive(Debug, Default)]
pub struct FlatRateSource;

impl RateSource for FlatRateSource {
    fn rates(&self, _address: &ShippingAddress) -> Result<Vec<ShippingOption>, RateError> {
        Ok(vec![
            ShippingOption {
                level: ShippingLevel::Express,
                name: "Express".to_string(),
                cost: 1450,
                estimated_delivery: "2-3 business days".to_string(),
            },
            ShippingOption {
                level: ShippingLevel::Standard,
                name: "Standard".to_string(),
                cost: 650,
                estimated_delivery: "5-8 business days".to_string(),
            },
            ShippingOption {
                level: ShippingLevel::Overnight,
                name: "Overnight".to_string(),
                cost: 2900,
                estimated_delivery: "next business day".to_string(),
            },
        ])
    }
}

/// Server-side record of issued quotes: token resolution at consumption time
/// plus the single-use register. Expired entries are pruned as traffic comes
/// through, so neither map outlives the validity window for long.
#[derive(Debug, Default)]
pub struct QuoteRegistry {
    issued: Mutex<HashMap<QuoteToken, Quote>>,
    /// Consumed tokens with their quote's expiry; held so a replay inside
    /// the validity window reads as reuse, not as an unknown token.
    consumed: Mutex<HashMap<QuoteToken, DateTime<Utc>>>,
}

impl QuoteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, quote: Quote) {
        let mut issued = self.issued.lock().unwrap();
        let now = quote.issued_at;
        issued.retain(|_, q| !q.is_expired(now));
        issued.insert(quote.token, quote);
    }

    /// Look up a quote by token.
    ///
    /// Other expired entries are dropped in passing. The requested quote is
    /// returned even when expired, so the caller can answer "expired" rather
    /// than "unknown"; a consumed token reports the reuse.
    pub fn resolve(&self, token: QuoteToken, now: DateTime<Utc>) -> Result<Quote, CheckoutError> {
        let mut issued = self.issued.lock().unwrap();
        issued.retain(|t, q| *t == token || !q.is_expired(now));
        if let Some(quote) = issued.get(&token) {
            return Ok(quote.clone());
        }

        let consumed = self.consumed.lock().unwrap();
        if consumed.contains_key(&token) {
            Err(CheckoutError::QuoteAlreadyUsed)
        } else {
            Err(CheckoutError::UnknownQuoteToken)
        }
    }

    /// Consume a token. A second consumption fails: a stale price must not
    /// be charged twice. The quote leaves the issued map; the token stays in
    /// the consumed register until its expiry passes, after which a replay
    /// reads as unknown (it could never have succeeded anyway).
    pub fn consume(&self, token: QuoteToken, now: DateTime<Utc>) -> Result<(), CheckoutError> {
        let mut issued = self.issued.lock().unwrap();
        let mut consumed = self.consumed.lock().unwrap();

        consumed.retain(|_, expires_at| *expires_at > now);
        if consumed.contains_key(&token) {
            return Err(CheckoutError::QuoteAlreadyUsed);
        }

        let quote = issued
            .remove(&token)
            .ok_or(CheckoutError::UnknownQuoteToken)?;
        consumed.insert(token, quote.expires_at);
        Ok(())
    }
}

/// Computes quotes: validates the address, asks the rate source, stamps the
/// token and expiry, registers the quote for later consumption.
pub struct QuoteIssuer {
    rate_source: Box<dyn RateSource>,
    validity: Duration,
    base_price: u64,
    currency: String,
}

impl QuoteIssuer {
    pub fn new(
        rate_source: Box<dyn RateSource>,
        validity: Duration,
        base_price: u64,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            rate_source,
            validity,
            base_price,
            currency: currency.into(),
        }
    }

    pub fn issue(
        &self,
        book_id: BookId,
        address: &ShippingAddress,
        now: DateTime<Utc>,
    ) -> Result<Quote, CheckoutError> {
        // Validation first: an invalid address never reaches the rate lookup.
        address.validate()?;

        let mut options = self.rate_source.rates(address)?;
        options.sort_by_key(|o| o.cost);

        Ok(Quote {
            token: QuoteToken::new(),
            book_id,
            issued_at: now,
            expires_at: now + self.validity,
            base_price: self.base_price,
            currency: self.currency.clone(),
            shipping_options: options,
        })
    }
}
