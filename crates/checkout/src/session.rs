//! Client-held checkout state machine.
//!
//! `ShippingInput → ShippingOptions → Processing → {Succeeded, Failed}`.
//! The session is ephemeral: created when the checkout flow opens, destroyed
//! when it closes or completes. Server-side processing lives in
//! [`crate::processor`]; the session only sequences the client's view.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bindery_core::BookId;

use crate::address::ShippingAddress;
use crate::error::CheckoutError;
use crate::progress::ProgressEvent;
use crate::quote::{Quote, QuoteToken, ShippingLevel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStage {
    ShippingInput,
    ShippingOptions,
    Processing,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSession {
    book_id: BookId,
    stage: CheckoutStage,
    address: Option<ShippingAddress>,
    quote: Option<Quote>,
    selected_level: Option<ShippingLevel>,
    error: Option<String>,
    /// Ordered log of received progress events, rendered linearly.
    progress_log: Vec<ProgressEvent>,
}

impl CheckoutSession {
    pub fn open(book_id: BookId) -> Self {
        Self {
            book_id,
            stage: CheckoutStage::ShippingInput,
            address: None,
            quote: None,
            selected_level: None,
            error: None,
            progress_log: Vec::new(),
        }
    }

    pub fn book_id(&self) -> BookId {
        self.book_id
    }

    pub fn stage(&self) -> CheckoutStage {
        self.stage
    }

    pub fn quote(&self) -> Option<&Quote> {
        self.quote.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn progress_log(&self) -> &[ProgressEvent] {
        &self.progress_log
    }

    /// Leave `ShippingInput` with a validated address and a freshly issued
    /// quote. On quote failure the caller keeps the session in
    /// `ShippingInput` and surfaces the error.
    pub fn enter_options(
        &mut self,
        address: ShippingAddress,
        quote: Quote,
    ) -> Result<(), CheckoutError> {
        if self.stage != CheckoutStage::ShippingInput {
            return Err(CheckoutError::InvalidStage(
                "address entry is only available from shipping_input".to_string(),
            ));
        }
        address.validate()?;

        self.address = Some(address);
        self.quote = Some(quote);
        self.stage = CheckoutStage::ShippingOptions;
        Ok(())
    }

    /// Select one shipping level from the active quote's options.
    pub fn select_level(&mut self, level: ShippingLevel) -> Result<(), CheckoutError> {
        if self.stage != CheckoutStage::ShippingOptions {
            return Err(CheckoutError::InvalidStage(
                "shipping selection is only available from shipping_options".to_string(),
            ));
        }
        let quote = self.quote.as_ref().ok_or_else(|| {
            CheckoutError::InvalidStage("no active quote".to_string())
        })?;
        if quote.option(level).is_none() {
            return Err(CheckoutError::UnknownShippingLevel);
        }

        self.selected_level = Some(level);
        Ok(())
    }

    /// Explicit confirmation: enter `Processing`, handing back the token and
    /// level the submission carries. A quote past its expiry must be
    /// re-issued, never silently reused.
    pub fn begin_processing(
        &mut self,
        now: DateTime<Utc>,
    ) -> Result<(QuoteToken, ShippingLevel), CheckoutError> {
        if self.stage != CheckoutStage::ShippingOptions {
            return Err(CheckoutError::InvalidStage(
                "confirmation is only available from shipping_options".to_string(),
            ));
        }
        let quote = self.quote.as_ref().ok_or_else(|| {
            CheckoutError::InvalidStage("no active quote".to_string())
        })?;
        if quote.is_expired(now) {
            return Err(CheckoutError::QuoteExpired);
        }
        let level = self
            .selected_level
            .ok_or_else(|| CheckoutError::validation("no shipping level selected"))?;

        self.stage = CheckoutStage::Processing;
        self.progress_log.clear();
        Ok((quote.token, level))
    }

    /// Append a received progress event while in `Processing`. Events are
    /// pure UX; delivery is not guaranteed and the log is advisory.
    pub fn record_progress(&mut self, event: ProgressEvent) {
        if self.stage == CheckoutStage::Processing {
            self.progress_log.push(event);
        }
    }

    pub fn succeed(&mut self) {
        self.stage = CheckoutStage::Succeeded;
    }

    pub fn fail(&mut self, error: impl Into<String>) {
        self.stage = CheckoutStage::Failed;
        self.error = Some(error.into());
    }

    /// From `Failed`, start the flow over at `ShippingInput`.
    ///
    /// `Failed` is only reachable through `Processing`, and entering
    /// `Processing` surrenders the quote token to the server, where it is
    /// consumed on arrival. A retry therefore always re-prices with a fresh
    /// quote; the old one is dropped here.
    pub fn retry(&mut self) -> Result<(), CheckoutError> {
        if self.stage != CheckoutStage::Failed {
            return Err(CheckoutError::InvalidStage(
                "retry is only available from failed".to_string(),
            ));
        }

        self.quote = None;
        self.selected_level = None;
        self.error = None;
        self.stage = CheckoutStage::ShippingInput;
        Ok(())
    }
}
