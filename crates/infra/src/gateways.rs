//! In-memory order and payment gateways for dev and tests.

use std::sync::Mutex;

use tracing::info;

use bindery_checkout::{OrderGateway, PaymentGateway, PaymentSession, Quote, ShippingLevel};
use bindery_core::{BookId, OrderId};

/// Order gateway backed by a Vec; records every created order.
#[derive(Debug, Default)]
pub struct InMemoryOrderGateway {
    orders: Mutex<Vec<(OrderId, BookId)>>,
}

impl InMemoryOrderGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn orders(&self) -> Vec<(OrderId, BookId)> {
        self.orders.lock().unwrap().clone()
    }
}

impl OrderGateway for InMemoryOrderGateway {
    fn create_order(
        &self,
        book_id: BookId,
        _quote: &Quote,
        level: ShippingLevel,
    ) -> Result<OrderId, String> {
        let order_id = OrderId::new();
        info!(%order_id, %book_id, ?level, "order created");
        self.orders.lock().unwrap().push((order_id, book_id));
        Ok(order_id)
    }
}

/// Payment gateway that mints hosted-session URLs without a processor.
#[derive(Debug, Default)]
pub struct InMemoryPaymentGateway {
    sessions_created: Mutex<u32>,
}

impl InMemoryPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sessions_created(&self) -> u32 {
        *self.sessions_created.lock().unwrap()
    }
}

impl PaymentGateway for InMemoryPaymentGateway {
    fn create_payment_session(
        &self,
        order_id: OrderId,
        amount: u64,
        currency: &str,
    ) -> Result<PaymentSession, String> {
        *self.sessions_created.lock().unwrap() += 1;
        info!(%order_id, amount, currency, "payment session created");
        Ok(PaymentSession {
            session_id: order_id.to_string(),
            redirect_url: format!("https://payments.example/session/{order_id}"),
        })
    }
}
