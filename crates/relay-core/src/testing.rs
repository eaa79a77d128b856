//! テスト用のメッセージと Handler（order ドメイン）

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{CancellationToken, Notification, Request};
use crate::typed::{NotificationHandler, RequestHandler};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderId(pub String);

impl OrderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum OrderError {
    #[error("rejected by {0}")]
    Rejected(String),
    #[error("cancelled")]
    Cancelled,
}

#[derive(Debug)]
pub struct CreateOrderRequest {
    pub sku: String,
}

impl CreateOrderRequest {
    pub fn new(sku: impl Into<String>) -> Self {
        Self { sku: sku.into() }
    }
}

impl Request for CreateOrderRequest {
    type Response = OrderId;
    type Error = OrderError;
}

#[derive(Debug)]
pub struct DeleteOrderRequest;

impl Request for DeleteOrderRequest {
    type Response = OrderId;
    type Error = OrderError;
}

#[derive(Debug)]
pub struct OrderCreated {
    pub order_id: OrderId,
}

impl OrderCreated {
    pub fn new(id: &str) -> Self {
        Self {
            order_id: OrderId::new(id),
        }
    }
}

impl Notification for OrderCreated {
    type Error = OrderError;
}

#[derive(Debug)]
pub struct OrderShipped;

impl Notification for OrderShipped {
    type Error = OrderError;
}

/// Returns a fixed id and counts invocations.
pub struct CreateOrderHandler {
    id: OrderId,
    calls: Arc<Mutex<usize>>,
}

impl CreateOrderHandler {
    pub fn new(id: &str) -> Self {
        Self {
            id: OrderId::new(id),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl RequestHandler<CreateOrderRequest> for CreateOrderHandler {
    async fn handle(
        &self,
        _request: CreateOrderRequest,
        cancel: &CancellationToken,
    ) -> Result<OrderId, OrderError> {
        *self.calls.lock().unwrap() += 1;
        if cancel.is_cancelled() {
            return Err(OrderError::Cancelled);
        }
        Ok(self.id.clone())
    }
}

/// Shared log of handler activity, in the order it happened.
#[derive(Clone, Default)]
pub struct Recorder {
    log: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(&self, name: &str) -> RecordingHandler {
        self.handler(name, false, Duration::ZERO)
    }

    pub fn failing(&self, name: &str) -> RecordingHandler {
        self.handler(name, true, Duration::ZERO)
    }

    /// Logs `name:start`, sleeps, then logs `name:end`.
    pub fn slow(&self, name: &str, delay: Duration) -> RecordingHandler {
        self.handler(name, false, delay)
    }

    fn handler(&self, name: &str, fail: bool, delay: Duration) -> RecordingHandler {
        RecordingHandler {
            name: name.to_string(),
            fail,
            delay,
            log: self.log.clone(),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

pub struct RecordingHandler {
    name: String,
    fail: bool,
    delay: Duration,
    log: Arc<Mutex<Vec<String>>>,
}

impl RecordingHandler {
    fn push(&self, entry: String) {
        self.log.lock().unwrap().push(entry);
    }
}

#[async_trait]
impl NotificationHandler<OrderCreated> for RecordingHandler {
    async fn handle(&self, _event: &OrderCreated, _cancel: &CancellationToken) -> Result<(), OrderError> {
        if self.delay.is_zero() {
            self.push(self.name.clone());
        } else {
            self.push(format!("{}:start", self.name));
            tokio::time::sleep(self.delay).await;
            self.push(format!("{}:end", self.name));
        }
        if self.fail {
            return Err(OrderError::Rejected(self.name.clone()));
        }
        Ok(())
    }
}
