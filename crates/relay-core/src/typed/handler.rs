//! Handler traits - 具体的なメッセージ型ごとの処理単位

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{CancellationToken, Notification, Request};

/// Turns one request type into its response.
///
/// # 使用例
/// ```ignore
/// struct CreateOrderHandler;
///
/// #[async_trait]
/// impl RequestHandler<CreateOrderRequest> for CreateOrderHandler {
///     async fn handle(
///         &self,
///         request: CreateOrderRequest,
///         _cancel: &CancellationToken,
///     ) -> Result<OrderId, OrderError> {
///         Ok(OrderId::new(format!("order-{}", request.sku)))
///     }
/// }
/// ```
#[async_trait]
pub trait RequestHandler<Q: Request>: Send + Sync {
    async fn handle(
        &self,
        request: Q,
        cancel: &CancellationToken,
    ) -> Result<Q::Response, Q::Error>;
}

/// Reacts to one notification type.
#[async_trait]
pub trait NotificationHandler<N: Notification>: Send + Sync {
    async fn handle(&self, notification: &N, cancel: &CancellationToken) -> Result<(), N::Error>;
}

// Arc<H> lets callers keep a handle to a registered handler's state.
#[async_trait]
impl<Q, H> RequestHandler<Q> for Arc<H>
where
    Q: Request,
    H: RequestHandler<Q> + ?Sized,
{
    async fn handle(
        &self,
        request: Q,
        cancel: &CancellationToken,
    ) -> Result<Q::Response, Q::Error> {
        (**self).handle(request, cancel).await
    }
}

#[async_trait]
impl<N, H> NotificationHandler<N> for Arc<H>
where
    N: Notification,
    H: NotificationHandler<N> + ?Sized,
{
    async fn handle(&self, notification: &N, cancel: &CancellationToken) -> Result<(), N::Error> {
        (**self).handle(notification, cancel).await
    }
}
