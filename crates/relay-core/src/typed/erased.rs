//! Invocation adapter - type erasure between the mediator and typed handlers.
//!
//! `TypedRequestHandler<Q, H>` を `DynRequestHandler` に変換することで、
//! `Arc<dyn Any + Send + Sync>` として Registry に格納できる。
//! Dispatch 時は具体的なメッセージ型へ downcast してから呼び出す（reflection なし）。

use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;

use super::handler::{NotificationHandler, RequestHandler};
use crate::domain::{CancellationToken, DispatchError, MessageType, Notification, Request};
use crate::ports::ErasedHandler;

/// Object-safe request handler for every request answering `Res` and failing with `E`.
#[async_trait]
pub trait DynRequestHandler<Res, E>: Send + Sync {
    async fn handle_dyn(
        &self,
        request: Box<dyn Any + Send>,
        cancel: &CancellationToken,
    ) -> Result<Res, DispatchError<E>>;

    fn message_type(&self) -> MessageType;
}

/// Object-safe notification handler.
#[async_trait]
pub trait DynNotificationHandler<E>: Send + Sync {
    async fn handle_dyn(
        &self,
        notification: &(dyn Any + Send + Sync),
        cancel: &CancellationToken,
    ) -> Result<(), DispatchError<E>>;

    fn message_type(&self) -> MessageType;
}

pub struct TypedRequestHandler<Q, H> {
    handler: H,
    _marker: PhantomData<fn(Q)>,
}

impl<Q: Request, H: RequestHandler<Q>> TypedRequestHandler<Q, H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<Q, H> DynRequestHandler<Q::Response, Q::Error> for TypedRequestHandler<Q, H>
where
    Q: Request,
    H: RequestHandler<Q>,
{
    async fn handle_dyn(
        &self,
        request: Box<dyn Any + Send>,
        cancel: &CancellationToken,
    ) -> Result<Q::Response, DispatchError<Q::Error>> {
        // registry とキーが食い違った場合のみ失敗する
        let request = request
            .downcast::<Q>()
            .map_err(|_| DispatchError::HandlerNotFound(MessageType::of::<Q>().short_name().into()))?;
        self.handler
            .handle(*request, cancel)
            .await
            .map_err(DispatchError::Handler)
    }

    fn message_type(&self) -> MessageType {
        MessageType::of::<Q>()
    }
}

pub struct TypedNotificationHandler<N, H> {
    handler: H,
    _marker: PhantomData<fn(&N)>,
}

impl<N: Notification, H: NotificationHandler<N>> TypedNotificationHandler<N, H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<N, H> DynNotificationHandler<N::Error> for TypedNotificationHandler<N, H>
where
    N: Notification,
    H: NotificationHandler<N>,
{
    async fn handle_dyn(
        &self,
        notification: &(dyn Any + Send + Sync),
        cancel: &CancellationToken,
    ) -> Result<(), DispatchError<N::Error>> {
        let Some(notification) = notification.downcast_ref::<N>() else {
            return Err(DispatchError::HandlerNotFound(
                MessageType::of::<N>().short_name().into(),
            ));
        };
        self.handler
            .handle(notification, cancel)
            .await
            .map_err(DispatchError::Handler)
    }

    fn message_type(&self) -> MessageType {
        MessageType::of::<N>()
    }
}

/// Wraps a typed request handler into a registry entry.
///
/// The entry holds an `Arc<dyn DynRequestHandler<Q::Response, Q::Error>>`.
pub fn erase_request_handler<Q, H>(handler: H) -> ErasedHandler
where
    Q: Request,
    H: RequestHandler<Q> + 'static,
{
    let typed: Arc<dyn DynRequestHandler<Q::Response, Q::Error>> =
        Arc::new(TypedRequestHandler::<Q, H>::new(handler));
    Arc::new(typed)
}

/// Wraps a typed notification handler into a registry entry.
pub fn erase_notification_handler<N, H>(handler: H) -> ErasedHandler
where
    N: Notification,
    H: NotificationHandler<N> + 'static,
{
    let typed: Arc<dyn DynNotificationHandler<N::Error>> =
        Arc::new(TypedNotificationHandler::<N, H>::new(handler));
    Arc::new(typed)
}
