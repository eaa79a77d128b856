//! Closure and factory adapters.
//!
//! Handlers don't have to be named types: any async closure with the right shape can be
//! registered. `FactoryHandler` builds a fresh handler for every dispatch (transient
//! lifetime) instead of sharing one instance.

use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;

use super::handler::{NotificationHandler, RequestHandler};
use crate::domain::{CancellationToken, Notification, Request};

/// Request handler backed by `Fn(Q, CancellationToken) -> Future`.
pub struct RequestFn<Q, F, Fut> {
    f: F,
    _marker: PhantomData<fn(Q) -> Fut>,
}

pub fn request_fn<Q, F, Fut>(f: F) -> RequestFn<Q, F, Fut>
where
    Q: Request,
    F: Fn(Q, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Q::Response, Q::Error>> + Send + 'static,
{
    RequestFn {
        f,
        _marker: PhantomData,
    }
}

#[async_trait]
impl<Q, F, Fut> RequestHandler<Q> for RequestFn<Q, F, Fut>
where
    Q: Request,
    F: Fn(Q, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Q::Response, Q::Error>> + Send + 'static,
{
    async fn handle(
        &self,
        request: Q,
        cancel: &CancellationToken,
    ) -> Result<Q::Response, Q::Error> {
        (self.f)(request, cancel.clone()).await
    }
}

/// Notification handler backed by `Fn(&N, CancellationToken) -> Future`.
///
/// The returned future can't borrow the notification; copy out what it needs first.
pub struct NotificationFn<N, F, Fut> {
    f: F,
    _marker: PhantomData<fn(&N) -> Fut>,
}

pub fn notification_fn<N, F, Fut>(f: F) -> NotificationFn<N, F, Fut>
where
    N: Notification,
    F: Fn(&N, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), N::Error>> + Send + 'static,
{
    NotificationFn {
        f,
        _marker: PhantomData,
    }
}

#[async_trait]
impl<N, F, Fut> NotificationHandler<N> for NotificationFn<N, F, Fut>
where
    N: Notification,
    F: Fn(&N, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), N::Error>> + Send + 'static,
{
    async fn handle(&self, notification: &N, cancel: &CancellationToken) -> Result<(), N::Error> {
        (self.f)(notification, cancel.clone()).await
    }
}

/// Builds a new `H` per invocation.
pub struct FactoryHandler<F, H> {
    factory: F,
    _marker: PhantomData<fn() -> H>,
}

impl<F, H> FactoryHandler<F, H>
where
    F: Fn() -> H + Send + Sync + 'static,
{
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<Q, F, H> RequestHandler<Q> for FactoryHandler<F, H>
where
    Q: Request,
    F: Fn() -> H + Send + Sync + 'static,
    H: RequestHandler<Q> + 'static,
{
    async fn handle(
        &self,
        request: Q,
        cancel: &CancellationToken,
    ) -> Result<Q::Response, Q::Error> {
        let handler = (self.factory)();
        handler.handle(request, cancel).await
    }
}

#[async_trait]
impl<N, F, H> NotificationHandler<N> for FactoryHandler<F, H>
where
    N: Notification,
    F: Fn() -> H + Send + Sync + 'static,
    H: NotificationHandler<N> + 'static,
{
    async fn handle(&self, notification: &N, cancel: &CancellationToken) -> Result<(), N::Error> {
        let handler = (self.factory)();
        handler.handle(notification, cancel).await
    }
}
