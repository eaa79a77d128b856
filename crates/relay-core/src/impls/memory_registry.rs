//! TypedRegistry - in-memory の Handler 登録
//!
//! # 内部実装
//! - `register_request::<Q, H>(handler)` で登録
//! - 内部的に TypedRequestHandler でラップして ErasedHandler に変換
//! - HashMap<ContractId, Vec<ErasedHandler>> で管理（Vec は登録順）

use std::collections::HashMap;
use std::future::Future;

use crate::domain::{CancellationToken, ContractId, Notification, RegistryError, Request};
use crate::ports::{ErasedHandler, HandlerRegistry};
use crate::typed::{
    FactoryHandler, NotificationHandler, RequestHandler, erase_notification_handler,
    erase_request_handler, notification_fn, request_fn,
};

/// Handler registry built at startup, then shared read-only.
///
/// # 使用例
/// ```ignore
/// let mut registry = TypedRegistry::new();
/// registry.register_request::<CreateOrderRequest, _>(CreateOrderHandler)?;
/// registry.register_notification::<OrderCreated, _>(AuditHandler);
/// registry.register_notification::<OrderCreated, _>(EmailHandler);
///
/// let mediator = Mediator::new(Arc::new(registry));
/// ```
///
/// A request contract takes one handler; a second registration is rejected.
/// Notification handlers run in the order they were registered.
#[derive(Default)]
pub struct TypedRegistry {
    requests: HashMap<ContractId, Vec<ErasedHandler>>,
    notifications: HashMap<ContractId, Vec<ErasedHandler>>,
}

impl TypedRegistry {
    pub fn new() -> Self {
        Self {
            requests: HashMap::new(),
            notifications: HashMap::new(),
        }
    }

    pub fn register_request<Q, H>(&mut self, handler: H) -> Result<(), RegistryError>
    where
        Q: Request,
        H: RequestHandler<Q> + 'static,
    {
        let contract = ContractId::request::<Q>();
        if self.requests.contains_key(&contract) {
            return Err(RegistryError::AlreadyRegistered(contract.to_string()));
        }
        tracing::debug!(%contract, "registered request handler");
        self.requests
            .insert(contract, vec![erase_request_handler::<Q, H>(handler)]);
        Ok(())
    }

    pub fn register_request_fn<Q, F, Fut>(&mut self, f: F) -> Result<(), RegistryError>
    where
        Q: Request,
        F: Fn(Q, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Q::Response, Q::Error>> + Send + 'static,
    {
        self.register_request::<Q, _>(request_fn(f))
    }

    /// Registers a factory; every dispatch gets a freshly built handler.
    pub fn register_request_factory<Q, H, F>(&mut self, factory: F) -> Result<(), RegistryError>
    where
        Q: Request,
        H: RequestHandler<Q> + 'static,
        F: Fn() -> H + Send + Sync + 'static,
    {
        self.register_request::<Q, _>(FactoryHandler::new(factory))
    }

    /// Appends a handler; it runs after every handler registered before it.
    pub fn register_notification<N, H>(&mut self, handler: H)
    where
        N: Notification,
        H: NotificationHandler<N> + 'static,
    {
        let contract = ContractId::notification::<N>();
        let handlers = self.notifications.entry(contract).or_default();
        handlers.push(erase_notification_handler::<N, H>(handler));
        tracing::debug!(%contract, position = handlers.len() - 1, "registered notification handler");
    }

    pub fn register_notification_fn<N, F, Fut>(&mut self, f: F)
    where
        N: Notification,
        F: Fn(&N, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), N::Error>> + Send + 'static,
    {
        self.register_notification::<N, _>(notification_fn(f));
    }

    pub fn register_notification_factory<N, H, F>(&mut self, factory: F)
    where
        N: Notification,
        H: NotificationHandler<N> + 'static,
        F: Fn() -> H + Send + Sync + 'static,
    {
        self.register_notification::<N, _>(FactoryHandler::new(factory));
    }

    pub fn contains(&self, contract: &ContractId) -> bool {
        self.requests.contains_key(contract) || self.notifications.contains_key(contract)
    }

    pub fn registered_contracts(&self) -> Vec<ContractId> {
        self.requests
            .keys()
            .chain(self.notifications.keys())
            .copied()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.requests.len() + self.notifications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty() && self.notifications.is_empty()
    }
}

impl HandlerRegistry for TypedRegistry {
    fn request_handlers(&self, contract: &ContractId) -> &[ErasedHandler] {
        self.requests.get(contract).map(Vec::as_slice).unwrap_or(&[])
    }

    fn notification_handlers(&self, contract: &ContractId) -> &[ErasedHandler] {
        self.notifications
            .get(contract)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
