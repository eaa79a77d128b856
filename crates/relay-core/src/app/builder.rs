//! MediatorBuilder - 登録とワイヤリング
//!
//! # Fail-fast 設計
//! - `expect_request::<Q>()` / `expect_notification::<N>()` で期待される契約を登録
//! - `build()` 時に「期待集合 ⊆ 登録済み集合」をチェック
//! - 不足があれば BuildError を返す

use std::future::Future;
use std::sync::Arc;

use super::config::MediatorConfig;
use super::mediator::Mediator;
use crate::domain::{
    BuildError, CancellationToken, ContractId, Notification, RegistryError, Request,
};
use crate::impls::TypedRegistry;
use crate::typed::{NotificationHandler, RequestHandler};

/// # 使用例
/// ```ignore
/// let mediator = MediatorBuilder::new()
///     .register_request::<CreateOrderRequest, _>(CreateOrderHandler)?
///     .register_notification::<OrderCreated, _>(AuditHandler)
///     .expect_request::<CreateOrderRequest>()
///     .build()?;
/// ```
#[derive(Default)]
pub struct MediatorBuilder {
    registry: TypedRegistry,
    expected: Vec<ContractId>,
    config: MediatorConfig,
}

impl MediatorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: MediatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn register_request<Q, H>(mut self, handler: H) -> Result<Self, RegistryError>
    where
        Q: Request,
        H: RequestHandler<Q> + 'static,
    {
        self.registry.register_request::<Q, H>(handler)?;
        Ok(self)
    }

    pub fn register_request_fn<Q, F, Fut>(mut self, f: F) -> Result<Self, RegistryError>
    where
        Q: Request,
        F: Fn(Q, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Q::Response, Q::Error>> + Send + 'static,
    {
        self.registry.register_request_fn::<Q, F, Fut>(f)?;
        Ok(self)
    }

    pub fn register_request_factory<Q, H, F>(mut self, factory: F) -> Result<Self, RegistryError>
    where
        Q: Request,
        H: RequestHandler<Q> + 'static,
        F: Fn() -> H + Send + Sync + 'static,
    {
        self.registry.register_request_factory::<Q, H, F>(factory)?;
        Ok(self)
    }

    pub fn register_notification<N, H>(mut self, handler: H) -> Self
    where
        N: Notification,
        H: NotificationHandler<N> + 'static,
    {
        self.registry.register_notification::<N, H>(handler);
        self
    }

    pub fn register_notification_fn<N, F, Fut>(mut self, f: F) -> Self
    where
        N: Notification,
        F: Fn(&N, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), N::Error>> + Send + 'static,
    {
        self.registry.register_notification_fn::<N, F, Fut>(f);
        self
    }

    pub fn register_notification_factory<N, H, F>(mut self, factory: F) -> Self
    where
        N: Notification,
        H: NotificationHandler<N> + 'static,
        F: Fn() -> H + Send + Sync + 'static,
    {
        self.registry.register_notification_factory::<N, H, F>(factory);
        self
    }

    pub fn expect_request<Q: Request>(mut self) -> Self {
        self.expected.push(ContractId::request::<Q>());
        self
    }

    pub fn expect_notification<N: Notification>(mut self) -> Self {
        self.expected.push(ContractId::notification::<N>());
        self
    }

    /// # 検証
    /// - expect_* で設定された契約が全て登録されているかチェック
    /// - 不足があれば BuildError::MissingHandlers を返す
    pub fn build(self) -> Result<Mediator, BuildError> {
        let missing: Vec<String> = self
            .expected
            .iter()
            .filter(|contract| !self.registry.contains(contract))
            .map(ToString::to_string)
            .collect();
        if !missing.is_empty() {
            return Err(BuildError::MissingHandlers(missing));
        }

        tracing::debug!(contracts = self.registry.len(), "mediator built");
        Ok(Mediator::with_config(Arc::new(self.registry), self.config))
    }
}
