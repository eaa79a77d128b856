//! Mediator - `send` / `publish` の dispatch
//!
//! 呼び出し側は Handler の存在も数も知らない。メッセージの実行時型だけで解決する。

use std::any::Any;
use std::sync::Arc;

use tracing::{Instrument, debug, debug_span, trace};

use super::config::MediatorConfig;
use super::resolver::Resolver;
use crate::domain::{
    AnyNotification, AnyRequest, CancellationToken, DispatchError, MessageType, Notification,
    Request,
};
use crate::ports::HandlerRegistry;

/// Routes requests to their single handler and notifications to all of theirs.
///
/// Holds no mutable state: clone it freely and call it from as many tasks as needed.
///
/// # 使用例
/// ```ignore
/// let mediator = Mediator::new(Arc::new(registry));
///
/// let id = mediator.send(CreateOrderRequest { sku: "A1".into() }).await?;
/// mediator.publish(OrderCreated { id }).await?;
/// ```
#[derive(Clone)]
pub struct Mediator {
    registry: Arc<dyn HandlerRegistry>,
    config: MediatorConfig,
}

impl Mediator {
    pub fn new(registry: Arc<dyn HandlerRegistry>) -> Self {
        Self::with_config(registry, MediatorConfig::default())
    }

    pub fn with_config(registry: Arc<dyn HandlerRegistry>, config: MediatorConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &dyn HandlerRegistry {
        self.registry.as_ref()
    }

    pub fn config(&self) -> &MediatorConfig {
        &self.config
    }

    fn resolver(&self) -> Resolver<'_> {
        Resolver::new(self.registry.as_ref(), self.config.ambiguity)
    }

    /// Sends a request to its handler with a token that never cancels.
    pub async fn send<Q: Request>(
        &self,
        request: Q,
    ) -> Result<Q::Response, DispatchError<Q::Error>> {
        self.send_with(request, &CancellationToken::none()).await
    }

    /// Sends a request to its handler.
    ///
    /// # Errors
    /// - `HandlerNotFound`: nothing registered, no handler ran
    /// - `AmbiguousRegistration`: several candidates under `AmbiguityPolicy::Reject`
    /// - `Handler`: the handler's own error, unchanged
    pub async fn send_with<Q: Request>(
        &self,
        request: Q,
        cancel: &CancellationToken,
    ) -> Result<Q::Response, DispatchError<Q::Error>> {
        self.dispatch_request(MessageType::of::<Q>(), Box::new(request), cancel)
            .await
    }

    /// Sends a request held behind its object-safe view.
    ///
    /// Routing uses the concrete type of the boxed request.
    pub async fn send_boxed<Res, E>(
        &self,
        request: Box<dyn AnyRequest<Res, E>>,
        cancel: &CancellationToken,
    ) -> Result<Res, DispatchError<E>>
    where
        Res: Send + 'static,
        E: Send + 'static,
    {
        let message = request.message_type();
        self.dispatch_request(message, request.into_any(), cancel)
            .await
    }

    async fn dispatch_request<Res, E>(
        &self,
        message: MessageType,
        request: Box<dyn Any + Send>,
        cancel: &CancellationToken,
    ) -> Result<Res, DispatchError<E>>
    where
        Res: Send + 'static,
        E: Send + 'static,
    {
        let span = debug_span!("mediator.send", message = message.short_name());
        async move {
            let handler = self.resolver().resolve_request_handler::<Res, E>(message)?;

            trace!("invoking request handler");
            let result = handler.handle_dyn(request, cancel).await;
            if result.is_err() {
                debug!("request failed");
            }
            result
        }
        .instrument(span)
        .await
    }

    /// Publishes a notification with a token that never cancels.
    pub async fn publish<N: Notification>(
        &self,
        notification: N,
    ) -> Result<(), DispatchError<N::Error>> {
        self.publish_with(notification, &CancellationToken::none())
            .await
    }

    /// Runs every handler of the notification one after another, in registration order.
    ///
    /// Handler `k + 1` starts only after handler `k` finished. The first failure stops the
    /// sequence and is returned as is; later handlers never run. No handlers is a success.
    /// A registry entry that isn't a handler for `N` fails the whole publish with
    /// `HandlerNotFound` before anything runs.
    pub async fn publish_with<N: Notification>(
        &self,
        notification: N,
        cancel: &CancellationToken,
    ) -> Result<(), DispatchError<N::Error>> {
        self.dispatch_notification(MessageType::of::<N>(), &notification, cancel)
            .await
    }

    /// Publishes a notification held behind its object-safe view.
    pub async fn publish_boxed<E>(
        &self,
        notification: Box<dyn AnyNotification<E>>,
        cancel: &CancellationToken,
    ) -> Result<(), DispatchError<E>>
    where
        E: Send + 'static,
    {
        let message = notification.message_type();
        self.dispatch_notification(message, notification.as_any(), cancel)
            .await
    }

    async fn dispatch_notification<E>(
        &self,
        message: MessageType,
        notification: &(dyn Any + Send + Sync),
        cancel: &CancellationToken,
    ) -> Result<(), DispatchError<E>>
    where
        E: Send + 'static,
    {
        let span = debug_span!("mediator.publish", message = message.short_name());
        async move {
            let handlers = self.resolver().resolve_notification_handlers::<E>(message)?;
            if handlers.is_empty() {
                trace!("no notification handlers registered");
                return Ok(());
            }

            // 順番に await する（並列にしない）
            for (index, handler) in handlers.iter().enumerate() {
                trace!(index, "invoking notification handler");
                if let Err(err) = handler.handle_dyn(notification, cancel).await {
                    debug!(
                        index,
                        skipped = handlers.len() - index - 1,
                        "notification handler failed"
                    );
                    return Err(err);
                }
            }
            Ok(())
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::AmbiguityPolicy;
    use crate::domain::{CancellationSource, ContractId};
    use crate::impls::TypedRegistry;
    use crate::ports::ErasedHandler;
    use crate::testing::{
        CreateOrderHandler, CreateOrderRequest, DeleteOrderRequest, OrderCreated, OrderError,
        OrderId, OrderShipped, Recorder,
    };
    use crate::typed::{RequestHandler, erase_notification_handler, erase_request_handler};
    use async_trait::async_trait;
    use rstest::rstest;
    use std::time::Duration;

    fn mediator(registry: TypedRegistry) -> Mediator {
        Mediator::new(Arc::new(registry))
    }

    #[tokio::test]
    async fn send_returns_the_handlers_result() {
        let handler = Arc::new(CreateOrderHandler::new("123"));
        let mut registry = TypedRegistry::new();
        registry
            .register_request::<CreateOrderRequest, _>(handler.clone())
            .unwrap();
        let mediator = mediator(registry);

        let id = mediator.send(CreateOrderRequest::new("A1")).await.unwrap();

        assert_eq!(id, OrderId::new("123"));
        assert_eq!(handler.calls(), 1);
    }

    #[tokio::test]
    async fn send_without_handler_fails_with_not_found() {
        let handler = Arc::new(CreateOrderHandler::new("123"));
        let mut registry = TypedRegistry::new();
        registry
            .register_request::<CreateOrderRequest, _>(handler.clone())
            .unwrap();
        let mediator = mediator(registry);

        let err = mediator.send(DeleteOrderRequest).await.unwrap_err();

        assert!(matches!(&err, DispatchError::HandlerNotFound(name) if name == "DeleteOrderRequest"));
        assert_eq!(err.to_string(), "handler not found for DeleteOrderRequest");
        assert_eq!(handler.calls(), 0);
    }

    #[tokio::test]
    async fn send_propagates_handler_error_unchanged() {
        let mut registry = TypedRegistry::new();
        registry
            .register_request_fn(|request: CreateOrderRequest, _| async move {
                Err::<OrderId, _>(OrderError::Rejected(request.sku))
            })
            .unwrap();
        let mediator = mediator(registry);

        let err = mediator.send(CreateOrderRequest::new("A1")).await.unwrap_err();

        assert_eq!(err.into_handler_error(), Some(OrderError::Rejected("A1".into())));
    }

    #[tokio::test]
    async fn send_threads_the_cancellation_token_through() {
        let mut registry = TypedRegistry::new();
        registry
            .register_request::<CreateOrderRequest, _>(CreateOrderHandler::new("123"))
            .unwrap();
        let mediator = mediator(registry);

        let source = CancellationSource::new();
        source.cancel();
        let err = mediator
            .send_with(CreateOrderRequest::new("A1"), &source.token())
            .await
            .unwrap_err();

        // handler が判断した結果がそのまま返る
        assert_eq!(err.into_handler_error(), Some(OrderError::Cancelled));
    }

    #[tokio::test]
    async fn transient_handlers_are_built_per_send() {
        let built = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = built.clone();
        let mut registry = TypedRegistry::new();
        registry
            .register_request_factory::<CreateOrderRequest, _, _>(move || {
                counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                CreateOrderHandler::new("123")
            })
            .unwrap();
        let mediator = mediator(registry);

        mediator.send(CreateOrderRequest::new("A1")).await.unwrap();
        mediator.send(CreateOrderRequest::new("A2")).await.unwrap();

        assert_eq!(built.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn publish_runs_handlers_sequentially_in_registration_order() {
        let recorder = Recorder::new();
        let mut registry = TypedRegistry::new();
        // h1 が一番遅い: 並列なら h2 が先に終わる
        registry.register_notification::<OrderCreated, _>(
            recorder.slow("h1", Duration::from_millis(30)),
        );
        registry.register_notification::<OrderCreated, _>(
            recorder.slow("h2", Duration::from_millis(5)),
        );
        registry.register_notification::<OrderCreated, _>(
            recorder.slow("h3", Duration::from_millis(1)),
        );
        let mediator = mediator(registry);

        mediator.publish(OrderCreated::new("123")).await.unwrap();

        assert_eq!(
            recorder.calls(),
            vec!["h1:start", "h1:end", "h2:start", "h2:end", "h3:start", "h3:end"]
        );
    }

    #[tokio::test]
    async fn publish_order_is_stable_across_calls() {
        let recorder = Recorder::new();
        let mut registry = TypedRegistry::new();
        registry.register_notification::<OrderCreated, _>(recorder.named("audit"));
        registry.register_notification::<OrderCreated, _>(recorder.named("email"));
        let mediator = mediator(registry);

        for _ in 0..3 {
            mediator.publish(OrderCreated::new("123")).await.unwrap();
        }

        assert_eq!(
            recorder.calls(),
            vec!["audit", "email", "audit", "email", "audit", "email"]
        );
    }

    #[rstest]
    #[case(0, vec!["h1"])]
    #[case(1, vec!["h1", "h2"])]
    #[case(2, vec!["h1", "h2", "h3"])]
    #[tokio::test]
    async fn publish_stops_at_the_first_failure(
        #[case] failing: usize,
        #[case] expected_calls: Vec<&str>,
    ) {
        let recorder = Recorder::new();
        let mut registry = TypedRegistry::new();
        for (index, name) in ["h1", "h2", "h3"].into_iter().enumerate() {
            let handler = if index == failing {
                recorder.failing(name)
            } else {
                recorder.named(name)
            };
            registry.register_notification::<OrderCreated, _>(handler);
        }
        let mediator = mediator(registry);

        let err = mediator.publish(OrderCreated::new("123")).await.unwrap_err();

        let failed = ["h1", "h2", "h3"][failing];
        assert_eq!(err.into_handler_error(), Some(OrderError::Rejected(failed.into())));
        assert_eq!(recorder.calls(), expected_calls);
    }

    /// Registry whose notification list holds a request entry in the middle.
    struct MixedRegistry {
        notifications: Vec<ErasedHandler>,
    }

    impl HandlerRegistry for MixedRegistry {
        fn request_handlers(&self, _contract: &ContractId) -> &[ErasedHandler] {
            &[]
        }

        fn notification_handlers(&self, _contract: &ContractId) -> &[ErasedHandler] {
            &self.notifications
        }
    }

    #[tokio::test]
    async fn publish_with_a_mismatched_entry_fails_before_any_handler_runs() {
        let recorder = Recorder::new();
        let registry = MixedRegistry {
            notifications: vec![
                erase_notification_handler::<OrderCreated, _>(recorder.named("h1")),
                erase_request_handler::<CreateOrderRequest, _>(CreateOrderHandler::new("1")),
                erase_notification_handler::<OrderCreated, _>(recorder.named("h3")),
            ],
        };
        let mediator = Mediator::new(Arc::new(registry));

        let err = mediator.publish(OrderCreated::new("123")).await.unwrap_err();

        assert!(matches!(err, DispatchError::HandlerNotFound(name) if name == "OrderCreated"));
        assert!(recorder.calls().is_empty());
    }

    #[tokio::test]
    async fn publish_without_handlers_is_a_no_op() {
        let recorder = Recorder::new();
        let mut registry = TypedRegistry::new();
        registry.register_notification::<OrderCreated, _>(recorder.named("audit"));
        let mediator = mediator(registry);

        mediator.publish(OrderShipped).await.unwrap();

        assert!(recorder.calls().is_empty());
    }

    #[tokio::test]
    async fn publish_hands_the_same_token_to_every_handler() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut registry = TypedRegistry::new();
        for _ in 0..2 {
            let seen = seen.clone();
            registry.register_notification_fn(move |_: &OrderCreated, cancel: CancellationToken| {
                seen.lock().unwrap().push(cancel.is_cancelled());
                async { Ok::<_, OrderError>(()) }
            });
        }
        let mediator = mediator(registry);

        let source = CancellationSource::new();
        source.cancel();
        mediator
            .publish_with(OrderCreated::new("123"), &source.token())
            .await
            .unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![true, true]);
    }

    /// Requests share one interface; each concrete type has its own handler.
    struct Lookup(&'static str);
    struct LookupByEmail(&'static str);

    impl Request for Lookup {
        type Response = String;
        type Error = OrderError;
    }

    impl Request for LookupByEmail {
        type Response = String;
        type Error = OrderError;
    }

    struct LookupHandler;

    #[async_trait]
    impl RequestHandler<Lookup> for LookupHandler {
        async fn handle(&self, request: Lookup, _: &CancellationToken) -> Result<String, OrderError> {
            Ok(format!("by-id:{}", request.0))
        }
    }

    struct LookupByEmailHandler;

    #[async_trait]
    impl RequestHandler<LookupByEmail> for LookupByEmailHandler {
        async fn handle(
            &self,
            request: LookupByEmail,
            _: &CancellationToken,
        ) -> Result<String, OrderError> {
            Ok(format!("by-email:{}", request.0))
        }
    }

    #[tokio::test]
    async fn boxed_requests_route_by_their_runtime_type() {
        let mut registry = TypedRegistry::new();
        registry
            .register_request::<Lookup, _>(LookupHandler)
            .unwrap();
        registry
            .register_request::<LookupByEmail, _>(LookupByEmailHandler)
            .unwrap();
        let mediator = mediator(registry);

        let requests: Vec<Box<dyn AnyRequest<String, OrderError>>> =
            vec![Box::new(LookupByEmail("a@b.c")), Box::new(Lookup("42"))];

        let mut answers = Vec::new();
        for request in requests {
            answers.push(
                mediator
                    .send_boxed(request, &CancellationToken::none())
                    .await
                    .unwrap(),
            );
        }
        assert_eq!(answers, vec!["by-email:a@b.c", "by-id:42"]);
    }

    #[tokio::test]
    async fn boxed_notifications_route_by_their_runtime_type() {
        let recorder = Recorder::new();
        let mut registry = TypedRegistry::new();
        registry.register_notification::<OrderCreated, _>(recorder.named("created"));
        let mediator = mediator(registry);

        let events: Vec<Box<dyn AnyNotification<OrderError>>> =
            vec![Box::new(OrderShipped), Box::new(OrderCreated::new("1"))];
        for event in events {
            mediator
                .publish_boxed(event, &CancellationToken::none())
                .await
                .unwrap();
        }

        assert_eq!(recorder.calls(), vec!["created"]);
    }

    /// Registry that hands back two candidates for every request contract.
    struct DuplicatingRegistry {
        entries: Vec<ErasedHandler>,
    }

    impl HandlerRegistry for DuplicatingRegistry {
        fn request_handlers(&self, _contract: &ContractId) -> &[ErasedHandler] {
            &self.entries
        }

        fn notification_handlers(&self, _contract: &ContractId) -> &[ErasedHandler] {
            &[]
        }
    }

    #[rstest]
    #[case(AmbiguityPolicy::Reject, None)]
    #[case(AmbiguityPolicy::FirstRegistered, Some("first"))]
    #[tokio::test]
    async fn ambiguity_follows_the_configured_policy(
        #[case] policy: AmbiguityPolicy,
        #[case] expected: Option<&str>,
    ) {
        let first = Arc::new(CreateOrderHandler::new("first"));
        let second = Arc::new(CreateOrderHandler::new("second"));
        let registry = DuplicatingRegistry {
            entries: vec![
                erase_request_handler::<CreateOrderRequest, _>(first.clone()),
                erase_request_handler::<CreateOrderRequest, _>(second.clone()),
            ],
        };
        let mediator = Mediator::with_config(
            Arc::new(registry),
            MediatorConfig::default().with_ambiguity(policy),
        );

        let result = mediator.send(CreateOrderRequest::new("A1")).await;

        match expected {
            Some(id) => assert_eq!(result.unwrap(), OrderId::new(id)),
            None => assert!(matches!(
                result,
                Err(DispatchError::AmbiguousRegistration { count: 2, .. })
            )),
        }
        assert_eq!(second.calls(), 0);
    }

    #[tokio::test]
    async fn concurrent_sends_share_one_mediator() {
        let handler = Arc::new(CreateOrderHandler::new("123"));
        let mut registry = TypedRegistry::new();
        registry
            .register_request::<CreateOrderRequest, _>(handler.clone())
            .unwrap();
        let mediator = mediator(registry);

        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let mediator = mediator.clone();
                tokio::spawn(async move { mediator.send(CreateOrderRequest::new(format!("sku-{i}"))).await })
            })
            .collect();
        for task in tasks {
            assert_eq!(task.await.unwrap().unwrap(), OrderId::new("123"));
        }
        assert_eq!(handler.calls(), 16);
    }
}
