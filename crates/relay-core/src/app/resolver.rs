//! Resolver - 実行時型から ContractId を導出して Registry に問い合わせる
//!
//! キャッシュは持たない。Registry 以外の状態もない。

use std::sync::Arc;

use tracing::warn;

use super::config::AmbiguityPolicy;
use crate::domain::{ContractId, DispatchError, MessageType};
use crate::ports::{ErasedHandler, HandlerRegistry};
use crate::typed::{DynNotificationHandler, DynRequestHandler};

pub struct Resolver<'a> {
    registry: &'a dyn HandlerRegistry,
    ambiguity: AmbiguityPolicy,
}

impl<'a> Resolver<'a> {
    pub fn new(registry: &'a dyn HandlerRegistry, ambiguity: AmbiguityPolicy) -> Self {
        Self {
            registry,
            ambiguity,
        }
    }

    /// Exactly one handler for `(message, Res)`.
    ///
    /// `message` is the runtime type of the request instance.
    pub fn resolve_request_handler<Res, E>(
        &self,
        message: MessageType,
    ) -> Result<Arc<dyn DynRequestHandler<Res, E>>, DispatchError<E>>
    where
        Res: 'static,
        E: 'static,
    {
        let contract = ContractId::request_of(message, MessageType::of::<Res>());
        let candidates = self.registry.request_handlers(&contract);
        match (candidates, self.ambiguity) {
            ([], _) => {
                warn!(%contract, "no request handler registered");
                return Err(not_found(message));
            }
            ([_, _, ..], AmbiguityPolicy::Reject) => {
                warn!(%contract, count = candidates.len(), "ambiguous request handler registration");
                return Err(DispatchError::AmbiguousRegistration {
                    message: message.short_name().into(),
                    count: candidates.len(),
                });
            }
            _ => {}
        }

        // FirstRegistered: earliest entry of the right shape
        candidates
            .iter()
            .find_map(downcast::<Arc<dyn DynRequestHandler<Res, E>>>)
            .ok_or_else(|| {
                warn!(%contract, "registry entry does not match the request contract");
                not_found(message)
            })
    }

    /// Handlers for `message` in registration order, possibly none.
    ///
    /// Fails with `HandlerNotFound` if any entry doesn't hold a `DynNotificationHandler<E>`;
    /// nothing has run at that point.
    pub fn resolve_notification_handlers<E>(
        &self,
        message: MessageType,
    ) -> Result<Vec<Arc<dyn DynNotificationHandler<E>>>, DispatchError<E>>
    where
        E: 'static,
    {
        let contract = ContractId::notification_of(message);
        self.registry
            .notification_handlers(&contract)
            .iter()
            .map(|entry| {
                downcast::<Arc<dyn DynNotificationHandler<E>>>(entry).ok_or_else(|| {
                    warn!(%contract, "registry entry does not match the notification contract");
                    not_found(message)
                })
            })
            .collect()
    }
}

fn not_found<E>(message: MessageType) -> DispatchError<E> {
    DispatchError::HandlerNotFound(message.short_name().into())
}

fn downcast<T: Clone + 'static>(entry: &ErasedHandler) -> Option<T> {
    (**entry).downcast_ref::<T>().cloned()
}
