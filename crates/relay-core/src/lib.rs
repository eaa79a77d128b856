//! relay-core
//!
//! In-process mediator: routes a message to the handler(s) registered for its runtime type.
//!
//! - **send**: request/response, exactly one handler
//! - **publish**: notification, zero or more handlers run one after another
//!
//! # モジュール構成
//! - **domain**: メッセージ trait, ContractId, キャンセル, エラー
//! - **ports**: HandlerRegistry（外部の登録機構との境界）
//! - **typed**: 型付き Handler trait と type erasure
//! - **impls**: in-memory の TypedRegistry
//! - **app**: Resolver, Mediator, MediatorBuilder, 設定

pub mod app;
pub mod domain;
pub mod impls;
pub mod ports;
pub mod typed;

#[cfg(test)]
mod testing;

pub use app::{AmbiguityPolicy, Mediator, MediatorBuilder, MediatorConfig, Resolver};
pub use domain::{
    AnyNotification, AnyRequest, BuildError, CancellationSource, CancellationToken, ContractId,
    DispatchError, MessageType, Notification, RegistryError, Request,
};
pub use impls::TypedRegistry;
pub use ports::{ErasedHandler, HandlerRegistry};
pub use typed::{NotificationHandler, RequestHandler};

// handler 実装用
pub use async_trait::async_trait;
