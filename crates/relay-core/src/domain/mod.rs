//! Domain - メッセージ契約とエラー
//!
//! # 主要な型
//! - **message**: `Request` / `Notification` trait と実行時型トークン `MessageType`
//! - **contract**: Registry のキーとなる `ContractId`
//! - **cancel**: 協調的なキャンセルシグナル
//! - **errors**: dispatch / registry / builder のエラー

pub mod cancel;
pub mod contract;
pub mod errors;
pub mod message;

pub use self::cancel::{CancellationSource, CancellationToken};
pub use self::contract::ContractId;
pub use self::errors::{BuildError, DispatchError, RegistryError};
pub use self::message::{AnyNotification, AnyRequest, MessageType, Notification, Request};
