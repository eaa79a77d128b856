use std::any::Any;
use std::sync::Arc;

use crate::domain::ContractId;

/// Type-erased registry entry.
///
/// Request entries hold an `Arc<dyn DynRequestHandler<Res, E>>`, notification entries an
/// `Arc<dyn DynNotificationHandler<E>>` (see `typed::erased`).
pub type ErasedHandler = Arc<dyn Any + Send + Sync>;

/// Lookup-by-contract, as seen by the mediator.
///
/// # 前提
/// - 起動時に構築し、共有後は変更しない（dispatch 中に中身が変わらないこと）
/// - 複数スレッドからの同時 lookup に耐えること
/// - スライスは登録順
pub trait HandlerRegistry: Send + Sync {
    /// Candidates for a request contract. More than one is possible for registries that
    /// don't enforce uniqueness; the mediator's `AmbiguityPolicy` settles it.
    fn request_handlers(&self, contract: &ContractId) -> &[ErasedHandler];

    /// Handlers for a notification contract, possibly none.
    fn notification_handlers(&self, contract: &ContractId) -> &[ErasedHandler];
}
