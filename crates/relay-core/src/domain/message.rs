//! Message contracts: requests (single-cast) and notifications (multi-cast).

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A message answered by exactly one handler.
///
/// # 使用例
/// ```ignore
/// struct CreateOrderRequest {
///     sku: String,
/// }
///
/// impl Request for CreateOrderRequest {
///     type Response = OrderId;
///     type Error = OrderError;
/// }
/// ```
///
/// `Error` is what every handler of this request fails with. The mediator hands it back
/// to the caller untouched inside `DispatchError::Handler`.
pub trait Request: Send + 'static {
    type Response: Send + 'static;
    type Error: std::error::Error + Send + Sync + 'static;
}

/// A message observed by zero or more handlers, with no response.
///
/// Handlers borrow the notification in turn, hence `Sync`.
pub trait Notification: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;
}

/// Runtime type token of a message (or response) type.
///
/// Equality and hashing use the `TypeId` only; the name is kept for diagnostics.
#[derive(Clone, Copy)]
pub struct MessageType {
    id: TypeId,
    name: &'static str,
}

impl MessageType {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name, e.g. `shop::orders::CreateOrderRequest`.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name without module path or generic arguments, e.g. `CreateOrderRequest`.
    pub fn short_name(&self) -> &'static str {
        short_type_name(self.name)
    }
}

impl PartialEq for MessageType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for MessageType {}

impl Hash for MessageType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MessageType").field(&self.name).finish()
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

fn short_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Object-safe view of a request whose response is `Res`.
///
/// Lets callers keep requests behind `Box<dyn AnyRequest<Res, E>>`; dispatch still routes
/// on the concrete type of the boxed value.
pub trait AnyRequest<Res, E>: Send {
    fn message_type(&self) -> MessageType;

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send>;
}

impl<Q: Request> AnyRequest<Q::Response, Q::Error> for Q {
    fn message_type(&self) -> MessageType {
        MessageType::of::<Q>()
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }
}

/// Object-safe view of a notification failing with `E`.
pub trait AnyNotification<E>: Send + Sync {
    fn message_type(&self) -> MessageType;

    fn as_any(&self) -> &(dyn Any + Send + Sync);
}

impl<N: Notification> AnyNotification<N::Error> for N {
    fn message_type(&self) -> MessageType {
        MessageType::of::<N>()
    }

    fn as_any(&self) -> &(dyn Any + Send + Sync) {
        self
    }
}
