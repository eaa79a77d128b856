//! Typed - 型付き Handler API
//!
//! # 二層構造
//! - **表層（Typed）**: `RequestHandler<Q>`, `NotificationHandler<N>` - 型安全
//! - **内部（Dyn）**: `DynRequestHandler`, `DynNotificationHandler` - object-safe, type erasure
//!
//! Registry には内部層だけが `ErasedHandler` として格納される。

pub mod erased;
pub mod func;
pub mod handler;

pub use self::erased::{
    DynNotificationHandler, DynRequestHandler, TypedNotificationHandler, TypedRequestHandler,
    erase_notification_handler, erase_request_handler,
};
pub use self::func::{FactoryHandler, NotificationFn, RequestFn, notification_fn, request_fn};
pub use self::handler::{NotificationHandler, RequestHandler};
