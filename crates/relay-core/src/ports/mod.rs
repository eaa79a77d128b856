//! Ports - Handler Registry との境界
//!
//! Handler の登録・生成・ライフタイム管理は外部（DI コンテナなど）の責務。
//! Mediator はここで定義する読み取り専用の問い合わせだけを使う。

pub mod registry;

pub use self::registry::{ErasedHandler, HandlerRegistry};
