//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **TypedRegistry**: in-memory の HandlerRegistry（起動時に登録、以後は読み取り専用）

pub mod memory_registry;

pub use self::memory_registry::TypedRegistry;
