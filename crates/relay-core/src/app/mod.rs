//! App - アプリケーション層
//!
//! # 主要コンポーネント
//! - **Resolver**: ContractId を導出して Registry に問い合わせる（純粋なクエリ）
//! - **Mediator**: `send` / `publish` の公開エントリポイント
//! - **MediatorBuilder**: 登録と起動時検証（Fail-fast）
//! - **MediatorConfig**: 曖昧な登録の扱いなど

pub mod builder;
pub mod config;
pub mod mediator;
pub mod resolver;

pub use self::builder::MediatorBuilder;
pub use self::config::{AmbiguityPolicy, MediatorConfig};
pub use self::mediator::Mediator;
pub use self::resolver::Resolver;
