//! ContractId - Registry のキー
//!
//! 登録時と dispatch 時で同じ関数から導出すること。

use std::fmt;

use super::message::{MessageType, Notification, Request};

/// Identity used to look handlers up in a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContractId {
    /// `(message type, response type)`
    Request {
        message: MessageType,
        response: MessageType,
    },
    /// `(message type)`
    Notification { message: MessageType },
}

impl ContractId {
    pub fn request<Q: Request>() -> Self {
        Self::request_of(MessageType::of::<Q>(), MessageType::of::<Q::Response>())
    }

    pub fn request_of(message: MessageType, response: MessageType) -> Self {
        Self::Request { message, response }
    }

    pub fn notification<N: Notification>() -> Self {
        Self::notification_of(MessageType::of::<N>())
    }

    pub fn notification_of(message: MessageType) -> Self {
        Self::Notification { message }
    }

    pub fn message(&self) -> MessageType {
        match self {
            Self::Request { message, .. } | Self::Notification { message } => *message,
        }
    }
}

impl fmt::Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request { message, response } => write!(f, "{message} -> {response}"),
            Self::Notification { message } => write!(f, "{message}"),
        }
    }
}
