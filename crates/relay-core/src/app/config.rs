//! Mediator configuration.

use serde::{Deserialize, Serialize};

/// What `send` does when a registry yields several handlers for one request contract.
///
/// `TypedRegistry` never does; foreign registries may.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmbiguityPolicy {
    /// Fail with `DispatchError::AmbiguousRegistration`.
    #[default]
    Reject,
    /// Use the earliest registered handler.
    FirstRegistered,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediatorConfig {
    pub ambiguity: AmbiguityPolicy,
}

impl MediatorConfig {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_ambiguity(mut self, ambiguity: AmbiguityPolicy) -> Self {
        self.ambiguity = ambiguity;
        self
    }
}
