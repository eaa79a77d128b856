use thiserror::Error;

/// Failure of a `send` / `publish`.
///
/// The kind tells "nobody was responsible" apart from "a handler ran and failed".
#[derive(Debug, Error)]
pub enum DispatchError<E> {
    /// No handler registered for the request; carries the request's type name.
    #[error("handler not found for {0}")]
    HandlerNotFound(String),

    #[error("ambiguous registration: {count} handlers registered for {message}")]
    AmbiguousRegistration { message: String, count: usize },

    /// The handler's own error, exactly as it returned it.
    #[error(transparent)]
    Handler(E),
}

impl<E> DispatchError<E> {
    pub fn is_handler_not_found(&self) -> bool {
        matches!(self, Self::HandlerNotFound(_))
    }

    pub fn handler_error(&self) -> Option<&E> {
        match self {
            Self::Handler(err) => Some(err),
            _ => None,
        }
    }

    pub fn into_handler_error(self) -> Option<E> {
        match self {
            Self::Handler(err) => Some(err),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("handler for request contract '{0}' is already registered")]
    AlreadyRegistered(String),
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("missing handlers: {0:?}. These contracts were expected but not registered.")]
    MissingHandlers(Vec<String>),
}
