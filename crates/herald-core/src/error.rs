//! Dispatcher error types

use thiserror::Error;

use crate::event::EventName;
use crate::handler::BoxError;

#[derive(Debug, Error)]
pub enum DispatcherError {
    #[error("event not registered: {name}")]
    EventNotRegistered { name: EventName },

    #[error("handler not registered for event: {name}")]
    HandlerNotRegistered { name: EventName },

    #[error("handler already registered for event: {name}")]
    HandlerAlreadyRegistered { name: EventName },

    /// A handler's own failure, unchanged.
    #[error(transparent)]
    Handler(BoxError),

    #[error("handler {handler} panicked: {message}")]
    HandlerPanicked { handler: String, message: String },

    #[error("handler {handler} aborted before completion")]
    HandlerAborted { handler: String },
}

impl DispatcherError {
    /// True for failures produced while running handlers rather than by the registry.
    pub fn is_handler_failure(&self) -> bool {
        matches!(
            self,
            Self::Handler(_) | Self::HandlerPanicked { .. } | Self::HandlerAborted { .. }
        )
    }

    pub fn handler_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            Self::Handler(err) => Some(err.as_ref()),
            _ => None,
        }
    }

    pub fn into_handler_error(self) -> Option<BoxError> {
        match self {
            Self::Handler(err) => Some(err),
            _ => None,
        }
    }

    pub fn event_name(&self) -> Option<&EventName> {
        match self {
            Self::EventNotRegistered { name }
            | Self::HandlerNotRegistered { name }
            | Self::HandlerAlreadyRegistered { name } => Some(name),
            _ => None,
        }
    }
}
