mod config;
mod context;
mod error;
mod event;
mod handler;

pub use config::{CancelPolicy, DispatcherConfig};
pub use context::{ContextError, DispatchContext};
pub use error::DispatcherError;
pub use event::{BasicEvent, Event, EventName, SharedEvent};
pub use handler::{
    handler_fn, BoxError, FnHandler, Handler, HandlerFn, HandlerFuture, HandlerResult,
    SharedHandler,
};
