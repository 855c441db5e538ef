mod dispatcher;
mod registry;

pub use dispatcher::{Dispatcher, EventDispatcher};

pub use herald_core::{
    handler_fn, BasicEvent, BoxError, CancelPolicy, ContextError, DispatchContext,
    DispatcherConfig, DispatcherError, Event, EventName, FnHandler, Handler, HandlerResult,
    SharedEvent, SharedHandler,
};
