use async_trait::async_trait;
use futures::future::join_all;
use herald_core::{
    CancelPolicy, DispatchContext, DispatcherConfig, DispatcherError, EventName, HandlerResult,
    SharedEvent, SharedHandler,
};
use std::any::Any;
use std::sync::Arc;
use tokio::task::JoinError;
use tokio_util::task::AbortOnDropHandle;

use crate::registry::HandlerRegistry;

/// Binds handlers to event names and delivers events to them.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Fails with `HandlerAlreadyRegistered` if this exact handler is already bound to `name`.
    fn register(&self, name: &str, handler: SharedHandler) -> Result<(), DispatcherError>;

    /// Each handler of an event must be removed individually.
    fn remove(&self, name: &str, handler: &SharedHandler) -> Result<(), DispatcherError>;

    fn has(&self, name: &str, handler: &SharedHandler) -> bool;

    /// Run every handler bound to the event's name concurrently and wait for all of them.
    ///
    /// Returns one entry per failed handler; an empty vector means every
    /// handler succeeded. An event with no handlers yields exactly
    /// `[EventNotRegistered]`.
    async fn dispatch(&self, ctx: &DispatchContext, event: SharedEvent) -> Vec<DispatcherError>;

    fn clear(&self);
}

/// Registry-backed [`Dispatcher`] fanning each dispatch out to tokio tasks.
///
/// Clones share the same registry.
#[derive(Clone, Default)]
pub struct EventDispatcher {
    registry: Arc<HandlerRegistry>,
    config: DispatcherConfig,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::with_config(DispatcherConfig::default())
    }

    pub fn with_config(config: DispatcherConfig) -> Self {
        Self {
            registry: Arc::new(HandlerRegistry::new()),
            config,
        }
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    pub fn handler_count(&self, name: &str) -> usize {
        self.registry.handler_count(name)
    }

    /// Handlers bound to `name`, in registration order.
    pub fn handlers(&self, name: &str) -> Vec<SharedHandler> {
        self.registry.snapshot(name)
    }

    /// Names with at least one handler, sorted.
    pub fn event_names(&self) -> Vec<EventName> {
        self.registry.event_names()
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    async fn join(
        &self,
        ctx: &DispatchContext,
        tasks: Vec<AbortOnDropHandle<HandlerResult>>,
    ) -> Vec<Result<HandlerResult, JoinError>> {
        match self.config.cancel_policy {
            CancelPolicy::AwaitAll => join_all(tasks).await,
            CancelPolicy::AbortOnCancel => {
                let abort_handles: Vec<_> =
                    tasks.iter().map(AbortOnDropHandle::abort_handle).collect();
                let joined = join_all(tasks);
                tokio::pin!(joined);

                let reason = tokio::select! {
                    outcomes = &mut joined => return outcomes,
                    reason = ctx.done() => reason,
                };

                let unfinished = abort_handles.iter().filter(|h| !h.is_finished()).count();
                tracing::warn!(
                    "Dispatch interrupted ({}), aborting {} unfinished handler(s)",
                    reason,
                    unfinished
                );
                for handle in &abort_handles {
                    handle.abort();
                }

                joined.await
            }
        }
    }
}

#[async_trait]
impl Dispatcher for EventDispatcher {
    fn register(&self, name: &str, handler: SharedHandler) -> Result<(), DispatcherError> {
        let label = handler.name().to_string();
        self.registry.register(name, handler)?;
        tracing::debug!("Registered handler {} for event {}", label, name);
        Ok(())
    }

    fn remove(&self, name: &str, handler: &SharedHandler) -> Result<(), DispatcherError> {
        self.registry.remove(name, handler)?;
        tracing::debug!("Removed handler {} from event {}", handler.name(), name);
        Ok(())
    }

    fn has(&self, name: &str, handler: &SharedHandler) -> bool {
        self.registry.contains(name, handler)
    }

    async fn dispatch(&self, ctx: &DispatchContext, event: SharedEvent) -> Vec<DispatcherError> {
        let name = event.name().clone();
        let handlers = self.registry.snapshot(name.as_str());

        if handlers.is_empty() {
            tracing::trace!("No handlers registered for event {}", name);
            return vec![DispatcherError::EventNotRegistered { name }];
        }

        tracing::debug!("Dispatching event {} to {} handler(s)", name, handlers.len());

        let labels: Vec<String> = handlers.iter().map(|h| h.name().to_string()).collect();
        // Dropping the dispatch future aborts every handler still in flight.
        let tasks: Vec<AbortOnDropHandle<HandlerResult>> = handlers
            .into_iter()
            .map(|handler| {
                let ctx = ctx.clone();
                let event = Arc::clone(&event);
                AbortOnDropHandle::new(tokio::spawn(async move {
                    handler.handle(&ctx, &event).await
                }))
            })
            .collect();

        let outcomes = self.join(ctx, tasks).await;

        let failures: Vec<DispatcherError> = labels
            .into_iter()
            .zip(outcomes)
            .filter_map(|(label, outcome)| into_failure(&name, label, outcome))
            .collect();

        tracing::debug!(
            "Dispatched event {}: {} failure(s)",
            name,
            failures.len()
        );

        failures
    }

    fn clear(&self) {
        self.registry.clear();
        tracing::debug!("Cleared all event handlers");
    }
}

fn into_failure(
    name: &EventName,
    handler: String,
    outcome: Result<HandlerResult, JoinError>,
) -> Option<DispatcherError> {
    match outcome {
        Ok(Ok(())) => None,
        Ok(Err(err)) => {
            tracing::warn!("Handler {} failed on event {}: {}", handler, name, err);
            Some(DispatcherError::Handler(err))
        }
        Err(join_err) if join_err.is_panic() => {
            let message = panic_message(join_err.into_panic());
            tracing::error!("Handler {} panicked on event {}: {}", handler, name, message);
            Some(DispatcherError::HandlerPanicked { handler, message })
        }
        Err(_) => {
            tracing::warn!("Handler {} aborted on event {}", handler, name);
            Some(DispatcherError::HandlerAborted { handler })
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
