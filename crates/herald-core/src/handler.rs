//! Handler trait and closure-backed handlers

use async_trait::async_trait;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::context::DispatchContext;
use crate::event::SharedEvent;

/// Failure reason returned by a handler, passed through the dispatcher untouched.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type HandlerResult = Result<(), BoxError>;

/// Something that reacts to dispatched events.
///
/// Registrations are keyed by the identity of the [`SharedHandler`] allocation,
/// so two handlers with identical behaviour are still distinct entries.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Label used in logs and in panic/abort reports.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    async fn handle(&self, ctx: &DispatchContext, event: &SharedEvent) -> HandlerResult;
}

pub type SharedHandler = Arc<dyn Handler>;

pub type HandlerFuture = Pin<Box<dyn Future<Output = HandlerResult> + Send + 'static>>;

/// Function-based handler body
pub trait HandlerFn: Send + Sync {
    fn call(&self, ctx: DispatchContext, event: SharedEvent) -> HandlerFuture;
}

impl<F, Fut> HandlerFn for F
where
    F: Fn(DispatchContext, SharedEvent) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, ctx: DispatchContext, event: SharedEvent) -> HandlerFuture {
        Box::pin((self)(ctx, event))
    }
}

/// Wrapper to create a [`Handler`] from an async closure
pub struct FnHandler<H: HandlerFn> {
    name: String,
    func: H,
}

impl<H: HandlerFn> FnHandler<H> {
    pub fn new(name: impl Into<String>, func: H) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

#[async_trait]
impl<H: HandlerFn + 'static> Handler for FnHandler<H> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, ctx: &DispatchContext, event: &SharedEvent) -> HandlerResult {
        self.func.call(ctx.clone(), Arc::clone(event)).await
    }
}

/// Build a shareable handler from an async closure.
pub fn handler_fn<H: HandlerFn + 'static>(name: impl Into<String>, func: H) -> SharedHandler {
    Arc::new(FnHandler::new(name, func))
}
