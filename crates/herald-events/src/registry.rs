use herald_core::{DispatcherError, EventName, SharedHandler};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Event name -> handlers in registration order.
///
/// A name is present only while at least one handler is registered for it.
#[derive(Default)]
pub(crate) struct HandlerRegistry {
    handlers: RwLock<HashMap<EventName, Vec<SharedHandler>>>,
}

fn same_handler(a: &SharedHandler, b: &SharedHandler) -> bool {
    Arc::ptr_eq(a, b)
}

impl HandlerRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn register(
        &self,
        name: &str,
        handler: SharedHandler,
    ) -> Result<(), DispatcherError> {
        let mut handlers = self.handlers.write();

        if let Some(existing) = handlers.get(name) {
            if existing.iter().any(|h| same_handler(h, &handler)) {
                return Err(DispatcherError::HandlerAlreadyRegistered { name: name.into() });
            }
        }

        handlers.entry(name.into()).or_default().push(handler);
        Ok(())
    }

    pub(crate) fn remove(&self, name: &str, handler: &SharedHandler) -> Result<(), DispatcherError> {
        let mut handlers = self.handlers.write();

        let Some(existing) = handlers.get_mut(name) else {
            return Err(DispatcherError::EventNotRegistered { name: name.into() });
        };

        let Some(index) = existing.iter().position(|h| same_handler(h, handler)) else {
            return Err(DispatcherError::HandlerNotRegistered { name: name.into() });
        };

        existing.remove(index);
        if existing.is_empty() {
            handlers.remove(name);
        }

        Ok(())
    }

    pub(crate) fn contains(&self, name: &str, handler: &SharedHandler) -> bool {
        self.handlers
            .read()
            .get(name)
            .is_some_and(|existing| existing.iter().any(|h| same_handler(h, handler)))
    }

    /// Copy of the handlers bound to `name`, taken under the lock.
    pub(crate) fn snapshot(&self, name: &str) -> Vec<SharedHandler> {
        self.handlers.read().get(name).cloned().unwrap_or_default()
    }

    pub(crate) fn handler_count(&self, name: &str) -> usize {
        self.handlers.read().get(name).map_or(0, Vec::len)
    }

    pub(crate) fn event_names(&self) -> Vec<EventName> {
        let mut names: Vec<EventName> = self.handlers.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub(crate) fn len(&self) -> usize {
        self.handlers.read().len()
    }

    pub(crate) fn clear(&self) {
        self.handlers.write().clear();
    }
}
