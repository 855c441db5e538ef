use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Key under which handlers are registered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventName(String);

impl EventName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for EventName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for EventName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EventName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for EventName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl PartialEq<str> for EventName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for EventName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// A named occurrence delivered to every handler registered under its name.
///
/// The dispatcher only ever reads [`Event::name`]; the payload travels to
/// handlers untouched.
pub trait Event: Send + Sync + 'static {
    fn name(&self) -> &EventName;

    fn payload(&self) -> &(dyn Any + Send + Sync);
}

impl dyn Event {
    /// Downcast the opaque payload to a concrete type.
    pub fn payload_as<T: Any>(&self) -> Option<&T> {
        self.payload().downcast_ref::<T>()
    }
}

impl fmt::Debug for dyn Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event").field("name", self.name()).finish()
    }
}

/// Events are shared between every handler task spawned for one dispatch.
pub type SharedEvent = Arc<dyn Event>;

/// Ready-made event carrying a typed payload.
#[derive(Debug, Clone, Serialize)]
pub struct BasicEvent<P> {
    name: EventName,
    payload: P,
    occurred_at: DateTime<Utc>,
}

impl<P> BasicEvent<P>
where
    P: Send + Sync + 'static,
{
    pub fn new(name: impl Into<EventName>, payload: P) -> Self {
        Self {
            name: name.into(),
            payload,
            occurred_at: Utc::now(),
        }
    }

    pub fn payload_ref(&self) -> &P {
        &self.payload
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    pub fn into_shared(self) -> SharedEvent {
        Arc::new(self)
    }
}

impl<P> Event for BasicEvent<P>
where
    P: Send + Sync + 'static,
{
    fn name(&self) -> &EventName {
        &self.name
    }

    fn payload(&self) -> &(dyn Any + Send + Sync) {
        &self.payload
    }
}
