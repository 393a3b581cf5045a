#![forbid(unsafe_code)]

//! Host events and listener handles.

use std::fmt;
use std::rc::Rc;

use crate::props::PropValue;

/// An event delivered by a host to a listener.
///
/// `value` carries the payload a host associates with the event, e.g. the
/// current value of an input field on `change`.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    event_type: Rc<str>,
    value: Option<PropValue>,
}

impl Event {
    /// Create an event with no payload.
    #[must_use]
    pub fn new(event_type: impl Into<Rc<str>>) -> Self {
        Self {
            event_type: event_type.into(),
            value: None,
        }
    }

    /// Create an event carrying a value.
    #[must_use]
    pub fn with_value(event_type: impl Into<Rc<str>>, value: impl Into<PropValue>) -> Self {
        Self {
            event_type: event_type.into(),
            value: Some(value.into()),
        }
    }

    /// Event type, e.g. `"click"`.
    #[must_use]
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// Payload, if any.
    #[must_use]
    pub fn value(&self) -> Option<&PropValue> {
        self.value.as_ref()
    }
}

/// Shared listener callback.
///
/// Two handlers compare equal only when they are the same allocation, so a
/// closure rebuilt on every render is seen as a changed listener.
#[derive(Clone)]
pub struct EventHandler(Rc<dyn Fn(&Event)>);

impl EventHandler {
    /// Wrap a callback.
    pub fn new(f: impl Fn(&Event) + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Invoke the callback.
    pub fn call(&self, event: &Event) {
        (self.0)(event);
    }

    /// Whether both handles point at the same callback.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.0), Rc::as_ptr(&other.0))
    }
}

impl PartialEq for EventHandler {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventHandler({:p})", Rc::as_ptr(&self.0).cast::<()>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn handler_equality_is_identity() {
        let a = EventHandler::new(|_| {});
        let b = EventHandler::new(|_| {});
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn handler_receives_event_payload() {
        let seen = Rc::new(Cell::new(0));
        let sink = Rc::clone(&seen);
        let handler = EventHandler::new(move |event| {
            if let Some(PropValue::Int(v)) = event.value() {
                sink.set(*v);
            }
        });
        handler.call(&Event::with_value("change", 7));
        assert_eq!(seen.get(), 7);
    }

    #[test]
    fn event_without_value() {
        let event = Event::new("click");
        assert_eq!(event.event_type(), "click");
        assert!(event.value().is_none());
    }
}
