#![forbid(unsafe_code)]

//! Property maps attached to elements and fibers.
//!
//! [`Props`] keeps insertion order so that host mutations are issued in a
//! deterministic sequence. Children are never stored here; they live on the
//! [`Element`](crate::Element) itself.

use std::fmt;
use std::rc::Rc;

use smallvec::SmallVec;

use crate::event::EventHandler;

/// A single property value.
#[derive(Debug, Clone)]
pub enum PropValue {
    /// String value.
    Str(Rc<str>),
    /// Integer value.
    Int(i64),
    /// Floating-point value.
    Float(f64),
    /// Boolean value.
    Bool(bool),
    /// Event listener.
    Listener(EventHandler),
}

/// How the committer treats a prop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropKind {
    /// Written to the host node with `set_attribute`.
    Attribute,
    /// Attached to the host node with `add_listener`.
    Listener,
}

impl PropValue {
    /// Classify this value.
    #[must_use]
    pub const fn kind(&self) -> PropKind {
        match self {
            Self::Listener(_) => PropKind::Listener,
            _ => PropKind::Attribute,
        }
    }

    /// Borrow as a string, if this is a `Str`.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Integer value, if this is an `Int`.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Listener handle, if this is a `Listener`.
    #[must_use]
    pub const fn as_listener(&self) -> Option<&EventHandler> {
        match self {
            Self::Listener(h) => Some(h),
            _ => None,
        }
    }
}

impl PartialEq for PropValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            // Bitwise so that a NaN prop does not look changed on every pass.
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Listener(a), Self::Listener(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Display for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Listener(_) => f.write_str("[listener]"),
        }
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        Self::Str(value.into())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        Self::Str(value.into())
    }
}

impl From<Rc<str>> for PropValue {
    fn from(value: Rc<str>) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u32> for PropValue {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<EventHandler> for PropValue {
    fn from(value: EventHandler) -> Self {
        Self::Listener(value)
    }
}

/// Event type for a listener prop: `onClick` → `click`.
///
/// Names without the `on` prefix are used as-is, lower-cased.
#[must_use]
pub fn event_type_of(name: &str) -> String {
    name.strip_prefix("on")
        .filter(|rest| !rest.is_empty())
        .unwrap_or(name)
        .to_ascii_lowercase()
}

/// Insertion-ordered property map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Props {
    entries: SmallVec<[(Rc<str>, PropValue); 4]>,
}

impl Props {
    /// Empty props.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, name: impl Into<Rc<str>>, value: impl Into<PropValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Builder-style listener insert.
    #[must_use]
    pub fn on(self, name: impl Into<Rc<str>>, handler: EventHandler) -> Self {
        self.with(name, PropValue::Listener(handler))
    }

    /// Insert or replace a prop, keeping its original position on replace.
    pub fn insert(
        &mut self,
        name: impl Into<Rc<str>>,
        value: impl Into<PropValue>,
    ) -> Option<PropValue> {
        let name = name.into();
        let value = value.into();
        if let Some((_, slot)) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            return Some(std::mem::replace(slot, value));
        }
        self.entries.push((name, value));
        None
    }

    /// Remove a prop.
    pub fn remove(&mut self, name: &str) -> Option<PropValue> {
        let idx = self.entries.iter().position(|(n, _)| &**n == name)?;
        Some(self.entries.remove(idx).1)
    }

    /// Look up a prop.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.entries
            .iter()
            .find(|(n, _)| &**n == name)
            .map(|(_, v)| v)
    }

    /// Whether a prop is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Number of props.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no props.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All props in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.entries.iter().map(|(n, v)| (&**n, v))
    }

    /// Non-listener props in insertion order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.iter()
            .filter(|(_, v)| v.kind() == PropKind::Attribute)
    }

    /// Listener props in insertion order.
    pub fn listeners(&self) -> impl Iterator<Item = (&str, &EventHandler)> {
        self.iter()
            .filter_map(|(n, v)| v.as_listener().map(|h| (n, h)))
    }

    /// Order-insensitive equality: same names mapped to equal values.
    ///
    /// A reasonable comparator for [`memo`](crate::memo).
    #[must_use]
    pub fn shallow_eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(n, v)| other.get(n) == Some(v))
    }
}

impl<K: Into<Rc<str>>, V: Into<PropValue>> FromIterator<(K, V)> for Props {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut props = Self::new();
        for (k, v) in iter {
            props.insert(k, v);
        }
        props
    }
}
