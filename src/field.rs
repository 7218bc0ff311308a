//! Field presence tracking and payload normalization helpers.
//!
//! A plain `bool` or integer cannot tell "never configured" apart from
//! "configured as `false`/`0`". [`Attr`] keeps that distinction, and also
//! remembers whether a value was learned from the remote rather than set by
//! the caller.

use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A nullable configuration value with explicit-set tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attr<T> {
    /// Not configured and not known from the remote.
    Unset,
    /// Explicitly configured by the caller. Sent in payloads.
    Set(T),
    /// Filled in from a remote response. Not sent in payloads.
    Computed(T),
}

impl<T> Attr<T> {
    /// The current value, whichever way it was obtained.
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Unset => None,
            Self::Set(v) | Self::Computed(v) => Some(v),
        }
    }

    /// The value only if the caller set it explicitly.
    pub fn explicit(&self) -> Option<&T> {
        match self {
            Self::Set(v) => Some(v),
            _ => None,
        }
    }

    /// Whether the caller set the value explicitly.
    pub fn is_set(&self) -> bool {
        matches!(self, Self::Set(_))
    }

    /// Whether no value is known at all.
    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    /// Overwrite with a value returned by the remote.
    ///
    /// `None` (the remote omitted the field) leaves the value untouched. An
    /// explicitly set field stays explicit.
    pub fn absorb(&mut self, remote: Option<T>) {
        let Some(remote) = remote else {
            return;
        };
        *self = match self {
            Self::Set(_) => Self::Set(remote),
            _ => Self::Computed(remote),
        };
    }
}

impl<T> Default for Attr<T> {
    fn default() -> Self {
        Self::Unset
    }
}

impl<T> From<Option<T>> for Attr<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Unset, Self::Set)
    }
}

impl<T: Serialize> Serialize for Attr<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value().serialize(serializer)
    }
}

/// A missing key (with `#[serde(default)]`) or `null` is `Unset`; any value
/// is `Set`.
impl<'de, T: Deserialize<'de>> Deserialize<'de> for Attr<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(Self::from)
    }
}

/// Explicit boolean for the payload, `None` to let the remote decide.
pub fn optional_bool(attr: &Attr<bool>) -> Option<bool> {
    attr.explicit().copied()
}

/// Explicit integer for the payload, `None` to let the remote decide.
pub fn optional_int(attr: &Attr<i64>) -> Option<i64> {
    attr.explicit().copied()
}

/// Elements of a set in deterministic (sorted) order.
pub fn sorted_sequence(set: &BTreeSet<String>) -> Vec<String> {
    set.iter().cloned().collect()
}

/// Like [`sorted_sequence`], but an empty set is omitted from the payload.
pub fn non_empty_sequence(set: &BTreeSet<String>) -> Option<Vec<String>> {
    if set.is_empty() {
        None
    } else {
        Some(sorted_sequence(set))
    }
}

/// A string for the payload, omitted when empty.
pub fn non_empty_string(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
