//! Data Record Facade
//!
//! A DataRecord turns a plain mapping of initial field values into a set
//! of observable fields, and is the accessor layer the rest of the
//! runtime (and render closures) read and write through.
//!
//! Field values are dynamic at the record boundary: [`Value`] is the small
//! scalar union a record cell can hold. Underneath, every key is an
//! ordinary `ReactiveField<Value>`, so reads register dependencies and
//! writes drive the synchronous cascade.
//!
//! Only keys present at construction are reactive. Reading an unknown key
//! yields [`Value::Null`]; writing one is a logged no-op.

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

use super::field::ReactiveField;

/// A dynamic scalar value held by one record field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// The absent value. Reading a key the record does not carry yields
    /// this.
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl fmt::Display for Value {
    /// Text-content formatting: `Null` renders as the empty string, the
    /// carried scalars render bare. This is what render closures splice
    /// into text vnodes.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Str(v) => f.write_str(v),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v.into())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl Value {
    /// The carried boolean, or `false` for every other variant.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(v) => *v,
            Value::Int(v) => *v != 0,
            Value::Float(v) => *v != 0.0,
            Value::Str(v) => !v.is_empty(),
        }
    }
}

/// A set of observable fields keyed by name.
///
/// The record is the facade over its fields: `get`/`set` on a key are
/// equivalent to `get`/`set` on the underlying `ReactiveField`.
pub struct DataRecord {
    /// Insertion-ordered so record traversal is deterministic.
    fields: IndexMap<String, ReactiveField<Value>>,
}

impl DataRecord {
    /// Wrap every key of the initial mapping in a reactive field.
    pub fn observe_all(data: IndexMap<String, Value>) -> Self {
        let fields = data
            .into_iter()
            .map(|(key, value)| (key, ReactiveField::new(value)))
            .collect();
        Self { fields }
    }

    /// Read a field, registering the evaluating watcher if one is active.
    ///
    /// Unknown keys yield [`Value::Null`] and register nothing.
    pub fn get(&self, key: &str) -> Value {
        match self.fields.get(key) {
            Some(field) => field.get(),
            None => Value::Null,
        }
    }

    /// Read a field without registering a dependency.
    pub fn get_untracked(&self, key: &str) -> Value {
        match self.fields.get(key) {
            Some(field) => field.get_untracked(),
            None => Value::Null,
        }
    }

    /// Write a field and drive the synchronous cascade.
    ///
    /// Writing the current value back is a no-op. Keys not present at
    /// construction are not reactive and the write is dropped.
    pub fn set(&self, key: &str, value: impl Into<Value>) {
        match self.fields.get(key) {
            Some(field) => field.set(value.into()),
            None => {
                tracing::warn!(key, "write to unobserved record key dropped");
            }
        }
    }

    /// The underlying field for a key, if the record carries it.
    pub fn field(&self, key: &str) -> Option<&ReactiveField<Value>> {
        self.fields.get(key)
    }

    /// Whether the record carries a key.
    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Field names, in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Debug for DataRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (key, field) in &self.fields {
            map.entry(key, &field.get_untracked());
        }
        map.finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
