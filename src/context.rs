//! Observable context records
//!
//! A `Record` is the data object a template is rendered against. Fields are
//! read with `get` and written with `set`; a field becomes observable once an
//! interceptor is installed on it, after which every `set` on that field
//! notifies synchronously before returning.
//!
//! Records are shared handles (`Rc`): cloning a record clones the handle, and
//! identity (`ptr_eq`, `id`) is what observer trees are keyed by.

use indexmap::IndexMap;
use serde_json::{Map, Number, Value as JsonValue};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::error::{Result, StacheError};

/// Zero-argument function stored in a record field
pub type Callable = Rc<dyn Fn() -> anyhow::Result<Value>>;

/// Notification hook installed on an intercepted field
pub type Notify = Rc<dyn Fn() -> Result<()>>;

/// A value held in a record field
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    Record(Record),
    Function(Callable),
}

impl Value {
    /// Wrap a closure as a callable value
    pub fn function<F>(f: F) -> Self
    where
        F: Fn() -> anyhow::Result<Value> + 'static,
    {
        Value::Function(Rc::new(f))
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }

    /// `false`, `0`, `NaN`, the empty string and `Null`
    pub fn is_falsy(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Bool(b) => !b,
            Value::Number(n) => *n == 0.0 || n.is_nan(),
            Value::Str(s) => s.is_empty(),
            Value::Record(_) | Value::Function(_) => false,
        }
    }

    /// Text shown when this value is the end of a path
    ///
    /// `Null` renders empty; records render as compact JSON.
    pub fn render(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            Value::Str(s) => s.clone(),
            Value::Record(record) => record.to_json().to_string(),
            Value::Function(_) => String::new(),
        }
    }

    /// Snapshot as JSON (functions and cycles become null)
    pub fn to_json(&self) -> JsonValue {
        self.to_json_within(&mut Vec::new())
    }

    fn to_json_within(&self, open: &mut Vec<usize>) -> JsonValue {
        match self {
            Value::Null | Value::Function(_) => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 9.0e15 => {
                JsonValue::from(*n as i64)
            }
            Value::Number(n) => Number::from_f64(*n)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Value::Str(s) => JsonValue::String(s.clone()),
            Value::Record(record) => record.to_json_within(open),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Value::Number(n) => f.debug_tuple("Number").field(n).finish(),
            Value::Str(s) => f.debug_tuple("Str").field(s).finish(),
            Value::Record(record) => write!(f, "Record({:#x})", record.id()),
            Value::Function(_) => f.write_str("Function(..)"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Record(record)
    }
}

impl From<JsonValue> for Value {
    fn from(json: JsonValue) -> Self {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(b),
            JsonValue::Number(n) => n.as_f64().map(Value::Number).unwrap_or(Value::Null),
            JsonValue::String(s) => Value::Str(s),
            JsonValue::Array(items) => {
                // Index-keyed so `items.0` resolves like any other field
                let record = Record::new();
                for (index, item) in items.into_iter().enumerate() {
                    record.insert(index.to_string(), Value::from(item));
                }
                Value::Record(record)
            }
            JsonValue::Object(map) => Value::Record(Record::from_map(map)),
        }
    }
}

#[derive(Default)]
struct RecordInner {
    fields: RefCell<IndexMap<String, Value>>,
    interceptors: RefCell<HashMap<String, Notify>>,
}

/// Shared, observable field-name → value record
#[derive(Clone, Default)]
pub struct Record {
    inner: Rc<RecordInner>,
}

/// Non-owning record handle
#[derive(Clone, Default)]
pub struct WeakRecord {
    inner: Weak<RecordInner>,
}

impl WeakRecord {
    pub fn upgrade(&self) -> Option<Record> {
        self.inner.upgrade().map(|inner| Record { inner })
    }

    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}

impl Record {
    /// Create empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from a JSON object (nested objects become records)
    pub fn from_map(map: Map<String, JsonValue>) -> Self {
        let record = Self::new();
        for (key, value) in map {
            record.insert(key, Value::from(value));
        }
        record
    }

    /// Build a record from any JSON value; the root must be an object
    pub fn from_json(json: JsonValue) -> Result<Self> {
        match json {
            JsonValue::Object(map) => Ok(Self::from_map(map)),
            other => Err(StacheError::InvalidContext {
                found: json_kind(&other).to_string(),
            }),
        }
    }

    /// Builder-style insert without notification
    pub fn with(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    /// Store a value without notifying; used while building records
    pub fn insert(&self, field: impl Into<String>, value: impl Into<Value>) {
        self.inner
            .fields
            .borrow_mut()
            .insert(field.into(), value.into());
    }

    /// Read a field (cheap clone: records and functions are shared handles)
    pub fn get(&self, field: &str) -> Option<Value> {
        self.inner.fields.borrow().get(field).cloned()
    }

    /// True when the field holds a value
    pub fn contains(&self, field: &str) -> bool {
        self.inner.fields.borrow().contains_key(field)
    }

    /// Field names in insertion order
    pub fn keys(&self) -> Vec<String> {
        self.inner.fields.borrow().keys().cloned().collect()
    }

    /// Write a field, then run its interceptor (if any)
    ///
    /// Errors raised while notifying (a failing callable during re-render)
    /// are returned to the writer.
    pub fn set(&self, field: &str, value: impl Into<Value>) -> Result<()> {
        self.inner
            .fields
            .borrow_mut()
            .insert(field.to_string(), value.into());

        let notify = self.inner.interceptors.borrow().get(field).cloned();
        match notify {
            Some(notify) => notify(),
            None => Ok(()),
        }
    }

    /// Make a field observable
    ///
    /// Returns `false` (and keeps the existing hook) when the field was
    /// already intercepted on this record.
    pub fn intercept(&self, field: &str, notify: Notify) -> bool {
        let mut interceptors = self.inner.interceptors.borrow_mut();
        if interceptors.contains_key(field) {
            return false;
        }
        interceptors.insert(field.to_string(), notify);
        true
    }

    pub fn is_intercepted(&self, field: &str) -> bool {
        self.inner.interceptors.borrow().contains_key(field)
    }

    /// Identity of this record (stable while it is alive)
    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.inner) as usize
    }

    pub fn ptr_eq(&self, other: &Record) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn downgrade(&self) -> WeakRecord {
        WeakRecord {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Snapshot as a JSON object
    ///
    /// A record already being written further up renders as `null`.
    pub fn to_json(&self) -> JsonValue {
        self.to_json_within(&mut Vec::new())
    }

    fn to_json_within(&self, open: &mut Vec<usize>) -> JsonValue {
        if open.contains(&self.id()) {
            return JsonValue::Null;
        }
        open.push(self.id());
        let map = self
            .inner
            .fields
            .borrow()
            .iter()
            .map(|(key, value)| (key.clone(), value.to_json_within(open)))
            .collect();
        open.pop();
        JsonValue::Object(map)
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.inner.fields.borrow().iter())
            .finish()
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
