//! Argument value model.
//!
//! Tool-call arguments arrive as loosely typed data that a host may have
//! assembled from several sources. [`ArgValue`] models that data with the
//! shapes the canonical serializer has to cope with: absent values, opaque
//! callables, and composite nodes that can be shared or even point back at
//! themselves.
//!
//! Composite nodes ([`ArgObject`], [`ArgArray`]) are reference-counted and
//! interior-mutable. Cloning one clones the *handle*, so two clones are the
//! same node by identity. That is what lets a structure contain a diamond
//! (one node reachable along two paths) or a true cycle.

use parking_lot::RwLock;
use serde::{Deserialize, Deserializer};
use serde_json::Number;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Error type returned by a failing [`ToJsonHook`].
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// Custom conversion attached to an [`ArgObject`].
///
/// When present, the serializer calls the hook and serializes its result
/// instead of the object's own entries. If the hook fails, the object is
/// serialized as a plain object.
///
/// A hooked object fully controls its own matching surface, so hooks should
/// only be attached by host code. Values converted from JSON never carry one.
pub trait ToJsonHook: Send + Sync {
    /// Produce the value to serialize in place of the object.
    fn to_json(&self) -> Result<ArgValue, HookError>;
}

impl<F> ToJsonHook for F
where
    F: Fn() -> Result<ArgValue, HookError> + Send + Sync,
{
    fn to_json(&self) -> Result<ArgValue, HookError> {
        self()
    }
}

/// A structured tool-call argument value.
#[derive(Debug, Clone, Default)]
pub enum ArgValue {
    /// An absent value (a key that exists but holds nothing).
    #[default]
    Undefined,
    /// An explicit null.
    Null,
    /// A boolean.
    Bool(bool),
    /// A finite number.
    Number(Number),
    /// A string.
    String(String),
    /// An opaque callable member. Carries no data.
    Function,
    /// A shared, ordered sequence.
    Array(ArgArray),
    /// A shared, insertion-ordered mapping.
    Object(ArgObject),
}

impl ArgValue {
    /// Build a number value from a float. Non-finite floats become `Null`.
    pub fn from_f64(value: f64) -> Self {
        Number::from_f64(value).map_or(ArgValue::Null, ArgValue::Number)
    }

    /// Returns true for values that are dropped from object output
    /// (`Undefined` and `Function`).
    pub fn is_omitted(&self) -> bool {
        matches!(self, ArgValue::Undefined | ArgValue::Function)
    }

    /// Returns true for `Array` and `Object`.
    pub fn is_composite(&self) -> bool {
        matches!(self, ArgValue::Array(_) | ArgValue::Object(_))
    }

    /// Borrow the object handle, if this is an object.
    pub fn as_object(&self) -> Option<&ArgObject> {
        match self {
            ArgValue::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Borrow the array handle, if this is an array.
    pub fn as_array(&self) -> Option<&ArgArray> {
        match self {
            ArgValue::Array(array) => Some(array),
            _ => None,
        }
    }

    /// Borrow the string contents, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ArgValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for ArgValue {
    fn from(value: bool) -> Self {
        ArgValue::Bool(value)
    }
}

impl From<i32> for ArgValue {
    fn from(value: i32) -> Self {
        ArgValue::Number(value.into())
    }
}

impl From<i64> for ArgValue {
    fn from(value: i64) -> Self {
        ArgValue::Number(value.into())
    }
}

impl From<u64> for ArgValue {
    fn from(value: u64) -> Self {
        ArgValue::Number(value.into())
    }
}

impl From<f64> for ArgValue {
    fn from(value: f64) -> Self {
        ArgValue::from_f64(value)
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        ArgValue::String(value.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(value: String) -> Self {
        ArgValue::String(value)
    }
}

impl From<ArgObject> for ArgValue {
    fn from(value: ArgObject) -> Self {
        ArgValue::Object(value)
    }
}

impl From<ArgArray> for ArgValue {
    fn from(value: ArgArray) -> Self {
        ArgValue::Array(value)
    }
}

impl From<serde_json::Value> for ArgValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => ArgValue::Null,
            Value::Bool(b) => ArgValue::Bool(b),
            Value::Number(n) => ArgValue::Number(n),
            Value::String(s) => ArgValue::String(s),
            Value::Array(items) => {
                ArgValue::Array(items.into_iter().map(ArgValue::from).collect())
            }
            // Map keys are already unique.
            Value::Object(map) => ArgValue::Object(ArgObject::from_unique_entries(
                map.into_iter()
                    .map(|(k, v)| (k, ArgValue::from(v)))
                    .collect(),
            )),
        }
    }
}

impl<'de> Deserialize<'de> for ArgValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        serde_json::Value::deserialize(deserializer).map(ArgValue::from)
    }
}

/// Identity of a composite node, stable for as long as the node is alive.
pub(crate) type NodeId = usize;

struct ObjectNode {
    entries: Vec<(String, ArgValue)>,
    hook: Option<Arc<dyn ToJsonHook>>,
}

/// Shared handle to an insertion-ordered mapping.
///
/// Clones share the same node. Mutation goes through `&self`.
#[derive(Clone)]
pub struct ArgObject(Arc<RwLock<ObjectNode>>);

impl ArgObject {
    /// Create an empty object without a hook.
    pub fn new() -> Self {
        Self(Arc::new(RwLock::new(ObjectNode {
            entries: Vec::new(),
            hook: None,
        })))
    }

    fn from_unique_entries(entries: Vec<(String, ArgValue)>) -> Self {
        Self(Arc::new(RwLock::new(ObjectNode {
            entries,
            hook: None,
        })))
    }

    /// Attach a to-JSON hook (builder form).
    pub fn with_to_json(self, hook: impl ToJsonHook + 'static) -> Self {
        self.set_to_json(hook);
        self
    }

    /// Attach or replace the to-JSON hook.
    pub fn set_to_json(&self, hook: impl ToJsonHook + 'static) {
        self.0.write().hook = Some(Arc::new(hook));
    }

    /// The attached hook, if any.
    pub fn to_json_hook(&self) -> Option<Arc<dyn ToJsonHook>> {
        self.0.read().hook.clone()
    }

    /// Insert a value. An existing key keeps its position and the previous
    /// value is returned.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<ArgValue>) -> Option<ArgValue> {
        let key = key.into();
        let value = value.into();
        let mut node = self.0.write();
        match node.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                node.entries.push((key, value));
                None
            }
        }
    }

    /// Remove a key, returning its value.
    pub fn remove(&self, key: &str) -> Option<ArgValue> {
        let mut node = self.0.write();
        let index = node.entries.iter().position(|(k, _)| k == key)?;
        Some(node.entries.remove(index).1)
    }

    /// Look up a key.
    pub fn get(&self, key: &str) -> Option<ArgValue> {
        self.0
            .read()
            .entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    pub fn len(&self) -> usize {
        self.0.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.read().entries.is_empty()
    }

    /// Snapshot of the entries in insertion order.
    ///
    /// Composite values in the snapshot are handles, so this is shallow.
    pub fn entries(&self) -> Vec<(String, ArgValue)> {
        self.0.read().entries.clone()
    }

    /// Whether two handles refer to the same node.
    pub fn ptr_eq(&self, other: &ArgObject) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn id(&self) -> NodeId {
        Arc::as_ptr(&self.0) as *const () as usize
    }
}

impl Default for ArgObject {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> FromIterator<(K, V)> for ArgObject
where
    K: Into<String>,
    V: Into<ArgValue>,
{
    /// A repeated key keeps its first position and takes the last value,
    /// as with [`ArgObject::insert`].
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut entries: Vec<(String, ArgValue)> = Vec::new();
        for (key, value) in iter {
            let value = value.into();
            match index.entry(key.into()) {
                Entry::Occupied(slot) => entries[*slot.get()].1 = value,
                Entry::Vacant(slot) => {
                    entries.push((slot.key().clone(), value));
                    slot.insert(entries.len() - 1);
                }
            }
        }
        Self::from_unique_entries(entries)
    }
}

// Never recurse: the node may be part of a cycle.
impl fmt::Debug for ArgObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = self.0.read();
        f.debug_struct("ArgObject")
            .field("node", &format_args!("{:#x}", self.id()))
            .field("len", &node.entries.len())
            .field("hook", &node.hook.is_some())
            .finish()
    }
}

/// Shared handle to an ordered sequence.
///
/// Clones share the same node. Mutation goes through `&self`.
#[derive(Clone)]
pub struct ArgArray(Arc<RwLock<Vec<ArgValue>>>);

impl ArgArray {
    pub fn new() -> Self {
        Self(Arc::new(RwLock::new(Vec::new())))
    }

    /// Append a value.
    pub fn push(&self, value: impl Into<ArgValue>) {
        self.0.write().push(value.into());
    }

    /// Replace the value at `index`. Returns false if out of bounds.
    pub fn set(&self, index: usize, value: impl Into<ArgValue>) -> bool {
        match self.0.write().get_mut(index) {
            Some(slot) => {
                *slot = value.into();
                true
            }
            None => false,
        }
    }

    pub fn get(&self, index: usize) -> Option<ArgValue> {
        self.0.read().get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }

    /// Shallow snapshot of the items.
    pub fn items(&self) -> Vec<ArgValue> {
        self.0.read().clone()
    }

    /// Whether two handles refer to the same node.
    pub fn ptr_eq(&self, other: &ArgArray) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn id(&self) -> NodeId {
        Arc::as_ptr(&self.0) as *const () as usize
    }
}

impl Default for ArgArray {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Into<ArgValue>> FromIterator<V> for ArgArray {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Self(Arc::new(RwLock::new(iter.into_iter().map(Into::into).collect())))
    }
}

impl fmt::Debug for ArgArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgArray")
            .field("node", &format_args!("{:#x}", self.id()))
            .field("len", &self.len())
            .finish()
    }
}
