// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Script values and the shared exports container.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Signature of a host function callable from scripts.
pub type NativeFn = dyn Fn(&[Value]) -> Result<Value, String> + Send + Sync;

/// A script value.
///
/// Module objects are shared, never copied: cloning a [`Value::Module`]
/// clones the handle, not the exports behind it.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Absence of a value
    #[default]
    Nil,
    /// Boolean value
    Bool(bool),
    /// Number (IEEE 754 double)
    Number(f64),
    /// String
    String(String),
    /// Ordered list
    List(Vec<Value>),
    /// A module's exports object
    Module(Exports),
    /// Host function
    Function(NativeFunction),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Module(a), Value::Module(b)) => a.ptr_eq(b),
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl Value {
    /// Returns true if this value is nil.
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Borrow the string contents, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the exports handle, if this is a module object.
    pub fn as_module(&self) -> Option<&Exports> {
        match self {
            Value::Module(exports) => Some(exports),
            _ => None,
        }
    }

    /// Truthiness used by `assert`.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Bool(b) => *b,
            Value::Number(n) => !n.is_nan() && *n != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::List(_) | Value::Module(_) | Value::Function(_) => true,
        }
    }

    /// Returns the type of this value as a string.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Module(_) => "module",
            Value::Function(_) => "function",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Module(exports) => {
                write!(f, "[module {{{}}}]", exports.keys().join(", "))
            }
            Value::Function(func) => write!(f, "[Function: {} (native)]", func.name()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<NativeFunction> for Value {
    fn from(func: NativeFunction) -> Self {
        Value::Function(func)
    }
}

impl From<Exports> for Value {
    fn from(exports: Exports) -> Self {
        Value::Module(exports)
    }
}

/// A named host function.
#[derive(Clone)]
pub struct NativeFunction {
    name: Arc<str>,
    func: Arc<NativeFn>,
}

impl NativeFunction {
    /// Wrap a closure as a script-callable function.
    pub fn new<F>(name: &str, func: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, String> + Send + Sync + 'static,
    {
        Self {
            name: Arc::from(name),
            func: Arc::new(func),
        }
    }

    /// Function name, for diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invoke the function.
    pub fn call(&self, args: &[Value]) -> Result<Value, String> {
        (self.func)(args)
    }

    /// Whether both handles point at the same function.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.func, &other.func)
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction").field("name", &self.name).finish()
    }
}

/// The mutable object a module populates to expose its public surface.
///
/// Cloning yields another handle to the same container; identity is
/// compared with [`Exports::ptr_eq`].
#[derive(Clone, Default)]
pub struct Exports(Arc<RwLock<BTreeMap<String, Value>>>);

impl Exports {
    /// Create an empty exports object.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a property.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.0.read().get(key).cloned()
    }

    /// Write a property, returning the previous value.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.write().insert(key.into(), value.into())
    }

    /// Remove a property.
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.0.write().remove(key)
    }

    /// Check whether a property is present.
    pub fn contains(&self, key: &str) -> bool {
        self.0.read().contains_key(key)
    }

    /// Property names in sorted order.
    pub fn keys(&self) -> Vec<String> {
        self.0.read().keys().cloned().collect()
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    /// Whether no property has been set.
    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }

    /// Copy of the current properties.
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        self.0.read().clone()
    }

    /// Whether both handles point at the same container.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

// Only keys are printed: exports may reference each other cyclically.
impl fmt::Debug for Exports {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Exports").field("keys", &self.keys()).finish()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Exports {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let exports = Exports::new();
        for (key, value) in iter {
            exports.set(key, value);
        }
        exports
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exports_are_shared_between_clones() {
        let a = Exports::new();
        let b = a.clone();
        b.set("answer", 42.0);
        assert_eq!(a.get("answer"), Some(Value::Number(42.0)));
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&Exports::new()));
    }

    #[test]
    fn test_module_values_compare_by_identity() {
        let a = Exports::new();
        let b = Exports::new();
        assert_eq!(Value::Module(a.clone()), Value::Module(a));
        assert_ne!(Value::Module(b), Value::Module(Exports::new()));
    }

    #[test]
    fn test_cyclic_exports_debug_terminates() {
        let a = Exports::new();
        let b = Exports::new();
        a.set("b", b.clone());
        b.set("a", a.clone());
        assert_eq!(format!("{:?}", a), "Exports { keys: [\"b\"] }");
        assert_eq!(Value::Module(a).to_string(), "[module {b}]");
    }

    #[test]
    fn test_native_function_call() {
        let double = NativeFunction::new("double", |args| match args.first() {
            Some(Value::Number(n)) => Ok(Value::Number(n * 2.0)),
            _ => Err("expected a number".to_string()),
        });
        assert_eq!(double.call(&[Value::Number(4.0)]), Ok(Value::Number(8.0)));
        assert!(double.call(&[]).is_err());
        assert_eq!(Value::Function(double).to_string(), "[Function: double (native)]");
    }
}
