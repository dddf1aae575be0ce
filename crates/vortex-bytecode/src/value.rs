//! Runtime value representation
//!
//! A Vortex value is a closed tagged variant over exactly four cases.
//! Values are plain 16-byte copies; the `Object` case carries a non-owning
//! [`ObjectRef`] into the owning program's heap arena, never the object
//! itself.

use crate::heap::{Heap, ObjectRef};

/// Tagged runtime value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    /// IEEE-754 double
    Double(f64),
    /// Boolean
    Bool(bool),
    /// Absence of a value
    Nil,
    /// Handle to a heap object owned by the program
    Object(ObjectRef),
}

impl Value {
    /// Check if value is truthy (for logical negation and conditionals)
    ///
    /// `Bool` uses its own value, `Nil` is false, every other variant
    /// (including `Double(0.0)`) is true.
    #[inline]
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Nil => false,
            _ => true,
        }
    }

    /// Extract the double, if this value is one
    #[inline]
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Double(d) => Some(*d),
            _ => None,
        }
    }

    /// Extract the object handle, if this value is one
    #[inline]
    pub fn as_object(&self) -> Option<ObjectRef> {
        match self {
            Value::Object(obj) => Some(*obj),
            _ => None,
        }
    }

    /// Get type name for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Double(_) => "double",
            Value::Bool(_) => "bool",
            Value::Nil => "nil",
            Value::Object(_) => "object",
        }
    }

    /// Render the value as display text
    ///
    /// Doubles use standard decimal formatting, booleans render as
    /// `true`/`false`, nil as `nil`, and strings wrapped in double quotes.
    /// Needs the heap because `Object` values only hold a handle.
    pub fn display_text(&self, heap: &Heap) -> String {
        match self {
            Value::Double(d) => format!("{}", d),
            Value::Bool(b) => format!("{}", b),
            Value::Nil => "nil".to_string(),
            Value::Object(obj) => match heap.str_contents(*obj) {
                Some(s) => format!("\"{}\"", s),
                None => "<object>".to_string(),
            },
        }
    }
}
