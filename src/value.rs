// ABOUTME: Runtime value types for the interpreter

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::ast::StmtRef;
use crate::env::Environment;
use crate::error::RuntimeError;
use crate::token::Token;

pub type NativeFn = fn(&[Value]) -> Result<Value, RuntimeError>;

#[derive(Clone)]
pub enum Value {
    Nothing,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Array(Rc<RefCell<Vec<Value>>>),
    Object(Rc<RefCell<IndexMap<String, Value>>>),
    Function {
        name: String,
        params: Rc<Vec<Token>>,
        body: Rc<Vec<StmtRef>>,
        closure: Rc<Environment>,
    },
    Lambda {
        params: Rc<Vec<Token>>,
        body: Rc<Vec<StmtRef>>,
        closure: Rc<Environment>,
    },
    Native {
        name: String,
        func: NativeFn,
    },
}

impl Value {
    pub fn array(items: Vec<Value>) -> Value {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    pub fn object(entries: IndexMap<String, Value>) -> Value {
        Value::Object(Rc::new(RefCell::new(entries)))
    }

    pub fn native(name: impl Into<String>, func: NativeFn) -> Value {
        Value::Native { name: name.into(), func }
    }

    /// `Nothing`, `false`, and numeric zero are falsy; everything else is
    /// truthy (§3 invariant).
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nothing => false,
            Value::Boolean(b) => *b,
            Value::Integer(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            _ => true,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nothing => "nothing",
            Value::Boolean(_) => "bool",
            Value::Integer(_) => "num",
            Value::Float(_) => "num",
            Value::Text(_) => "str",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Function { .. } | Value::Lambda { .. } | Value::Native { .. } => "function",
        }
    }

    /// The name surfaced by the built-in `type()` function (§4.3), or
    /// `None` when `type()` has no tag for this value at all (§A.6,
    /// matching the original's `type_fn`, which only recognizes
    /// str/num/array/object and folds `bool` into `num` the same way its
    /// host language treats booleans as integers).
    pub fn type_tag(&self) -> Option<&'static str> {
        match self {
            Value::Text(_) => Some("str"),
            Value::Integer(_) | Value::Float(_) | Value::Boolean(_) => Some("num"),
            Value::Array(_) => Some("array"),
            Value::Object(_) => Some("object"),
            Value::Nothing | Value::Function { .. } | Value::Lambda { .. } | Value::Native { .. } => None,
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Function { .. } | Value::Lambda { .. } | Value::Native { .. })
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nothing => write!(f, "nothing"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(n) => {
                if n.fract() == 0.0 && n.is_finite() {
                    write!(f, "{:.1}", n)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::Text(s) => write!(f, "{}", s),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Object(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
            Value::Function { name, .. } => write!(f, "<func {}>", name),
            Value::Lambda { .. } => write!(f, "<lambda>"),
            Value::Native { name, .. } => write!(f, "<native {}>", name),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl PartialEq for Value {
    /// `Nothing` equals only `Nothing`; primitives compare structurally;
    /// arrays and objects compare by identity (§3 invariant).
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nothing, Value::Nothing) => true,
            (Value::Nothing, _) | (_, Value::Nothing) => false,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Integer(a), Value::Float(b)) | (Value::Float(b), Value::Integer(a)) => {
                *a as f64 == *b
            }
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Function { closure: a, .. }, Value::Function { closure: b, .. }) => {
                Rc::ptr_eq(a, b)
            }
            (Value::Lambda { closure: a, .. }, Value::Lambda { closure: b, .. }) => {
                Rc::ptr_eq(a, b)
            }
            (Value::Native { name: a, .. }, Value::Native { name: b, .. }) => a == b,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness_matches_the_table() {
        assert!(!Value::Nothing.is_truthy());
        assert!(!Value::Boolean(false).is_truthy());
        assert!(!Value::Integer(0).is_truthy());
        assert!(!Value::Float(0.0).is_truthy());
        assert!(Value::Integer(1).is_truthy());
        assert!(Value::Text(String::new()).is_truthy());
    }

    #[test]
    fn whole_floats_display_with_trailing_point() {
        assert_eq!(format!("{}", Value::Float(42.0)), "42.0");
        assert_eq!(format!("{}", Value::Float(2.5)), "2.5");
    }

    #[test]
    fn nothing_equals_only_nothing() {
        assert_eq!(Value::Nothing, Value::Nothing);
        assert_ne!(Value::Nothing, Value::Boolean(false));
        assert_ne!(Value::Nothing, Value::Integer(0));
    }

    #[test]
    fn arrays_compare_by_identity() {
        let a = Value::array(vec![Value::Integer(1)]);
        let b = Value::array(vec![Value::Integer(1)]);
        assert_ne!(a, b);
        assert_eq!(a.clone(), a);
    }
}
