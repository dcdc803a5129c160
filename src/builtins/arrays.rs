// ABOUTME: The `array` namespace: append and pop

use std::rc::Rc;

use indexmap::IndexMap;

use crate::env::Environment;
use crate::error::RuntimeError;
use crate::value::Value;

fn append(args: &[Value]) -> Result<Value, RuntimeError> {
    let [array, value] = args else {
        return Err(RuntimeError::arity("array.append", 2, args.len()));
    };
    match array {
        Value::Array(items) => {
            items.borrow_mut().push(value.clone());
            Ok(Value::Nothing)
        }
        other => Err(RuntimeError::wrong_type("array.append", "array", other)),
    }
}

/// `pop(array)` removes the last element; `pop(array, index)` removes a
/// specific, bounds-checked index (§A.6).
fn pop(args: &[Value]) -> Result<Value, RuntimeError> {
    match args {
        [array] => pop_at(array, None),
        [array, index] => {
            let i = match index {
                Value::Integer(i) => *i,
                other => return Err(RuntimeError::wrong_type("array.pop", "num", other)),
            };
            pop_at(array, Some(i))
        }
        _ => Err(RuntimeError::arity("array.pop", 1, args.len())),
    }
}

fn pop_at(array: &Value, index: Option<i64>) -> Result<Value, RuntimeError> {
    match array {
        Value::Array(items) => {
            let mut items = items.borrow_mut();
            if items.is_empty() {
                return Err(RuntimeError::IndexOutOfBounds { index: 0, len: 0 });
            }
            let i = index.unwrap_or(items.len() as i64 - 1);
            if i < 0 || i as usize >= items.len() {
                return Err(RuntimeError::IndexOutOfBounds { index: i, len: items.len() });
            }
            Ok(items.remove(i as usize))
        }
        other => Err(RuntimeError::wrong_type("array.pop", "array", other)),
    }
}

pub fn register(env: &Rc<Environment>) {
    let mut array = IndexMap::new();
    array.insert("append".to_string(), Value::native("array.append", append));
    array.insert("pop".to_string(), Value::native("array.pop", pop));
    env.define("array", Value::object(array), false);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_then_pop_restores_prior_length() {
        let array = Value::array(vec![Value::Integer(1), Value::Integer(2)]);
        append(&[array.clone(), Value::Integer(3)]).unwrap();
        let popped = pop(&[array.clone()]).unwrap();
        assert_eq!(popped, Value::Integer(3));
        if let Value::Array(items) = &array {
            assert_eq!(items.borrow().len(), 2);
        }
    }

    #[test]
    fn pop_with_explicit_index_is_bounds_checked() {
        let array = Value::array(vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)]);
        let popped = pop(&[array.clone(), Value::Integer(0)]).unwrap();
        assert_eq!(popped, Value::Integer(1));
        assert!(pop(&[array, Value::Integer(99)]).is_err());
    }
}
