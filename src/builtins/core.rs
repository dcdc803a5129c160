// ABOUTME: Flat top-level built-ins: len, tonum, tostr, type, reverse, split, ord, chr

use std::rc::Rc;

use indexmap::IndexMap;

use crate::env::Environment;
use crate::error::RuntimeError;
use crate::value::Value;

fn len(args: &[Value]) -> Result<Value, RuntimeError> {
    let [value] = args else {
        return Err(RuntimeError::arity("len", 1, args.len()));
    };
    let n = match value {
        Value::Array(items) => items.borrow().len(),
        Value::Text(s) => s.chars().count(),
        Value::Object(map) => map.borrow().len(),
        other => return Err(RuntimeError::wrong_type("len", "array, str, or object", other)),
    };
    Ok(Value::Integer(n as i64))
}

/// Tries integer parse, then float; a string that parses as neither is
/// handed back unchanged rather than raising (§A.6, matching the original's
/// `num_fn` fallthrough).
fn tonum(args: &[Value]) -> Result<Value, RuntimeError> {
    let [value] = args else {
        return Err(RuntimeError::arity("tonum", 1, args.len()));
    };
    match value {
        Value::Integer(_) | Value::Float(_) => Ok(value.clone()),
        Value::Text(s) => {
            if let Ok(i) = s.parse::<i64>() {
                Ok(Value::Integer(i))
            } else if let Ok(f) = s.parse::<f64>() {
                Ok(Value::Float(f))
            } else {
                Ok(value.clone())
            }
        }
        other => Err(RuntimeError::wrong_type("tonum", "num or str", other)),
    }
}

fn tostr(args: &[Value]) -> Result<Value, RuntimeError> {
    let [value] = args else {
        return Err(RuntimeError::arity("tostr", 1, args.len()));
    };
    match value {
        Value::Text(_) | Value::Integer(_) | Value::Float(_) => Ok(Value::Text(value.to_string())),
        other => Err(RuntimeError::wrong_type("tostr", "num or str", other)),
    }
}

fn type_of(args: &[Value]) -> Result<Value, RuntimeError> {
    let [value] = args else {
        return Err(RuntimeError::arity("type", 1, args.len()));
    };
    match value.type_tag() {
        Some(tag) => Ok(Value::Text(tag.to_string())),
        None => Err(RuntimeError::builtin("type", "type() requires a string, number, array, or object.")),
    }
}

/// Reverses insertion order for objects, element order for arrays;
/// returns a new value, the argument is left untouched (§A.6).
fn reverse(args: &[Value]) -> Result<Value, RuntimeError> {
    let [value] = args else {
        return Err(RuntimeError::arity("reverse", 1, args.len()));
    };
    match value {
        Value::Array(items) => {
            let mut cloned: Vec<Value> = items.borrow().clone();
            cloned.reverse();
            Ok(Value::array(cloned))
        }
        Value::Object(map) => {
            let reversed: IndexMap<String, Value> =
                map.borrow().iter().rev().map(|(k, v)| (k.clone(), v.clone())).collect();
            Ok(Value::object(reversed))
        }
        other => Err(RuntimeError::wrong_type("reverse", "array or object", other)),
    }
}

/// Splits `text` on newlines first, then splits each line on `sep`,
/// flattening every part into one array (preserved quirk, §A.6).
fn split(args: &[Value]) -> Result<Value, RuntimeError> {
    let [text, sep] = args else {
        return Err(RuntimeError::arity("split", 2, args.len()));
    };
    let (text, sep) = match (text, sep) {
        (Value::Text(t), Value::Text(s)) => (t, s),
        _ => return Err(RuntimeError::wrong_type("split", "str, str", text)),
    };
    let mut parts = Vec::new();
    for line in text.split('\n') {
        for part in line.split(sep.as_str()) {
            parts.push(Value::Text(part.to_string()));
        }
    }
    Ok(Value::array(parts))
}

fn ord(args: &[Value]) -> Result<Value, RuntimeError> {
    let [value] = args else {
        return Err(RuntimeError::arity("ord", 1, args.len()));
    };
    match value {
        Value::Text(s) if s.chars().count() == 1 => {
            Ok(Value::Integer(s.chars().next().unwrap() as i64))
        }
        Value::Text(s) => Err(RuntimeError::builtin(
            "ord",
            format!("expected a single-character string, got length {}", s.chars().count()),
        )),
        other => Err(RuntimeError::wrong_type("ord", "single-character str", other)),
    }
}

fn chr(args: &[Value]) -> Result<Value, RuntimeError> {
    let [value] = args else {
        return Err(RuntimeError::arity("chr", 1, args.len()));
    };
    match value {
        Value::Integer(code) => {
            let c = u32::try_from(*code)
                .ok()
                .and_then(char::from_u32)
                .ok_or_else(|| RuntimeError::builtin("chr", format!("{} is not a valid codepoint", code)))?;
            Ok(Value::Text(c.to_string()))
        }
        other => Err(RuntimeError::wrong_type("chr", "num", other)),
    }
}

pub fn register(env: &Rc<Environment>) {
    env.define("len", Value::native("len", len), false);
    env.define("tonum", Value::native("tonum", tonum), false);
    env.define("tostr", Value::native("tostr", tostr), false);
    env.define("type", Value::native("type", type_of), false);
    env.define("reverse", Value::native("reverse", reverse), false);
    env.define("split", Value::native("split", split), false);
    env.define("ord", Value::native("ord", ord), false);
    env.define("chr", Value::native("chr", chr), false);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn len_counts_array_string_and_object() {
        assert_eq!(len(&[Value::array(vec![Value::Integer(1), Value::Integer(2)])]).unwrap(), Value::Integer(2));
        assert_eq!(len(&[Value::Text("hi".into())]).unwrap(), Value::Integer(2));
    }

    #[test]
    fn tonum_prefers_integer_parse() {
        assert_eq!(tonum(&[Value::Text("42".into())]).unwrap(), Value::Integer(42));
        assert_eq!(tonum(&[Value::Text("4.5".into())]).unwrap(), Value::Float(4.5));
    }

    #[test]
    fn tonum_returns_original_string_on_total_parse_failure() {
        assert_eq!(tonum(&[Value::Text("nope".into())]).unwrap(), Value::Text("nope".into()));
    }

    #[test]
    fn tostr_tonum_round_trip_for_scalars() {
        let n = Value::Integer(42);
        let s = tostr(&[n.clone()]).unwrap();
        assert_eq!(tonum(&[s]).unwrap(), n);
    }

    #[test]
    fn reverse_does_not_mutate_the_array_argument() {
        let original = Value::array(vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)]);
        let reversed = reverse(&[original.clone()]).unwrap();
        if let Value::Array(items) = &reversed {
            assert_eq!(*items.borrow(), vec![Value::Integer(3), Value::Integer(2), Value::Integer(1)]);
        }
        if let Value::Array(items) = &original {
            assert_eq!(*items.borrow(), vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)]);
        }
    }

    #[test]
    fn split_flattens_across_lines() {
        let result = split(&[Value::Text("a,b\nc,d".into()), Value::Text(",".into())]).unwrap();
        if let Value::Array(items) = result {
            let strs: Vec<String> = items.borrow().iter().map(|v| v.to_string()).collect();
            assert_eq!(strs, vec!["a", "b", "c", "d"]);
        }
    }

    #[test]
    fn ord_requires_single_character() {
        assert_eq!(ord(&[Value::Text("a".into())]).unwrap(), Value::Integer(97));
        assert!(ord(&[Value::Text("ab".into())]).is_err());
    }

    #[test]
    fn chr_is_the_inverse_of_ord() {
        assert_eq!(chr(&[Value::Integer(97)]).unwrap(), Value::Text("a".into()));
    }

    #[test]
    fn type_of_folds_booleans_into_num() {
        assert_eq!(type_of(&[Value::Boolean(true)]).unwrap(), Value::Text("num".into()));
        assert_eq!(type_of(&[Value::Integer(1)]).unwrap(), Value::Text("num".into()));
    }

    #[test]
    fn type_of_rejects_nothing_and_functions() {
        assert!(type_of(&[Value::Nothing]).is_err());
        assert!(type_of(&[Value::native("f", |_| Ok(Value::Nothing))]).is_err());
    }
}
