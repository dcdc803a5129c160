// ABOUTME: The `math` namespace: trig, exponentials, rounding, and random

use std::rc::Rc;

use indexmap::IndexMap;
use rand::Rng;

use crate::env::Environment;
use crate::error::RuntimeError;
use crate::value::Value;

fn as_f64(value: &Value, function: &str) -> Result<f64, RuntimeError> {
    match value {
        Value::Integer(i) => Ok(*i as f64),
        Value::Float(f) => Ok(*f),
        other => Err(RuntimeError::wrong_type(function, "num", other)),
    }
}

fn unary_fn(name: &'static str, f: fn(f64) -> f64) -> impl Fn(&[Value]) -> Result<Value, RuntimeError> {
    move |args: &[Value]| {
        let [value] = args else {
            return Err(RuntimeError::arity(name, 1, args.len()));
        };
        Ok(Value::Float(f(as_f64(value, name)?)))
    }
}

macro_rules! native_unary {
    ($name:literal, $f:expr) => {{
        fn wrapper(args: &[Value]) -> Result<Value, RuntimeError> {
            unary_fn($name, $f)(args)
        }
        wrapper
    }};
}

fn pow(args: &[Value]) -> Result<Value, RuntimeError> {
    let [base, exp] = args else {
        return Err(RuntimeError::arity("math.pow", 2, args.len()));
    };
    Ok(Value::Float(as_f64(base, "math.pow")?.powf(as_f64(exp, "math.pow")?)))
}

fn floor(args: &[Value]) -> Result<Value, RuntimeError> {
    let [value] = args else {
        return Err(RuntimeError::arity("math.floor", 1, args.len()));
    };
    Ok(Value::Integer(as_f64(value, "math.floor")?.floor() as i64))
}

fn ceil(args: &[Value]) -> Result<Value, RuntimeError> {
    let [value] = args else {
        return Err(RuntimeError::arity("math.ceil", 1, args.len()));
    };
    Ok(Value::Integer(as_f64(value, "math.ceil")?.ceil() as i64))
}

fn abs(args: &[Value]) -> Result<Value, RuntimeError> {
    let [value] = args else {
        return Err(RuntimeError::arity("math.abs", 1, args.len()));
    };
    match value {
        Value::Integer(i) => Ok(Value::Integer(i.abs())),
        Value::Float(f) => Ok(Value::Float(f.abs())),
        other => Err(RuntimeError::wrong_type("math.abs", "num", other)),
    }
}

fn randint(args: &[Value]) -> Result<Value, RuntimeError> {
    let [lo, hi] = args else {
        return Err(RuntimeError::arity("math.random.randint", 2, args.len()));
    };
    let lo = match lo {
        Value::Integer(i) => *i,
        other => return Err(RuntimeError::wrong_type("math.random.randint", "num", other)),
    };
    let hi = match hi {
        Value::Integer(i) => *i,
        other => return Err(RuntimeError::wrong_type("math.random.randint", "num", other)),
    };
    if lo > hi {
        return Err(RuntimeError::builtin("math.random.randint", "lower bound exceeds upper bound"));
    }
    Ok(Value::Integer(rand::thread_rng().gen_range(lo..=hi)))
}

fn uniform(args: &[Value]) -> Result<Value, RuntimeError> {
    let [lo, hi] = args else {
        return Err(RuntimeError::arity("math.random.uniform", 2, args.len()));
    };
    let lo = as_f64(lo, "math.random.uniform")?;
    let hi = as_f64(hi, "math.random.uniform")?;
    if lo > hi {
        return Err(RuntimeError::builtin("math.random.uniform", "lower bound exceeds upper bound"));
    }
    Ok(Value::Float(rand::thread_rng().gen_range(lo..=hi)))
}

pub fn register(env: &Rc<Environment>) {
    let mut math = IndexMap::new();
    math.insert("sin".to_string(), Value::native("math.sin", native_unary!("math.sin", f64::sin)));
    math.insert("cos".to_string(), Value::native("math.cos", native_unary!("math.cos", f64::cos)));
    math.insert("tan".to_string(), Value::native("math.tan", native_unary!("math.tan", f64::tan)));
    math.insert("asin".to_string(), Value::native("math.asin", native_unary!("math.asin", f64::asin)));
    math.insert("acos".to_string(), Value::native("math.acos", native_unary!("math.acos", f64::acos)));
    math.insert("atan".to_string(), Value::native("math.atan", native_unary!("math.atan", f64::atan)));
    math.insert("exp".to_string(), Value::native("math.exp", native_unary!("math.exp", f64::exp)));
    math.insert(
        "radians".to_string(),
        Value::native("math.radians", native_unary!("math.radians", f64::to_radians)),
    );
    math.insert("sqrt".to_string(), Value::native("math.sqrt", native_unary!("math.sqrt", f64::sqrt)));
    math.insert("floor".to_string(), Value::native("math.floor", floor));
    math.insert("ceil".to_string(), Value::native("math.ceil", ceil));
    math.insert("abs".to_string(), Value::native("math.abs", abs));
    math.insert("pow".to_string(), Value::native("math.pow", pow));

    let mut random = IndexMap::new();
    random.insert("randint".to_string(), Value::native("math.random.randint", randint));
    random.insert("uniform".to_string(), Value::native("math.random.uniform", uniform));
    math.insert("random".to_string(), Value::object(random));

    env.define("math", Value::object(math), false);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_and_ceil_return_integers() {
        assert_eq!(floor(&[Value::Float(1.7)]).unwrap(), Value::Integer(1));
        assert_eq!(ceil(&[Value::Float(1.2)]).unwrap(), Value::Integer(2));
    }

    #[test]
    fn abs_preserves_numeric_kind() {
        assert_eq!(abs(&[Value::Integer(-5)]).unwrap(), Value::Integer(5));
        assert_eq!(abs(&[Value::Float(-5.5)]).unwrap(), Value::Float(5.5));
    }

    #[test]
    fn pow_computes_exponentiation() {
        assert_eq!(pow(&[Value::Integer(2), Value::Integer(10)]).unwrap(), Value::Float(1024.0));
    }

    #[test]
    fn randint_stays_within_bounds() {
        for _ in 0..20 {
            match randint(&[Value::Integer(1), Value::Integer(3)]).unwrap() {
                Value::Integer(n) => assert!((1..=3).contains(&n)),
                _ => panic!("expected integer"),
            }
        }
    }
}
