// ABOUTME: Tree-walking evaluator executing the AST against an environment

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::ast::{Expr, Literal, Stmt, StmtRef};
use crate::config::MODULE_EXTENSION;
use crate::env::Environment;
use crate::error::{Flow, RuntimeError, Unwind};
use crate::token::Token;
use crate::token::TokenKind;
use crate::value::Value;

/// Executes every top-level statement of a file against one shared
/// environment. `return`/`break`/`continue` escaping all the way to the
/// top level are themselves runtime errors (§7).
pub fn eval_program(stmts: &[StmtRef], env: &Rc<Environment>) -> Result<(), RuntimeError> {
    for stmt in stmts {
        eval_statement(stmt, env)?;
    }
    Ok(())
}

/// Executes a single top-level statement and surfaces its value, for the
/// REPL driver to print when truthy.
pub fn eval_statement(stmt: &Stmt, env: &Rc<Environment>) -> Result<Value, RuntimeError> {
    match execute(stmt, env) {
        Ok(value) => Ok(value),
        Err(Unwind::Error(err)) => Err(err),
        Err(Unwind::Return(_)) => Err(RuntimeError::builtin("return", "cannot return from top level")),
        Err(Unwind::Break) => Err(RuntimeError::builtin("break", "cannot break outside a loop")),
        Err(Unwind::Continue) => Err(RuntimeError::builtin("continue", "cannot continue outside a loop")),
    }
}

fn execute(stmt: &Stmt, env: &Rc<Environment>) -> Flow<Value> {
    match stmt {
        Stmt::Expression(expr) => evaluate(expr, env),

        Stmt::Var { name, is_const, initializer } => {
            let value = match initializer {
                Some(expr) => evaluate(expr, env)?,
                None => Value::Nothing,
            };
            env.define(name.lexeme.clone(), value, *is_const);
            Ok(Value::Nothing)
        }

        Stmt::Block(stmts) => {
            let inner = Environment::with_parent(env.clone());
            execute_block(stmts, &inner)
        }

        Stmt::If { condition, then_branch, elseifs, else_branch } => {
            if evaluate(condition, env)?.is_truthy() {
                return execute(then_branch, env);
            }
            for (cond, branch) in elseifs {
                if evaluate(cond, env)?.is_truthy() {
                    return execute(branch, env);
                }
            }
            if let Some(branch) = else_branch {
                return execute(branch, env);
            }
            Ok(Value::Nothing)
        }

        Stmt::While { condition, body } => {
            while evaluate(condition, env)?.is_truthy() {
                match execute(body, env) {
                    Ok(_) => {}
                    Err(Unwind::Break) => break,
                    Err(Unwind::Continue) => continue,
                    Err(other) => return Err(other),
                }
            }
            Ok(Value::Nothing)
        }

        Stmt::For { init, condition, increment, body } => {
            let loop_env = Environment::with_parent(env.clone());
            if let Some(init_stmt) = init {
                execute(init_stmt, &loop_env)?;
            }
            loop {
                if let Some(cond) = condition {
                    if !evaluate(cond, &loop_env)?.is_truthy() {
                        break;
                    }
                }
                match execute(body, &loop_env) {
                    Ok(_) => {}
                    Err(Unwind::Break) => break,
                    Err(Unwind::Continue) => {}
                    Err(other) => return Err(other),
                }
                if let Some(incr) = increment {
                    evaluate(incr, &loop_env)?;
                }
            }
            Ok(Value::Nothing)
        }

        Stmt::Function { name, params, body } => {
            let func = Value::Function {
                name: name.lexeme.clone(),
                params: Rc::new(params.clone()),
                body: Rc::new(body.clone()),
                closure: env.clone(),
            };
            env.define(name.lexeme.clone(), func, false);
            Ok(Value::Nothing)
        }

        Stmt::Return { value, .. } => {
            let result = match value {
                Some(expr) => evaluate(expr, env)?,
                None => Value::Nothing,
            };
            Err(Unwind::Return(result))
        }

        Stmt::Break(_) => Err(Unwind::Break),
        Stmt::Continue(_) => Err(Unwind::Continue),

        Stmt::Import { module, .. } => {
            import_module(module, env)?;
            Ok(Value::Nothing)
        }
    }
}

fn execute_block(stmts: &[StmtRef], env: &Rc<Environment>) -> Flow<Value> {
    let mut result = Value::Nothing;
    for stmt in stmts {
        result = execute(stmt, env)?;
    }
    Ok(result)
}

fn evaluate(expr: &Expr, env: &Rc<Environment>) -> Flow<Value> {
    match expr {
        Expr::Literal(lit) => Ok(literal_value(lit)),

        Expr::Variable(name) => env
            .get(&name.lexeme)
            .ok_or_else(|| RuntimeError::UndefinedVariable(name.lexeme.clone()).into()),

        Expr::Grouping(inner) => evaluate(inner, env),

        Expr::Unary { op, right } => {
            let value = evaluate(right, env)?;
            match op.kind {
                TokenKind::Minus => match value {
                    Value::Integer(i) => Ok(Value::Integer(-i)),
                    Value::Float(f) => Ok(Value::Float(-f)),
                    other => Err(RuntimeError::wrong_type("unary -", "num", &other).into()),
                },
                TokenKind::Bang => Ok(Value::Boolean(!value.is_truthy())),
                _ => unreachable!("parser only emits ! and - as unary operators"),
            }
        }

        Expr::Binary { left, op, right } => {
            let l = evaluate(left, env)?;
            let r = evaluate(right, env)?;
            binary_op(op, l, r)
        }

        Expr::Logical { left, op, right } => {
            let l = evaluate(left, env)?;
            match op.kind {
                TokenKind::Or => {
                    if l.is_truthy() {
                        Ok(l)
                    } else {
                        evaluate(right, env)
                    }
                }
                TokenKind::And => {
                    if !l.is_truthy() {
                        Ok(l)
                    } else {
                        evaluate(right, env)
                    }
                }
                _ => unreachable!("parser only emits and/or as logical operators"),
            }
        }

        Expr::Assign { name, value } => {
            let v = evaluate(value, env)?;
            env.assign(&name.lexeme, v.clone())?;
            Ok(v)
        }

        Expr::Call { callee, paren, args } => {
            let callee_value = evaluate(callee, env)?;
            let mut arg_values = Vec::with_capacity(args.len());
            for arg in args {
                arg_values.push(evaluate(arg, env)?);
            }
            call_value(&callee_value, &arg_values, paren)
        }

        Expr::Get { object, name } => {
            let object = evaluate(object, env)?;
            get_property(&object, &name.lexeme)
        }

        Expr::Set { object, name, value } => {
            let object = evaluate(object, env)?;
            let value = evaluate(value, env)?;
            set_property(&object, &name.lexeme, value.clone())?;
            Ok(value)
        }

        Expr::Index { object, bracket, index } => {
            let object = evaluate(object, env)?;
            let index = evaluate(index, env)?;
            index_value(&object, &index, bracket)
        }

        Expr::SetIndex { object, bracket, index, value } => {
            let object = evaluate(object, env)?;
            let index = evaluate(index, env)?;
            let value = evaluate(value, env)?;
            set_index_value(&object, &index, value.clone(), bracket)?;
            Ok(value)
        }

        Expr::ArrayLiteral { elements, .. } => {
            let mut items = Vec::with_capacity(elements.len());
            for e in elements {
                items.push(evaluate(e, env)?);
            }
            Ok(Value::array(items))
        }

        Expr::ObjectLiteral { entries, .. } => {
            let mut map = IndexMap::with_capacity(entries.len());
            for (key, value) in entries {
                map.insert(key.lexeme.clone(), evaluate(value, env)?);
            }
            Ok(Value::object(map))
        }

        Expr::Lambda { params, body } => Ok(Value::Lambda {
            params: Rc::new(params.clone()),
            body: Rc::new(body.clone()),
            closure: env.clone(),
        }),
    }
}

fn literal_value(lit: &Literal) -> Value {
    match lit {
        Literal::Integer(i) => Value::Integer(*i),
        Literal::Float(f) => Value::Float(*f),
        Literal::String(s) => Value::Text(s.clone()),
        Literal::Boolean(b) => Value::Boolean(*b),
        Literal::Nothing => Value::Nothing,
    }
}

fn call_value(callee: &Value, args: &[Value], paren: &Token) -> Flow<Value> {
    let _ = paren;
    match callee {
        Value::Function { name, params, body, closure } => {
            if params.len() != args.len() {
                return Err(RuntimeError::arity(name.clone(), params.len(), args.len()).into());
            }
            let call_env = Environment::with_parent(closure.clone());
            for (param, arg) in params.iter().zip(args) {
                call_env.define(param.lexeme.clone(), arg.clone(), false);
            }
            match execute_block(body, &call_env) {
                Ok(_) => Ok(Value::Nothing),
                Err(Unwind::Return(value)) => Ok(value),
                Err(other) => Err(other),
            }
        }

        Value::Lambda { params, body, closure } => {
            if params.len() != args.len() {
                return Err(RuntimeError::arity("<lambda>", params.len(), args.len()).into());
            }
            let call_env = Environment::with_parent(closure.clone());
            for (param, arg) in params.iter().zip(args) {
                call_env.define(param.lexeme.clone(), arg.clone(), false);
            }
            match execute_block(body, &call_env) {
                Ok(value) => Ok(value),
                Err(Unwind::Return(value)) => Ok(value),
                Err(other) => Err(other),
            }
        }

        Value::Native { func, .. } => func(args).map_err(Unwind::Error),

        other => Err(RuntimeError::NotCallable(other.to_string()).into()),
    }
}

enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn as_f64(&self) -> f64 {
        match self {
            Num::Int(i) => *i as f64,
            Num::Float(f) => *f,
        }
    }
}

fn as_number(value: &Value, context: &str) -> Result<Num, RuntimeError> {
    match value {
        Value::Integer(i) => Ok(Num::Int(*i)),
        Value::Float(f) => Ok(Num::Float(*f)),
        other => Err(RuntimeError::wrong_type(context, "num", other)),
    }
}

fn binary_op(op: &Token, left: Value, right: Value) -> Flow<Value> {
    match op.kind {
        TokenKind::Plus => add(left, right),
        TokenKind::Minus => {
            let a = as_number(&left, "-")?;
            let b = as_number(&right, "-")?;
            Ok(match (a, b) {
                (Num::Int(x), Num::Int(y)) => Value::Integer(x - y),
                (a, b) => Value::Float(a.as_f64() - b.as_f64()),
            })
        }
        TokenKind::Star => {
            let a = as_number(&left, "*")?;
            let b = as_number(&right, "*")?;
            Ok(match (a, b) {
                (Num::Int(x), Num::Int(y)) => Value::Integer(x * y),
                (a, b) => Value::Float(a.as_f64() * b.as_f64()),
            })
        }
        TokenKind::Slash => divide(left, right),
        TokenKind::Modulo => modulo(left, right),
        TokenKind::Less => Ok(Value::Boolean(compare(&left, &right)? == std::cmp::Ordering::Less)),
        TokenKind::LessEqual => {
            Ok(Value::Boolean(compare(&left, &right)? != std::cmp::Ordering::Greater))
        }
        TokenKind::Greater => {
            Ok(Value::Boolean(compare(&left, &right)? == std::cmp::Ordering::Greater))
        }
        TokenKind::GreaterEqual => {
            Ok(Value::Boolean(compare(&left, &right)? != std::cmp::Ordering::Less))
        }
        TokenKind::EqualEqual => Ok(Value::Boolean(left == right)),
        TokenKind::BangEqual => Ok(Value::Boolean(left != right)),
        _ => unreachable!("parser only emits these kinds as binary operators"),
    }
}

/// `+`: number+number promotes per the usual rule; any text operand
/// concatenates both sides' textual form (§4.3).
fn add(left: Value, right: Value) -> Flow<Value> {
    if matches!(left, Value::Text(_)) || matches!(right, Value::Text(_)) {
        return Ok(Value::Text(format!("{}{}", left, right)));
    }
    let a = as_number(&left, "+")?;
    let b = as_number(&right, "+")?;
    Ok(match (a, b) {
        (Num::Int(x), Num::Int(y)) => Value::Integer(x + y),
        (a, b) => Value::Float(a.as_f64() + b.as_f64()),
    })
}

fn divide(left: Value, right: Value) -> Flow<Value> {
    let a = as_number(&left, "/")?;
    let b = as_number(&right, "/")?;
    if b.as_f64() == 0.0 {
        return Err(RuntimeError::DivisionByZero.into());
    }
    Ok(match (a, b) {
        (Num::Int(x), Num::Int(y)) if x % y == 0 => Value::Integer(x / y),
        (a, b) => Value::Float(a.as_f64() / b.as_f64()),
    })
}

fn modulo(left: Value, right: Value) -> Flow<Value> {
    let a = as_number(&left, "%")?;
    let b = as_number(&right, "%")?;
    if b.as_f64() == 0.0 {
        return Err(RuntimeError::ModuloByZero.into());
    }
    Ok(match (a, b) {
        (Num::Int(x), Num::Int(y)) => Value::Integer(x % y),
        (a, b) => Value::Float(a.as_f64() % b.as_f64()),
    })
}

fn compare(left: &Value, right: &Value) -> Result<std::cmp::Ordering, RuntimeError> {
    let a = as_number(left, "comparison")?;
    let b = as_number(right, "comparison")?;
    a.as_f64()
        .partial_cmp(&b.as_f64())
        .ok_or_else(|| RuntimeError::builtin("comparison", "cannot compare NaN"))
}

fn get_property(object: &Value, name: &str) -> Flow<Value> {
    match object {
        Value::Object(map) => Ok(map.borrow().get(name).cloned().unwrap_or(Value::Nothing)),
        _ => Err(RuntimeError::NotAnObject { property: name.to_string() }.into()),
    }
}

fn set_property(object: &Value, name: &str, value: Value) -> Result<(), RuntimeError> {
    match object {
        Value::Object(map) => {
            map.borrow_mut().insert(name.to_string(), value);
            Ok(())
        }
        _ => Err(RuntimeError::NotAnObject { property: name.to_string() }),
    }
}

fn as_index(value: &Value, container: &'static str) -> Result<i64, RuntimeError> {
    match value {
        Value::Integer(i) => Ok(*i),
        _ => Err(RuntimeError::InvalidIndexType { container }),
    }
}

fn index_value(object: &Value, index: &Value, bracket: &Token) -> Flow<Value> {
    let _ = bracket;
    match object {
        Value::Array(items) => {
            let i = as_index(index, "array")?;
            let items = items.borrow();
            if i < 0 || i as usize >= items.len() {
                return Err(RuntimeError::IndexOutOfBounds { index: i, len: items.len() }.into());
            }
            Ok(items[i as usize].clone())
        }
        Value::Text(s) => {
            let i = as_index(index, "str")?;
            let chars: Vec<char> = s.chars().collect();
            if i < 0 || i as usize >= chars.len() {
                return Err(RuntimeError::IndexOutOfBounds { index: i, len: chars.len() }.into());
            }
            Ok(Value::Text(chars[i as usize].to_string()))
        }
        Value::Object(map) => match index {
            Value::Text(key) => Ok(map.borrow().get(key).cloned().unwrap_or(Value::Nothing)),
            _ => Err(RuntimeError::InvalidIndexType { container: "object" }.into()),
        },
        other => Err(RuntimeError::InvalidIndexType { container: other.type_name() }.into()),
    }
}

fn set_index_value(
    object: &Value,
    index: &Value,
    value: Value,
    bracket: &Token,
) -> Result<(), RuntimeError> {
    let _ = bracket;
    match object {
        Value::Array(items) => {
            let i = as_index(index, "array")?;
            let mut items = items.borrow_mut();
            if i < 0 || i as usize >= items.len() {
                return Err(RuntimeError::IndexOutOfBounds { index: i, len: items.len() });
            }
            items[i as usize] = value;
            Ok(())
        }
        Value::Object(map) => match index {
            Value::Text(key) => {
                map.borrow_mut().insert(key.clone(), value);
                Ok(())
            }
            _ => Err(RuntimeError::InvalidIndexType { container: "object" }),
        },
        other => Err(RuntimeError::InvalidIndexType { container: other.type_name() }),
    }
}

thread_local! {
    /// Directory `import` resolves bare module names against, overridden
    /// per-thread by callers (notably tests) instead of the process's
    /// working directory, which is shared mutable state across every
    /// thread cargo's test harness runs concurrently. `None` falls back
    /// to the working directory, matching §6's documented default.
    static IMPORT_BASE_DIR: RefCell<Option<PathBuf>> = const { RefCell::new(None) };
}

/// Scopes `import` resolution to `dir` for the current thread for the
/// duration of `f`, restoring whatever base directory was set before.
pub fn with_import_base_dir<R>(dir: impl Into<PathBuf>, f: impl FnOnce() -> R) -> R {
    let previous = IMPORT_BASE_DIR.with(|cell| cell.borrow_mut().replace(dir.into()));
    let result = f();
    IMPORT_BASE_DIR.with(|cell| *cell.borrow_mut() = previous);
    result
}

fn resolve_module_path(name: &str) -> PathBuf {
    let filename = format!("{}.{}", name, MODULE_EXTENSION);
    IMPORT_BASE_DIR.with(|cell| match &*cell.borrow() {
        Some(dir) => dir.join(filename),
        None => PathBuf::from(filename),
    })
}

/// Resolves a module name to `<name>.thy`, scans and parses it, and
/// executes only its top-level `func`/`const` declarations in a fresh
/// frame enclosing the globals, exporting those names into the
/// importer's current frame (§4.3, §9 — resolved via the original
/// implementation, see DESIGN.md).
fn import_module(module: &Token, env: &Rc<Environment>) -> Result<(), RuntimeError> {
    let name = match &module.literal {
        Some(crate::token::Literal::String(s)) => s.clone(),
        _ => module.lexeme.clone(),
    };
    let path = resolve_module_path(&name);
    let source = std::fs::read_to_string(&path).map_err(|_| RuntimeError::UnknownModule(name.clone()))?;

    let (tokens, scan_errors) = crate::scanner::Scanner::new(&source).scan();
    if !scan_errors.is_empty() {
        return Err(RuntimeError::UnknownModule(name));
    }
    let (stmts, parse_errors) = crate::parser::Parser::new(tokens).parse();
    if !parse_errors.is_empty() {
        return Err(RuntimeError::UnknownModule(name));
    }

    let module_env = Environment::with_parent(env.global());

    for stmt in &stmts {
        match stmt.as_ref() {
            Stmt::Function { name: fn_name, .. } => {
                execute(stmt, &module_env).map_err(unwind_to_error)?;
                if let Some(value) = module_env.get(&fn_name.lexeme) {
                    env.define(fn_name.lexeme.clone(), value, false);
                }
            }
            Stmt::Var { name: const_name, is_const: true, .. } => {
                execute(stmt, &module_env).map_err(unwind_to_error)?;
                if let Some(value) = module_env.get(&const_name.lexeme) {
                    env.define(const_name.lexeme.clone(), value, true);
                }
            }
            _ => {}
        }
    }

    Ok(())
}

fn unwind_to_error(unwind: Unwind) -> RuntimeError {
    match unwind {
        Unwind::Error(err) => err,
        _ => RuntimeError::builtin("import", "unexpected control flow at module top level"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use crate::scanner::Scanner;

    fn run(src: &str) -> Result<(), RuntimeError> {
        let (tokens, _) = Scanner::new(src).scan();
        let (stmts, errors) = Parser::new(tokens).parse();
        assert!(errors.is_empty(), "{:?}", errors);
        let env = Environment::new();
        crate::builtins::register_builtins(&env);
        eval_program(&stmts, &env)
    }

    fn run_and_capture_var(src: &str, var: &str) -> Value {
        let (tokens, _) = Scanner::new(src).scan();
        let (stmts, errors) = Parser::new(tokens).parse();
        assert!(errors.is_empty(), "{:?}", errors);
        let env = Environment::new();
        crate::builtins::register_builtins(&env);
        eval_program(&stmts, &env).unwrap();
        env.get(var).unwrap()
    }

    #[test]
    fn integer_arithmetic_promotes_only_with_float_operand() {
        assert_eq!(run_and_capture_var("var x = 1 + 2 * 3;", "x"), Value::Integer(7));
        // `2.0` collapses to an Integer literal (§4.1), so this stays
        // integer arithmetic; a genuinely fractional operand promotes.
        assert_eq!(run_and_capture_var("var x = 1 + 2.0;", "x"), Value::Integer(3));
        assert_eq!(run_and_capture_var("var x = 1 + 2.5;", "x"), Value::Float(3.5));
    }

    #[test]
    fn division_promotes_to_float_only_when_uneven() {
        assert_eq!(run_and_capture_var("var x = 6 / 3;", "x"), Value::Integer(2));
        assert_eq!(run_and_capture_var("var x = 7 / 2;", "x"), Value::Float(3.5));
    }

    #[test]
    fn division_by_zero_is_a_runtime_error() {
        assert!(run("var x = 1 / 0;").is_err());
    }

    #[test]
    fn string_concatenation_coerces_mixed_operands() {
        assert_eq!(
            run_and_capture_var(r#"var x = "n=" + 1;"#, "x"),
            Value::Text("n=1".to_string())
        );
    }

    #[test]
    fn short_circuit_or_skips_right_side_effects() {
        let src = "var hit = false; func mark(){ hit = true; return true; } var x = true or mark();";
        assert_eq!(run_and_capture_var(src, "hit"), Value::Boolean(false));
    }

    #[test]
    fn short_circuit_and_skips_right_side_effects() {
        let src = "var hit = false; func mark(){ hit = true; return true; } var x = false and mark();";
        assert_eq!(run_and_capture_var(src, "hit"), Value::Boolean(false));
    }

    #[test]
    fn const_reassignment_fails() {
        assert!(run("const x = 1; x = 2;").is_err());
    }

    #[test]
    fn recursive_function_call_works() {
        let src = "func fib(n){ if (n<2){ return n; } return fib(n-1)+fib(n-2); } var x = fib(10);";
        assert_eq!(run_and_capture_var(src, "x"), Value::Integer(55));
    }

    #[test]
    fn closures_capture_the_defining_environment() {
        let src = "var make = (x)->(y)->x+y; var add3 = make(3); var x = add3(4);";
        assert_eq!(run_and_capture_var(src, "x"), Value::Integer(7));
    }

    #[test]
    fn array_index_assignment_and_bounds_check() {
        assert_eq!(run_and_capture_var("var a=[1,2,3]; a[1]=9; var x=a[1];", "x"), Value::Integer(9));
        assert!(run("var a=[1]; var x=a[5];").is_err());
    }

    #[test]
    fn object_property_set_does_not_need_predeclaration() {
        let src = "const p = {x: 1}; p.z = 3; var x = p.z + p.x;";
        assert_eq!(run_and_capture_var(src, "x"), Value::Integer(4));
    }

    #[test]
    fn for_loop_continue_skips_body_not_increment() {
        let src = "var out = []; for (var i=0;i<3;i=i+1){ if(i==1){continue;} array.append(out, i); }";
        match run_and_capture_var(src, "out") {
            Value::Array(items) => {
                assert_eq!(items.borrow().clone(), vec![Value::Integer(0), Value::Integer(2)]);
            }
            _ => panic!("expected array"),
        }
    }

    #[test]
    fn arity_mismatch_is_a_runtime_error() {
        assert!(run("func f(a,b){ return a+b; } var x = f(1);").is_err());
    }

    #[test]
    fn break_outside_loop_is_a_runtime_error() {
        assert!(run("break;").is_err());
    }
}
