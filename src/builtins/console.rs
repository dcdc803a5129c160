// ABOUTME: The `console` namespace: output.print/println and read

use std::io::{BufRead, Write};
use std::rc::Rc;

use indexmap::IndexMap;

use crate::env::Environment;
use crate::error::RuntimeError;
use crate::value::Value;

fn print(args: &[Value]) -> Result<Value, RuntimeError> {
    let mut stdout = std::io::stdout();
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            let _ = write!(stdout, " ");
        }
        let _ = write!(stdout, "{}", arg);
    }
    let _ = stdout.flush();
    Ok(Value::Nothing)
}

fn println(args: &[Value]) -> Result<Value, RuntimeError> {
    let mut stdout = std::io::stdout();
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            let _ = write!(stdout, " ");
        }
        let _ = write!(stdout, "{}", arg);
    }
    let _ = writeln!(stdout);
    Ok(Value::Nothing)
}

fn read(args: &[Value]) -> Result<Value, RuntimeError> {
    if !args.is_empty() {
        return Err(RuntimeError::arity("console.read", 0, args.len()));
    }
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| RuntimeError::Io(e.to_string()))?;
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    Ok(Value::Text(line))
}

pub fn register(env: &Rc<Environment>) {
    let mut output = IndexMap::new();
    output.insert("print".to_string(), Value::native("console.output.print", print));
    output.insert("println".to_string(), Value::native("console.output.println", println));

    let mut console = IndexMap::new();
    console.insert("output".to_string(), Value::object(output));
    console.insert("read".to_string(), Value::native("console.read", read));

    env.define("console", Value::object(console), false);
}
