// ABOUTME: The `io.file` namespace: plain, unsandboxed file I/O

use std::rc::Rc;

use indexmap::IndexMap;

use crate::env::Environment;
use crate::error::RuntimeError;
use crate::value::Value;

fn path_arg(value: &Value, function: &str) -> Result<String, RuntimeError> {
    match value {
        Value::Text(s) => Ok(s.clone()),
        other => Err(RuntimeError::wrong_type(function, "str", other)),
    }
}

fn read(args: &[Value]) -> Result<Value, RuntimeError> {
    let [path] = args else {
        return Err(RuntimeError::arity("io.file.read", 1, args.len()));
    };
    let path = path_arg(path, "io.file.read")?;
    std::fs::read_to_string(&path)
        .map(Value::Text)
        .map_err(|e| RuntimeError::Io(format!("{}: {}", path, e)))
}

fn write(args: &[Value]) -> Result<Value, RuntimeError> {
    let [path, contents] = args else {
        return Err(RuntimeError::arity("io.file.modify.write", 2, args.len()));
    };
    let path = path_arg(path, "io.file.modify.write")?;
    let contents = path_arg(contents, "io.file.modify.write")?;
    std::fs::write(&path, contents)
        .map(|_| Value::Nothing)
        .map_err(|e| RuntimeError::Io(format!("{}: {}", path, e)))
}

fn append(args: &[Value]) -> Result<Value, RuntimeError> {
    use std::io::Write;

    let [path, contents] = args else {
        return Err(RuntimeError::arity("io.file.modify.append", 2, args.len()));
    };
    let path = path_arg(path, "io.file.modify.append")?;
    let contents = path_arg(contents, "io.file.modify.append")?;
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| RuntimeError::Io(format!("{}: {}", path, e)))?;
    file.write_all(contents.as_bytes())
        .map(|_| Value::Nothing)
        .map_err(|e| RuntimeError::Io(format!("{}: {}", path, e)))
}

pub fn register(env: &Rc<Environment>) {
    let mut modify = IndexMap::new();
    modify.insert("write".to_string(), Value::native("io.file.modify.write", write));
    modify.insert("append".to_string(), Value::native("io.file.modify.append", append));

    let mut file = IndexMap::new();
    file.insert("read".to_string(), Value::native("io.file.read", read));
    file.insert("modify".to_string(), Value::object(modify));

    let mut io = IndexMap::new();
    io.insert("file".to_string(), Value::object(file));

    env.define("io", Value::object(io), false);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.txt");
        let path_str = path.to_str().unwrap().to_string();

        write(&[Value::Text(path_str.clone()), Value::Text("hello".into())]).unwrap();
        let contents = read(&[Value::Text(path_str)]).unwrap();
        assert_eq!(contents, Value::Text("hello".into()));
    }

    #[test]
    fn append_adds_to_existing_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        let path_str = path.to_str().unwrap().to_string();

        write(&[Value::Text(path_str.clone()), Value::Text("a".into())]).unwrap();
        append(&[Value::Text(path_str.clone()), Value::Text("b".into())]).unwrap();
        let contents = read(&[Value::Text(path_str)]).unwrap();
        assert_eq!(contents, Value::Text("ab".into()));
    }

    #[test]
    fn read_missing_file_is_an_io_error() {
        assert!(read(&[Value::Text("/nonexistent/path.thy".into())]).is_err());
    }
}
