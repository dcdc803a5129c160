// ABOUTME: Error types for scanning, parsing, and evaluation failures

use thiserror::Error;

use crate::value::Value;

#[derive(Error, Debug, Clone, PartialEq)]
#[error("[line {line}] {message}")]
pub struct ScanError {
    pub line: usize,
    pub message: String,
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("[line {line}] at '{lexeme}': {message}")]
pub struct ParseError {
    pub line: usize,
    pub lexeme: String,
    pub message: String,
}

#[allow(dead_code)]
#[derive(Error, Debug, Clone)]
pub enum RuntimeError {
    #[error("Undefined variable '{0}'")]
    UndefinedVariable(String),

    #[error("Cannot reassign const '{0}'")]
    ConstReassignment(String),

    #[error("{context}: expected {expected}, got {got}")]
    WrongType {
        context: String,
        expected: &'static str,
        got: &'static str,
    },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Modulo by zero")]
    ModuloByZero,

    #[error("Index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: i64, len: usize },

    #[error("Invalid index type for {container}")]
    InvalidIndexType { container: &'static str },

    #[error("'{0}' is not callable")]
    NotCallable(String),

    #[error("Cannot access property '{property}' on a non-object value")]
    NotAnObject { property: String },

    #[error("Unknown module '{0}'")]
    UnknownModule(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("{function}: expected {expected} argument{}, got {got}", if *.expected == 1 { "" } else { "s" })]
    ArityMismatch {
        function: String,
        expected: usize,
        got: usize,
    },

    #[error("{function}: {message}")]
    Builtin { function: String, message: String },
}

impl RuntimeError {
    pub fn wrong_type(context: impl Into<String>, expected: &'static str, got: &Value) -> Self {
        RuntimeError::WrongType {
            context: context.into(),
            expected,
            got: got.type_name(),
        }
    }

    pub fn arity(function: impl Into<String>, expected: usize, got: usize) -> Self {
        RuntimeError::ArityMismatch {
            function: function.into(),
            expected,
            got,
        }
    }

    pub fn builtin(function: impl Into<String>, message: impl Into<String>) -> Self {
        RuntimeError::Builtin {
            function: function.into(),
            message: message.into(),
        }
    }
}

/// The unwinding channel driving the evaluator. `return`/`break`/`continue`
/// travel alongside runtime errors but must never be mistaken for one —
/// a loop handler catches `Break`/`Continue`, a call frame catches
/// `Return`, and everything else propagates to the driver unchanged.
#[derive(Debug, Clone)]
pub enum Unwind {
    Error(RuntimeError),
    Return(Value),
    Break,
    Continue,
}

impl From<RuntimeError> for Unwind {
    fn from(err: RuntimeError) -> Self {
        Unwind::Error(err)
    }
}

pub type Flow<T> = Result<T, Unwind>;
