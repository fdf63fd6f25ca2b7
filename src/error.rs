use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PointerError {
    #[error("could not allocate {size} bytes")]
    Allocation { size: usize },

    #[error("{0}")]
    Argument(String),

    #[error("{kind} value out of range: {value}")]
    Range { kind: &'static str, value: f64 },

    #[error("{operation} through a null pointer")]
    NullDereference { operation: &'static str },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScriptError {
    #[error("syntax error: {0}")]
    Lex(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("undefined variable: {0}")]
    UndefinedVariable(String),

    #[error("{0} is not a Pointer")]
    NotAnObject(String),

    #[error(transparent)]
    Pointer(#[from] PointerError),

    #[error("IO error: {0}")]
    Io(String),

    #[error("line {line}: {source}")]
    Statement {
        line: usize,
        source: Box<ScriptError>,
    },
}
