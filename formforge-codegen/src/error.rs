//! Error types for codegen

use formforge::SchemaError;
use std::fmt;

#[derive(Debug)]
pub enum CodegenError {
    Io(std::io::Error),
    Parse(String),
    /// The configuration failed validation; nothing was written for it.
    InvalidForm(SchemaError),
}

impl fmt::Display for CodegenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodegenError::Io(e) => write!(f, "I/O error: {e}"),
            CodegenError::Parse(msg) => write!(f, "Parse error: {msg}"),
            CodegenError::InvalidForm(e) => write!(f, "Invalid form configuration: {e}"),
        }
    }
}

impl std::error::Error for CodegenError {}

impl From<std::io::Error> for CodegenError {
    fn from(err: std::io::Error) -> Self {
        CodegenError::Io(err)
    }
}

impl From<SchemaError> for CodegenError {
    fn from(err: SchemaError) -> Self {
        CodegenError::InvalidForm(err)
    }
}

pub type Result<T> = std::result::Result<T, CodegenError>;
