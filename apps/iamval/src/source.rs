//! Policy source adapter: literal strings, files, and form fields.
//!
//! Bytes are read as-is; the well-formedness check happens in
//! `PolicyDocument::parse` so no caller can reach the analyzer with bad JSON.

use crate::models::PolicyDocument;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
/// Everything that can go wrong before a document is handed to the analyzer.
pub enum InputError {
    #[error("File '{}' not found", .0.display())]
    NotFound(PathBuf),
    #[error("Failed to read file '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Invalid JSON format: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("Policy document must be a JSON object, found {0}")]
    NotAnObject(&'static str),
    #[error("Please enter or load a policy JSON")]
    Empty,
}

#[derive(Debug, Clone)]
/// Where a policy document comes from.
pub enum PolicySource {
    /// `--policy` argument, a web form field, or the shell buffer.
    Literal(String),
    File(PathBuf),
}

impl PolicySource {
    pub fn read(&self) -> Result<String, InputError> {
        match self {
            PolicySource::Literal(s) => Ok(s.clone()),
            PolicySource::File(p) => read_file(p),
        }
    }

    pub fn load(&self) -> Result<PolicyDocument, InputError> {
        PolicyDocument::parse(self.read()?)
    }
}

/// Read a file, mapping a missing path to `InputError::NotFound`.
pub fn read_file(path: &Path) -> Result<String, InputError> {
    fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => InputError::NotFound(path.to_path_buf()),
        _ => InputError::Read {
            path: path.to_path_buf(),
            source: e,
        },
    })
}
