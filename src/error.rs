//! Error types for rust-sqldiff

use std::path::PathBuf;
use thiserror::Error;

use crate::model::Name;
use crate::script::ScriptType;

/// Errors that can occur while loading, diffing, or executing scripts
#[derive(Error, Debug)]
pub enum SqlDiffError {
    #[error("Adding duplicate script: {name} {script_type}")]
    DuplicateScript { name: Name, script_type: ScriptType },

    #[error("No connection target was supplied")]
    MissingConnectionTarget,

    #[error("Script directory not found: {path}")]
    ScriptDirectoryNotFound { path: PathBuf },

    #[error("Failed to read script file: {path}")]
    ScriptReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid object name: {text}")]
    InvalidName { text: String },

    #[error("Failed to execute script {name} {script_type}: {message}")]
    ExecutionFailed {
        name: Name,
        script_type: ScriptType,
        message: String,
    },
}
