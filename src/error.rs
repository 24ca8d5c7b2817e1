//! Error taxonomy for taskparams.
//!
//! Grouped by subsystem so callers can match on the failure class
//! (`Error::Config(ConfigError::NotConfigured)` etc.) without string
//! inspection.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type returned by all fallible operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Param(#[from] ParamError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Cipher(#[from] CipherError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Global configuration lifecycle errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("parameter subsystem already configured for this registry")]
    AlreadyConfigured,

    #[error("parameters cannot be defined before configure is called")]
    NotConfigured,

    #[error("failed to read settings file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse settings file: {0}")]
    Parse(#[source] serde_yaml::Error),
}

/// Per-parameter resolution and execution errors.
#[derive(Error, Debug)]
pub enum ParamError {
    #[error("the parameter '{0}' has not been provided or defaulted")]
    Missing(String),

    #[error("unknown parameter: {0}")]
    Unknown(String),
}

/// Host-graph node errors.
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("unknown task: {0}")]
    UnknownNode(String),

    #[error("don't know how to build '{0}': file does not exist")]
    Unbuildable(PathBuf),

    #[error("circular dependency detected: {0}")]
    Circular(String),
}

/// Encryption service errors, propagated unchanged from the backend.
#[derive(Error, Debug)]
pub enum CipherError {
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("decryption failed: {0}")]
    DecryptionFailed(String),
}

/// Config-document parsing errors.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("failed to read config document: {0}")]
    Read(#[source] std::io::Error),

    #[error("failed to parse config document: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
