//! Error types for embedvfs

use thiserror::Error;

/// Errors produced by the overlay, its bundles and its configuration
#[derive(Error, Debug)]
pub enum Error {
    /// Null/empty path or identifier supplied by a caller
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Resource identifier or namespace is not a well-formed dotted name
    #[error("Malformed identifier: {0}")]
    MalformedIdentifier(String),

    /// Namespace is not a period-delimited prefix of the resource identifier
    #[error("Resource '{resource}' is not declared under namespace '{namespace}'")]
    InvalidMapping { namespace: String, resource: String },

    /// A configured source bundle could not be loaded
    #[error("Source bundle not found: {0}")]
    BundleNotFound(String),

    /// Neither the overlay nor the base provider has the path
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Resolver is already initialized")]
    AlreadyInitialized,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
