//! Error types for namesake.
//!
//! All errors are strongly typed using thiserror. Per-record problems
//! (a name that cannot be parsed) are recovered locally by the registry;
//! structural problems (an index entry pointing at a record that no longer
//! exists) surface as [`RegistryError`] and must not be swallowed.

use thiserror::Error;

use crate::person::PersonId;

/// Errors produced while parsing a single raw name string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Raw name is empty after cleanup: {raw:?}")]
    Empty {
        raw: String,
    },

    #[error("No last name could be recovered from {raw:?}")]
    MissingLastName {
        raw: String,
    },
}

impl ParseError {
    /// Returns the raw input that failed to parse.
    #[must_use]
    pub fn raw(&self) -> &str {
        match self {
            Self::Empty { raw } | Self::MissingLastName { raw } => raw,
        }
    }
}

/// Errors raised by the person registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Person not found: {id}")]
    PersonNotFound {
        id: PersonId,
    },

    #[error("Cannot merge person {id} with itself")]
    SelfMerge {
        id: PersonId,
    },

    #[error("Alias index is inconsistent: {message}")]
    IndexInconsistency {
        message: String,
    },
}

/// Errors raised while encoding, decoding or moving snapshots to disk.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot is corrupt: {0}")]
    Corrupt(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Errors raised while loading or validating configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {reason}")]
    Invalid {
        reason: String,
    },

    #[error("Failed to read {path}: {message}")]
    Read {
        path: String,
        message: String,
    },

    #[error("Failed to decode {what}: {message}")]
    Decode {
        what: String,
        message: String,
    },
}

/// Top-level error type for namesake.
#[derive(Debug, Error)]
pub enum NamesakeError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl NamesakeError {
    /// Returns true if this is a parse error.
    #[must_use]
    pub const fn is_parse(&self) -> bool {
        matches!(self, Self::Parse(_))
    }

    /// Returns true if this is a registry error.
    #[must_use]
    pub const fn is_registry(&self) -> bool {
        matches!(self, Self::Registry(_))
    }

    /// Returns true if this is a storage error.
    #[must_use]
    pub const fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    /// Returns true if this is a configuration error.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Returns true if the error indicates a broken core invariant rather
    /// than bad input.
    #[must_use]
    pub const fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            Self::Registry(RegistryError::IndexInconsistency { .. })
        )
    }
}

/// Result type alias for namesake operations.
pub type NamesakeResult<T> = Result<T, NamesakeError>;
