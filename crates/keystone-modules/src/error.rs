// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Error types for module resolution and loading

use std::path::PathBuf;
use thiserror::Error;

/// Result type for module system operations
pub type Result<T> = std::result::Result<T, ModuleError>;

/// Boxed error raised by a module body
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while resolving or loading a module
#[derive(Debug, Error)]
pub enum ModuleError {
    /// An argument had the wrong dynamic type
    #[error("TypeError: {0}")]
    TypeError(String),

    /// An argument had the right type but an unusable value
    #[error("ValueError: {0}")]
    ValueError(String),

    /// No search root yielded a matching file
    #[error("Cannot find module '{0}'")]
    NotFound(String),

    /// The module body raised; carried through untouched
    #[error(transparent)]
    Evaluation(BoxError),

    /// The host could not materialize a native module
    #[error("Failed to load native module '{name}': {reason}")]
    Native {
        /// Native module name
        name: String,
        /// Reason reported by the host
        reason: String,
    },

    /// A resolved module file could not be read
    #[error("Failed to read module '{}': {source}", path.display())]
    Io {
        /// Resolved path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed configuration file
    #[error("Configuration parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Coarse classification of a [`ModuleError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// See [`ModuleError::TypeError`]
    Type,
    /// See [`ModuleError::ValueError`]
    Value,
    /// See [`ModuleError::NotFound`]
    NotFound,
    /// See [`ModuleError::Evaluation`]
    Evaluation,
    /// See [`ModuleError::Native`]
    Native,
    /// See [`ModuleError::Io`]
    Io,
    /// See [`ModuleError::Config`] and [`ModuleError::Toml`]
    Config,
}

impl ModuleError {
    /// Create a new TypeError
    pub fn type_error(msg: impl Into<String>) -> Self {
        Self::TypeError(msg.into())
    }

    /// Create a new ValueError
    pub fn value_error(msg: impl Into<String>) -> Self {
        Self::ValueError(msg.into())
    }

    /// Create a module not found error
    pub fn not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound(identifier.into())
    }

    /// Wrap an error raised by a module body
    pub fn evaluation(error: impl Into<BoxError>) -> Self {
        Self::Evaluation(error.into())
    }

    /// Create a native materialization error
    pub fn native(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Native {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ModuleError::TypeError(_) => ErrorKind::Type,
            ModuleError::ValueError(_) => ErrorKind::Value,
            ModuleError::NotFound(_) => ErrorKind::NotFound,
            ModuleError::Evaluation(_) => ErrorKind::Evaluation,
            ModuleError::Native { .. } => ErrorKind::Native,
            ModuleError::Io { .. } => ErrorKind::Io,
            ModuleError::Config(_) | ModuleError::Toml(_) => ErrorKind::Config,
        }
    }
}
