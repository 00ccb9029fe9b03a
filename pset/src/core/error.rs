//! Error taxonomy for configuration-tree construction and finalization.
//!
//! Every variant carries the offending name or entry path so that the caller
//! (usually a configuration file author) can find the problem.

use thiserror::Error;

use crate::core::module::ModuleRole;
use crate::core::value::Kind;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Two siblings share a name (parameter set entries, or process labels).
    #[error("duplicate name '{path}'")]
    DuplicateName { path: String },

    /// A sequence-only mutation targeted something other than a `vstring`.
    #[error("'{path}' is a {found}, not a vstring")]
    NotASequence { path: String, found: Kind },

    #[error("index {index} out of range for '{path}' (length {len})")]
    IndexOutOfRange {
        path: String,
        index: usize,
        len: usize,
    },

    /// A path or sequence names a label that is neither a module nor a sequence.
    #[error("'{name}' referenced by {referenced_by} is not a registered module or sequence")]
    UnresolvedReference { name: String, referenced_by: String },

    #[error("sequence cycle: {}", chain.join(" -> "))]
    SequenceCycle { chain: Vec<String> },

    #[error("no entry at '{path}'")]
    MissingEntry { path: String },

    #[error("'{path}' is a {found}, expected {expected}")]
    TypeMismatch {
        path: String,
        expected: Kind,
        found: Kind,
    },

    #[error("invalid name '{name}'")]
    InvalidName { name: String },

    #[error("invalid entry path '{path}'")]
    InvalidPath { path: String },

    #[error("invalid InputTag {value:?}: {reason}")]
    InvalidInputTag { value: String, reason: &'static str },

    #[error("invalid {kind} literal {value:?}: {reason}")]
    InvalidLiteral {
        kind: Kind,
        value: String,
        reason: String,
    },

    #[error("'{label}' is a {found} module, expected {expected}")]
    RoleMismatch {
        label: String,
        expected: &'static str,
        found: ModuleRole,
    },

    #[error("process has no name")]
    MissingProcessName,

    #[error("parse error at {line}:{column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },
}

impl ConfigError {
    /// True for problems only detectable once the whole process is assembled.
    pub fn is_finalization_error(&self) -> bool {
        matches!(
            self,
            ConfigError::UnresolvedReference { .. }
                | ConfigError::SequenceCycle { .. }
                | ConfigError::MissingProcessName
        )
    }

    /// Re-anchor an entry-relative error under `prefix` (used when a nested
    /// set is built first and inserted later).
    pub(crate) fn under(self, prefix: &str) -> Self {
        if prefix.is_empty() {
            return self;
        }
        let join = |path: String| format!("{prefix}.{path}");
        match self {
            ConfigError::DuplicateName { path } => ConfigError::DuplicateName { path: join(path) },
            ConfigError::MissingEntry { path } => ConfigError::MissingEntry { path: join(path) },
            other => other,
        }
    }
}
