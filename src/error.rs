use std::path::PathBuf;

use thiserror::Error;

/// Fatal, session-level failures. Anything else degrades to a structured
/// status on the affected candidate or mutant.
#[derive(Debug, Error)]
pub enum MutationError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid Python syntax in {} at line {line}, column {column}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        column: usize,
    },

    #[error("failed to create scratch directory: {0}")]
    Scratch(#[source] std::io::Error),

    #[error("mutation session already cleaned up")]
    SessionClosed,
}

/// Per-candidate failures during mutant construction. These are logged and
/// skipped; they never abort the generation batch.
#[derive(Debug, Error)]
pub enum ConstructionError {
    #[error("no equivalent {kind} node at line {line}, column {column} in the copied tree")]
    NodeNotFound {
        kind: &'static str,
        line: usize,
        column: usize,
    },

    #[error("mutation by '{operator}' at line {line} produced invalid syntax")]
    InvalidSyntax { operator: String, line: usize },

    #[error("failed to write scratch file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Sandbox setup failures in the test runner. Mapped to an Error-status
/// result for the mutant in question; the rest of the batch continues.
#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("failed to create sandbox directory: {0}")]
    Create(#[source] std::io::Error),

    #[error("failed to copy {} into sandbox: {source}", path.display())]
    Copy {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to launch test command '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
}
