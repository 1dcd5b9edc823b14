// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Error types for gitdb-git

use thiserror::Error;

/// Errors that can occur while talking to git
#[derive(Debug, Error)]
pub enum GitError {
    /// The git binary could not be started
    #[error("Failed to run `{command}`: {source}")]
    Spawn {
        /// The command line that was attempted
        command: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// git exited with a non-zero status
    #[error("`{command}` failed ({status}): {stderr}")]
    CommandFailed {
        /// The command line that failed
        command: String,
        /// Exit status description
        status: String,
        /// Exit code, `None` when killed by a signal
        code: Option<i32>,
        /// Captured standard error, trimmed
        stderr: String,
    },

    /// git produced output that is not valid UTF-8
    #[error("`{command}` produced non UTF-8 output")]
    InvalidOutput {
        /// The command line whose output could not be decoded
        command: String,
    },

    /// A reference (hash, tag, branch) does not exist
    #[error("Invalid commit reference: {reference}")]
    InvalidReference {
        /// The reference string that could not be resolved
        reference: String,
    },
}
