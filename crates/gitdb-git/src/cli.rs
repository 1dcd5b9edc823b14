// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! [`GitSource`] backed by the git command line
//!
//! Every call spawns one git process. Failures are returned as-is; there is
//! no retry.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::commit::{ChangedFile, GitCommit};
use crate::error::GitError;
use crate::log::{LogOptions, parse_lines, parse_log_output, parse_name_status};
use crate::source::GitSource;

/// A repository accessed through the `git` binary
#[derive(Debug, Clone)]
pub struct GitCli {
    workdir: PathBuf,
    binary: String,
}

impl GitCli {
    /// Use the `git` found on `PATH` inside `workdir`
    #[must_use]
    pub fn new(workdir: impl AsRef<Path>) -> Self {
        Self {
            workdir: workdir.as_ref().to_path_buf(),
            binary: "git".to_string(),
        }
    }

    /// Use a specific git binary
    #[must_use]
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Get the working directory
    #[must_use]
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Run git with the given arguments and return stdout
    ///
    /// # Errors
    ///
    /// Returns `GitError::Spawn` if git cannot be started and
    /// `GitError::CommandFailed` (carrying stderr) on a non-zero exit.
    pub async fn run<S: AsRef<str>>(&self, args: &[S]) -> Result<String, GitError> {
        let args: Vec<&str> = args.iter().map(AsRef::as_ref).collect();
        let command = format!("{} {}", self.binary, args.join(" "));
        debug!(command = %command, workdir = %self.workdir.display(), "Running git");

        let output = Command::new(&self.binary)
            .args(&args)
            .current_dir(&self.workdir)
            .env("GIT_TERMINAL_PROMPT", "0")
            .output()
            .await
            .map_err(|source| GitError::Spawn {
                command: command.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(GitError::CommandFailed {
                command,
                status: output.status.to_string(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        String::from_utf8(output.stdout).map_err(|_| GitError::InvalidOutput { command })
    }

    /// Resolve a revision expression to a commit hash
    ///
    /// `Ok(None)` means git ran and the revision does not name a commit
    /// (`rev-parse --verify --quiet` exits 1 without a message). Any other
    /// failure, such as a missing binary or a directory that is not a
    /// repository, is returned as an error.
    async fn rev_parse_commit(&self, revision: &str) -> Result<Option<String>, GitError> {
        let spec = format!("{revision}^{{commit}}");
        match self
            .run(&["rev-parse", "--verify", "--quiet", spec.as_str()])
            .await
        {
            Ok(output) => Ok(parse_lines(&output).into_iter().next()),
            Err(GitError::CommandFailed {
                code: Some(1),
                ref stderr,
                ..
            }) if stderr.is_empty() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl GitSource for GitCli {
    async fn read_commits(&self, options: &LogOptions) -> Result<Vec<GitCommit>, GitError> {
        let output = self.run(&options.to_args()).await?;
        let commits = parse_log_output(&output);
        debug!(count = commits.len(), "Read commits from git log");
        Ok(commits)
    }

    async fn read_changed_files(&self, hash: &str) -> Result<Vec<ChangedFile>, GitError> {
        let output = self
            .run(&["show", "--name-status", "--pretty=format:", hash])
            .await?;
        Ok(parse_name_status(hash, &output))
    }

    async fn list_tags(&self, pattern: &str, newest_first: bool) -> Result<Vec<String>, GitError> {
        let mut args = vec!["tag", "--list", pattern];
        if newest_first {
            args.push("--sort=-v:refname");
        }
        Ok(parse_lines(&self.run(&args).await?))
    }

    async fn resolve_hash_range(&self, from: &str, to: &str) -> Result<Vec<String>, GitError> {
        let parent = format!("{from}^");
        if self.rev_parse_commit(&parent).await?.is_some() {
            let range = format!("{parent}..{to}");
            return Ok(parse_lines(
                &self.run(&["rev-list", "--reverse", range.as_str()]).await?,
            ));
        }

        // `from` is a root commit: walk everything up to `to` and start at `from`
        let from_hash = self.resolve_ref(from).await?;
        let all = parse_lines(&self.run(&["rev-list", "--reverse", to]).await?);
        Ok(all.into_iter().skip_while(|h| *h != from_hash).collect())
    }

    async fn resolve_ref(&self, reference: &str) -> Result<String, GitError> {
        self.rev_parse_commit(reference)
            .await?
            .ok_or_else(|| GitError::InvalidReference {
                reference: reference.to_string(),
            })
    }

    async fn head_hash(&self) -> Result<String, GitError> {
        let output = self.run(&["rev-parse", "HEAD"]).await?;
        parse_lines(&output)
            .into_iter()
            .next()
            .ok_or_else(|| GitError::InvalidReference {
                reference: "HEAD".to_string(),
            })
    }
}
