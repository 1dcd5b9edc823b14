// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Test utilities for git-db integration tests
//!
//! This module provides utilities for:
//! - Temporary directory management
//! - Scripted git repositories with deterministic dates

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicU32, Ordering};

// ============================================================================
// Temporary Directory Management
// ============================================================================

/// Counter for generating unique test directory names
static TEST_DIR_COUNTER: AtomicU32 = AtomicU32::new(0);

/// A temporary directory that is automatically cleaned up when dropped
pub struct TempTestDir {
    path: PathBuf,
}

impl TempTestDir {
    /// Create a new, unique temporary test directory
    pub fn new(test_name: &str) -> Self {
        let counter = TEST_DIR_COUNTER.fetch_add(1, Ordering::SeqCst);
        let dir_name = format!("gitdb-test-{}-{}-{}", test_name, std::process::id(), counter);
        let path = std::env::temp_dir().join(dir_name);
        fs::create_dir_all(&path).expect("Failed to create temp test directory");
        Self { path }
    }

    /// Get the path to the temporary directory
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create a file within the temp directory with the given content
    pub fn create_file(&self, relative_path: &str, content: &str) -> PathBuf {
        let file_path = self.path.join(relative_path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        fs::write(&file_path, content).expect("Failed to write file");
        file_path
    }
}

impl Drop for TempTestDir {
    fn drop(&mut self) {
        if self.path.exists() {
            let _ = fs::remove_dir_all(&self.path);
        }
    }
}

// ============================================================================
// Git Repository Scaffolding
// ============================================================================

/// A real git repository whose commits get one-day-apart author dates
pub struct TestGitRepo {
    temp_dir: TempTestDir,
    day: u32,
}

impl TestGitRepo {
    /// Create and initialize a repository
    pub fn new(test_name: &str) -> Self {
        let temp_dir = TempTestDir::new(test_name);
        run_git(temp_dir.path(), &["init", "-q"], &[]);
        Self { temp_dir, day: 0 }
    }

    /// Get the path to the repository
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write files and commit them as `email`, returning the new HEAD
    pub fn commit_as(&mut self, email: &str, message: &str, files: &[&str]) -> String {
        for file in files {
            self.temp_dir
                .create_file(file, &format!("{message}\n{}", self.day));
            run_git(self.path(), &["add", file], &[]);
        }

        self.day += 1;
        let date = format!("2026-03-{:02}T09:00:00+01:00", self.day);
        let name = email.split('@').next().unwrap_or(email);
        let name_cfg = format!("user.name={name}");
        let email_cfg = format!("user.email={email}");
        run_git(
            self.path(),
            &[
                "-c",
                name_cfg.as_str(),
                "-c",
                email_cfg.as_str(),
                "-c",
                "commit.gpgsign=false",
                "commit",
                "-q",
                "--allow-empty",
                "-m",
                message,
            ],
            &[
                ("GIT_AUTHOR_DATE", date.as_str()),
                ("GIT_COMMITTER_DATE", date.as_str()),
            ],
        );
        self.head()
    }

    /// Commit as the default test author
    pub fn commit(&mut self, message: &str, files: &[&str]) -> String {
        self.commit_as("test@example.com", message, files)
    }

    /// Create a lightweight tag at HEAD
    pub fn tag(&self, name: &str) {
        run_git(self.path(), &["tag", name], &[]);
    }

    /// Get the SHA of HEAD
    pub fn head(&self) -> String {
        run_git(self.path(), &["rev-parse", "HEAD"], &[])
            .trim()
            .to_string()
    }
}

/// Run git in `dir`, panicking with stderr on failure
pub fn run_git(dir: &Path, args: &[&str], envs: &[(&str, &str)]) -> String {
    let output = Command::new("git")
        .current_dir(dir)
        .args(args)
        .envs(envs.iter().copied())
        .env("GIT_CONFIG_NOSYSTEM", "1")
        .output()
        .expect("Failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}
