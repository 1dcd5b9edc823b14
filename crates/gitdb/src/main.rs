// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! git-db: incremental git history index backed by SQLite
//!
//! Scans the repository's history into a SQLite file and answers queries
//! over it. Results are printed to stdout as JSON; logs go to stderr.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use gitdb::commands;
use gitdb::config::Config;
use gitdb::db::{close_db, open_db};
use gitdb_git::GitCli;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(config.log_level().into()))
        .with_writer(std::io::stderr)
        .init();

    config.validate()?;

    let repo = config
        .repo_path()
        .context("Cannot determine the repository directory")?;
    let db_path = config.database_path();
    info!(repo = %repo.display(), database = %db_path.display(), "Starting git-db");

    let mut db = open_db(&db_path)
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;
    let git = GitCli::new(&repo).with_binary(config.git.clone());

    let outcome = commands::run(&config, &mut db, &git).await;
    close_db(db).context("Failed to close database")?;

    let value = outcome?;
    debug!("Command finished");
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
