pub mod index;
pub mod query;
pub mod serve;
pub mod status;

use std::path::{Path, PathBuf};

use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the knowledge graph for a repository (full rebuild)
    Index(index::IndexArgs),
    /// Look up entities and traverse the stored graph
    Query(query::QueryArgs),
    /// Show entity and relationship counts for the stored graph
    Status(status::StatusArgs),
    /// Start MCP server for AI agent integration
    Serve(serve::ServeArgs),
}

pub async fn run(cmd: Command) -> anyhow::Result<()> {
    match cmd {
        Command::Index(args) => index::run(args).await,
        Command::Query(args) => query::run(args).await,
        Command::Status(args) => status::run(args).await,
        Command::Serve(args) => serve::run(args).await,
    }
}

/// Database location under a repository root.
pub fn resolve_db_path(repo_path: &Path) -> PathBuf {
    repo_path.join(".repograph/graph.db")
}
