use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use repograph_core::store::GraphStore;
use repograph_core::store::sqlite::SqliteStore;

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Path to repository (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,
}

pub async fn run(args: StatusArgs) -> anyhow::Result<()> {
    let repo_path = std::fs::canonicalize(&args.path)
        .with_context(|| format!("Cannot resolve path: {}", args.path.display()))?;

    let db_path = super::resolve_db_path(&repo_path);
    if !db_path.exists() {
        anyhow::bail!(
            "repograph is not initialized in {}. Run `repograph index` first.",
            repo_path.display()
        );
    }

    let store = SqliteStore::open(&db_path)
        .with_context(|| format!("Cannot open database: {}", db_path.display()))?;

    let stats = store.stats().await.context("Failed to read store stats")?;

    println!("repograph status for {}", repo_path.display());
    println!();
    println!("  Database: {}", db_path.display());
    println!();

    println!("  Entities: {} total", stats.total_entities);
    let mut kinds: Vec<_> = stats.entities_by_kind.iter().collect();
    kinds.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
    for (kind, count) in &kinds {
        println!("    {kind:<12} {count:>6}");
    }
    println!();

    println!("  Relationships: {} total", stats.total_relationships);
    let mut kinds: Vec<_> = stats.relationships_by_kind.iter().collect();
    kinds.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
    for (kind, count) in &kinds {
        println!("    {kind:<12} {count:>6}");
    }

    Ok(())
}
