use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use repograph_core::config::RepographConfig;
use repograph_core::pipeline::BuildPipeline;
use repograph_core::store::sqlite::SqliteStore;
use repograph_lang::PythonFrontEnd;

#[derive(Args, Debug)]
pub struct IndexArgs {
    /// Path to repository (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,
}

pub async fn run(args: IndexArgs) -> anyhow::Result<()> {
    let repo_path = std::fs::canonicalize(&args.path)
        .with_context(|| format!("Cannot resolve path: {}", args.path.display()))?;

    let repograph_dir = repo_path.join(".repograph");
    std::fs::create_dir_all(&repograph_dir)
        .with_context(|| format!("Cannot create directory: {}", repograph_dir.display()))?;

    // Write a default config on first run so users have something to edit
    let config_path = repograph_dir.join("config.toml");
    if !config_path.exists() {
        let text = toml::to_string_pretty(&RepographConfig::default())
            .context("Cannot serialize default config")?;
        std::fs::write(&config_path, text)
            .with_context(|| format!("Cannot write config: {}", config_path.display()))?;
        info!(path = %config_path.display(), "Wrote default config");
    }
    let config = RepographConfig::load_or_default(&repo_path)
        .with_context(|| format!("Cannot load config: {}", config_path.display()))?;

    let db_path = super::resolve_db_path(&repo_path);
    let store = SqliteStore::open(&db_path)
        .with_context(|| format!("Cannot open database: {}", db_path.display()))?;

    let bar = ProgressBar::new_spinner();
    bar.set_style(ProgressStyle::with_template("{spinner:.green} {msg}").unwrap());
    bar.set_message("Building graph");
    bar.enable_steady_tick(Duration::from_millis(100));

    let front_end = PythonFrontEnd;
    let pipeline = BuildPipeline::new(&repo_path, config, &front_end);
    let stats = pipeline.run(&store).await.context("Build failed")?;

    bar.finish_and_clear();

    println!("Graph built for {}", repo_path.display());
    println!();
    println!("  Files parsed:  {}", stats.files_parsed);
    println!("  Entities:      {}", stats.entities);
    println!("  Relationships: {}", stats.relationship_total());
    let mut kinds: Vec<_> = stats.relationships.iter().collect();
    kinds.sort();
    for (kind, count) in kinds {
        println!("    {kind:<12} {count:>6}");
    }

    if !stats.skipped.is_empty() {
        println!();
        println!("  Skipped ({}):", stats.skipped.len());
        for (path, reason) in &stats.skipped {
            println!("    {}: {reason}", path.display());
        }
    }

    Ok(())
}
