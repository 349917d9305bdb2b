use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use repograph_core::store::GraphStore;
use repograph_core::store::sqlite::SqliteStore;
use repograph_core::types::{Direction, Entity, EntityKind, RelationKind};

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Entity identity name (`pkg/a.py:Base`) or unqualified short name
    pub entity: String,

    /// Path to repository (default: current directory)
    #[arg(long, default_value = ".")]
    pub path: PathBuf,

    /// Output format: text, json
    #[arg(long, default_value = "text")]
    pub format: String,

    /// Traverse from the first match: downstream or upstream
    #[arg(long)]
    pub direction: Option<String>,

    /// Traversal depth (1-5; negative means maximum)
    #[arg(long, default_value_t = 1)]
    pub depth: i64,

    /// Entity kinds to keep in traversal output (comma-separated)
    #[arg(long)]
    pub entity_types: Option<String>,

    /// Relationship kinds to follow (comma-separated)
    #[arg(long)]
    pub relation_types: Option<String>,
}

pub async fn run(args: QueryArgs) -> anyhow::Result<()> {
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

    // Exact identity first, then case-tolerant short-name candidates
    let mut matches: Vec<Entity> = Vec::new();
    if let Some(exact) = store.get(&args.entity).await? {
        matches.push(exact);
    }
    for candidate in store.find_by_short_name(&args.entity).await? {
        if matches
            .iter()
            .all(|m| m.name != candidate.name || m.kind != candidate.kind)
        {
            matches.push(candidate);
        }
    }

    if matches.is_empty() {
        println!("No entity found matching: {}", args.entity);
        return Ok(());
    }

    let traversal = match args.direction.as_deref() {
        Some(d) => {
            let direction = Direction::parse(d)
                .ok_or_else(|| anyhow::anyhow!("Unknown direction: {d}. Use: downstream, upstream"))?;
            let entity_kinds = parse_entity_kinds(args.entity_types.as_deref())?;
            let relation_kinds = parse_relation_kinds(args.relation_types.as_deref())?;
            Some(
                store
                    .traverse(
                        &matches[0].name,
                        direction,
                        args.depth,
                        &entity_kinds,
                        &relation_kinds,
                    )
                    .await?,
            )
        }
        None => None,
    };

    match args.format.as_str() {
        "json" => print_json(&matches, traversal.as_ref())?,
        _ => print_text(&matches, traversal.as_ref()),
    }

    Ok(())
}

fn parse_entity_kinds(spec: Option<&str>) -> anyhow::Result<Vec<EntityKind>> {
    let Some(spec) = spec else {
        return Ok(Vec::new());
    };
    spec.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| EntityKind::parse(s).ok_or_else(|| anyhow::anyhow!("Unknown entity kind: {s}")))
        .collect()
}

fn parse_relation_kinds(spec: Option<&str>) -> anyhow::Result<Vec<RelationKind>> {
    let Some(spec) = spec else {
        return Ok(Vec::new());
    };
    spec.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            RelationKind::parse(s).ok_or_else(|| anyhow::anyhow!("Unknown relationship kind: {s}"))
        })
        .collect()
}

fn print_text(matches: &[Entity], traversal: Option<&HashMap<String, Vec<String>>>) {
    let first = &matches[0];
    println!("{}: {}", first.kind, first.name);
    if let Some(span) = first.span {
        println!("Lines: {}-{}", span.start_line, span.end_line);
    }

    if matches.len() > 1 {
        println!();
        println!("Also matched:");
        for entity in &matches[1..] {
            println!("  {}: {}", entity.kind, entity.name);
        }
    }

    if let Some(reached) = traversal {
        println!();
        println!("Reached:");
        let mut kinds: Vec<_> = reached.iter().collect();
        kinds.sort_by_key(|(kind, _)| kind.as_str());
        for (kind, names) in kinds {
            println!("  {kind}:");
            for name in names {
                println!("    {name}");
            }
        }
    }
}

fn print_json(
    matches: &[Entity],
    traversal: Option<&HashMap<String, Vec<String>>>,
) -> anyhow::Result<()> {
    let entities: Vec<serde_json::Value> = matches.iter().map(entity_json).collect();
    let mut data = serde_json::json!({ "matches": entities });
    if let Some(reached) = traversal {
        data["traversal"] = serde_json::to_value(reached)?;
    }
    println!("{}", serde_json::to_string_pretty(&data)?);
    Ok(())
}

fn entity_json(entity: &Entity) -> serde_json::Value {
    let mut value = serde_json::json!({
        "type": entity.kind.as_str(),
        "name": entity.name,
    });
    if let Some(span) = entity.span {
        value["span"] = serde_json::json!({
            "start_line": span.start_line,
            "end_line": span.end_line,
        });
    }
    value
}
