// Repograph MCP server — exposes the code knowledge graph as MCP tools
// for AI agents.
//
// Tools:
//   search_entities — look up entities by identity name or short name
//   traverse_graph  — bounded directional traversal from start entities

use std::path::PathBuf;
use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{ServerCapabilities, ServerInfo};
use rmcp::{ServerHandler, ServiceExt, schemars, tool, tool_router};
use serde::Deserialize;
use tracing::info;

use repograph_core::store::GraphStore;
use repograph_core::store::sqlite::SqliteStore;
use repograph_core::types::{Direction, Entity, EntityKind, RelationKind};

// ── Tool parameter types ──────────────────────────────────────────

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchParams {
    /// Identity names or unqualified short names to search for
    #[schemars(
        description = "Entity names to search for. Either full identities \
                       ('src/helpers/math.py:MathUtils.sum' or 'src/helpers/math.py') \
                       or unqualified names ('MathUtils', case-tolerant)."
    )]
    pub search_terms: Vec<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct TraverseParams {
    /// Entity identity names to start from
    #[schemars(
        description = "Entities to start the traversal from. Classes and functions \
                       are named 'file_path:QualifiedName'; files and directories by path."
    )]
    pub start_entities: Vec<String>,
    /// downstream (dependencies) or upstream (dependents)
    #[schemars(
        description = "Traversal direction: 'downstream' explores what the entities \
                       depend on, 'upstream' what depends on them (default: downstream)"
    )]
    pub direction: Option<String>,
    /// Maximum hops; -1 means unbounded (capped at 5)
    #[schemars(
        description = "Maximum traversal depth, clamped to 1..5. \
                       -1 means unbounded, which maps to 5 (default: 1)"
    )]
    pub traversal_depth: Option<i64>,
    /// Entity kinds to include
    #[schemars(
        description = "Entity kinds to include: directory, file, variable, function, \
                       class, unparsed (omit for all)"
    )]
    pub entity_type_filter: Option<Vec<String>>,
    /// Relationship kinds to follow
    #[schemars(
        description = "Relationship kinds to follow: contains, imports, inherits, \
                       references (omit for all)"
    )]
    pub dependency_type_filter: Option<Vec<String>>,
}

// ── Server struct ─────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RepographMcpServer {
    store: Arc<SqliteStore>,
    #[allow(dead_code)]
    tool_router: ToolRouter<Self>,
}

impl RepographMcpServer {
    /// Create a new MCP server backed by the given graph database.
    pub fn new(db_path: &std::path::Path) -> Result<Self, String> {
        let store =
            SqliteStore::open(db_path).map_err(|e| format!("Failed to open database: {e}"))?;
        Ok(Self {
            store: Arc::new(store),
            tool_router: Self::tool_router(),
        })
    }

    /// Create from an existing store (for testing).
    pub fn from_store(store: SqliteStore) -> Self {
        Self {
            store: Arc::new(store),
            tool_router: Self::tool_router(),
        }
    }
}

// ── Tool implementations ──────────────────────────────────────────

#[tool_router]
impl RepographMcpServer {
    #[tool(
        name = "search_entities",
        description = "Search the code graph for entities by name. Accepts full identities \
                       ('src/a.py:MyClass', 'src/a.py') or unqualified short names ('MyClass'). \
                       Returns matching entities with their kind and source span."
    )]
    async fn search_entities(&self, Parameters(params): Parameters<SearchParams>) -> String {
        match self.do_search(params).await {
            Ok(s) => s,
            Err(e) => format!("Error: {e}"),
        }
    }

    #[tool(
        name = "traverse_graph",
        description = "Explore the dependency structure around entities in the code graph. \
                       Traverses contains/imports/inherits/references edges downstream \
                       (dependencies) or upstream (dependents), up to 5 hops."
    )]
    async fn traverse_graph(&self, Parameters(params): Parameters<TraverseParams>) -> String {
        match self.do_traverse(params).await {
            Ok(s) => s,
            Err(e) => format!("Error: {e}"),
        }
    }
}

impl ServerHandler for RepographMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Repograph MCP server — read-only queries over a pre-built code \
                 knowledge graph. Use search_entities to find where something is \
                 defined, and traverse_graph to explore what it depends on \
                 (downstream) or what depends on it (upstream)."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

// ── Tool logic (separated for testability) ────────────────────────

impl RepographMcpServer {
    async fn do_search(&self, params: SearchParams) -> Result<String, String> {
        let mut results = Vec::new();

        for term in &params.search_terms {
            let term = term.trim();

            if let Some(entity) = self
                .store
                .get(term)
                .await
                .map_err(|e| format!("Store error: {e}"))?
            {
                results.push(entity_json(&entity));
            }

            let matches = self
                .store
                .find_by_short_name(term)
                .await
                .map_err(|e| format!("Store error: {e}"))?;
            for entity in &matches {
                // Exact identity hit above may also match by short name
                if entity.name != term {
                    results.push(entity_json(entity));
                }
            }
        }

        serde_json::to_string_pretty(&results).map_err(|e| format!("JSON error: {e}"))
    }

    async fn do_traverse(&self, params: TraverseParams) -> Result<String, String> {
        let direction = match params.direction.as_deref() {
            None => Direction::Downstream,
            Some(s) => Direction::parse(s)
                .ok_or_else(|| format!("Unknown direction '{s}'. Use: downstream, upstream"))?,
        };
        let depth = params.traversal_depth.unwrap_or(1);
        let entity_kinds = parse_kinds(params.entity_type_filter.as_deref(), EntityKind::parse)?;
        let relation_kinds =
            parse_kinds(params.dependency_type_filter.as_deref(), RelationKind::parse)?;

        let mut results = serde_json::Map::new();
        for start in &params.start_entities {
            let reached = self
                .store
                .traverse(start, direction, depth, &entity_kinds, &relation_kinds)
                .await
                .map_err(|e| format!("Store error: {e}"))?;
            results.insert(start.clone(), serde_json::json!(reached));
        }

        serde_json::to_string(&serde_json::Value::Object(results))
            .map_err(|e| format!("JSON error: {e}"))
    }
}

// ── Helpers ───────────────────────────────────────────────────────

fn entity_json(entity: &Entity) -> serde_json::Value {
    let mut value = serde_json::json!({
        "name": entity.name,
        "type": entity.kind.as_str(),
    });
    if let Some(span) = entity.span {
        value["span"] = serde_json::json!({
            "start_line": span.start_line,
            "end_line": span.end_line,
        });
    }
    value
}

fn parse_kinds<K>(
    terms: Option<&[String]>,
    parse: impl Fn(&str) -> Option<K>,
) -> Result<Vec<K>, String> {
    let Some(terms) = terms else {
        return Ok(Vec::new());
    };
    terms
        .iter()
        .map(|t| {
            parse(&t.to_lowercase()).ok_or_else(|| format!("Unknown kind filter entry '{t}'"))
        })
        .collect()
}

/// Start the MCP server on stdio transport.
pub async fn serve_stdio(db_path: &std::path::Path) -> Result<(), Box<dyn std::error::Error>> {
    let server = RepographMcpServer::new(db_path)?;
    info!("Starting repograph MCP server (stdio transport)");

    let transport = tokio::io::join(tokio::io::stdin(), tokio::io::stdout());
    let service = server.serve(transport).await?;
    service.waiting().await?;

    Ok(())
}

/// Resolve the graph database path from a repo path.
pub fn resolve_db_path(repo_path: &std::path::Path) -> Option<PathBuf> {
    let db = repo_path.join(".repograph/graph.db");
    if db.exists() { Some(db) } else { None }
}

// ── Tests ─────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use repograph_core::types::{RelationKind, Relationship, Span};

    async fn seeded_server() -> RepographMcpServer {
        let store = SqliteStore::in_memory().unwrap();

        let file = Entity::new(EntityKind::File, "pkg/a.py");
        let mut base = Entity::new(EntityKind::Class, "pkg/a.py:Base");
        base.span = Some(Span {
            start_line: 1,
            start_col: 1,
            end_line: 3,
            end_col: 9,
        });
        let child = Entity::new(EntityKind::Class, "pkg/b.py:Child");
        store
            .bulk_insert_entities(&[file.clone(), base.clone(), child.clone()])
            .await
            .unwrap();
        store
            .bulk_insert_relationships(&[
                Relationship::new(RelationKind::Contains, &file, &base),
                Relationship::new(RelationKind::Inherits, &child, &base),
            ])
            .await
            .unwrap();

        RepographMcpServer::from_store(store)
    }

    #[tokio::test]
    async fn search_by_exact_identity() {
        let server = seeded_server().await;
        let result = server
            .do_search(SearchParams {
                search_terms: vec!["pkg/a.py:Base".to_string()],
            })
            .await
            .unwrap();

        assert!(result.contains("pkg/a.py:Base"));
        assert!(result.contains("\"type\": \"class\""));
        assert!(result.contains("start_line"));
    }

    #[tokio::test]
    async fn search_by_short_name_is_case_tolerant() {
        let server = seeded_server().await;
        let result = server
            .do_search(SearchParams {
                search_terms: vec!["base".to_string()],
            })
            .await
            .unwrap();
        assert!(result.contains("pkg/a.py:Base"));
    }

    #[tokio::test]
    async fn search_unknown_term_is_empty() {
        let server = seeded_server().await;
        let result = server
            .do_search(SearchParams {
                search_terms: vec!["Nothing".to_string()],
            })
            .await
            .unwrap();
        assert_eq!(result.trim(), "[]");
    }

    #[tokio::test]
    async fn traverse_inheritance_edge() {
        let server = seeded_server().await;
        let result = server
            .do_traverse(TraverseParams {
                start_entities: vec!["pkg/b.py:Child".to_string()],
                direction: Some("downstream".to_string()),
                traversal_depth: Some(1),
                entity_type_filter: Some(vec!["class".to_string()]),
                dependency_type_filter: Some(vec!["inherits".to_string()]),
            })
            .await
            .unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&result).unwrap();
        assert_eq!(
            parsed["pkg/b.py:Child"]["class"],
            serde_json::json!(["pkg/a.py:Base"])
        );
    }

    #[tokio::test]
    async fn traverse_unknown_start_yields_empty_mapping() {
        let server = seeded_server().await;
        let result = server
            .do_traverse(TraverseParams {
                start_entities: vec!["missing.py".to_string()],
                direction: None,
                traversal_depth: None,
                entity_type_filter: None,
                dependency_type_filter: None,
            })
            .await
            .unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&result).unwrap();
        assert_eq!(parsed["missing.py"], serde_json::json!({}));
    }

    #[tokio::test]
    async fn traverse_negative_depth_is_unbounded_sentinel() {
        let server = seeded_server().await;
        let result = server
            .do_traverse(TraverseParams {
                start_entities: vec!["pkg/a.py".to_string()],
                direction: Some("downstream".to_string()),
                traversal_depth: Some(-1),
                entity_type_filter: None,
                dependency_type_filter: None,
            })
            .await
            .unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&result).unwrap();
        assert_eq!(
            parsed["pkg/a.py"]["class"],
            serde_json::json!(["pkg/a.py:Base"])
        );
    }

    #[tokio::test]
    async fn traverse_rejects_unknown_direction() {
        let server = seeded_server().await;
        let result = server
            .do_traverse(TraverseParams {
                start_entities: vec!["pkg/a.py".to_string()],
                direction: Some("sideways".to_string()),
                traversal_depth: None,
                entity_type_filter: None,
                dependency_type_filter: None,
            })
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn traverse_rejects_unknown_kind_filter() {
        let server = seeded_server().await;
        let result = server
            .do_traverse(TraverseParams {
                start_entities: vec!["pkg/a.py".to_string()],
                direction: None,
                traversal_depth: None,
                entity_type_filter: Some(vec!["widget".to_string()]),
                dependency_type_filter: None,
            })
            .await;
        assert!(result.is_err());
    }
}
