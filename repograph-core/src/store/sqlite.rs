use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::Mutex;

use rusqlite::{Connection, OptionalExtension, params};

use crate::error::StoreError;
use crate::types::{
    Direction, Entity, EntityKind, RelationKind, Relationship, Span, StoreStats,
};

use super::GraphStore;
use super::schema;

/// SQLite-backed implementation of `GraphStore`.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a store at the given path.
    pub fn open(path: &Path) -> crate::error::Result<Self> {
        let conn = Connection::open(path).map_err(StoreError::Sqlite)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing).
    pub fn in_memory() -> crate::error::Result<Self> {
        let conn = Connection::open_in_memory().map_err(StoreError::Sqlite)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize()?;
        Ok(store)
    }

    fn initialize(&self) -> crate::error::Result<()> {
        let conn = self.conn.lock().expect("repograph store mutex poisoned");

        conn.execute_batch(schema::PRAGMAS_SQL)
            .map_err(StoreError::Sqlite)?;
        conn.execute_batch(schema::SCHEMA_SQL)
            .map_err(StoreError::Sqlite)?;

        conn.execute(
            "INSERT OR IGNORE INTO repograph_meta (key, value) VALUES ('schema_version', ?1)",
            params![schema::SCHEMA_VERSION],
        )
        .map_err(StoreError::Sqlite)?;

        Ok(())
    }

    /// Helper: read a full entity from a row.
    fn row_to_entity(row: &rusqlite::Row<'_>) -> rusqlite::Result<Entity> {
        let kind_str: String = row.get("kind")?;
        let start_line: Option<i64> = row.get("start_line")?;
        let start_col: Option<i64> = row.get("start_col")?;
        let end_line: Option<i64> = row.get("end_line")?;
        let end_col: Option<i64> = row.get("end_col")?;

        #[allow(clippy::cast_sign_loss)]
        let span = match (start_line, start_col, end_line, end_col) {
            (Some(sl), Some(sc), Some(el), Some(ec)) => Some(Span {
                start_line: sl as usize,
                start_col: sc as usize,
                end_line: el as usize,
                end_col: ec as usize,
            }),
            _ => None,
        };

        Ok(Entity {
            kind: EntityKind::parse(&kind_str).unwrap_or(EntityKind::Unparsed),
            name: row.get("name")?,
            source: row.get("source")?,
            span,
        })
    }

    /// Upsert one entity within an open connection/transaction and refresh
    /// its derived short names.
    fn upsert_in_conn(conn: &Connection, entity: &Entity) -> rusqlite::Result<()> {
        #[allow(clippy::cast_possible_wrap)]
        let (sl, sc, el, ec) = match entity.span {
            Some(s) => (
                Some(s.start_line as i64),
                Some(s.start_col as i64),
                Some(s.end_line as i64),
                Some(s.end_col as i64),
            ),
            None => (None, None, None, None),
        };

        conn.execute(
            "INSERT INTO entities (kind, name, source, start_line, start_col, end_line, end_col)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(kind, name) DO UPDATE SET
                source = excluded.source,
                start_line = excluded.start_line,
                start_col = excluded.start_col,
                end_line = excluded.end_line,
                end_col = excluded.end_col",
            params![
                entity.kind.as_str(),
                entity.name,
                entity.source,
                sl,
                sc,
                el,
                ec
            ],
        )?;

        // ON CONFLICT UPDATE doesn't report the row id — re-query by identity
        let entity_id: i64 = conn.query_row(
            "SELECT id FROM entities WHERE kind = ?1 AND name = ?2",
            params![entity.kind.as_str(), entity.name],
            |row| row.get(0),
        )?;

        conn.execute(
            "DELETE FROM entity_short_names WHERE entity_id = ?1",
            params![entity_id],
        )?;
        let mut insert_short = conn.prepare_cached(
            "INSERT OR IGNORE INTO entity_short_names (entity_id, short_name) VALUES (?1, ?2)",
        )?;
        for short in entity.short_names() {
            insert_short.execute(params![entity_id, short])?;
        }

        Ok(())
    }

    /// Helper: read a relationship from a row.
    fn row_to_relationship(row: &rusqlite::Row<'_>) -> rusqlite::Result<Relationship> {
        let kind_str: String = row.get("kind")?;
        let from_kind_str: String = row.get("from_kind")?;
        let to_kind_str: String = row.get("to_kind")?;

        Ok(Relationship {
            kind: RelationKind::parse(&kind_str).unwrap_or(RelationKind::Contains),
            from: row.get("from_name")?,
            from_kind: EntityKind::parse(&from_kind_str).unwrap_or(EntityKind::Unparsed),
            to: row.get("to_name")?,
            to_kind: EntityKind::parse(&to_kind_str).unwrap_or(EntityKind::Unparsed),
            import: row.get("import")?,
            alias: row.get("alias")?,
        })
    }

    /// Build an `AND kind IN (...)` clause from a relation-kind filter.
    /// Kind names are static strings from a closed enum, safe to inline.
    fn relation_filter_clause(kinds: &[RelationKind]) -> String {
        if kinds.is_empty() {
            String::new()
        } else {
            let list = kinds
                .iter()
                .map(|k| format!("'{}'", k.as_str()))
                .collect::<Vec<_>>()
                .join(", ");
            format!(" AND kind IN ({list})")
        }
    }
}

#[async_trait::async_trait]
impl GraphStore for SqliteStore {
    // ── Entity operations ──────────────────────────────────────────

    async fn upsert_entity(&self, entity: &Entity) -> crate::error::Result<()> {
        let conn = self.conn.lock().expect("repograph store mutex poisoned");
        Self::upsert_in_conn(&conn, entity).map_err(StoreError::Sqlite)?;
        Ok(())
    }

    async fn bulk_insert_entities(&self, entities: &[Entity]) -> crate::error::Result<u64> {
        let conn = self.conn.lock().expect("repograph store mutex poisoned");
        let tx = conn.unchecked_transaction().map_err(StoreError::Sqlite)?;

        let mut written = 0u64;
        // Grouped by kind so each record collection loads contiguously
        for kind in EntityKind::ALL {
            for entity in entities.iter().filter(|e| e.kind == kind) {
                Self::upsert_in_conn(&tx, entity).map_err(StoreError::Sqlite)?;
                written += 1;
            }
        }

        tx.commit().map_err(StoreError::Sqlite)?;
        Ok(written)
    }

    async fn get(&self, name: &str) -> crate::error::Result<Option<Entity>> {
        let conn = self.conn.lock().expect("repograph store mutex poisoned");
        let entity = conn
            .query_row(
                "SELECT kind, name, source, start_line, start_col, end_line, end_col
                 FROM entities WHERE name = ?1 ORDER BY id LIMIT 1",
                params![name],
                Self::row_to_entity,
            )
            .optional()
            .map_err(StoreError::Sqlite)?;
        Ok(entity)
    }

    async fn exists(&self, name: &str) -> crate::error::Result<bool> {
        let conn = self.conn.lock().expect("repograph store mutex poisoned");
        let exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM entities WHERE name = ?1)",
                params![name],
                |row| row.get(0),
            )
            .map_err(StoreError::Sqlite)?;
        Ok(exists)
    }

    async fn find_by_short_name(&self, term: &str) -> crate::error::Result<Vec<Entity>> {
        let conn = self.conn.lock().expect("repograph store mutex poisoned");
        let mut stmt = conn
            .prepare(
                "SELECT DISTINCT e.id, e.kind, e.name, e.source,
                        e.start_line, e.start_col, e.end_line, e.end_col
                 FROM entities e
                 JOIN entity_short_names s ON s.entity_id = e.id
                 WHERE s.short_name = ?1 OR s.short_name = ?2
                 ORDER BY e.id",
            )
            .map_err(StoreError::Sqlite)?;
        let entities = stmt
            .query_map(params![term, term.to_lowercase()], Self::row_to_entity)
            .map_err(StoreError::Sqlite)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(StoreError::Sqlite)?;
        Ok(entities)
    }

    // ── Relationship operations ────────────────────────────────────

    async fn bulk_insert_relationships(
        &self,
        relationships: &[Relationship],
    ) -> crate::error::Result<u64> {
        let conn = self.conn.lock().expect("repograph store mutex poisoned");
        let tx = conn.unchecked_transaction().map_err(StoreError::Sqlite)?;

        // Partition by (kind, endpoint pair tag) the way the bulk load
        // format is defined
        let mut groups: BTreeMap<(String, String), Vec<&Relationship>> = BTreeMap::new();
        for rel in relationships {
            groups
                .entry((rel.kind.as_str().to_string(), rel.pair_tag()))
                .or_default()
                .push(rel);
        }

        let mut written = 0u64;
        {
            let mut insert = tx
                .prepare_cached(
                    "INSERT INTO relationships
                        (kind, pair, from_name, from_kind, to_name, to_kind, import, alias)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                )
                .map_err(StoreError::Sqlite)?;
            for ((kind, pair), rels) in &groups {
                for rel in rels {
                    insert
                        .execute(params![
                            kind,
                            pair,
                            rel.from,
                            rel.from_kind.as_str(),
                            rel.to,
                            rel.to_kind.as_str(),
                            rel.import,
                            rel.alias
                        ])
                        .map_err(StoreError::Sqlite)?;
                    written += 1;
                }
            }
        }

        tx.commit().map_err(StoreError::Sqlite)?;
        Ok(written)
    }

    async fn relationships_from(
        &self,
        from: &str,
        kinds: &[RelationKind],
    ) -> crate::error::Result<Vec<Relationship>> {
        let conn = self.conn.lock().expect("repograph store mutex poisoned");
        let sql = format!(
            "SELECT kind, from_name, from_kind, to_name, to_kind, import, alias
             FROM relationships WHERE from_name = ?1{} ORDER BY id",
            Self::relation_filter_clause(kinds)
        );
        let mut stmt = conn.prepare(&sql).map_err(StoreError::Sqlite)?;
        let rels = stmt
            .query_map(params![from], Self::row_to_relationship)
            .map_err(StoreError::Sqlite)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(StoreError::Sqlite)?;
        Ok(rels)
    }

    async fn containing_file(&self, name: &str) -> crate::error::Result<Option<Entity>> {
        let conn = self.conn.lock().expect("repograph store mutex poisoned");

        // One indirection allowed: method → class → file
        let mut current = name.to_string();
        for _ in 0..2 {
            let row: Option<(String, String)> = conn
                .query_row(
                    "SELECT from_name, from_kind FROM relationships
                     WHERE kind = 'contains' AND to_name = ?1 LIMIT 1",
                    params![current],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()
                .map_err(StoreError::Sqlite)?;

            match row {
                Some((from, from_kind)) if from_kind == "file" => {
                    let entity = conn
                        .query_row(
                            "SELECT kind, name, source, start_line, start_col, end_line, end_col
                             FROM entities WHERE kind = 'file' AND name = ?1",
                            params![from],
                            Self::row_to_entity,
                        )
                        .optional()
                        .map_err(StoreError::Sqlite)?;
                    return Ok(entity);
                }
                Some((from, _)) => current = from,
                None => return Ok(None),
            }
        }

        Ok(None)
    }

    // ── Traversal ──────────────────────────────────────────────────

    async fn traverse(
        &self,
        start: &str,
        direction: Direction,
        depth: i64,
        entity_kinds: &[EntityKind],
        relation_kinds: &[RelationKind],
    ) -> crate::error::Result<HashMap<String, Vec<String>>> {
        // Negative means unbounded; the hard ceiling bounds query cost
        let depth = if depth < 0 { 5 } else { depth.clamp(1, 5) };

        let conn = self.conn.lock().expect("repograph store mutex poisoned");

        let known: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM entities WHERE name = ?1)",
                params![start],
                |row| row.get(0),
            )
            .map_err(StoreError::Sqlite)?;
        if !known {
            return Ok(HashMap::new());
        }

        let (match_col, out_name, out_kind) = match direction {
            Direction::Downstream => ("from_name", "to_name", "to_kind"),
            Direction::Upstream => ("to_name", "from_name", "from_kind"),
        };
        let sql = format!(
            "SELECT {out_name}, {out_kind} FROM relationships
             WHERE {match_col} = ?1{} ORDER BY id",
            Self::relation_filter_clause(relation_kinds)
        );
        let mut stmt = conn.prepare(&sql).map_err(StoreError::Sqlite)?;

        let mut results: HashMap<String, Vec<String>> = HashMap::new();
        let mut frontier: Vec<String> = vec![start.to_string()];

        for _ in 0..depth {
            let mut next: HashSet<String> = HashSet::new();
            for name in &frontier {
                let reached = stmt
                    .query_map(params![name], |row| {
                        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                    })
                    .map_err(StoreError::Sqlite)?
                    .collect::<rusqlite::Result<Vec<_>>>()
                    .map_err(StoreError::Sqlite)?;

                for (target, kind_str) in reached {
                    let Some(kind) = EntityKind::parse(&kind_str) else {
                        continue;
                    };
                    // The kind filter selects what is reported, not what is
                    // expanded: filtered-out nodes still route the walk
                    if entity_kinds.is_empty() || entity_kinds.contains(&kind) {
                        results
                            .entry(kind_str)
                            .or_default()
                            .push(target.clone());
                    }
                    next.insert(target);
                }
            }
            if next.is_empty() {
                break;
            }
            frontier = next.into_iter().collect();
        }

        Ok(results)
    }

    // ── Maintenance ────────────────────────────────────────────────

    async fn clear_all(&self) -> crate::error::Result<()> {
        let conn = self.conn.lock().expect("repograph store mutex poisoned");
        conn.execute_batch(
            "DELETE FROM relationships;
             DELETE FROM entity_short_names;
             DELETE FROM entities;",
        )
        .map_err(StoreError::Sqlite)?;
        Ok(())
    }

    async fn stats(&self) -> crate::error::Result<StoreStats> {
        let conn = self.conn.lock().expect("repograph store mutex poisoned");

        let total_entities: u64 = conn
            .query_row("SELECT COUNT(*) FROM entities", [], |row| row.get(0))
            .map_err(StoreError::Sqlite)?;
        let total_relationships: u64 = conn
            .query_row("SELECT COUNT(*) FROM relationships", [], |row| row.get(0))
            .map_err(StoreError::Sqlite)?;

        let mut entities_by_kind = HashMap::new();
        let mut stmt = conn
            .prepare("SELECT kind, COUNT(*) FROM entities GROUP BY kind")
            .map_err(StoreError::Sqlite)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, u64>(1)?))
            })
            .map_err(StoreError::Sqlite)?;
        for row in rows {
            let (kind, count) = row.map_err(StoreError::Sqlite)?;
            entities_by_kind.insert(kind, count);
        }

        let mut relationships_by_kind = HashMap::new();
        let mut stmt = conn
            .prepare("SELECT kind, COUNT(*) FROM relationships GROUP BY kind")
            .map_err(StoreError::Sqlite)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, u64>(1)?))
            })
            .map_err(StoreError::Sqlite)?;
        for row in rows {
            let (kind, count) = row.map_err(StoreError::Sqlite)?;
            relationships_by_kind.insert(kind, count);
        }

        Ok(StoreStats {
            total_entities,
            total_relationships,
            entities_by_kind,
            relationships_by_kind,
        })
    }
}

// ── Tests ──────────────────────────────────────────────────────────
