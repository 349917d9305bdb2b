/// Current schema version.
pub const SCHEMA_VERSION: &str = "1";

/// Full SQL schema for repograph's `SQLite` database.
pub const SCHEMA_SQL: &str = r"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS repograph_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

-- All entities in the graph. Identity is (kind, name); re-extraction
-- refreshes attributes for the same key instead of forking rows.
CREATE TABLE IF NOT EXISTS entities (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    kind TEXT NOT NULL,
    name TEXT NOT NULL,
    source TEXT NOT NULL DEFAULT '',
    start_line INTEGER,
    start_col INTEGER,
    end_line INTEGER,
    end_col INTEGER,
    UNIQUE(kind, name)
);
CREATE INDEX IF NOT EXISTS idx_entities_kind ON entities(kind);
CREATE INDEX IF NOT EXISTS idx_entities_name ON entities(name);

-- Derived short names for case-tolerant unqualified lookup
CREATE TABLE IF NOT EXISTS entity_short_names (
    entity_id INTEGER NOT NULL REFERENCES entities(id) ON DELETE CASCADE,
    short_name TEXT NOT NULL,
    PRIMARY KEY (entity_id, short_name)
);
CREATE INDEX IF NOT EXISTS idx_esn_short ON entity_short_names(short_name);

-- Typed edges, append-only, partitioned by the composite endpoint-kind
-- pair tag for bulk loading
CREATE TABLE IF NOT EXISTS relationships (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    kind TEXT NOT NULL,
    pair TEXT NOT NULL,
    from_name TEXT NOT NULL,
    from_kind TEXT NOT NULL,
    to_name TEXT NOT NULL,
    to_kind TEXT NOT NULL,
    import TEXT,
    alias TEXT
);
CREATE INDEX IF NOT EXISTS idx_rel_from ON relationships(from_name, kind);
CREATE INDEX IF NOT EXISTS idx_rel_to ON relationships(to_name, kind);
CREATE INDEX IF NOT EXISTS idx_rel_kind ON relationships(kind);
";

/// `SQLite` PRAGMAs for performance.
pub const PRAGMAS_SQL: &str = r"
PRAGMA journal_mode = WAL;
PRAGMA synchronous = NORMAL;
PRAGMA cache_size = -64000;
PRAGMA foreign_keys = ON;
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_executes_on_in_memory_sqlite() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();

        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        conn.execute_batch(SCHEMA_SQL).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        assert!(tables.contains(&"entities".to_string()));
        assert!(tables.contains(&"entity_short_names".to_string()));
        assert!(tables.contains(&"relationships".to_string()));
        assert!(tables.contains(&"repograph_meta".to_string()));
    }

    #[test]
    fn entity_identity_is_unique_per_kind_and_name() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA_SQL).unwrap();

        conn.execute(
            "INSERT INTO entities (kind, name) VALUES ('class', 'a.py:C')",
            [],
        )
        .unwrap();
        let dup = conn.execute(
            "INSERT INTO entities (kind, name) VALUES ('class', 'a.py:C')",
            [],
        );
        assert!(dup.is_err());

        // Same name under a different kind is a distinct identity
        conn.execute(
            "INSERT INTO entities (kind, name) VALUES ('unparsed', 'a.py:C')",
            [],
        )
        .unwrap();
    }

    #[test]
    fn schema_version_is_set() {
        assert_eq!(SCHEMA_VERSION, "1");
    }
}
