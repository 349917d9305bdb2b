use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ── Entity kinds ───────────────────────────────────────────────────

/// Every node in the knowledge graph is one of these kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// Placeholder for a symbol whose defining source could not be located.
    Unparsed,
    /// A directory in the repository tree.
    Directory,
    /// A source file, repository-relative (or absolute for external files).
    File,
    /// A module-level simple assignment.
    Variable,
    /// A function or method definition.
    Function,
    /// A class definition.
    Class,
}

impl EntityKind {
    pub const ALL: [Self; 6] = [
        Self::Unparsed,
        Self::Directory,
        Self::File,
        Self::Variable,
        Self::Function,
        Self::Class,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unparsed => "unparsed",
            Self::Directory => "directory",
            Self::File => "file",
            Self::Variable => "variable",
            Self::Function => "function",
            Self::Class => "class",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "unparsed" => Some(Self::Unparsed),
            "directory" => Some(Self::Directory),
            "file" => Some(Self::File),
            "variable" => Some(Self::Variable),
            "function" => Some(Self::Function),
            "class" => Some(Self::Class),
            _ => None,
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Span ───────────────────────────────────────────────────────────

/// One-based source span within an entity's defining file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start_line: usize,
    pub start_col: usize,
    pub end_line: usize,
    pub end_col: usize,
}

impl From<repograph_lang::TextRange> for Span {
    fn from(r: repograph_lang::TextRange) -> Self {
        Self {
            start_line: r.start_row + 1,
            start_col: r.start_col + 1,
            end_line: r.end_row + 1,
            end_col: r.end_col + 1,
        }
    }
}

// ── Entity ─────────────────────────────────────────────────────────

/// A node in the knowledge graph. Identity is exactly `(kind, name)`.
///
/// Name scheme: directories and files use repository-relative paths
/// (`a/b.py`); a module-level declaration uses `path:Identifier`; a nested
/// member uses `path:Outer.Inner`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub kind: EntityKind,
    pub name: String,
    /// Exact source text; blank for directories, placeholders, and external
    /// files whose body is deliberately not retained.
    pub source: String,
    pub span: Option<Span>,
}

impl Entity {
    pub fn new(kind: EntityKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            source: String::new(),
            span: None,
        }
    }

    /// Placeholder for a symbol whose definition could not be located.
    pub fn unparsed(name: impl Into<String>) -> Self {
        Self::new(EntityKind::Unparsed, name)
    }

    /// The last path or qualifier segment of the name.
    ///
    /// `a/b.py:Outer.Inner` → `Inner`; `pkg/mod.py` → `mod.py`.
    pub fn short_name(&self) -> &str {
        short_name_of(&self.name)
    }

    /// Derived short names: the last segment, plus its lower-cased form
    /// when different. Used for case-tolerant unqualified lookup.
    pub fn short_names(&self) -> Vec<String> {
        let short = self.short_name();
        let lower = short.to_lowercase();
        if lower == short {
            vec![short.to_string()]
        } else {
            vec![short.to_string(), lower]
        }
    }
}

/// Last segment of an entity name: the qualifier tail after `:` (dot-split),
/// or the last path component for directory/file names.
pub fn short_name_of(name: &str) -> &str {
    match name.rsplit_once(':') {
        Some((_, qualifier)) => qualifier.rsplit('.').next().unwrap_or(qualifier),
        None => name.rsplit('/').next().unwrap_or(name),
    }
}

// ── Relationships ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationKind {
    /// Structural nesting: directory→file, file→declaration, class→method.
    Contains,
    /// File → imported target entity; carries the literal name and alias.
    Imports,
    /// Class → superclass entity (real or placeholder).
    Inherits,
    /// Declared entity → entity its body mentions.
    References,
}

impl RelationKind {
    pub const ALL: [Self; 4] = [
        Self::Contains,
        Self::Imports,
        Self::Inherits,
        Self::References,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Contains => "contains",
            Self::Imports => "imports",
            Self::Inherits => "inherits",
            Self::References => "references",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "contains" => Some(Self::Contains),
            "imports" => Some(Self::Imports),
            "inherits" => Some(Self::Inherits),
            "references" => Some(Self::References),
            _ => None,
        }
    }
}

impl std::fmt::Display for RelationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed edge between two entities, addressed by their identity names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub kind: RelationKind,
    pub from: String,
    pub from_kind: EntityKind,
    pub to: String,
    pub to_kind: EntityKind,
    /// Literal imported text (IMPORTS only).
    pub import: Option<String>,
    /// Import alias (IMPORTS only).
    pub alias: Option<String>,
}

impl Relationship {
    pub fn new(kind: RelationKind, from: &Entity, to: &Entity) -> Self {
        Self {
            kind,
            from: from.name.clone(),
            from_kind: from.kind,
            to: to.name.clone(),
            to_kind: to.kind,
            import: None,
            alias: None,
        }
    }

    /// Composite endpoint-kind tag used to partition bulk edge loads.
    pub fn pair_tag(&self) -> String {
        format!("{}_{}", self.from_kind.as_str(), self.to_kind.as_str())
    }
}

// ── Traversal direction ────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Entity → its dependencies (follow edges forward).
    Downstream,
    /// Dependents of the entity (follow edges backward).
    Upstream,
}

impl Direction {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "downstream" => Some(Self::Downstream),
            "upstream" => Some(Self::Upstream),
            _ => None,
        }
    }
}

// ── Raw intermediate records ───────────────────────────────────────

/// An import statement awaiting module resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImport {
    /// Name of the containing File entity.
    pub file: String,
    /// Dotted specifier, possibly relative (leading dots).
    pub specifier: String,
    /// Literal imported text.
    pub imported: String,
    pub alias: Option<String>,
}

/// A superclass expression awaiting inheritance resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawInherit {
    /// Name of the declaring Class entity.
    pub class_name: String,
    /// Name of the declaring File entity.
    pub file: String,
    /// Base-list expression text: `Name` or `Mod.Name`.
    pub superclass: String,
}

// ── Build statistics ───────────────────────────────────────────────

/// Outcome of one full build. Per-file failures don't abort the pipeline.
#[derive(Debug, Default)]
pub struct BuildStats {
    pub files_parsed: u64,
    pub entities: u64,
    /// Edge counts keyed by relationship kind.
    pub relationships: HashMap<String, u64>,
    /// Files skipped during the walk, with the reason.
    pub skipped: Vec<(PathBuf, String)>,
}

impl BuildStats {
    pub fn relationship_total(&self) -> u64 {
        self.relationships.values().sum()
    }
}

/// Summary statistics for the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreStats {
    pub total_entities: u64,
    pub total_relationships: u64,
    pub entities_by_kind: HashMap<String, u64>,
    pub relationships_by_kind: HashMap<String, u64>,
}

// ── Tests ──────────────────────────────────────────────────────────
