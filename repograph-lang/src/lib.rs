pub mod helpers;
pub mod python;

use serde::{Deserialize, Serialize};

pub use python::PythonFrontEnd;

/// Error type for the language front ends.
#[derive(thiserror::Error, Debug)]
pub enum LangError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),
}

pub type Result<T> = std::result::Result<T, LangError>;

// ── Span type ──────────────────────────────────────────────────────

/// Zero-based source range, as reported by tree-sitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextRange {
    pub start_row: usize,
    pub start_col: usize,
    pub end_row: usize,
    pub end_col: usize,
}

impl From<tree_sitter::Range> for TextRange {
    fn from(r: tree_sitter::Range) -> Self {
        Self {
            start_row: r.start_point.row,
            start_col: r.start_point.column,
            end_row: r.end_point.row,
            end_col: r.end_point.column,
        }
    }
}

// ── Outline types ──────────────────────────────────────────────────

/// One imported name, as written. A plain `import a, b` yields one record
/// per listed module; a from-form yields one record per imported name with
/// the module prefix folded into the specifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportDecl {
    /// Dotted target specifier to be resolved against the filesystem later.
    /// Relative imports keep their leading dots (`.sibling.helper`).
    pub specifier: String,
    /// The literal imported text: the module for plain imports, the bare
    /// name for from-imports.
    pub imported: String,
    pub alias: Option<String>,
}

/// A module-level simple assignment. Augmented assignments are not outlined.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VarDecl {
    pub name: String,
    pub text: String,
    pub range: TextRange,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FnDecl {
    pub name: String,
    pub text: String,
    pub range: TextRange,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassDecl {
    pub name: String,
    pub text: String,
    pub range: TextRange,
    /// Base-list expressions that are plain identifiers or dotted attributes,
    /// as source text. Other base forms (calls, subscripts) are not modeled.
    pub bases: Vec<String>,
    /// Function definitions found directly in the class body.
    pub methods: Vec<FnDecl>,
}

/// Language-neutral summary of one file's top-level declarations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileOutline {
    pub imports: Vec<ImportDecl>,
    pub variables: Vec<VarDecl>,
    pub functions: Vec<FnDecl>,
    pub classes: Vec<ClassDecl>,
}

// ── Front-end trait ────────────────────────────────────────────────

/// A pluggable grammar/query pair for one source language.
///
/// Implementations carry no parser state; `parse` builds a fresh
/// tree-sitter parser per call since parsers are not `Sync`.
pub trait FrontEnd: Send + Sync + std::fmt::Debug {
    /// Stable identifier, e.g. `"python"`.
    fn id(&self) -> &'static str;

    /// File extensions this front end handles, without the dot.
    fn extensions(&self) -> &'static [&'static str];

    fn tree_sitter_language(&self) -> tree_sitter::Language;

    /// Parse source text into a syntax tree. Tree-sitter produces a
    /// best-effort partial tree for malformed input; only a total parser
    /// failure is an error.
    fn parse(&self, source: &str) -> Result<tree_sitter::Tree>;

    /// Walk the tree's top-level statements into a declaration outline.
    fn outline(&self, tree: &tree_sitter::Tree, source: &str) -> FileOutline;

    /// Run the language's reference query over a code span, returning the
    /// identifier and dotted-attribute tokens used inside it, in document
    /// order.
    fn capture_references(&self, source: &str) -> Result<Vec<String>>;
}
