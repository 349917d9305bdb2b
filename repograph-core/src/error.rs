/// Top-level repograph error type.
///
/// All fallible operations in `repograph-core` return
/// [`Result<T, RepographError>`](Result). Each variant wraps a
/// domain-specific error enum, allowing callers to match on the error
/// source without losing type information.
#[derive(thiserror::Error, Debug)]
pub enum RepographError {
    /// Error from the graph store layer (`SQLite` operations).
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Error during repository walking or declaration extraction.
    #[error("Extraction error: {0}")]
    Extract(#[from] ExtractError),

    /// Error during import/inheritance/reference resolution.
    #[error("Resolution error: {0}")]
    Resolve(#[from] ResolveError),

    /// Error from a language front end (tree-sitter parsing, queries).
    #[error("Language error: {0}")]
    Lang(#[from] repograph_lang::LangError),

    /// Error in configuration parsing or validation.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors from the SQLite-backed graph store.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// Underlying `SQLite` operation failed.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Schema creation or migration failed.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// A stored row carried a kind tag outside the entity vocabulary.
    #[error("Unknown entity kind in store: {0}")]
    UnknownKind(String),
}

/// Errors during the extraction pass.
#[derive(thiserror::Error, Debug)]
pub enum ExtractError {
    /// Source file could not be parsed at all (tree-sitter failure).
    #[error("Parse error in {path}: {message}")]
    Parse {
        /// Path of the file that failed to parse.
        path: String,
        /// Description of the parse failure.
        message: String,
    },

    /// Filesystem I/O error during the walk.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An ignore pattern in the configuration is not a valid glob.
    #[error("Invalid ignore pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}

/// Errors during the resolution passes.
#[derive(thiserror::Error, Debug)]
pub enum ResolveError {
    /// An entity queued for resolution vanished from the store.
    #[error("Entity not found in store: {0}")]
    MissingEntity(String),
}

/// Errors in repograph configuration parsing and validation.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The configuration file does not exist at the expected path.
    #[error("Config file not found: {0}")]
    NotFound(String),

    /// Configuration values are present but semantically invalid.
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// Configuration file syntax could not be parsed (TOML error).
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Convenience alias for `Result<T, RepographError>`.
pub type Result<T> = std::result::Result<T, RepographError>;
