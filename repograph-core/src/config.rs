use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Top-level repograph configuration, matching `.repograph/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepographConfig {
    #[serde(default)]
    pub repograph: RepographSection,
    #[serde(default)]
    pub walk: WalkSection,
    #[serde(default)]
    pub resolver: ResolverSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepographSection {
    pub version: String,
}

impl Default for RepographSection {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_string(),
        }
    }
}

/// Repository walk settings: which files enter the graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkSection {
    /// Path-segment glob patterns excluded from the walk.
    pub exclude_patterns: Vec<String>,
}

impl Default for WalkSection {
    fn default() -> Self {
        Self {
            exclude_patterns: vec![
                "__pycache__".into(),
                ".git".into(),
                ".venv".into(),
                "venv".into(),
                "node_modules".into(),
                "build".into(),
                "dist".into(),
                ".repograph".into(),
                ".*".into(),
            ],
        }
    }
}

/// Module resolution settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolverSection {
    /// External roots searched for imports that don't resolve inside the
    /// repository (site-packages directories and the like).
    pub search_paths: Vec<PathBuf>,
}

impl RepographConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::NotFound(path.display().to_string()))?;
        let config: Self =
            toml::from_str(&text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Ok(config)
    }

    /// Load `.repograph/config.toml` under the repo root, or defaults if absent.
    pub fn load_or_default(repo_root: &Path) -> Result<Self> {
        let path = repo_root.join(".repograph/config.toml");
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }
}
