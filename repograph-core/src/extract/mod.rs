pub mod declarations;
pub mod walker;

use std::path::{Path, PathBuf};

use repograph_lang::FrontEnd;
use tracing::{info, instrument, warn};

use crate::config::RepographConfig;
use crate::types::{Entity, RawImport, RawInherit, Relationship};

use self::walker::RepoWalker;

/// Everything the declaration pass contributes: the full entity and
/// CONTAINS edge set, plus the raw records the resolution passes consume.
#[derive(Debug, Default)]
pub struct ExtractOutput {
    pub entities: Vec<Entity>,
    pub relationships: Vec<Relationship>,
    pub imports: Vec<RawImport>,
    pub inherits: Vec<RawInherit>,
    pub files_parsed: u64,
    /// Per-file failures; these never abort the pass.
    pub skipped: Vec<(PathBuf, String)>,
}

/// Declaration extractor: walks the repository and outlines every source
/// file the front end handles.
#[derive(Debug)]
pub struct RepoExtractor<'a> {
    repo_root: PathBuf,
    front_end: &'a dyn FrontEnd,
}

impl<'a> RepoExtractor<'a> {
    pub fn new(repo_root: &Path, front_end: &'a dyn FrontEnd) -> Self {
        Self {
            repo_root: repo_root.to_path_buf(),
            front_end,
        }
    }

    /// Run the declaration pass over the whole repository.
    #[instrument(skip_all, name = "extract")]
    pub fn extract(&self, config: &RepographConfig) -> crate::error::Result<ExtractOutput> {
        let walker = RepoWalker::new(&self.repo_root, &config.walk, self.front_end.extensions())?;
        let walked = walker.walk()?;

        let mut out = ExtractOutput {
            entities: walked.entities,
            relationships: walked.relationships,
            skipped: walked.skipped,
            ..ExtractOutput::default()
        };

        for path in &walked.files {
            let file_name = walker.relative_name(path);
            let source = match std::fs::read_to_string(path) {
                Ok(source) => source,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable file");
                    out.skipped.push((path.clone(), e.to_string()));
                    continue;
                }
            };

            match declarations::extract_file(self.front_end, &file_name, &source) {
                Ok(extraction) => {
                    out.entities.extend(extraction.entities);
                    out.relationships.extend(extraction.relationships);
                    out.imports.extend(extraction.imports);
                    out.inherits.extend(extraction.inherits);
                    out.files_parsed += 1;
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unparsable file");
                    out.skipped.push((path.clone(), e.to_string()));
                }
            }
        }

        info!(
            files = out.files_parsed,
            entities = out.entities.len(),
            contains_edges = out.relationships.len(),
            raw_imports = out.imports.len(),
            raw_inherits = out.inherits.len(),
            skipped = out.skipped.len(),
            "Declaration extraction complete"
        );
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EntityKind;
    use repograph_lang::PythonFrontEnd;

    #[test]
    fn extracts_a_small_repository() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("pkg")).unwrap();
        std::fs::write(
            tmp.path().join("pkg/a.py"),
            "class Base:\n    def ping(self):\n        pass\n",
        )
        .unwrap();
        std::fs::write(
            tmp.path().join("pkg/b.py"),
            "from pkg.a import Base as B\n\nclass Child(B):\n    pass\n",
        )
        .unwrap();

        let front_end = PythonFrontEnd;
        let extractor = RepoExtractor::new(tmp.path(), &front_end);
        let out = extractor.extract(&RepographConfig::default()).unwrap();

        assert_eq!(out.files_parsed, 2);
        assert!(out.skipped.is_empty());

        let class_names: Vec<&str> = out
            .entities
            .iter()
            .filter(|e| e.kind == EntityKind::Class)
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(class_names, vec!["pkg/a.py:Base", "pkg/b.py:Child"]);

        assert_eq!(out.imports.len(), 1);
        assert_eq!(out.imports[0].file, "pkg/b.py");
        assert_eq!(out.imports[0].specifier, "pkg.a.Base");

        assert_eq!(out.inherits.len(), 1);
        assert_eq!(out.inherits[0].superclass, "B");
    }

    #[test]
    fn unreadable_file_is_a_diagnostic_not_an_abort() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("good.py"), "x = 1\n").unwrap();
        // Invalid UTF-8 makes read_to_string fail
        std::fs::write(tmp.path().join("bad.py"), [0xff, 0xfe, 0x00]).unwrap();

        let front_end = PythonFrontEnd;
        let extractor = RepoExtractor::new(tmp.path(), &front_end);
        let out = extractor.extract(&RepographConfig::default()).unwrap();

        assert_eq!(out.files_parsed, 1);
        assert_eq!(out.skipped.len(), 1);
        assert!(out.skipped[0].0.ends_with("bad.py"));
    }
}
