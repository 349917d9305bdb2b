use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::WalkSection;
use crate::error::ExtractError;
use crate::types::{Entity, EntityKind, RelationKind, Relationship};

/// Result of one repository walk: the directory skeleton of the graph plus
/// the source files queued for declaration extraction.
#[derive(Debug, Default)]
pub struct WalkOutput {
    /// Directory entities, root first.
    pub entities: Vec<Entity>,
    /// CONTAINS edges: directory→directory and directory→file.
    pub relationships: Vec<Relationship>,
    /// Absolute paths of source files to extract, in walk order.
    pub files: Vec<PathBuf>,
    /// Paths skipped with the reason (unreadable, not a walk abort).
    pub skipped: Vec<(PathBuf, String)>,
}

/// Recursive repository walker. Builds Directory entities and their
/// CONTAINS edges, and collects files whose extension one of the
/// registered front ends handles.
#[derive(Debug)]
pub struct RepoWalker {
    repo_root: PathBuf,
    exclude: Vec<glob::Pattern>,
    extensions: Vec<String>,
}

impl RepoWalker {
    pub fn new(
        repo_root: &Path,
        walk: &WalkSection,
        extensions: &[&str],
    ) -> crate::error::Result<Self> {
        let exclude = walk
            .exclude_patterns
            .iter()
            .map(|p| glob::Pattern::new(p))
            .collect::<Result<Vec<_>, _>>()
            .map_err(ExtractError::Pattern)?;
        Ok(Self {
            repo_root: repo_root.to_path_buf(),
            exclude,
            extensions: extensions.iter().map(|e| (*e).to_string()).collect(),
        })
    }

    /// Walk the repository tree from the root.
    pub fn walk(&self) -> crate::error::Result<WalkOutput> {
        let mut output = WalkOutput::default();

        let root_entity = Entity::new(EntityKind::Directory, ".");
        output.entities.push(root_entity.clone());
        self.walk_dir(&self.repo_root.clone(), &root_entity, &mut output)?;

        debug!(
            directories = output.entities.len(),
            files = output.files.len(),
            skipped = output.skipped.len(),
            "Repository walk complete"
        );
        Ok(output)
    }

    fn walk_dir(
        &self,
        dir: &Path,
        dir_entity: &Entity,
        output: &mut WalkOutput,
    ) -> crate::error::Result<()> {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "Skipping unreadable directory");
                output.skipped.push((dir.to_path_buf(), e.to_string()));
                return Ok(());
            }
        };

        // Sorted for a deterministic walk order
        let mut paths: Vec<PathBuf> = entries.flatten().map(|e| e.path()).collect();
        paths.sort();

        for path in paths {
            let Some(segment) = path.file_name().map(|n| n.to_string_lossy().to_string()) else {
                continue;
            };
            if self.is_excluded(&segment) {
                continue;
            }

            if path.is_dir() {
                let child = Entity::new(EntityKind::Directory, self.relative_name(&path));
                output.relationships.push(Relationship::new(
                    RelationKind::Contains,
                    dir_entity,
                    &child,
                ));
                output.entities.push(child.clone());
                self.walk_dir(&path, &child, output)?;
            } else if self.handles_extension(&path) {
                let file = Entity::new(EntityKind::File, self.relative_name(&path));
                output.relationships.push(Relationship::new(
                    RelationKind::Contains,
                    dir_entity,
                    &file,
                ));
                output.files.push(path);
            }
        }

        Ok(())
    }

    /// Repository-relative entity name for a walked path.
    pub fn relative_name(&self, path: &Path) -> String {
        path.strip_prefix(&self.repo_root)
            .unwrap_or(path)
            .to_string_lossy()
            .to_string()
    }

    fn is_excluded(&self, segment: &str) -> bool {
        self.exclude.iter().any(|p| p.matches(segment))
    }

    fn handles_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|known| known == ext))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walker(root: &Path) -> RepoWalker {
        RepoWalker::new(root, &WalkSection::default(), &["py"]).unwrap()
    }

    #[test]
    fn walk_collects_python_files_and_directories() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("pkg/sub")).unwrap();
        std::fs::write(tmp.path().join("main.py"), "x = 1\n").unwrap();
        std::fs::write(tmp.path().join("pkg/a.py"), "y = 2\n").unwrap();
        std::fs::write(tmp.path().join("pkg/sub/b.py"), "z = 3\n").unwrap();
        std::fs::write(tmp.path().join("README.md"), "# readme\n").unwrap();

        let output = walker(tmp.path()).walk().unwrap();

        let dir_names: Vec<&str> = output.entities.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(dir_names, vec![".", "pkg", "pkg/sub"]);

        let file_names: Vec<String> = output
            .files
            .iter()
            .map(|p| walker(tmp.path()).relative_name(p))
            .collect();
        assert_eq!(file_names, vec!["main.py", "pkg/a.py", "pkg/sub/b.py"]);

        // dir→dir and dir→file edges: .→main.py, .→pkg, pkg→a.py,
        // pkg→sub, sub→b.py
        assert_eq!(output.relationships.len(), 5);
        assert!(
            output
                .relationships
                .iter()
                .all(|r| r.kind == RelationKind::Contains)
        );
    }

    #[test]
    fn walk_skips_excluded_segments() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("__pycache__")).unwrap();
        std::fs::create_dir_all(tmp.path().join(".git")).unwrap();
        std::fs::write(tmp.path().join("__pycache__/a.py"), "x = 1\n").unwrap();
        std::fs::write(tmp.path().join(".git/hook.py"), "x = 1\n").unwrap();
        std::fs::write(tmp.path().join(".hidden.py"), "x = 1\n").unwrap();
        std::fs::write(tmp.path().join("keep.py"), "x = 1\n").unwrap();

        let output = walker(tmp.path()).walk().unwrap();

        assert_eq!(output.files.len(), 1);
        assert!(output.files[0].ends_with("keep.py"));
        assert_eq!(output.entities.len(), 1); // just the root
    }

    #[test]
    fn invalid_pattern_is_an_extract_error() {
        let tmp = tempfile::tempdir().unwrap();
        let walk = WalkSection {
            exclude_patterns: vec!["[".to_string()],
        };
        let err = RepoWalker::new(tmp.path(), &walk, &["py"]).unwrap_err();
        assert!(err.to_string().contains("Extraction error"));
    }

    #[test]
    fn empty_repository_yields_only_root() {
        let tmp = tempfile::tempdir().unwrap();
        let output = walker(tmp.path()).walk().unwrap();
        assert_eq!(output.entities.len(), 1);
        assert!(output.files.is_empty());
        assert!(output.relationships.is_empty());
    }
}
