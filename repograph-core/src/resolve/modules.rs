use std::path::{Path, PathBuf};

use repograph_lang::FrontEnd;
use tracing::{debug, instrument};

use crate::store::GraphStore;
use crate::types::{Entity, EntityKind, RawImport, RelationKind, Relationship, Span};

/// The import resolution pass. Maps dotted import specifiers to File
/// entities on disk, lazily materializing entities for files found outside
/// the repository root. Resolution is total: an unresolvable specifier is
/// returned unchanged and simply never becomes an edge.
#[derive(Debug)]
pub struct ModuleResolver<'a> {
    repo_root: PathBuf,
    search_paths: Vec<PathBuf>,
    front_end: &'a dyn FrontEnd,
}

impl<'a> ModuleResolver<'a> {
    pub fn new(repo_root: &Path, search_paths: &[PathBuf], front_end: &'a dyn FrontEnd) -> Self {
        Self {
            repo_root: repo_root.to_path_buf(),
            search_paths: search_paths.to_vec(),
            front_end,
        }
    }

    /// Resolve every raw import record into IMPORTS edges. Records whose
    /// target never materializes as a store entity are dropped.
    #[instrument(skip_all, name = "resolve_imports")]
    pub async fn resolve_imports(
        &self,
        store: &dyn GraphStore,
        raw_imports: &[RawImport],
    ) -> crate::error::Result<Vec<Relationship>> {
        let mut edges = Vec::new();

        for raw in raw_imports {
            let target_name = self.resolve(store, &raw.file, &raw.specifier).await?;
            let Some(target) = store.get(&target_name).await? else {
                debug!(
                    file = raw.file,
                    specifier = raw.specifier,
                    "Import target not in store, edge dropped"
                );
                continue;
            };

            let file_entity = Entity::new(EntityKind::File, raw.file.clone());
            let mut edge = Relationship::new(RelationKind::Imports, &file_entity, &target);
            edge.import = Some(raw.imported.clone());
            edge.alias = raw.alias.clone();
            edges.push(edge);
        }

        debug!(
            raw = raw_imports.len(),
            resolved = edges.len(),
            "Import resolution complete"
        );
        Ok(edges)
    }

    /// Resolve one dotted specifier to a target entity name.
    ///
    /// Tries the whole specifier as a module path first, then retries with
    /// the last segment split off as an attribute. Falls back to the
    /// original specifier when nothing matches.
    pub async fn resolve(
        &self,
        store: &dyn GraphStore,
        requesting_file: &str,
        specifier: &str,
    ) -> crate::error::Result<String> {
        let absolute = self.absolutize(requesting_file, specifier);

        if let Some((name, external)) = self.find_module_file(&absolute) {
            if external {
                self.materialize_external(store, &name, None).await?;
            }
            return Ok(name);
        }

        if let Some((module, attr)) = absolute.rsplit_once('.') {
            if let Some((name, external)) = self.find_module_file(module) {
                let target = format!("{name}:{attr}");
                if external {
                    self.materialize_external(store, &name, Some(attr)).await?;
                } else if !store.exists(&target).await? {
                    // The module file is real but the symbol isn't among its
                    // extracted declarations; keep the edge traversable
                    store.upsert_entity(&Entity::unparsed(target.clone())).await?;
                }
                return Ok(target);
            }
        }

        // Unresolved: carry the specifier as a best-effort label
        Ok(specifier.to_string())
    }

    /// Rewrite a relative specifier (leading dots) against the requesting
    /// file's directory. Level 1 is the file's own directory; each extra
    /// dot walks one directory up. Absolute specifiers pass through.
    fn absolutize(&self, requesting_file: &str, specifier: &str) -> String {
        let parts: Vec<&str> = specifier.split('.').collect();
        let level = parts.iter().take_while(|p| p.is_empty()).count();
        if level == 0 {
            return specifier.to_string();
        }

        let remaining: Vec<&str> = parts[level..].iter().copied().collect();
        if remaining.is_empty() {
            return specifier.to_string();
        }

        let mut base = Path::new(requesting_file)
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .to_path_buf();
        for _ in 1..level {
            base = base.parent().unwrap_or_else(|| Path::new("")).to_path_buf();
        }

        let mut segments: Vec<String> = base
            .components()
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .collect();
        segments.extend(remaining.iter().map(|s| (*s).to_string()));
        segments.join(".")
    }

    /// Find the file a dotted module path names: `a/b/name.<ext>` or
    /// `a/b/name/__init__.<ext>`, under the repository root first, then
    /// under each external search root. Returns the entity name and
    /// whether the hit lies outside the repository.
    fn find_module_file(&self, module: &str) -> Option<(String, bool)> {
        if module.is_empty() {
            return None;
        }
        let stem = module.replace('.', "/");
        let ext = self.front_end.extensions().first().copied().unwrap_or("py");
        let candidates = [format!("{stem}.{ext}"), format!("{stem}/__init__.{ext}")];

        let mut roots = vec![self.repo_root.clone()];
        roots.extend(self.search_paths.iter().cloned());

        for root in &roots {
            for candidate in &candidates {
                let path = root.join(candidate);
                if path.is_file() {
                    return if root == &self.repo_root {
                        Some((candidate.clone(), false))
                    } else {
                        Some((path.to_string_lossy().to_string(), true))
                    };
                }
            }
        }
        None
    }

    /// Persist the entity an external (outside-repo) import resolves to.
    ///
    /// Without an attribute the File entity is stored with its body
    /// discarded. With an attribute, the file's top-level declarations are
    /// outlined once (never recursing into its imports) and the matching
    /// function or class is stored; a missing attribute becomes an Unparsed
    /// placeholder so resolution never fails.
    async fn materialize_external(
        &self,
        store: &dyn GraphStore,
        file_path: &str,
        attr: Option<&str>,
    ) -> crate::error::Result<()> {
        let source = std::fs::read_to_string(file_path).unwrap_or_default();

        let Some(attr) = attr else {
            // External file bodies are not retained
            store
                .upsert_entity(&Entity::new(EntityKind::File, file_path))
                .await?;
            return Ok(());
        };

        let target_name = format!("{file_path}:{attr}");
        let tree = self.front_end.parse(&source)?;
        let outline = self.front_end.outline(&tree, &source);

        for func in outline.functions {
            if func.name == attr {
                let mut entity = Entity::new(EntityKind::Function, target_name);
                entity.source = func.text;
                entity.span = Some(Span::from(func.range));
                store.upsert_entity(&entity).await?;
                return Ok(());
            }
        }
        for class in outline.classes {
            if class.name == attr {
                let mut entity = Entity::new(EntityKind::Class, target_name);
                entity.source = class.text;
                entity.span = Some(Span::from(class.range));
                store.upsert_entity(&entity).await?;
                return Ok(());
            }
        }

        // Not defined at the top level (re-exported from elsewhere, most
        // likely): placeholder under the requested name
        store.upsert_entity(&Entity::unparsed(target_name)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::sqlite::SqliteStore;
    use repograph_lang::PythonFrontEnd;

    fn resolver<'a>(
        root: &Path,
        search_paths: &[PathBuf],
        front_end: &'a PythonFrontEnd,
    ) -> ModuleResolver<'a> {
        ModuleResolver::new(root, search_paths, front_end)
    }

    #[test]
    fn absolutize_levels() {
        let front_end = PythonFrontEnd;
        let tmp = tempfile::tempdir().unwrap();
        let r = resolver(tmp.path(), &[], &front_end);

        assert_eq!(r.absolutize("pkg/sub/mod.py", "os.path"), "os.path");
        assert_eq!(
            r.absolutize("pkg/sub/mod.py", ".sibling.helper"),
            "pkg.sub.sibling.helper"
        );
        assert_eq!(r.absolutize("pkg/sub/mod.py", "..a.Base"), "pkg.a.Base");
        assert_eq!(r.absolutize("pkg/sub/mod.py", ".util"), "pkg.sub.util");
        assert_eq!(r.absolutize("top.py", ".util"), "util");
    }

    #[tokio::test]
    async fn resolves_module_inside_repo() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("pkg")).unwrap();
        std::fs::write(tmp.path().join("pkg/a.py"), "class Base: pass\n").unwrap();

        let front_end = PythonFrontEnd;
        let store = SqliteStore::in_memory().unwrap();
        let r = resolver(tmp.path(), &[], &front_end);

        let name = r.resolve(&store, "pkg/b.py", "pkg.a").await.unwrap();
        assert_eq!(name, "pkg/a.py");
    }

    #[tokio::test]
    async fn resolves_package_init_form() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("pkg")).unwrap();
        std::fs::write(tmp.path().join("pkg/__init__.py"), "").unwrap();

        let front_end = PythonFrontEnd;
        let store = SqliteStore::in_memory().unwrap();
        let r = resolver(tmp.path(), &[], &front_end);

        let name = r.resolve(&store, "main.py", "pkg").await.unwrap();
        assert_eq!(name, "pkg/__init__.py");
    }

    #[tokio::test]
    async fn splits_attribute_from_module_path() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("pkg")).unwrap();
        std::fs::write(tmp.path().join("pkg/a.py"), "class Base: pass\n").unwrap();

        let front_end = PythonFrontEnd;
        let store = SqliteStore::in_memory().unwrap();
        let r = resolver(tmp.path(), &[], &front_end);

        let name = r.resolve(&store, "pkg/b.py", "pkg.a.Base").await.unwrap();
        assert_eq!(name, "pkg/a.py:Base");
    }

    #[tokio::test]
    async fn relative_specifier_resolves_from_requesting_file() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("pkg/sub")).unwrap();
        std::fs::write(
            tmp.path().join("pkg/sub/sibling.py"),
            "def helper(): pass\n",
        )
        .unwrap();

        let front_end = PythonFrontEnd;
        let store = SqliteStore::in_memory().unwrap();
        let r = resolver(tmp.path(), &[], &front_end);

        let name = r
            .resolve(&store, "pkg/sub/mod.py", ".sibling.helper")
            .await
            .unwrap();
        assert_eq!(name, "pkg/sub/sibling.py:helper");
    }

    #[tokio::test]
    async fn missing_symbol_in_repo_module_becomes_placeholder() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("pkg/sub")).unwrap();
        std::fs::write(tmp.path().join("pkg/sub/sibling.py"), "x = 1\n").unwrap();

        let front_end = PythonFrontEnd;
        let store = SqliteStore::in_memory().unwrap();
        let r = resolver(tmp.path(), &[], &front_end);

        let name = r
            .resolve(&store, "pkg/sub/mod.py", ".sibling.helper")
            .await
            .unwrap();
        assert_eq!(name, "pkg/sub/sibling.py:helper");
        let entity = store.get(&name).await.unwrap().unwrap();
        assert_eq!(entity.kind, EntityKind::Unparsed);
    }

    #[tokio::test]
    async fn unresolved_specifier_passes_through() {
        let tmp = tempfile::tempdir().unwrap();
        let front_end = PythonFrontEnd;
        let store = SqliteStore::in_memory().unwrap();
        let r = resolver(tmp.path(), &[], &front_end);

        let name = r.resolve(&store, "main.py", "no.such.module").await.unwrap();
        assert_eq!(name, "no.such.module");
    }

    #[tokio::test]
    async fn external_file_materialized_without_body() {
        let repo = tempfile::tempdir().unwrap();
        let lib = tempfile::tempdir().unwrap();
        std::fs::write(lib.path().join("requests.py"), "def get(url): pass\n").unwrap();

        let front_end = PythonFrontEnd;
        let store = SqliteStore::in_memory().unwrap();
        let r = resolver(repo.path(), &[lib.path().to_path_buf()], &front_end);

        let name = r.resolve(&store, "main.py", "requests").await.unwrap();
        let entity = store.get(&name).await.unwrap().unwrap();
        assert_eq!(entity.kind, EntityKind::File);
        assert!(entity.source.is_empty());
    }

    #[tokio::test]
    async fn external_attribute_materialized_as_declaration() {
        let repo = tempfile::tempdir().unwrap();
        let lib = tempfile::tempdir().unwrap();
        std::fs::write(
            lib.path().join("requests.py"),
            "def get(url):\n    return url\n\nclass Session:\n    pass\n",
        )
        .unwrap();

        let front_end = PythonFrontEnd;
        let store = SqliteStore::in_memory().unwrap();
        let r = resolver(repo.path(), &[lib.path().to_path_buf()], &front_end);

        let name = r.resolve(&store, "main.py", "requests.Session").await.unwrap();
        let entity = store.get(&name).await.unwrap().unwrap();
        assert_eq!(entity.kind, EntityKind::Class);
        assert!(entity.source.contains("class Session"));

        let name = r.resolve(&store, "main.py", "requests.get").await.unwrap();
        let entity = store.get(&name).await.unwrap().unwrap();
        assert_eq!(entity.kind, EntityKind::Function);
    }

    #[tokio::test]
    async fn missing_external_attribute_becomes_placeholder() {
        let repo = tempfile::tempdir().unwrap();
        let lib = tempfile::tempdir().unwrap();
        // `post` is re-exported from elsewhere, not defined here
        std::fs::write(lib.path().join("requests.py"), "from api import post\n").unwrap();

        let front_end = PythonFrontEnd;
        let store = SqliteStore::in_memory().unwrap();
        let r = resolver(repo.path(), &[lib.path().to_path_buf()], &front_end);

        let name = r.resolve(&store, "main.py", "requests.post").await.unwrap();
        let entity = store.get(&name).await.unwrap().unwrap();
        assert_eq!(entity.kind, EntityKind::Unparsed);
    }

    #[tokio::test]
    async fn repo_root_wins_over_search_paths() {
        let repo = tempfile::tempdir().unwrap();
        let lib = tempfile::tempdir().unwrap();
        std::fs::write(repo.path().join("util.py"), "x = 1\n").unwrap();
        std::fs::write(lib.path().join("util.py"), "y = 2\n").unwrap();

        let front_end = PythonFrontEnd;
        let store = SqliteStore::in_memory().unwrap();
        let r = resolver(repo.path(), &[lib.path().to_path_buf()], &front_end);

        let name = r.resolve(&store, "main.py", "util").await.unwrap();
        assert_eq!(name, "util.py");
    }

    #[tokio::test]
    async fn import_edges_only_for_targets_in_store() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("pkg")).unwrap();
        std::fs::write(tmp.path().join("pkg/a.py"), "class Base: pass\n").unwrap();

        let front_end = PythonFrontEnd;
        let store = SqliteStore::in_memory().unwrap();
        store
            .upsert_entity(&Entity::new(EntityKind::File, "pkg/a.py"))
            .await
            .unwrap();

        let r = resolver(tmp.path(), &[], &front_end);
        let raw = vec![
            RawImport {
                file: "pkg/b.py".to_string(),
                specifier: "pkg.a".to_string(),
                imported: "pkg.a".to_string(),
                alias: None,
            },
            RawImport {
                file: "pkg/b.py".to_string(),
                specifier: "no.such.module".to_string(),
                imported: "no.such.module".to_string(),
                alias: None,
            },
        ];

        let edges = r.resolve_imports(&store, &raw).await.unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].to, "pkg/a.py");
        assert_eq!(edges[0].import.as_deref(), Some("pkg.a"));
    }
}
