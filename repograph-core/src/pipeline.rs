use std::path::{Path, PathBuf};

use repograph_lang::FrontEnd;
use tracing::{info, instrument};

use crate::config::RepographConfig;
use crate::extract::RepoExtractor;
use crate::resolve::{InheritanceResolver, ModuleResolver, ReferenceResolver};
use crate::store::GraphStore;
use crate::types::{BuildStats, RelationKind};

/// The full build pipeline: extraction, then import, inheritance, and
/// reference resolution, in that order. Each pass commits before the next
/// starts because later passes query edges written by earlier ones.
#[derive(Debug)]
pub struct BuildPipeline<'a> {
    repo_root: PathBuf,
    config: RepographConfig,
    front_end: &'a dyn FrontEnd,
}

impl<'a> BuildPipeline<'a> {
    pub fn new(repo_root: &Path, config: RepographConfig, front_end: &'a dyn FrontEnd) -> Self {
        Self {
            repo_root: repo_root.to_path_buf(),
            config,
            front_end,
        }
    }

    /// Run a full build. The store is cleared first; there is no
    /// incremental diffing between runs.
    #[instrument(skip_all, name = "build")]
    pub async fn run(&self, store: &dyn GraphStore) -> crate::error::Result<BuildStats> {
        store.clear_all().await?;

        let extractor = RepoExtractor::new(&self.repo_root, self.front_end);
        let extracted = extractor.extract(&self.config)?;

        let entities = store.bulk_insert_entities(&extracted.entities).await?;
        let contains = store
            .bulk_insert_relationships(&extracted.relationships)
            .await?;

        let module_resolver = ModuleResolver::new(
            &self.repo_root,
            &self.config.resolver.search_paths,
            self.front_end,
        );
        let import_edges = module_resolver
            .resolve_imports(store, &extracted.imports)
            .await?;
        let imports = store.bulk_insert_relationships(&import_edges).await?;

        let inherit_edges =
            InheritanceResolver::resolve_inherits(store, &extracted.inherits).await?;
        let inherits = store.bulk_insert_relationships(&inherit_edges).await?;

        let mut reference_resolver = ReferenceResolver::new(self.front_end);
        let reference_edges = reference_resolver
            .resolve_all(store, &extracted.entities)
            .await?;
        let references = store.bulk_insert_relationships(&reference_edges).await?;

        let mut stats = BuildStats {
            files_parsed: extracted.files_parsed,
            entities,
            skipped: extracted.skipped,
            ..BuildStats::default()
        };
        stats
            .relationships
            .insert(RelationKind::Contains.as_str().to_string(), contains);
        stats
            .relationships
            .insert(RelationKind::Imports.as_str().to_string(), imports);
        stats
            .relationships
            .insert(RelationKind::Inherits.as_str().to_string(), inherits);
        stats
            .relationships
            .insert(RelationKind::References.as_str().to_string(), references);

        info!(
            files = stats.files_parsed,
            entities = stats.entities,
            relationships = stats.relationship_total(),
            skipped = stats.skipped.len(),
            "Build complete"
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::sqlite::SqliteStore;
    use crate::types::{Direction, EntityKind};
    use repograph_lang::PythonFrontEnd;

    async fn build(store: &SqliteStore, root: &Path) -> BuildStats {
        let front_end = PythonFrontEnd;
        let pipeline = BuildPipeline::new(root, RepographConfig::default(), &front_end);
        pipeline.run(store).await.unwrap()
    }

    #[tokio::test]
    async fn aliased_cross_file_inheritance() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("pkg")).unwrap();
        std::fs::write(tmp.path().join("pkg/a.py"), "class Base:\n    pass\n").unwrap();
        std::fs::write(
            tmp.path().join("pkg/b.py"),
            "from pkg.a import Base as B\n\nclass Child(B):\n    pass\n",
        )
        .unwrap();

        let store = SqliteStore::in_memory().unwrap();
        build(&store, tmp.path()).await;

        assert!(store.get("pkg/b.py:Child").await.unwrap().is_some());

        let reached = store
            .traverse(
                "pkg/b.py:Child",
                Direction::Downstream,
                1,
                &[EntityKind::Class],
                &[RelationKind::Inherits],
            )
            .await
            .unwrap();
        assert_eq!(reached["class"], vec!["pkg/a.py:Base"]);
    }

    #[tokio::test]
    async fn rebuild_does_not_duplicate() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join("a.py"),
            "class Base:\n    pass\n\nclass Child(Base):\n    pass\n",
        )
        .unwrap();

        let store = SqliteStore::in_memory().unwrap();
        let first = build(&store, tmp.path()).await;
        let second = build(&store, tmp.path()).await;

        assert_eq!(first.entities, second.entities);
        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total_relationships, second.relationship_total());
    }

    #[tokio::test]
    async fn stats_count_each_relationship_kind() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("a.py"), "class Base:\n    pass\n").unwrap();
        std::fs::write(
            tmp.path().join("b.py"),
            "from a import Base\n\nclass Child(Base):\n    pass\n",
        )
        .unwrap();

        let store = SqliteStore::in_memory().unwrap();
        let stats = build(&store, tmp.path()).await;

        assert_eq!(stats.files_parsed, 2);
        assert!(stats.relationships["contains"] >= 4);
        assert_eq!(stats.relationships["imports"], 1);
        assert_eq!(stats.relationships["inherits"], 1);
    }
}
