// Integration test utilities and fixture repositories for repograph.

use std::path::Path;

use repograph_core::config::RepographConfig;
use repograph_core::pipeline::BuildPipeline;
use repograph_core::store::sqlite::SqliteStore;
use repograph_core::types::BuildStats;
use repograph_lang::PythonFrontEnd;

/// A test fixture with a temporary source repository.
#[derive(Debug)]
pub struct TestRepo {
    pub dir: tempfile::TempDir,
}

impl TestRepo {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn empty() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create tempdir"),
        }
    }

    /// Write a file under the repo root, creating parent directories.
    pub fn write(&self, rel: &str, content: &str) {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    /// A small package: a base class with a method, a subclass in a
    /// second file inheriting through an import alias, and a module-level
    /// entry point with a variable.
    pub fn python_package() -> Self {
        let repo = Self::empty();
        repo.write(
            "pkg/a.py",
            "class Base:\n    def greet(self):\n        return \"hi\"\n",
        );
        repo.write(
            "pkg/b.py",
            "from pkg.a import Base as B\n\nclass Child(B):\n    def run(self):\n        return B()\n",
        );
        repo.write(
            "main.py",
            "import pkg.b\n\nVERSION = \"1.0\"\n\ndef main():\n    return VERSION\n",
        );
        repo
    }

    /// Sibling modules reached through leading-dot relative imports, one
    /// of them naming a symbol the sibling never defines.
    pub fn relative_imports() -> Self {
        let repo = Self::empty();
        repo.write("pkg/sub/sibling.py", "def helper():\n    return 1\n");
        repo.write(
            "pkg/sub/mod.py",
            "from .sibling import helper\n\ndef use():\n    return helper()\n",
        );
        repo.write("pkg/sub/broken.py", "from .sibling import missing\n");
        repo
    }
}

/// Run a full build against an in-memory store with default config.
pub async fn run_pipeline_with_store(repo_path: &Path) -> (BuildStats, SqliteStore) {
    run_pipeline_with_config(repo_path, RepographConfig::default()).await
}

/// Run a full build against an in-memory store with the given config.
pub async fn run_pipeline_with_config(
    repo_path: &Path,
    config: RepographConfig,
) -> (BuildStats, SqliteStore) {
    let store = SqliteStore::in_memory().unwrap();
    let front_end = PythonFrontEnd;
    let pipeline = BuildPipeline::new(repo_path, config, &front_end);
    let stats = pipeline.run(&store).await.unwrap();
    (stats, store)
}
