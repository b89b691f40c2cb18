use crate::config::MathNotesConfig;
use crate::coordinator::PersistenceCoordinator;
use crate::debounce::ManualClock;
use crate::drawing::InkDrawing;
use crate::store::fs_backend::FsBackend;
use std::path::PathBuf;
use tempfile::TempDir;

pub type TestCoordinator = PersistenceCoordinator<FsBackend, InkDrawing, ManualClock>;

pub struct TestEnv {
    // We keep _temp_dir to ensure the directory is not dropped until the test is done
    pub _temp_dir: TempDir,
    pub root: PathBuf,
    pub clock: ManualClock,
    pub config: MathNotesConfig,
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl TestEnv {
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("failed to create temp dir");
        let root = temp_dir.path().to_path_buf();
        Self {
            _temp_dir: temp_dir,
            root,
            clock: ManualClock::new(),
            config: MathNotesConfig::default(),
        }
    }

    /// Open (or reopen) the notebook in this environment's directory.
    pub fn open(&self) -> TestCoordinator {
        let backend = FsBackend::new(self.root.clone()).with_file_ext(&self.config.page_file_ext);
        TestCoordinator::open(backend, &self.config, self.clock.clone())
            .expect("failed to open notebook")
    }
}
