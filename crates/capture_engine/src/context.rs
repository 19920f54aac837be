use std::path::{Path, PathBuf};

use capture_core::RunOptions;
use capture_logging::{capture_info, capture_warn};

use crate::checkpoint::CheckpointStore;
use crate::diagnostics::DebugSnapshots;
use crate::export::ExportOptions;
use crate::fetch::FetchSettings;
use crate::retry::RetryPolicy;
use crate::throttle::Throttle;

pub const DEFAULT_INPUT: &str = "ao3_original_work_lists.json";
pub const DEFAULT_OUTPUT_ROOT: &str = "corpus/00_sources";
pub const DEFAULT_LOG_FILE: &str = "capture_ao3_lists.log";
pub const DEFAULT_USER: &str = "ubuntu";

/// Where a run reads and writes on disk.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    pub root: PathBuf,
    /// Per-page captures, one directory per year.
    pub lists_dir: PathBuf,
    pub debug_dir: PathBuf,
    pub export: ExportOptions,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            lists_dir: root.join("00_lists"),
            debug_dir: root.join("debug"),
            export: ExportOptions::default(),
            root,
        }
    }

    pub fn jsonl_path(&self) -> PathBuf {
        self.root.join(&self.export.jsonl_filename)
    }

    pub fn workbook_path(&self) -> PathBuf {
        self.root.join(&self.export.workbook_filename)
    }

    pub fn table_path(&self) -> Option<PathBuf> {
        self.export
            .table_filename
            .as_ref()
            .map(|name| self.root.join(name))
    }
}

/// Everything a run needs, built once at startup and passed by reference.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub input: PathBuf,
    pub layout: OutputLayout,
    pub log_file: PathBuf,
    pub fetch: FetchSettings,
    pub retry: RetryPolicy,
    pub throttle: Throttle,
    pub options: RunOptions,
    /// Save a screenshot and markup when a page fails.
    pub debug_snapshots: bool,
}

impl Default for RunContext {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT),
            layout: OutputLayout::new(DEFAULT_OUTPUT_ROOT),
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            fetch: FetchSettings::default(),
            retry: RetryPolicy::default(),
            throttle: Throttle::default(),
            options: RunOptions::default(),
            debug_snapshots: true,
        }
    }
}

impl RunContext {
    pub fn checkpoint_store(&self) -> CheckpointStore {
        CheckpointStore::new(&self.layout.lists_dir)
    }

    pub fn snapshots(&self) -> Option<DebugSnapshots> {
        self.debug_snapshots
            .then(|| DebugSnapshots::new(&self.layout.debug_dir))
    }
}

/// Browser binary installed under the given account's home directory, if any.
/// `None` lets the browser driver auto-detect an installed Chromium.
pub fn resolve_browser_executable(user: &str) -> Option<PathBuf> {
    resolve_browser_in(Path::new("/home"), user)
}

fn resolve_browser_in(home_root: &Path, user: &str) -> Option<PathBuf> {
    let candidate = home_root.join(user).join("chromium").join("chrome");
    if candidate.is_file() {
        capture_info!("Using browser binary {}", candidate.display());
        Some(candidate)
    } else {
        capture_warn!(
            "No browser binary at {}; falling back to auto-detection",
            candidate.display()
        );
        None
    }
}
