//! Capture engine: browser fetching, extraction, checkpoints and the run driver.
mod browser;
mod checkpoint;
mod config;
mod context;
mod decode;
mod diagnostics;
mod export;
mod extract;
mod fetch;
mod persist;
mod pipeline;
mod retry;
mod throttle;
mod types;

pub use checkpoint::{CheckpointError, CheckpointStore};
pub use config::{load_year_configs, ConfigError};
pub use context::{
    resolve_browser_executable, OutputLayout, RunContext, DEFAULT_INPUT, DEFAULT_LOG_FILE,
    DEFAULT_OUTPUT_ROOT, DEFAULT_USER,
};
pub use decode::{decode_html, DecodeError, DecodedHtml};
pub use diagnostics::{DebugSnapshots, SnapshotPaths};
pub use export::{
    export_records, render_jsonl, render_table, render_workbook, ExportError, ExportOptions,
    ExportSummary, WORKSHEET_NAME,
};
pub use extract::{ExtractError, Extractor, ListingExtractor, ListingPage, ORIGINAL_WORK};
pub use fetch::{BrowserFetcher, ConsentSettings, FetchSettings, PageFetcher, DEFAULT_USER_AGENT};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use pipeline::{Pipeline, PipelineError, RunReport};
pub use retry::{Exhausted, RetryPolicy};
pub use throttle::Throttle;
pub use types::{FailureKind, FetchError, Stage};
