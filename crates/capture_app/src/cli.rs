use std::path::PathBuf;
use std::time::Duration;

use capture_engine::{
    resolve_browser_executable, OutputLayout, RunContext, DEFAULT_INPUT, DEFAULT_LOG_FILE,
    DEFAULT_OUTPUT_ROOT, DEFAULT_USER,
};
use clap::Parser;

/// Capture archive "Original Work" listings and extract per-work metadata.
#[derive(Debug, Parser)]
#[command(name = "capture-lists", version)]
pub struct Cli {
    /// Run in test mode (limited pages per year)
    #[arg(short, long)]
    pub test: bool,

    /// Pages to capture per year in test mode
    #[arg(short, long, default_value_t = 5)]
    pub pages: u32,

    /// Account whose home directory holds the browser binary
    #[arg(short, long, default_value = DEFAULT_USER)]
    pub user: String,

    /// Page load timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = 60)]
    pub nav_timeout: u64,

    /// Navigation attempts per page
    #[arg(long, value_name = "N", default_value_t = 3)]
    pub nav_retries: u32,

    /// Year list (JSON)
    #[arg(long, default_value = DEFAULT_INPUT)]
    pub input: PathBuf,

    #[arg(long, default_value = DEFAULT_OUTPUT_ROOT)]
    pub output_root: PathBuf,

    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    /// Browser binary; overrides the lookup under --user's home
    #[arg(long, value_name = "PATH")]
    pub browser: Option<PathBuf>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Also write a CSV copy of the spreadsheet
    #[arg(long)]
    pub csv: bool,

    /// Restart the browser after this many fetched pages (0 = never)
    #[arg(long, value_name = "N", default_value_t = 50)]
    pub recycle_every: u32,
}

impl Cli {
    pub fn into_context(self) -> RunContext {
        let mut context = RunContext {
            input: self.input,
            layout: OutputLayout::new(self.output_root),
            log_file: self.log_file,
            ..RunContext::default()
        };
        context.fetch.navigation_timeout = Duration::from_secs(self.nav_timeout);
        context.fetch.page_load_timeout = Duration::from_secs(self.nav_timeout);
        context.fetch.headless = !self.headed;
        context.fetch.browser_executable = self
            .browser
            .or_else(|| resolve_browser_executable(&self.user));
        context.retry.max_attempts = self.nav_retries.max(1);
        if self.csv {
            context.layout.export.table_filename = Some("lists.csv".to_string());
        }
        context.options.recycle_every = self.recycle_every;
        context.options.page_limit = self.test.then_some(self.pages.max(1));
        context
    }
}
