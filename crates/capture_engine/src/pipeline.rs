use std::collections::VecDeque;

use capture_core::{
    dedupe_by_url, update, Effect, Msg, PageKey, PageSource, RunState, RunSummary, YearConfig,
};
use capture_logging::{capture_error, capture_info, capture_warn};

use crate::checkpoint::{CheckpointError, CheckpointStore};
use crate::context::RunContext;
use crate::export::{export_records, ExportError, ExportSummary};
use crate::extract::{Extractor, ListingPage};
use crate::fetch::PageFetcher;
use crate::FetchError;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("browser unavailable: {0}")]
    Browser(FetchError),
    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),
    #[error("export error: {0}")]
    Export(#[from] ExportError),
    #[error("no records were captured")]
    NoRecords,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub summary: RunSummary,
    pub export: ExportSummary,
    /// Records dropped as duplicates of an earlier canonical URL.
    pub duplicates: usize,
}

/// Executes the capture state machine's effects against a fetcher, an
/// extractor and the checkpoint store.
pub struct Pipeline<'a, F, E> {
    context: &'a RunContext,
    fetcher: F,
    extractor: E,
    store: CheckpointStore,
}

impl<'a, F, E> Pipeline<'a, F, E>
where
    F: PageFetcher,
    E: Extractor,
{
    pub fn new(context: &'a RunContext, fetcher: F, extractor: E) -> Self {
        Self {
            context,
            fetcher,
            extractor,
            store: context.checkpoint_store(),
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn store(&self) -> &CheckpointStore {
        &self.store
    }

    /// Capture every configured year, then write the aggregate outputs.
    /// The fetcher is shut down before this returns, whatever the outcome.
    pub async fn run(&mut self, years: Vec<YearConfig>) -> Result<RunReport, PipelineError> {
        let driven = self.drive(years).await;
        self.fetcher.shutdown().await;
        self.finish(driven?)
    }

    async fn drive(&mut self, years: Vec<YearConfig>) -> Result<RunState, PipelineError> {
        let (mut state, effects) = update(RunState::new(years, self.context.options), Msg::Start);
        let mut queue: VecDeque<Effect> = effects.into();

        while let Some(effect) = queue.pop_front() {
            let Some(msg) = self.execute(effect).await? else {
                continue;
            };
            let (next, effects) = update(state, msg);
            state = next;
            queue.extend(effects);
        }
        Ok(state)
    }

    async fn execute(&mut self, effect: Effect) -> Result<Option<Msg>, PipelineError> {
        match effect {
            Effect::YearStarted {
                year,
                first_page,
                last_page,
            } => {
                capture_info!(">>> Processing year {} (pages {}..={})", year, first_page, last_page);
                Ok(None)
            }
            Effect::VisitPage { key, url } => self.visit(key, &url).await.map(Some),
            Effect::Throttle => {
                self.context.throttle.pause().await;
                Ok(None)
            }
            Effect::RecycleSession => {
                // Records already collected stay valid; a later fetch that
                // cannot start a browser still aborts the run.
                if let Err(err) = self.fetcher.recycle().await {
                    capture_warn!("Browser session restart failed: {}", err);
                }
                Ok(None)
            }
            Effect::YearFinished { year, stop } => {
                if stop.is_failure() {
                    capture_error!("year={}: stopped early: {}", year, stop);
                } else {
                    capture_info!("year={}: done ({})", year, stop);
                }
                Ok(None)
            }
            Effect::Finish => {
                capture_info!("All years processed");
                Ok(None)
            }
        }
    }

    async fn visit(&mut self, key: PageKey, url: &str) -> Result<Msg, PipelineError> {
        if self.store.exists(key) {
            capture_info!(
                "year={} page={} stage=checkpoint: reusing existing capture",
                key.year,
                key.page
            );
            let html = self.store.read(key)?;
            let page = self.extractor.extract(&html, key.year);
            if !page.listing_found {
                capture_warn!(
                    "year={} page={} stage=checkpoint: no listing in {}; capture may be stale",
                    key.year,
                    key.page,
                    self.store.path_for(key).display()
                );
            }
            return Ok(extracted(key, PageSource::Checkpoint, page));
        }

        capture_info!("year={} page={} stage=fetch: {}", key.year, key.page, url);
        let html = match self.fetcher.fetch(key, url).await {
            Ok(html) => html,
            Err(err) => {
                let Some(stop) = err.year_stop() else {
                    return Err(PipelineError::Browser(err));
                };
                capture_error!("year={} page={}: {}", key.year, key.page, err);
                return Ok(Msg::PageFailed { key, stop });
            }
        };

        self.store.write(key, &html)?;
        let page = self.extractor.extract(&html, key.year);
        capture_info!(
            "year={} page={} stage=extract: {} Original Works ({} entries, {} filtered, {} malformed)",
            key.year,
            key.page,
            page.records.len(),
            page.entries,
            page.filtered,
            page.malformed
        );
        Ok(extracted(key, PageSource::Live, page))
    }

    fn finish(&self, state: RunState) -> Result<RunReport, PipelineError> {
        let (records, summary) = state.into_parts();
        log_summary(&summary);

        let raw_count = records.len();
        let records = dedupe_by_url(records);
        let duplicates = raw_count - records.len();
        if records.is_empty() {
            capture_warn!("No data was captured. Check the log for errors.");
            self.warn_stale_aggregates();
            return Err(PipelineError::NoRecords);
        }
        if duplicates > 0 {
            capture_info!("Removed {} duplicate records", duplicates);
        }

        let layout = &self.context.layout;
        let export = export_records(&layout.root, &records, &layout.export)?;
        capture_info!(
            "SUCCESS: captured {} records; files saved: {} and {}",
            export.record_count,
            export.jsonl_path.display(),
            export.workbook_path.display()
        );
        if let Some(table) = &export.table_path {
            capture_info!("CSV copy saved: {}", table.display());
        }
        Ok(RunReport {
            summary,
            export,
            duplicates,
        })
    }
}

impl<F, E> Pipeline<'_, F, E> {
    /// Aggregates from an earlier run are left in place, but must not be
    /// mistaken for this run's output.
    fn warn_stale_aggregates(&self) {
        let layout = &self.context.layout;
        for name in layout.export.filenames() {
            let path = layout.root.join(name);
            if path.is_file() {
                capture_warn!(
                    "{} is left over from an earlier run and was not updated",
                    path.display()
                );
            }
        }
    }
}

fn extracted(key: PageKey, source: PageSource, page: ListingPage) -> Msg {
    Msg::PageExtracted {
        key,
        source,
        records: page.records,
        has_next: page.has_next,
    }
}

fn log_summary(summary: &RunSummary) {
    capture_info!(
        "Pages: {} from checkpoints, {} fetched; {} records before deduplication",
        summary.pages_from_checkpoint,
        summary.pages_fetched,
        summary.records
    );
    for outcome in &summary.years {
        match outcome.last_page {
            Some(page) => capture_info!(
                "year={}: {} records through page {} ({})",
                outcome.year,
                outcome.records,
                page,
                outcome.stop
            ),
            None => capture_info!("year={}: no pages processed ({})", outcome.year, outcome.stop),
        }
    }
}
