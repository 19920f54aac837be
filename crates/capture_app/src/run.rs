use anyhow::{Context, Result};
use capture_engine::{load_year_configs, BrowserFetcher, ListingExtractor, Pipeline, RunContext, RunReport};
use capture_logging::capture_info;

/// Load the year list and drive one capture run to completion.
pub fn run(context: &RunContext) -> Result<RunReport> {
    let years = load_year_configs(&context.input).context("execution aborted")?;
    capture_info!(
        "Loaded {} year configurations from {}",
        years.len(),
        context.input.display()
    );
    if let Some(limit) = context.options.page_limit {
        capture_info!("Test mode: at most {} pages per year", limit);
    }

    let extractor = ListingExtractor::new().context("building listing extractor")?;
    let fetcher = BrowserFetcher::new(
        context.fetch.clone(),
        context.retry,
        context.snapshots(),
    );

    let runtime = tokio::runtime::Runtime::new().context("starting async runtime")?;
    let mut pipeline = Pipeline::new(context, fetcher, extractor);
    let report = runtime
        .block_on(pipeline.run(years))
        .context("capture run failed")?;
    Ok(report)
}
