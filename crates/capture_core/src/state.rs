use crate::{PageKey, PageSource, RunSummary, WorkRecord, YearConfig};

pub const DEFAULT_RECYCLE_EVERY: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Test mode: visit at most this many pages per year.
    pub page_limit: Option<u32>,
    /// Relaunch the browser after this many live fetches; 0 disables recycling.
    pub recycle_every: u32,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            page_limit: None,
            recycle_every: DEFAULT_RECYCLE_EVERY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunPhase {
    #[default]
    Idle,
    Running,
    Finished,
}

/// Progress of one capture run. Only `update` mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunState {
    pub(crate) years: Vec<YearConfig>,
    pub(crate) options: RunOptions,
    pub(crate) phase: RunPhase,
    pub(crate) year_index: usize,
    pub(crate) first_page: u32,
    pub(crate) last_page: u32,
    pub(crate) in_flight: Option<PageKey>,
    pub(crate) year_records: usize,
    pub(crate) live_fetches: u32,
    pub(crate) records: Vec<WorkRecord>,
    pub(crate) summary: RunSummary,
}

impl RunState {
    pub fn new(years: Vec<YearConfig>, options: RunOptions) -> Self {
        Self {
            years,
            options,
            ..Self::default()
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn in_flight(&self) -> Option<PageKey> {
        self.in_flight
    }

    pub fn current_year(&self) -> Option<&YearConfig> {
        match self.phase {
            RunPhase::Running => self.years.get(self.year_index),
            _ => None,
        }
    }

    /// Live fetches so far; checkpoint reads are not counted.
    pub fn live_fetches(&self) -> u32 {
        self.live_fetches
    }

    pub fn records(&self) -> &[WorkRecord] {
        &self.records
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// Consume the state, yielding the accumulated (not yet deduplicated) records.
    pub fn into_parts(self) -> (Vec<WorkRecord>, RunSummary) {
        (self.records, self.summary)
    }

    pub(crate) fn record_page(&mut self, source: PageSource, records: Vec<WorkRecord>) {
        match source {
            PageSource::Checkpoint => self.summary.pages_from_checkpoint += 1,
            PageSource::Live => {
                self.summary.pages_fetched += 1;
                self.live_fetches += 1;
            }
        }
        self.year_records += records.len();
        self.summary.records += records.len();
        self.records.extend(records);
    }

    pub(crate) fn recycle_due(&self) -> bool {
        self.options.recycle_every > 0 && self.live_fetches % self.options.recycle_every == 0
    }
}
