use crate::YearStop;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearOutcome {
    pub year: u32,
    pub stop: YearStop,
    pub last_page: Option<u32>,
    pub records: usize,
}

/// Counters accumulated over one run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub pages_from_checkpoint: usize,
    pub pages_fetched: usize,
    /// Records before deduplication.
    pub records: usize,
    pub years: Vec<YearOutcome>,
}

impl RunSummary {
    pub fn failed_years(&self) -> impl Iterator<Item = &YearOutcome> {
        self.years.iter().filter(|outcome| outcome.stop.is_failure())
    }
}
