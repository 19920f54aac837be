use crate::{PageKey, PageSource, WorkRecord, YearStop};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Begin the run with the first configured year.
    Start,
    /// A page was read from a checkpoint or fetched live, then extracted.
    PageExtracted {
        key: PageKey,
        source: PageSource,
        records: Vec<WorkRecord>,
        has_next: bool,
    },
    /// Fetching the page failed in a way that ends the current year.
    PageFailed { key: PageKey, stop: YearStop },
}
