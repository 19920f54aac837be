use crate::{PageKey, YearStop};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    YearStarted { year: u32, first_page: u32, last_page: u32 },
    /// Load the page from its checkpoint, or fetch and checkpoint it.
    VisitPage { key: PageKey, url: String },
    /// Randomized pause after a live fetch.
    Throttle,
    /// Tear down and relaunch the browser session.
    RecycleSession,
    YearFinished { year: u32, stop: YearStop },
    /// All years are done; aggregate and export.
    Finish,
}
