use std::fmt;

use serde::{Deserialize, Serialize};

const PAGE_PLACEHOLDER: &str = "{page}";

/// One year's listing to capture, as supplied by the input configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearConfig {
    pub year: u32,
    /// Listing URL without the page number. A `{page}` placeholder is
    /// substituted when present, otherwise the number is appended.
    pub list_url: String,
    #[serde(default = "default_start_page")]
    pub start_page: u32,
    pub end_page: u32,
}

fn default_start_page() -> u32 {
    1
}

impl YearConfig {
    pub fn page_url(&self, page: u32) -> String {
        if self.list_url.contains(PAGE_PLACEHOLDER) {
            self.list_url.replace(PAGE_PLACEHOLDER, &page.to_string())
        } else {
            format!("{}{}", self.list_url, page)
        }
    }

    /// Last page to visit, optionally capped to `limit` pages from `start_page`.
    pub fn last_page(&self, limit: Option<u32>) -> u32 {
        match limit {
            Some(n) => self
                .end_page
                .min(self.start_page.saturating_add(n.max(1) - 1)),
            None => self.end_page,
        }
    }
}

/// Identity of one listing page: `(year, page_number)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageKey {
    pub year: u32,
    pub page: u32,
}

impl PageKey {
    pub fn new(year: u32, page: u32) -> Self {
        Self { year, page }
    }
}

impl fmt::Display for PageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{:04}", self.year, self.page)
    }
}

/// Where a page's markup came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSource {
    Checkpoint,
    Live,
}

/// Why processing of a year stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearStop {
    /// The page had no "next" control.
    LastPage,
    /// The configured (or test-mode) last page was processed.
    EndOfRange,
    /// Navigation retries were exhausted.
    FetchExhausted,
    /// The listing never rendered; usually rate limiting upstream.
    RenderTimeout,
    /// `start_page` lies past the last page to visit.
    EmptyRange,
}

impl YearStop {
    pub fn is_failure(self) -> bool {
        matches!(self, YearStop::FetchExhausted | YearStop::RenderTimeout)
    }
}

impl fmt::Display for YearStop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            YearStop::LastPage => write!(f, "last page reached"),
            YearStop::EndOfRange => write!(f, "end of configured range"),
            YearStop::FetchExhausted => write!(f, "navigation retries exhausted"),
            YearStop::RenderTimeout => write!(f, "listing did not render"),
            YearStop::EmptyRange => write!(f, "empty page range"),
        }
    }
}
