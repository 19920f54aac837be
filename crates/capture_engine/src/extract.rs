use std::fmt;

use capture_core::{canonical_work_url, WorkRecord, ARCHIVE_ORIGIN};
use capture_logging::capture_warn;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// The only fandom tag a kept work may carry.
pub const ORIGINAL_WORK: &str = "Original Work";
const ANONYMOUS: &str = "Anonymous";
const MISSING_STAT: &str = "0";

/// Result of extracting one listing page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListingPage {
    pub records: Vec<WorkRecord>,
    pub has_next: bool,
    /// Whether the listing container was present at all.
    pub listing_found: bool,
    pub entries: usize,
    /// Entries dropped by the fandom filter.
    pub filtered: usize,
    /// Entries that passed the filter but could not be extracted.
    pub malformed: usize,
}

pub trait Extractor: Send + Sync {
    fn extract(&self, html: &str, year: u32) -> ListingPage;
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("invalid selector {selector}: {message}")]
    Selector { selector: String, message: String },
    #[error("invalid base url {url}: {message}")]
    BaseUrl { url: String, message: String },
}

#[derive(Debug)]
enum EntryError {
    MissingTitleLink,
    UnresolvableLink(String),
}

impl fmt::Display for EntryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryError::MissingTitleLink => write!(f, "no title link"),
            EntryError::UnresolvableLink(href) => write!(f, "unresolvable work link {href:?}"),
        }
    }
}

struct Selectors {
    listing: Selector,
    entry: Selector,
    fandom_tag: Selector,
    heading_link: Selector,
    author: Selector,
    datetime: Selector,
    next_page: Selector,
    language: Selector,
    words: Selector,
    chapters: Selector,
    collections: Selector,
    comments: Selector,
    kudos: Selector,
    bookmarks: Selector,
    hits: Selector,
}

impl Selectors {
    fn compile() -> Result<Self, ExtractError> {
        Ok(Self {
            listing: compile("ol.work.index.group")?,
            entry: compile("li.work.blurb")?,
            fandom_tag: compile("h5.fandoms a.tag")?,
            heading_link: compile("h4.heading > a")?,
            author: compile(r#"a[rel="author"]"#)?,
            datetime: compile("p.datetime")?,
            next_page: compile(r#"a[rel="next"]"#)?,
            language: compile("dd.language")?,
            words: compile("dd.words")?,
            chapters: compile("dd.chapters")?,
            collections: compile("dd.collections")?,
            comments: compile("dd.comments")?,
            kudos: compile("dd.kudos")?,
            bookmarks: compile("dd.bookmarks")?,
            hits: compile("dd.hits")?,
        })
    }
}

fn compile(css: &str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|err| ExtractError::Selector {
        selector: css.to_string(),
        message: format!("{err:?}"),
    })
}

/// Extractor for archive work listings, keeping only single-fandom
/// "Original Work" entries.
pub struct ListingExtractor {
    base: Url,
    selectors: Selectors,
}

impl ListingExtractor {
    pub fn new() -> Result<Self, ExtractError> {
        Self::with_origin(ARCHIVE_ORIGIN)
    }

    /// Use `origin` to resolve relative work links.
    pub fn with_origin(origin: &str) -> Result<Self, ExtractError> {
        let base = Url::parse(origin).map_err(|err| ExtractError::BaseUrl {
            url: origin.to_string(),
            message: err.to_string(),
        })?;
        Ok(Self {
            base,
            selectors: Selectors::compile()?,
        })
    }

    fn extract_entry(&self, entry: ElementRef, year: u32) -> Result<Option<WorkRecord>, EntryError> {
        let sel = &self.selectors;

        let fandoms: Vec<String> = entry.select(&sel.fandom_tag).map(text_of).collect();
        if fandoms.len() != 1 || fandoms[0] != ORIGINAL_WORK {
            return Ok(None);
        }

        let title_link = entry
            .select(&sel.heading_link)
            .find(|a| a.value().attr("rel") != Some("author"))
            .ok_or(EntryError::MissingTitleLink)?;
        let href = title_link
            .value()
            .attr("href")
            .ok_or(EntryError::MissingTitleLink)?;
        let canonical_url = canonical_work_url(&self.base, href)
            .ok_or_else(|| EntryError::UnresolvableLink(href.to_string()))?;

        let title = non_empty_or(text_of(title_link), ANONYMOUS);
        let authors: Vec<String> = entry
            .select(&sel.author)
            .map(text_of)
            .filter(|name| !name.is_empty())
            .collect();
        let author = non_empty_or(authors.join(", "), ANONYMOUS);

        let stat = |selector: &Selector| first_text(entry, selector).unwrap_or_else(|| MISSING_STAT.to_string());

        Ok(Some(WorkRecord {
            year,
            title,
            author,
            fandom: ORIGINAL_WORK.to_string(),
            date_updated: first_text(entry, &sel.datetime).unwrap_or_default(),
            language: first_text(entry, &sel.language).unwrap_or_default(),
            word_count: stat(&sel.words),
            chapter_count: stat(&sel.chapters),
            collection_count: stat(&sel.collections),
            comment_count: stat(&sel.comments),
            kudos_count: stat(&sel.kudos),
            bookmark_count: stat(&sel.bookmarks),
            hit_count: stat(&sel.hits),
            canonical_url,
        }))
    }
}

impl Extractor for ListingExtractor {
    fn extract(&self, html: &str, year: u32) -> ListingPage {
        let doc = Html::parse_document(html);
        let mut page = ListingPage {
            has_next: doc.select(&self.selectors.next_page).next().is_some(),
            ..ListingPage::default()
        };

        let Some(listing) = doc.select(&self.selectors.listing).next() else {
            // Without a listing there is nothing to page through either.
            page.has_next = false;
            return page;
        };
        page.listing_found = true;

        for (index, entry) in listing.select(&self.selectors.entry).enumerate() {
            page.entries += 1;
            match self.extract_entry(entry, year) {
                Ok(Some(record)) => page.records.push(record),
                Ok(None) => page.filtered += 1,
                Err(err) => {
                    page.malformed += 1;
                    capture_warn!(
                        "year={} stage=extract: skipping malformed entry #{}: {}",
                        year,
                        index + 1,
                        err
                    );
                }
            }
        }
        page
    }
}

/// Element text with whitespace runs collapsed to single spaces.
fn text_of(element: ElementRef) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn first_text(scope: ElementRef, selector: &Selector) -> Option<String> {
    scope.select(selector).next().map(text_of)
}

fn non_empty_or(value: String, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value
    }
}
