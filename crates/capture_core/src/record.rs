use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use url::Url;

pub const ARCHIVE_ORIGIN: &str = "https://archiveofourown.org";
/// Forces mature content to display and the whole work on one page.
pub const WORK_URL_QUERY: &str = "view_adult=true&view_full_work=true";

/// Export column names, in order; matches the serialized field names.
pub const EXPORT_COLUMNS: [&str; 14] = [
    "Year",
    "Title",
    "Author",
    "Fandom",
    "Date_Updated",
    "Language",
    "Words",
    "Chapters",
    "Collections",
    "Comments",
    "Kudos",
    "Bookmarks",
    "Hits",
    "URL",
];

/// Metadata of one listed work. Field order is the export column order.
///
/// Statistics are kept as the archive displays them (`"1,234"`, `"3/10"`).
/// A missing statistic is `"0"`; missing language or date is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkRecord {
    #[serde(rename = "Year")]
    pub year: u32,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Author")]
    pub author: String,
    #[serde(rename = "Fandom")]
    pub fandom: String,
    #[serde(rename = "Date_Updated")]
    pub date_updated: String,
    #[serde(rename = "Language")]
    pub language: String,
    #[serde(rename = "Words")]
    pub word_count: String,
    #[serde(rename = "Chapters")]
    pub chapter_count: String,
    #[serde(rename = "Collections")]
    pub collection_count: String,
    #[serde(rename = "Comments")]
    pub comment_count: String,
    #[serde(rename = "Kudos")]
    pub kudos_count: String,
    #[serde(rename = "Bookmarks")]
    pub bookmark_count: String,
    #[serde(rename = "Hits")]
    pub hit_count: String,
    #[serde(rename = "URL")]
    pub canonical_url: String,
}

impl WorkRecord {
    /// Text columns after `Year`, in export order.
    pub fn text_columns(&self) -> [&str; 13] {
        [
            &self.title,
            &self.author,
            &self.fandom,
            &self.date_updated,
            &self.language,
            &self.word_count,
            &self.chapter_count,
            &self.collection_count,
            &self.comment_count,
            &self.kudos_count,
            &self.bookmark_count,
            &self.hit_count,
            &self.canonical_url,
        ]
    }
}

/// Resolve a work link against the archive origin and append the fixed view
/// parameters. Returns `None` for empty or unresolvable links.
pub fn canonical_work_url(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    let mut url = base.join(href).ok()?;
    url.set_fragment(None);
    url.set_query(Some(WORK_URL_QUERY));
    Some(url.into())
}

/// Keep the first record for each canonical URL, preserving order.
pub fn dedupe_by_url(records: Vec<WorkRecord>) -> Vec<WorkRecord> {
    let mut seen = HashSet::with_capacity(records.len());
    records
        .into_iter()
        .filter(|record| seen.insert(record.canonical_url.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Url {
        Url::parse(ARCHIVE_ORIGIN).unwrap()
    }

    #[test]
    fn relative_work_link_becomes_canonical() {
        assert_eq!(
            canonical_work_url(&origin(), "/works/123456").as_deref(),
            Some("https://archiveofourown.org/works/123456?view_adult=true&view_full_work=true")
        );
    }

    #[test]
    fn existing_query_and_fragment_are_replaced() {
        assert_eq!(
            canonical_work_url(&origin(), "/works/9?view_adult=false#main").as_deref(),
            Some("https://archiveofourown.org/works/9?view_adult=true&view_full_work=true")
        );
    }

    #[test]
    fn serialized_keys_follow_export_columns() {
        let record = WorkRecord {
            year: 2019,
            title: "t".into(),
            author: "a".into(),
            fandom: "Original Work".into(),
            date_updated: String::new(),
            language: String::new(),
            word_count: "0".into(),
            chapter_count: "0".into(),
            collection_count: "0".into(),
            comment_count: "0".into(),
            kudos_count: "0".into(),
            bookmark_count: "0".into(),
            hit_count: "0".into(),
            canonical_url: "u".into(),
        };
        let json = serde_json::to_string(&record).unwrap();
        let positions: Vec<usize> = EXPORT_COLUMNS
            .iter()
            .map(|column| json.find(&format!("\"{column}\":")).unwrap())
            .collect();
        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(record.text_columns().len() + 1, EXPORT_COLUMNS.len());
    }

    #[test]
    fn empty_or_fragment_links_are_rejected() {
        assert_eq!(canonical_work_url(&origin(), "  "), None);
        assert_eq!(canonical_work_url(&origin(), "#top"), None);
    }
}
