use std::path::PathBuf;

use capture_core::PageKey;
use chrono::{DateTime, Utc};

use crate::persist::{AtomicFileWriter, PersistError};
use crate::Stage;

/// Writes failure snapshots (render image and raw markup) for offline
/// inspection, named `{year}_{page:04}_{stage}_{timestamp}.{png,html}`.
#[derive(Debug, Clone)]
pub struct DebugSnapshots {
    writer: AtomicFileWriter,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotPaths {
    pub image: Option<PathBuf>,
    pub markup: Option<PathBuf>,
}

impl DebugSnapshots {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            writer: AtomicFileWriter::new(dir.into()),
        }
    }

    pub fn save(
        &self,
        key: PageKey,
        stage: Stage,
        at: DateTime<Utc>,
        image_png: Option<&[u8]>,
        markup: Option<&str>,
    ) -> Result<SnapshotPaths, PersistError> {
        let stem = snapshot_stem(key, stage, at);
        let mut paths = SnapshotPaths::default();
        if let Some(png) = image_png {
            paths.image = Some(self.writer.write_bytes(&format!("{stem}.png"), png)?);
        }
        if let Some(html) = markup {
            paths.markup = Some(self.writer.write(&format!("{stem}.html"), html)?);
        }
        Ok(paths)
    }
}

fn snapshot_stem(key: PageKey, stage: Stage, at: DateTime<Utc>) -> String {
    format!("{key}_{stage}_{}", at.format("%Y%m%dT%H%M%SZ"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn snapshot_files_are_named_by_page_stage_and_time() {
        let temp = tempfile::TempDir::new().unwrap();
        let snapshots = DebugSnapshots::new(temp.path().join("debug"));
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 17, 5, 0).unwrap();

        let paths = snapshots
            .save(PageKey::new(2019, 42), Stage::Render, at, Some(&b"png"[..]), Some("<html/>"))
            .unwrap();

        let image = paths.image.unwrap();
        let markup = paths.markup.unwrap();
        assert_eq!(image.file_name().unwrap(), "2019_0042_render_20240309T170500Z.png");
        assert_eq!(markup.file_name().unwrap(), "2019_0042_render_20240309T170500Z.html");
        assert_eq!(std::fs::read_to_string(markup).unwrap(), "<html/>");
    }

    #[test]
    fn missing_artifacts_are_skipped() {
        let temp = tempfile::TempDir::new().unwrap();
        let snapshots = DebugSnapshots::new(temp.path());
        let paths = snapshots
            .save(PageKey::new(2019, 1), Stage::Navigate, Utc::now(), None, None)
            .unwrap();
        assert_eq!(paths, SnapshotPaths::default());
    }
}
