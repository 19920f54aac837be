use std::fs;
use std::path::{Path, PathBuf};

use capture_core::PageKey;
use thiserror::Error;

use crate::decode::{decode_html, DecodeError};
use crate::persist::{AtomicFileWriter, PersistError};

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("page {0} is already captured")]
    AlreadyCaptured(PageKey),
    #[error("failed to read capture {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("capture {path} is not decodable: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },
    #[error("failed to write capture: {0}")]
    Write(#[from] PersistError),
}

/// Raw page captures on disk, one file per `(year, page)`:
/// `{root}/{year}/{year}_{page:04}.html`.
///
/// A non-empty capture is never overwritten; its presence is the resume marker.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    root: PathBuf,
}

impl CheckpointStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn year_dir(&self, year: u32) -> PathBuf {
        self.root.join(year.to_string())
    }

    pub fn path_for(&self, key: PageKey) -> PathBuf {
        self.year_dir(key.year).join(file_name(key))
    }

    pub fn exists(&self, key: PageKey) -> bool {
        fs::metadata(self.path_for(key))
            .map(|meta| meta.is_file() && meta.len() > 0)
            .unwrap_or(false)
    }

    pub fn read(&self, key: PageKey) -> Result<String, CheckpointError> {
        let path = self.path_for(key);
        let bytes = fs::read(&path).map_err(|source| CheckpointError::Read {
            path: path.clone(),
            source,
        })?;
        decode_html(&bytes)
            .map(|decoded| decoded.html)
            .map_err(|source| CheckpointError::Decode { path, source })
    }

    pub fn write(&self, key: PageKey, content: &str) -> Result<PathBuf, CheckpointError> {
        if self.exists(key) {
            return Err(CheckpointError::AlreadyCaptured(key));
        }
        let path = self.path_for(key);
        // An empty leftover from an interrupted run does not count as a capture.
        if path.is_file() {
            fs::remove_file(&path).map_err(PersistError::from)?;
        }
        let writer = AtomicFileWriter::new(self.year_dir(key.year));
        writer
            .write_new(&file_name(key), content)
            .map_err(|err| match err {
                PersistError::AlreadyExists(_) => CheckpointError::AlreadyCaptured(key),
                other => CheckpointError::Write(other),
            })
    }
}

fn file_name(key: PageKey) -> String {
    format!("{key}.html")
}
