use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use capture_core::YearConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("input file {0} not found")]
    Missing(PathBuf),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("year {year}: {reason}")]
    Invalid { year: u32, reason: String },
}

/// Load the year list: a JSON array of
/// `{"year", "list_url", "end_page", "start_page"?}` objects.
pub fn load_year_configs(path: &Path) -> Result<Vec<YearConfig>, ConfigError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(ConfigError::Missing(path.to_path_buf()))
        }
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    parse_year_configs(&raw).map_err(|err| match err {
        ParseFailure::Json(source) => ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        },
        ParseFailure::Invalid(err) => err,
    })
}

enum ParseFailure {
    Json(serde_json::Error),
    Invalid(ConfigError),
}

fn parse_year_configs(raw: &str) -> Result<Vec<YearConfig>, ParseFailure> {
    let configs: Vec<YearConfig> = serde_json::from_str(raw).map_err(ParseFailure::Json)?;
    for config in &configs {
        validate(config).map_err(ParseFailure::Invalid)?;
    }
    Ok(configs)
}

fn validate(config: &YearConfig) -> Result<(), ConfigError> {
    let invalid = |reason: &str| ConfigError::Invalid {
        year: config.year,
        reason: reason.to_string(),
    };
    if config.list_url.trim().is_empty() {
        return Err(invalid("list_url is empty"));
    }
    if config.start_page == 0 {
        return Err(invalid("start_page must be at least 1"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_input(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn start_page_defaults_to_one() {
        let file = write_input(
            r#"[{"year": 2019, "list_url": "https://example.org/works?page=", "end_page": 12}]"#,
        );
        let configs = load_year_configs(file.path()).unwrap();
        assert_eq!(configs.len(), 1);
        assert_eq!(configs[0].start_page, 1);
        assert_eq!(configs[0].end_page, 12);
    }

    #[test]
    fn missing_file_is_reported_as_missing() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = load_year_configs(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(_)));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let file = write_input(r#"[{"year": 2019}]"#);
        let err = load_year_configs(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn zero_start_page_is_rejected() {
        let file = write_input(
            r#"[{"year": 2020, "list_url": "https://example.org/?page=", "start_page": 0, "end_page": 3}]"#,
        );
        let err = load_year_configs(file.path()).unwrap_err();
        assert_eq!(err.to_string(), "year 2020: start_page must be at least 1");
    }
}
