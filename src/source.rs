//! Proposal source: reads fetched API responses from disk or stdin and
//! yields raw records for the relevance filter.

use crate::config::ScanConfig;
use crate::error::{Error, Result};
use crate::filter::SourcedRecord;
use crate::selectors::select_records;
use async_stream::stream;
use futures::{Stream, StreamExt};
use jwalk::WalkDir;
use std::io::{BufRead, ErrorKind};
use std::path::{Path, PathBuf};

/// A JSON file found under the input directory
#[derive(Debug, Clone)]
struct SourceFile {
    path: PathBuf,
    relative_path: String,
}

/// Reactive reader over a directory of fetched proposal documents
pub struct ProposalSource {
    config: ScanConfig,
}

impl ProposalSource {
    /// Create a new source with the given configuration
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }

    /// Discover and decode every JSON document under the input directory.
    ///
    /// Files are read in relative-path order. A file that cannot be read or
    /// decoded yields one `Err` item and the stream moves on to the next.
    pub fn process(&self) -> impl Stream<Item = Result<SourcedRecord>> {
        let config = self.config.clone();
        let config_for_discovery = config.clone();
        Box::pin(stream! {
            // jwalk is synchronous, so discovery runs on the blocking pool
            let files = match tokio::task::spawn_blocking(move || {
                Self::discover_files_internal(&config_for_discovery)
            }).await {
                Ok(Ok(files)) => files,
                Ok(Err(e)) => {
                    yield Err(e);
                    return;
                }
                Err(e) => {
                    yield Err(Error::Io(std::io::Error::new(
                        std::io::ErrorKind::Other,
                        format!("Task join error: {}", e)
                    )));
                    return;
                }
            };

            let files = Self::apply_limit_internal(&config, files);
            log::info!("Reading {} files from {}", files.len(), config.input_dir.display());

            for file in files {
                match Self::read_file_internal(&file.path, &file.relative_path).await {
                    Ok(records) => {
                        for record in records {
                            yield Ok(record);
                        }
                    }
                    Err(e) => yield Err(e),
                }
            }
        })
    }

    /// Read records from stdin lines. A line holding a JSON object or array
    /// is decoded in place; any other line is taken as a file path.
    /// Useful for stdio pipelines: `cat fetched/*.json | legisbot scan --stdin`
    pub fn from_stdin(lines: impl Iterator<Item = String>) -> impl Stream<Item = Result<SourcedRecord>> {
        Box::pin(stream! {
            for (line_no, line) in lines.enumerate() {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }

                if trimmed.starts_with('{') || trimmed.starts_with('[') {
                    let origin = format!("stdin:{}", line_no + 1);
                    match serde_json::from_str::<serde_json::Value>(trimmed) {
                        Ok(value) => {
                            for record in select_records(&value) {
                                yield Ok(SourcedRecord { origin: Some(origin.clone()), record });
                            }
                        }
                        Err(e) => yield Err(Error::Json(e)),
                    }
                    continue;
                }

                let path = Path::new(trimmed);
                if !path.is_file() {
                    log::warn!("Skipping stdin entry, not a file: {}", trimmed);
                    continue;
                }
                match Self::read_file_internal(path, trimmed).await {
                    Ok(records) => {
                        for record in records {
                            yield Ok(record);
                        }
                    }
                    Err(e) => yield Err(e),
                }
            }
        })
    }

    /// Discover all `.json` files below the input directory, sorted by
    /// relative path
    fn discover_files_internal(config: &ScanConfig) -> Result<Vec<SourceFile>> {
        let search_dir = &config.input_dir;
        if !search_dir.exists() {
            log::warn!("Input directory does not exist: {}", search_dir.display());
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry_result in WalkDir::new(search_dir).into_iter() {
            let entry = match entry_result {
                Ok(e) => e,
                Err(e) => {
                    log::debug!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                let relative_path = Self::calculate_relative_path(&path, search_dir)?;
                files.push(SourceFile {
                    path,
                    relative_path,
                });
            }
        }

        files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        Ok(files)
    }

    /// Calculate relative path from search directory
    fn calculate_relative_path(path: &Path, search_dir: &Path) -> Result<String> {
        let relative = pathdiff::diff_paths(path, search_dir).ok_or_else(|| {
            Error::Path(format!(
                "Failed to calculate relative path of {}",
                path.display()
            ))
        })?;
        Ok(relative.to_string_lossy().to_string())
    }

    /// Apply file limit
    fn apply_limit_internal(config: &ScanConfig, files: Vec<SourceFile>) -> Vec<SourceFile> {
        if let Some(limit) = config.max_files {
            files.into_iter().take(limit).collect()
        } else {
            files
        }
    }

    /// Read and decode one file into records tagged with `origin`
    async fn read_file_internal(path: &Path, origin: &str) -> Result<Vec<SourcedRecord>> {
        let content = tokio::fs::read_to_string(path).await?;
        let value: serde_json::Value = serde_json::from_str(&content)?;
        let records: Vec<SourcedRecord> = select_records(&value)
            .into_iter()
            .map(|record| SourcedRecord {
                origin: Some(origin.to_string()),
                record,
            })
            .collect();
        log::debug!("{}: {} records", origin, records.len());
        Ok(records)
    }
}

/// Lines of a reader for [`ProposalSource::from_stdin`]. Lines that are not
/// valid UTF-8 are logged and skipped; any other read error ends the input.
pub fn readable_lines<R: BufRead>(reader: R) -> impl Iterator<Item = String> {
    reader
        .lines()
        .enumerate()
        .map_while(|(line_no, line)| match line {
            Ok(line) => Some(Some(line)),
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                log::warn!("Skipping stdin line {}: {}", line_no + 1, e);
                Some(None)
            }
            Err(e) => {
                log::error!("Stopped reading stdin at line {}: {}", line_no + 1, e);
                None
            }
        })
        .flatten()
}

/// Drain a record stream, keeping the records and the per-file errors apart
pub async fn collect_records<S>(stream: S) -> (Vec<SourcedRecord>, Vec<Error>)
where
    S: Stream<Item = Result<SourcedRecord>>,
{
    let mut records = Vec::new();
    let mut errors = Vec::new();
    let mut stream = Box::pin(stream);
    while let Some(result) = stream.next().await {
        match result {
            Ok(record) => records.push(record),
            Err(e) => {
                log::warn!("Failed to read source: {}", e);
                errors.push(e);
            }
        }
    }
    (records, errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_readable_lines_skips_invalid_utf8() {
        let input: Vec<u8> = [
            b"{\"id\": 1}\n".as_slice(),
            b"\xff\xfe broken\n".as_slice(),
            b"/tmp/next.json\n".as_slice(),
        ]
        .concat();
        let lines: Vec<String> = readable_lines(Cursor::new(input)).collect();
        assert_eq!(lines, vec!["{\"id\": 1}".to_string(), "/tmp/next.json".to_string()]);
    }
}
