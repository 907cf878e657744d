//! Two-tier record filtering of a GAF file.
//!
//! The published set drops complex-derived records (identifier prefix
//! match). The mapper input additionally drops records whose evidence code
//! is excluded. Comment lines (`!`) and blank lines are not records and
//! are copied to both outputs unchanged.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::DeriveError;

/// Exclusion markers and the tab-separated field positions they apply to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvidenceFilter {
    /// A record whose id field starts with one of these is complex-derived.
    pub excluded_id_prefixes: Vec<String>,
    /// A record whose evidence field equals one of these is kept out of the
    /// mapper input.
    pub excluded_evidence_codes: Vec<String>,
    /// 0-based id field index.
    pub id_field: usize,
    /// 0-based evidence field index.
    pub evidence_field: usize,
}

/// Counts from one filter pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FilterStats {
    /// Records in the fetched file.
    pub records_in: usize,
    /// Records kept in the published annotation set.
    pub published: usize,
    /// Records kept in the mapper input.
    pub mapper_input: usize,
    pub excluded_complex: usize,
    pub excluded_evidence: usize,
}

/// Where a record goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Comment or blank line, copied everywhere.
    Header,
    Both,
    PublishedOnly,
    Dropped,
}

impl EvidenceFilter {
    /// Classify one line. A trailing `\n` or `\r\n` is ignored.
    #[must_use]
    pub fn classify(&self, line: &[u8]) -> Disposition {
        let line = trim_newline(line);
        if line.trim_ascii().is_empty() || line.starts_with(b"!") {
            return Disposition::Header;
        }
        if self.is_complex(line) {
            return Disposition::Dropped;
        }
        if self.has_excluded_evidence(line) {
            return Disposition::PublishedOnly;
        }
        Disposition::Both
    }

    fn is_complex(&self, line: &[u8]) -> bool {
        field(line, self.id_field).is_some_and(|id| {
            self.excluded_id_prefixes
                .iter()
                .any(|prefix| !prefix.is_empty() && id.starts_with(prefix.as_bytes()))
        })
    }

    fn has_excluded_evidence(&self, line: &[u8]) -> bool {
        field(line, self.evidence_field).is_some_and(|code| {
            self.excluded_evidence_codes
                .iter()
                .any(|c| c.as_bytes() == code)
        })
    }

    /// Stream `input` into the published set and the mapper input.
    ///
    /// # Errors
    ///
    /// [`DeriveError::EmptyInput`] when `input` holds no records,
    /// [`DeriveError::FilteredEmpty`] when either output would hold none,
    /// and [`DeriveError::Io`] on read/write failures.
    pub fn filter_file(
        &self,
        input: &Path,
        published: &Path,
        mapper_input: &Path,
    ) -> Result<FilterStats, DeriveError> {
        let mut reader =
            BufReader::new(File::open(input).map_err(|e| DeriveError::io(input, e))?);
        let mut published_out = create(published)?;
        let mut mapper_out = create(mapper_input)?;
        let mut stats = FilterStats::default();
        let mut line = Vec::new();

        while next_line(&mut reader, &mut line).map_err(|e| DeriveError::io(input, e))? {
            let disposition = self.classify(&line);
            if disposition != Disposition::Header {
                stats.records_in += 1;
            }
            match disposition {
                Disposition::Header | Disposition::Both => {
                    write_line(&mut published_out, published, &line)?;
                    write_line(&mut mapper_out, mapper_input, &line)?;
                    if disposition == Disposition::Both {
                        stats.published += 1;
                        stats.mapper_input += 1;
                    }
                }
                Disposition::PublishedOnly => {
                    write_line(&mut published_out, published, &line)?;
                    stats.published += 1;
                    stats.excluded_evidence += 1;
                }
                Disposition::Dropped => stats.excluded_complex += 1,
            }
        }

        finish(published_out, published)?;
        finish(mapper_out, mapper_input)?;

        if stats.records_in == 0 {
            return Err(DeriveError::EmptyInput {
                path: input.to_path_buf(),
            });
        }
        if stats.published == 0 {
            return Err(DeriveError::FilteredEmpty {
                input: input.to_path_buf(),
                output: "published annotation set",
            });
        }
        if stats.mapper_input == 0 {
            return Err(DeriveError::FilteredEmpty {
                input: input.to_path_buf(),
                output: "mapper input",
            });
        }
        Ok(stats)
    }

    /// [`Self::filter_file`] on the blocking pool.
    ///
    /// # Errors
    ///
    /// See [`Self::filter_file`].
    pub async fn filter(
        &self,
        input: &Path,
        published: &Path,
        mapper_input: &Path,
    ) -> Result<FilterStats, DeriveError> {
        let filter = self.clone();
        let paths: (PathBuf, PathBuf, PathBuf) = (
            input.to_path_buf(),
            published.to_path_buf(),
            mapper_input.to_path_buf(),
        );
        tokio::task::spawn_blocking(move || filter.filter_file(&paths.0, &paths.1, &paths.2))
            .await
            .map_err(|e| DeriveError::io(input, std::io::Error::other(e)))?
    }
}

/// Tab-separated field `idx`, if the record is long enough.
fn field(line: &[u8], idx: usize) -> Option<&[u8]> {
    line.split(|&b| b == b'\t').nth(idx)
}

fn trim_newline(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Read the next raw line, newline included, into `buf`. `false` at EOF.
fn next_line(reader: &mut impl BufRead, buf: &mut Vec<u8>) -> std::io::Result<bool> {
    buf.clear();
    Ok(reader.read_until(b'\n', buf)? > 0)
}

/// Count annotation records (non-comment, non-blank lines) in a file.
///
/// # Errors
///
/// Returns [`DeriveError::Io`] when the file cannot be read.
pub fn count_records(path: &Path) -> Result<usize, DeriveError> {
    let mut reader = BufReader::new(File::open(path).map_err(|e| DeriveError::io(path, e))?);
    let mut line = Vec::new();
    let mut records = 0;
    while next_line(&mut reader, &mut line).map_err(|e| DeriveError::io(path, e))? {
        let trimmed = trim_newline(&line);
        if !trimmed.trim_ascii().is_empty() && !trimmed.starts_with(b"!") {
            records += 1;
        }
    }
    Ok(records)
}

fn create(path: &Path) -> Result<BufWriter<File>, DeriveError> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|e| DeriveError::io(path, e))
}

/// Write the line bytes as read, adding a `\n` only to an unterminated last line.
fn write_line(out: &mut BufWriter<File>, path: &Path, line: &[u8]) -> Result<(), DeriveError> {
    out.write_all(line)
        .and_then(|()| {
            if line.ends_with(b"\n") {
                Ok(())
            } else {
                out.write_all(b"\n")
            }
        })
        .map_err(|e| DeriveError::io(path, e))
}

fn finish(out: BufWriter<File>, path: &Path) -> Result<(), DeriveError> {
    let file = out
        .into_inner()
        .map_err(|e| DeriveError::io(path, e.into_error()))?;
    file.sync_all().map_err(|e| DeriveError::io(path, e))
}
