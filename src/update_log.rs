//! The persistent update log: for each generated file, the imprint and
//! content hash it was last produced with, plus the dependencies discovered
//! along the way.
//!
//! Records are appended (and flushed) as updates complete, so a crashed run
//! still knows what it finished.  At shutdown the deduplicated snapshot is
//! written to a staging file and renamed over the log.

use crate::error::{Error, Result};
use crate::hash::Hash;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Everything recorded about one generated file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Digest of the command line, sources, and dependencies that produced
    /// the file.
    pub imprint: Hash,
    /// Digest of the generated content itself, to detect an artifact that
    /// was modified or corrupted after the fact.
    pub content_hash: Hash,
    /// Files the target depends on beyond its direct sources, typically
    /// headers reported through the depfile.
    pub dependency_local_paths: Vec<String>,
}

pub type RecordsByFile = HashMap<String, FileRecord>;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RecordMode {
    Append,
    Truncate,
}

/// Writes records to the log, one line per record, flushed immediately.
pub struct Recorder {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl Recorder {
    pub fn open(path: &Path, mode: RecordMode) -> Result<Self> {
        let file = match mode {
            RecordMode::Append => OpenOptions::new().create(true).append(true).open(path),
            RecordMode::Truncate => File::create(path),
        }
        .map_err(Error::io(path))?;
        Ok(Recorder {
            path: path.to_owned(),
            writer: BufWriter::new(file),
        })
    }

    pub fn record(&mut self, local_path: &str, record: &FileRecord) -> Result<()> {
        let mut line = format!(
            "{:016x} {:016x} {}",
            record.imprint.0, record.content_hash.0, local_path
        );
        for dep in &record.dependency_local_paths {
            line.push(' ');
            line.push_str(dep);
        }
        line.push('\n');
        self.writer
            .write_all(line.as_bytes())
            .and_then(|()| self.writer.flush())
            .map_err(Error::io(&self.path))
    }
}

fn parse_hash_field(field: &str) -> Option<Hash> {
    if field.len() != 16 {
        return None;
    }
    u64::from_str_radix(field, 16).ok().map(Hash)
}

fn parse_record(line: &str) -> Option<(String, FileRecord)> {
    let mut fields = line.split(' ');
    let imprint = parse_hash_field(fields.next()?)?;
    let content_hash = parse_hash_field(fields.next()?)?;
    let target = fields.next()?;
    if target.is_empty() {
        return None;
    }
    let mut dependency_local_paths = Vec::new();
    for dep in fields {
        if dep.is_empty() {
            return None;
        }
        dependency_local_paths.push(dep.to_string());
    }
    Some((
        target.to_string(),
        FileRecord {
            imprint,
            content_hash,
            dependency_local_paths,
        },
    ))
}

/// Parse an existing log.  A target recorded several times keeps only its
/// latest record.  A missing log is simply empty.
pub fn records_from_log_file(path: &Path) -> Result<RecordsByFile> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(RecordsByFile::new()),
        Err(err) => return Err(Error::io(path)(err)),
    };
    let mut records = RecordsByFile::new();
    for line in text.lines() {
        if line.is_empty() {
            continue;
        }
        let (target, record) = parse_record(line).ok_or_else(|| Error::LogCorruption {
            path: path.to_owned(),
        })?;
        records.insert(target, record);
    }
    Ok(records)
}

/// The in-memory view of the log.  Recording updates the map and appends to
/// the on-disk log in one call, so a crash at any point loses at most the
/// update in flight.
pub struct LogCache {
    recorder: Recorder,
    records: RecordsByFile,
}

impl LogCache {
    pub fn from_log_file(path: &Path) -> Result<Self> {
        let records = records_from_log_file(path)?;
        Ok(LogCache {
            recorder: Recorder::open(path, RecordMode::Append)?,
            records,
        })
    }

    pub fn find(&self, local_path: &str) -> Option<&FileRecord> {
        self.records.get(local_path)
    }

    pub fn record(&mut self, local_path: String, record: FileRecord) -> Result<()> {
        self.recorder.record(&local_path, &record)?;
        self.records.insert(local_path, record);
        Ok(())
    }

    pub fn records(&self) -> &RecordsByFile {
        &self.records
    }
}

/// Write the deduplicated snapshot to `temporary_path`, then rename it over
/// the log.  Rename is atomic, so a crash leaves either the old log or the
/// new one, never a truncated mix.
pub fn rewrite_file(
    path: &Path,
    temporary_path: &Path,
    records: &RecordsByFile,
) -> Result<()> {
    let mut recorder = Recorder::open(temporary_path, RecordMode::Truncate)?;
    let mut paths: Vec<&String> = records.keys().collect();
    paths.sort();
    for target in paths {
        recorder.record(target, &records[target])?;
    }
    drop(recorder);
    std::fs::rename(temporary_path, path).map_err(Error::io(path))
}
