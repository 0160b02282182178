use csv::{ByteRecord, Position, ReaderBuilder, Trim};
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};
use votelens_core::{CoreError, ErrorExt, InputError, VoteRecord};

/// A byte offset into the votes file, shared with other tasks.
#[derive(Debug, Clone, Default)]
pub struct ScanProgress(Arc<AtomicU64>);

impl ScanProgress {
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    pub(crate) fn set(&self, position: u64) {
        self.0.store(position, Ordering::Relaxed);
    }
}

/// Reads vote records line by line starting at a byte offset and tracks the
/// offset just past the last record read, so a run can be resumed from there.
///
/// Quotes carry no meaning and fields need not be valid UTF-8 for the line
/// to be read; a line that does not decode is skipped like any other
/// malformed row.
pub struct VoteScanner<R> {
    reader: csv::Reader<R>,
    record: ByteRecord,
    progress: ScanProgress,
    skipped: u64,
}

impl VoteScanner<File> {
    pub fn open(path: impl AsRef<Path>, start: u64) -> Result<Self, CoreError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| InputError::InputOpen {
            path: path.display().to_string(),
            source,
        })?;

        if let Ok(metadata) = file.metadata() {
            if start > metadata.len() {
                warn!(
                    "Start offset {} is past the end of {} ({} bytes)",
                    start,
                    path.display(),
                    metadata.len()
                );
            }
        }

        Self::new(file, start)
    }
}

impl<R: Read + Seek> VoteScanner<R> {
    pub fn new(source: R, start: u64) -> Result<Self, CoreError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .quoting(false)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(source);

        let mut position = Position::new();
        position.set_byte(start);
        reader.seek(position)?;
        debug!("Scanning votes from byte {}", start);

        let progress = ScanProgress::default();
        progress.set(start);

        Ok(Self {
            reader,
            record: ByteRecord::new(),
            progress,
            skipped: 0,
        })
    }

    /// Next well-formed record, or `None` at end of input. Malformed rows
    /// are logged and skipped.
    pub fn next_record(&mut self) -> Result<Option<VoteRecord>, CoreError> {
        loop {
            let row_start = self.position();
            let more = self.reader.read_byte_record(&mut self.record)?;
            self.progress.set(self.reader.position().byte());

            if !more {
                return Ok(None);
            }

            match decode_fields(&self.record).and_then(VoteRecord::from_fields) {
                Ok(vote) => return Ok(Some(vote)),
                Err(details) => {
                    let error = InputError::MalformedRecord {
                        position: row_start,
                        details,
                    };
                    error.log_warn();
                    self.skipped += 1;
                }
            }
        }
    }

    /// Byte offset just past the last record read.
    pub fn position(&self) -> u64 {
        self.progress.get()
    }

    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}

fn decode_fields(record: &ByteRecord) -> Result<Vec<&str>, String> {
    record
        .iter()
        .enumerate()
        .map(|(index, field)| {
            std::str::from_utf8(field)
                .map_err(|e| format!("field {} is not valid UTF-8: {}", index + 1, e))
        })
        .collect()
}
