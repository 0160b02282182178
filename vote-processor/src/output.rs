use csv::WriterBuilder;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use votelens_core::{CoreError, InputError, PostInfo};

/// Appends enriched rows as `username,vote,subreddit,title,content`.
pub struct PostWriter<W: Write> {
    writer: csv::Writer<W>,
    rows_written: u64,
}

impl PostWriter<File> {
    /// Opens `path` for appending, creating it when missing.
    pub fn append(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| InputError::OutputOpen {
                path: path.display().to_string(),
                source,
            })?;
        Ok(Self::new(file))
    }
}

impl<W: Write> PostWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            writer: WriterBuilder::new().has_headers(false).from_writer(inner),
            rows_written: 0,
        }
    }

    /// Writes the rows of one batch and flushes them.
    pub fn write_batch(&mut self, rows: &[PostInfo]) -> Result<(), CoreError> {
        for row in rows {
            self.writer.serialize(row)?;
        }
        self.writer.flush()?;
        self.rows_written += rows.len() as u64;
        Ok(())
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    pub fn get_ref(&self) -> &W {
        self.writer.get_ref()
    }
}
