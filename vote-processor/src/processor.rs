use crate::batch::{BatchAccumulator, DEFAULT_BATCH_SIZE};
use crate::output::PostWriter;
use crate::scanner::{ScanProgress, VoteScanner};
use reddit_client::RedditClient;
use std::io::{Read, Seek, Write};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};
use votelens_core::{CoreError, ErrorExt, PostInfo, VoteRecord};

/// Resolves a batch of votes into output rows.
#[allow(async_fn_in_trait)]
pub trait PostLookup {
    async fn lookup(&mut self, batch: &[VoteRecord]) -> Result<Vec<PostInfo>, CoreError>;
}

impl PostLookup for RedditClient {
    async fn lookup(&mut self, batch: &[VoteRecord]) -> Result<Vec<PostInfo>, CoreError> {
        self.lookup_batch(batch).await
    }
}

#[derive(Debug, Clone)]
pub struct ProcessorSettings {
    pub batch_size: usize,
    /// Pause after every dispatched batch.
    pub batch_pause: Duration,
}

impl Default for ProcessorSettings {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            batch_pause: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessSummary {
    pub records_read: u64,
    pub records_skipped: u64,
    pub rows_written: u64,
    pub batches_sent: u64,
    pub batches_dropped: u64,
    pub records_dropped: u64,
    /// Byte offset just past the last record read.
    pub scanned_position: u64,
    /// Byte offset just past the last record whose batch was dispatched.
    /// Restarting here reprocesses exactly the undispatched records.
    pub resume_position: u64,
    pub interrupted: bool,
}

pub struct VoteProcessor<L> {
    lookup: L,
    settings: ProcessorSettings,
    stop: Option<watch::Receiver<bool>>,
    resume: ScanProgress,
}

impl<L: PostLookup> VoteProcessor<L> {
    pub fn new(lookup: L, settings: ProcessorSettings) -> Self {
        Self {
            lookup,
            settings,
            stop: None,
            resume: ScanProgress::default(),
        }
    }

    /// Stop cooperatively once `true` is sent on the channel.
    pub fn with_stop_signal(mut self, stop: watch::Receiver<bool>) -> Self {
        self.stop = Some(stop);
        self
    }

    pub fn lookup(&self) -> &L {
        &self.lookup
    }

    /// Publish the resume position through `resume`. It is updated after
    /// every dispatched batch, so it never runs ahead of the output file.
    pub fn with_resume_progress(mut self, resume: ScanProgress) -> Self {
        self.resume = resume;
        self
    }

    fn stop_requested(&self) -> bool {
        self.stop.as_ref().is_some_and(|stop| *stop.borrow())
    }

    pub async fn run<R, W>(
        &mut self,
        scanner: &mut VoteScanner<R>,
        writer: &mut PostWriter<W>,
    ) -> Result<ProcessSummary, CoreError>
    where
        R: Read + Seek,
        W: Write,
    {
        let start = scanner.position();
        let mut summary = ProcessSummary {
            scanned_position: start,
            resume_position: start,
            ..Default::default()
        };
        self.resume.set(start);

        match self.process(scanner, writer, &mut summary).await {
            Ok(()) => {
                info!(
                    "Finished: {} records read, {} rows written, {} of {} batches dropped",
                    summary.records_read,
                    summary.rows_written,
                    summary.batches_dropped,
                    summary.batches_sent
                );
                Ok(summary)
            }
            Err(e) => {
                error!(
                    "Processing aborted after {} rows, resume from byte {}",
                    summary.rows_written, summary.resume_position
                );
                Err(e)
            }
        }
    }

    async fn process<R, W>(
        &mut self,
        scanner: &mut VoteScanner<R>,
        writer: &mut PostWriter<W>,
        summary: &mut ProcessSummary,
    ) -> Result<(), CoreError>
    where
        R: Read + Seek,
        W: Write,
    {
        let mut batches = BatchAccumulator::new(self.settings.batch_size);

        info!(
            "Processing votes from byte {} in batches of {}",
            summary.resume_position,
            batches.batch_size()
        );

        loop {
            if self.stop_requested() {
                info!("Stop requested, no further records will be read");
                summary.interrupted = true;
                break;
            }

            let Some(record) = scanner.next_record()? else {
                break;
            };
            summary.records_read += 1;
            summary.scanned_position = scanner.position();

            if let Some(batch) = batches.push(record) {
                self.dispatch(batch, writer, summary).await?;
                self.mark_resume(summary, scanner.position());
                self.pause().await;
            }
        }

        if !summary.interrupted {
            if let Some(batch) = batches.finish() {
                self.dispatch(batch, writer, summary).await?;
            }
        }

        let scanned = scanner.position();
        summary.scanned_position = scanned;
        if batches.is_empty() {
            self.mark_resume(summary, scanned);
        }
        summary.records_skipped = scanner.skipped();
        Ok(())
    }

    fn mark_resume(&self, summary: &mut ProcessSummary, position: u64) {
        summary.resume_position = position;
        self.resume.set(position);
    }

    async fn dispatch<W: Write>(
        &mut self,
        batch: Vec<VoteRecord>,
        writer: &mut PostWriter<W>,
        summary: &mut ProcessSummary,
    ) -> Result<(), CoreError> {
        summary.batches_sent += 1;
        debug!("Looking up batch {} ({} records)", summary.batches_sent, batch.len());

        match self.lookup.lookup(&batch).await {
            Ok(rows) => {
                writer.write_batch(&rows)?;
                summary.rows_written += rows.len() as u64;
                Ok(())
            }
            Err(e) if e.is_fatal() => {
                e.log_error();
                Err(e)
            }
            Err(e) => {
                e.log_warn();
                warn!("Dropping batch of {} records", batch.len());
                summary.batches_dropped += 1;
                summary.records_dropped += batch.len() as u64;
                Ok(())
            }
        }
    }

    async fn pause(&self) {
        let pause = self.settings.batch_pause;
        if pause.is_zero() {
            return;
        }

        match &self.stop {
            Some(stop) => {
                let mut stop = stop.clone();
                tokio::select! {
                    _ = sleep(pause) => {}
                    _ = stop.wait_for(|stopped| *stopped) => {}
                }
            }
            None => sleep(pause).await,
        }
    }
}
