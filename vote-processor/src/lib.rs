//! Streams vote records from a CSV file through Reddit lookups into an
//! enriched CSV, in fixed-size batches that can be resumed by byte offset.

pub mod batch;
pub mod output;
pub mod processor;
pub mod scanner;

pub use batch::{BatchAccumulator, DEFAULT_BATCH_SIZE};
pub use output::PostWriter;
pub use processor::{PostLookup, ProcessSummary, ProcessorSettings, VoteProcessor};
pub use scanner::{ScanProgress, VoteScanner};
