use votelens_core::VoteRecord;

pub const DEFAULT_BATCH_SIZE: usize = 25;

/// Groups records into fixed-size batches.
#[derive(Debug)]
pub struct BatchAccumulator {
    size: usize,
    pending: Vec<VoteRecord>,
}

impl BatchAccumulator {
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            size,
            pending: Vec::with_capacity(size),
        }
    }

    /// Adds a record, returning the batch once it is full.
    pub fn push(&mut self, record: VoteRecord) -> Option<Vec<VoteRecord>> {
        self.pending.push(record);
        if self.pending.len() >= self.size {
            Some(std::mem::replace(
                &mut self.pending,
                Vec::with_capacity(self.size),
            ))
        } else {
            None
        }
    }

    /// Hands out whatever is left over.
    pub fn finish(&mut self) -> Option<Vec<VoteRecord>> {
        if self.pending.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.pending))
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn batch_size(&self) -> usize {
        self.size
    }
}

impl Default for BatchAccumulator {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE)
    }
}
