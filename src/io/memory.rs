//! In-RAM sample store, mostly useful for tests and for callers that post-process
//! the chain directly.

use super::{check_block, Dataset, RunMetadata, SampleStore, SampleWriter};
use crate::error::Result;
use ndarray::{s, Array2, ArrayView2};

#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryStore;

#[derive(Debug)]
pub struct MemoryWriter {
    metadata: RunMetadata,
    samples: Array2<f64>,
    last_written_column: usize,
}

impl SampleStore for MemoryStore {
    type Writer = MemoryWriter;

    fn open(
        self,
        dimensions: usize,
        total_samples: usize,
        metadata: &RunMetadata,
    ) -> Result<MemoryWriter> {
        Ok(MemoryWriter {
            metadata: metadata.clone(),
            samples: Array2::zeros((dimensions + 1, total_samples)),
            last_written_column: 0,
        })
    }
}

impl SampleWriter for MemoryWriter {
    type Finalized = Dataset;

    fn dimensions(&self) -> usize {
        self.samples.nrows() - 1
    }

    fn total_samples(&self) -> usize {
        self.samples.ncols()
    }

    fn last_written_column(&self) -> usize {
        self.last_written_column
    }

    fn write(&mut self, first_column: usize, columns: ArrayView2<f64>) -> Result<()> {
        check_block(
            self.dimensions(),
            self.total_samples(),
            first_column,
            &columns,
        )?;
        let end = first_column + columns.ncols();
        self.samples
            .slice_mut(s![.., first_column..end])
            .assign(&columns);
        self.last_written_column = self.last_written_column.max(end);
        Ok(())
    }

    fn close(self) -> Result<Dataset> {
        Ok(Dataset::new(
            self.metadata,
            self.samples,
            self.last_written_column,
        ))
    }
}
