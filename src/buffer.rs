/*!
A fixed-capacity RAM staging area for thinned samples.

Records are addressed by their *logical* column index in the final dataset.
The buffer maps a logical index onto a physical slot with `logical % capacity`,
so the engine never has to track wrap-around itself. Whatever has been
appended since the last flush is the *pending* region; it is always a
contiguous logical range that fits into the buffer.
*/

use crate::error::{HmcError, Result};
use crate::io::SampleWriter;
use ndarray::{s, Array1, Array2};
use tracing::debug;

/// Column-major store of `(coordinates, misfit)` records, `dimensions + 1`
/// rows by `capacity` columns.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    data: Array2<f64>,
    dimensions: usize,
    /// Logical index of the first pending record.
    flushed: usize,
    /// Logical index one past the last appended record.
    filled: usize,
}

impl SampleBuffer {
    /// Creates an empty buffer. A zero capacity is a configuration error.
    pub fn new(dimensions: usize, capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(HmcError::Config(
                "the sample buffer needs room for at least one record".into(),
            ));
        }
        Ok(Self {
            data: Array2::zeros((dimensions + 1, capacity)),
            dimensions,
            flushed: 0,
            filled: 0,
        })
    }

    pub fn capacity(&self) -> usize {
        self.data.ncols()
    }

    /// Number of records appended but not yet flushed.
    pub fn pending(&self) -> usize {
        self.filled - self.flushed
    }

    /// Logical index the next appended record will receive.
    pub fn next_logical(&self) -> usize {
        self.filled
    }

    pub fn is_full(&self) -> bool {
        self.pending() == self.capacity()
    }

    /// Stores one record in the slot of the next logical column.
    ///
    /// Returns `true` when the buffer has just become full and must be flushed
    /// before the next append.
    pub fn append(&mut self, coordinates: &Array1<f64>, misfit: f64) -> Result<bool> {
        if self.is_full() {
            return Err(HmcError::Storage(
                "sample buffer overflow: flush before appending".into(),
            ));
        }
        if coordinates.len() != self.dimensions {
            return Err(HmcError::Config(format!(
                "sample has {} coordinates, buffer expects {}",
                coordinates.len(),
                self.dimensions
            )));
        }
        let slot = self.filled % self.capacity();
        let mut column = self.data.column_mut(slot);
        column
            .slice_mut(s![..self.dimensions])
            .assign(coordinates);
        column[self.dimensions] = misfit;
        self.filled += 1;
        Ok(self.is_full())
    }

    /// Writes the logical columns `logical_start..logical_end` to `writer`.
    ///
    /// The range must lie inside the current fill. Slots that wrap around the
    /// end of the physical buffer are written as two contiguous blocks.
    pub fn flush_range<W: SampleWriter + ?Sized>(
        &self,
        writer: &mut W,
        logical_start: usize,
        logical_end: usize,
    ) -> Result<()> {
        if logical_start > logical_end
            || logical_start < self.flushed
            || logical_end > self.filled
        {
            return Err(HmcError::Storage(format!(
                "columns {logical_start}..{logical_end} are not buffered \
                 (buffer holds {}..{})",
                self.flushed, self.filled
            )));
        }
        if logical_start == logical_end {
            return Ok(());
        }
        let capacity = self.capacity();
        let first_slot = logical_start % capacity;
        let count = logical_end - logical_start;
        let head = count.min(capacity - first_slot);
        writer.write(
            logical_start,
            self.data.slice(s![.., first_slot..first_slot + head]),
        )?;
        if head < count {
            writer.write(
                logical_start + head,
                self.data.slice(s![.., ..count - head]),
            )?;
        }
        Ok(())
    }

    /// Writes every pending record and marks the buffer empty. Flushing an
    /// empty buffer is a no-op.
    pub fn flush<W: SampleWriter + ?Sized>(&mut self, writer: &mut W) -> Result<usize> {
        let (start, end) = (self.flushed, self.filled);
        self.flush_range(writer, start, end)?;
        self.flushed = end;
        if end > start {
            debug!(first = start, count = end - start, "flushed samples");
        }
        Ok(end - start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::memory::MemoryStore;
    use crate::io::{RunMetadata, SampleStore};
    use ndarray::array;

    fn writer(dimensions: usize, total: usize) -> <MemoryStore as SampleStore>::Writer {
        MemoryStore
            .open(dimensions, total, &RunMetadata::default())
            .unwrap()
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert!(matches!(SampleBuffer::new(2, 0), Err(HmcError::Config(_))));
    }

    #[test]
    fn append_reports_full_on_last_slot() {
        let mut buffer = SampleBuffer::new(1, 3).unwrap();
        assert!(!buffer.append(&array![1.0], 0.1).unwrap());
        assert!(!buffer.append(&array![2.0], 0.2).unwrap());
        assert!(buffer.append(&array![3.0], 0.3).unwrap());
        assert!(buffer.append(&array![4.0], 0.4).is_err());
    }

    #[test]
    fn append_checks_dimensions() {
        let mut buffer = SampleBuffer::new(2, 3).unwrap();
        assert!(buffer.append(&array![1.0], 0.0).is_err());
        assert_eq!(buffer.pending(), 0);
    }

    #[test]
    fn flush_writes_pending_columns_in_order() {
        let mut buffer = SampleBuffer::new(2, 4).unwrap();
        let mut sink = writer(2, 10);
        for k in 0..3 {
            let k = k as f64;
            buffer.append(&array![k, -k], 10.0 * k).unwrap();
        }
        assert_eq!(buffer.flush(&mut sink).unwrap(), 3);
        assert_eq!(buffer.pending(), 0);
        assert_eq!(sink.last_written_column(), 3);

        let dataset = sink.close().unwrap();
        assert_eq!(
            dataset.samples(),
            array![[0.0, 1.0, 2.0], [0.0, -1.0, -2.0], [0.0, 10.0, 20.0]]
        );
    }

    #[test]
    fn wrapped_logical_range_is_written_in_two_blocks() {
        let mut buffer = SampleBuffer::new(1, 4).unwrap();
        let mut sink = writer(1, 10);
        for k in 0..3 {
            buffer.append(&array![k as f64], 0.0).unwrap();
        }
        buffer.flush(&mut sink).unwrap();
        // Logical 3..7 occupy slots 3, 0, 1, 2.
        for k in 3..7 {
            buffer.append(&array![k as f64], 0.0).unwrap();
        }
        assert!(buffer.is_full());
        buffer.flush(&mut sink).unwrap();

        let dataset = sink.close().unwrap();
        assert_eq!(dataset.last_written_column(), 7);
        let coordinates: Vec<f64> = dataset.coordinates().row(0).to_vec();
        assert_eq!(coordinates, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn flush_range_outside_fill_is_an_error() {
        let mut buffer = SampleBuffer::new(1, 4).unwrap();
        let mut sink = writer(1, 10);
        buffer.append(&array![1.0], 0.0).unwrap();
        assert!(buffer.flush_range(&mut sink, 0, 2).is_err());
        assert!(buffer.flush_range(&mut sink, 1, 0).is_err());
        buffer.flush_range(&mut sink, 0, 1).unwrap();
    }

    #[test]
    fn flushing_an_empty_buffer_writes_nothing() {
        let mut buffer = SampleBuffer::new(3, 2).unwrap();
        let mut sink = writer(3, 5);
        assert_eq!(buffer.flush(&mut sink).unwrap(), 0);
        assert_eq!(sink.last_written_column(), 0);
    }
}
