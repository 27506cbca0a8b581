/*!
# Sample persistence

A run streams its thinned samples into a [`SampleWriter`] obtained from a
[`SampleStore`]. The dataset is a `(dimensions + 1) × total_samples` matrix:
column `k` holds the `k`-th thinned sample, rows `0..dimensions` its
coordinates and the last row its misfit. Each dataset carries the immutable
[`RunMetadata`] of the run plus a `last_written_column` high-water mark, so
that a dataset left behind by an interrupted run is still self-describing.

Two stores are provided:
- [`memory::MemoryStore`] keeps everything in RAM and finalizes to a [`Dataset`].
- [`file::FileStore`] writes a dataset directory on disk that
  [`Dataset::read`] opens again.

Finished datasets can be exported with [`csv::save_csv`] and, behind the
`arrow` and `parquet` features, `arrow::save_arrow` / `parquet::save_parquet`.
*/

#[cfg(feature = "arrow")]
pub mod arrow;

pub mod csv;
pub mod file;
pub mod memory;

#[cfg(feature = "parquet")]
pub mod parquet;

use crate::error::{HmcError, Result};
use ndarray::{s, Array2, ArrayView1, ArrayView2};
use std::collections::HashMap;
use std::path::Path;

/// Name recorded in the `sampler_name` attribute.
pub const SAMPLER_NAME: &str = "HMC";

/// Run settings recorded alongside the samples.
#[derive(Debug, Clone, PartialEq)]
pub struct RunMetadata {
    pub proposals: usize,
    pub online_thinning: usize,
    pub nominal_step_size: f64,
    pub nominal_steps: usize,
    pub randomize_step_size: bool,
    pub randomize_steps: bool,
    pub sampler_name: String,
}

impl Default for RunMetadata {
    fn default() -> Self {
        Self {
            proposals: 100,
            online_thinning: 1,
            nominal_step_size: 0.1,
            nominal_steps: 10,
            randomize_step_size: true,
            randomize_steps: true,
            sampler_name: SAMPLER_NAME.to_string(),
        }
    }
}

impl RunMetadata {
    /// The metadata as `(key, value)` attribute pairs, in a stable order.
    pub fn attributes(&self) -> Vec<(&'static str, String)> {
        vec![
            ("proposals", self.proposals.to_string()),
            ("online_thinning", self.online_thinning.to_string()),
            ("nominal_step_size", self.nominal_step_size.to_string()),
            ("nominal_steps", self.nominal_steps.to_string()),
            ("randomize_step_size", self.randomize_step_size.to_string()),
            ("randomize_steps", self.randomize_steps.to_string()),
            ("sampler_name", self.sampler_name.clone()),
        ]
    }

    /// Parses the pairs produced by [`RunMetadata::attributes`]. Unknown keys
    /// are ignored.
    pub fn from_attributes(attributes: &HashMap<String, String>) -> Result<Self> {
        Ok(Self {
            proposals: attribute(attributes, "proposals")?,
            online_thinning: attribute(attributes, "online_thinning")?,
            nominal_step_size: attribute(attributes, "nominal_step_size")?,
            nominal_steps: attribute(attributes, "nominal_steps")?,
            randomize_step_size: attribute(attributes, "randomize_step_size")?,
            randomize_steps: attribute(attributes, "randomize_steps")?,
            sampler_name: attribute(attributes, "sampler_name")?,
        })
    }
}

/// Looks up and parses one attribute.
pub(crate) fn attribute<T: std::str::FromStr>(
    attributes: &HashMap<String, String>,
    key: &str,
) -> Result<T> {
    let raw = attributes
        .get(key)
        .ok_or_else(|| HmcError::Storage(format!("missing attribute `{key}`")))?;
    raw.parse()
        .map_err(|_| HmcError::Storage(format!("malformed attribute `{key}`: {raw:?}")))
}

/// A place a run can persist its samples to.
pub trait SampleStore {
    type Writer: SampleWriter;

    /// Allocates a dataset of `dimensions + 1` rows by `total_samples`
    /// columns and records `metadata`. Failing here aborts the run before any
    /// proposal is made.
    fn open(
        self,
        dimensions: usize,
        total_samples: usize,
        metadata: &RunMetadata,
    ) -> Result<Self::Writer>;
}

/// An open dataset accepting blocks of columns.
pub trait SampleWriter {
    /// What [`SampleWriter::close`] hands back, e.g. the in-memory dataset or
    /// the path of the dataset directory.
    type Finalized;

    fn dimensions(&self) -> usize;

    fn total_samples(&self) -> usize;

    /// Number of leading columns known to hold valid samples.
    fn last_written_column(&self) -> usize;

    /// Writes `columns` to the dataset starting at `first_column` and raises
    /// the high-water mark to the end of the block.
    fn write(&mut self, first_column: usize, columns: ArrayView2<f64>) -> Result<()>;

    /// Finalizes the attributes and releases the dataset.
    fn close(self) -> Result<Self::Finalized>;
}

/// Rejects blocks of the wrong height or reaching past the dataset end.
pub(crate) fn check_block(
    dimensions: usize,
    total_samples: usize,
    first_column: usize,
    columns: &ArrayView2<f64>,
) -> Result<()> {
    if columns.nrows() != dimensions + 1 {
        return Err(HmcError::Storage(format!(
            "block has {} rows, dataset has {}",
            columns.nrows(),
            dimensions + 1
        )));
    }
    let end = first_column + columns.ncols();
    if end > total_samples {
        return Err(HmcError::Storage(format!(
            "columns {first_column}..{end} are out of range for a dataset of {total_samples} samples"
        )));
    }
    Ok(())
}

/// A dataset of thinned samples together with its run metadata.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub metadata: RunMetadata,
    samples: Array2<f64>,
    last_written_column: usize,
}

impl Dataset {
    pub(crate) fn new(
        metadata: RunMetadata,
        samples: Array2<f64>,
        last_written_column: usize,
    ) -> Self {
        Self {
            metadata,
            samples,
            last_written_column,
        }
    }

    /// Opens a dataset directory written by [`file::FileStore`].
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        file::read_dataset(path.as_ref())
    }

    /// Number of model parameters.
    pub fn dimensions(&self) -> usize {
        self.samples.nrows() - 1
    }

    /// Number of columns allocated for the run.
    pub fn total_samples(&self) -> usize {
        self.samples.ncols()
    }

    pub fn last_written_column(&self) -> usize {
        self.last_written_column
    }

    /// The valid columns: coordinates in rows `0..dimensions`, misfit in the
    /// last row.
    pub fn samples(&self) -> ArrayView2<'_, f64> {
        self.samples.slice(s![.., ..self.last_written_column])
    }

    pub fn coordinates(&self) -> ArrayView2<'_, f64> {
        self.samples
            .slice(s![..self.dimensions(), ..self.last_written_column])
    }

    pub fn misfits(&self) -> ArrayView1<'_, f64> {
        self.samples
            .slice(s![self.dimensions(), ..self.last_written_column])
    }
}
