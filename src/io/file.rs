/*!
A dataset directory on disk.

```text
<path>/
  samples.bin     (dimensions + 1) * total_samples little-endian f64,
                  one column after another
  attributes.csv  key,value rows: run metadata and last_written_column
```

`samples.bin` is allocated to its full size when the dataset is opened, and
column `k` starts at byte `k * (dimensions + 1) * 8`. The number of columns is
`proposals / online_thinning`, so the two files together are self-describing.
`attributes.csv` is rewritten after every block is written, through a
temporary file that is renamed into place, so a reader never sees a high-water
mark that is ahead of the sample data.
*/

use super::{attribute, check_block, Dataset, RunMetadata, SampleStore, SampleWriter};
use crate::error::{HmcError, Result};
use ndarray::{Array2, ArrayView2, ShapeBuilder};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const SAMPLES_FILE: &str = "samples.bin";
pub const ATTRIBUTES_FILE: &str = "attributes.csv";

const F64_BYTES: usize = std::mem::size_of::<f64>();

/// Opens dataset directories for writing.
#[derive(Debug, Clone)]
pub struct FileStore {
    pub path: PathBuf,
    /// Replace an existing dataset at `path` instead of failing.
    pub overwrite: bool,
}

impl FileStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            overwrite: false,
        }
    }

    pub fn set_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}

#[derive(Debug)]
pub struct FileWriter {
    path: PathBuf,
    samples: File,
    metadata: RunMetadata,
    dimensions: usize,
    total_samples: usize,
    last_written_column: usize,
}

impl SampleStore for FileStore {
    type Writer = FileWriter;

    fn open(
        self,
        dimensions: usize,
        total_samples: usize,
        metadata: &RunMetadata,
    ) -> Result<FileWriter> {
        if metadata.online_thinning == 0
            || metadata.proposals / metadata.online_thinning != total_samples
        {
            return Err(HmcError::Storage(format!(
                "a dataset of {total_samples} columns does not match {} proposals thinned by {}",
                metadata.proposals, metadata.online_thinning
            )));
        }
        let exists =
            self.path.join(SAMPLES_FILE).exists() || self.path.join(ATTRIBUTES_FILE).exists();
        if exists && !self.overwrite {
            return Err(HmcError::Storage(format!(
                "a dataset already exists at {}; enable overwrite to replace it",
                self.path.display()
            )));
        }
        fs::create_dir_all(&self.path).map_err(|e| {
            HmcError::Storage(format!("cannot create {}: {e}", self.path.display()))
        })?;

        let samples = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(self.path.join(SAMPLES_FILE))?;
        samples.set_len(((dimensions + 1) * total_samples * F64_BYTES) as u64)?;

        let writer = FileWriter {
            path: self.path,
            samples,
            metadata: metadata.clone(),
            dimensions,
            total_samples,
            last_written_column: 0,
        };
        writer.write_attributes()?;
        debug!(path = %writer.path.display(), dimensions, total_samples, "opened dataset");
        Ok(writer)
    }
}

impl FileWriter {
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_attributes(&self) -> Result<()> {
        let staging = self.path.join(format!("{ATTRIBUTES_FILE}.tmp"));
        let mut wtr = csv::Writer::from_path(&staging)?;
        wtr.write_record(["key", "value"])?;
        for (key, value) in self.metadata.attributes() {
            wtr.write_record([key, value.as_str()])?;
        }
        wtr.write_record([
            "last_written_column",
            self.last_written_column.to_string().as_str(),
        ])?;
        wtr.flush()?;
        drop(wtr);
        fs::rename(&staging, self.path.join(ATTRIBUTES_FILE))?;
        Ok(())
    }
}

impl SampleWriter for FileWriter {
    type Finalized = PathBuf;

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn total_samples(&self) -> usize {
        self.total_samples
    }

    fn last_written_column(&self) -> usize {
        self.last_written_column
    }

    fn write(&mut self, first_column: usize, columns: ArrayView2<f64>) -> Result<()> {
        check_block(self.dimensions, self.total_samples, first_column, &columns)?;

        let mut bytes = Vec::with_capacity(columns.len() * F64_BYTES);
        for column in columns.columns() {
            for value in column {
                bytes.extend_from_slice(&value.to_le_bytes());
            }
        }
        let offset = first_column * (self.dimensions + 1) * F64_BYTES;
        self.samples.seek(SeekFrom::Start(offset as u64))?;
        self.samples.write_all(&bytes)?;
        self.samples.flush()?;

        self.last_written_column = self
            .last_written_column
            .max(first_column + columns.ncols());
        self.write_attributes()
    }

    fn close(self) -> Result<PathBuf> {
        self.samples.sync_all()?;
        self.write_attributes()?;
        Ok(self.path)
    }
}

pub(crate) fn read_dataset(path: &Path) -> Result<Dataset> {
    let mut attributes = HashMap::new();
    let mut rdr = csv::Reader::from_path(path.join(ATTRIBUTES_FILE))?;
    for record in rdr.records() {
        let record = record?;
        if let (Some(key), Some(value)) = (record.get(0), record.get(1)) {
            attributes.insert(key.to_string(), value.to_string());
        }
    }
    let metadata = RunMetadata::from_attributes(&attributes)?;
    let last_written_column: usize = attribute(&attributes, "last_written_column")?;

    let total_samples = metadata.proposals / metadata.online_thinning.max(1);
    let bytes = fs::read(path.join(SAMPLES_FILE))?;
    let column_bytes = total_samples * F64_BYTES;
    if total_samples == 0 || bytes.len() % column_bytes != 0 || bytes.len() < 2 * column_bytes {
        return Err(HmcError::Storage(format!(
            "{} holds {} bytes, which is not a whole number of {total_samples} columns",
            path.join(SAMPLES_FILE).display(),
            bytes.len()
        )));
    }
    if last_written_column > total_samples {
        return Err(HmcError::Storage(format!(
            "last_written_column {last_written_column} exceeds the {total_samples} allocated columns"
        )));
    }
    let rows = bytes.len() / column_bytes;

    let values: Vec<f64> = bytes
        .chunks_exact(F64_BYTES)
        .map(|chunk| {
            let mut raw = [0u8; F64_BYTES];
            raw.copy_from_slice(chunk);
            f64::from_le_bytes(raw)
        })
        .collect();
    let samples = Array2::from_shape_vec((rows, total_samples).f(), values)
        .map_err(|e| HmcError::Storage(format!("malformed sample data: {e}")))?;

    Ok(Dataset::new(metadata, samples, last_written_column))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use tempfile::tempdir;

    fn metadata(proposals: usize, online_thinning: usize) -> RunMetadata {
        RunMetadata {
            proposals,
            online_thinning,
            ..RunMetadata::default()
        }
    }

    #[test]
    fn written_columns_are_read_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run");
        let mut writer = FileStore::new(&path)
            .open(2, 4, &metadata(8, 2))
            .unwrap();
        writer
            .write(0, array![[1.0, 2.0], [3.0, 4.0], [0.5, 0.25]].view())
            .unwrap();
        writer.write(2, array![[5.0], [6.0], [0.125]].view()).unwrap();
        assert_eq!(writer.close().unwrap(), path);

        let dataset = Dataset::read(&path).unwrap();
        assert_eq!(dataset.metadata, metadata(8, 2));
        assert_eq!(dataset.dimensions(), 2);
        assert_eq!(dataset.total_samples(), 4);
        assert_eq!(dataset.last_written_column(), 3);
        assert_eq!(
            dataset.samples(),
            array![[1.0, 2.0, 5.0], [3.0, 4.0, 6.0], [0.5, 0.25, 0.125]]
        );
    }

    #[test]
    fn unclosed_dataset_is_readable() {
        let dir = tempdir().unwrap();
        let mut writer = FileStore::new(dir.path())
            .open(1, 5, &metadata(5, 1))
            .unwrap();
        writer.write(0, array![[7.0, 8.0], [1.0, 2.0]].view()).unwrap();
        // Simulates a process that dies before `close`.
        drop(writer);

        let dataset = Dataset::read(dir.path()).unwrap();
        assert_eq!(dataset.last_written_column(), 2);
        assert_eq!(dataset.misfits(), array![1.0, 2.0]);
    }

    #[test]
    fn existing_dataset_requires_overwrite() {
        let dir = tempdir().unwrap();
        FileStore::new(dir.path())
            .open(1, 2, &metadata(2, 1))
            .unwrap()
            .close()
            .unwrap();

        let refused = FileStore::new(dir.path()).open(1, 2, &metadata(2, 1));
        assert!(matches!(refused, Err(HmcError::Storage(_))));

        let mut writer = FileStore::new(dir.path())
            .set_overwrite(true)
            .open(3, 2, &metadata(2, 1))
            .unwrap();
        writer.write(0, Array2::ones((4, 1)).view()).unwrap();
        writer.close().unwrap();
        assert_eq!(Dataset::read(dir.path()).unwrap().dimensions(), 3);
    }

    #[test]
    fn unusable_path_fails_to_open() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("not-a-directory");
        fs::write(&blocker, b"occupied").unwrap();
        let result = FileStore::new(blocker.join("run")).open(1, 1, &metadata(1, 1));
        assert!(matches!(result, Err(HmcError::Storage(_))));
    }

    #[test]
    fn column_count_must_follow_from_metadata() {
        let dir = tempdir().unwrap();
        let result = FileStore::new(dir.path()).open(1, 3, &metadata(10, 2));
        assert!(matches!(result, Err(HmcError::Storage(_))));
    }

    #[test]
    fn attributes_use_plain_key_value_rows() {
        let dir = tempdir().unwrap();
        FileStore::new(dir.path())
            .open(1, 10, &metadata(100, 10))
            .unwrap();
        let text = fs::read_to_string(dir.path().join(ATTRIBUTES_FILE)).unwrap();
        assert!(text.starts_with("key,value\n"));
        assert!(text.contains("online_thinning,10\n"));
        assert!(text.contains("sampler_name,HMC\n"));
        assert!(text.contains("last_written_column,0\n"));
        assert!(!dir.path().join("attributes.csv.tmp").exists());
    }
}
