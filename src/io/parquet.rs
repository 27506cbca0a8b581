/*!
# Exporting datasets to Parquet

Enable via the `parquet` feature (which pulls in `arrow`). Same table as the
Arrow exporter, with the run metadata stored in the embedded Arrow schema.
*/

use super::Dataset;
use crate::error::Result;
use parquet::{arrow::ArrowWriter, file::properties::WriterProperties};
use std::fs::File;
use std::path::Path;

/**
Saves the valid columns of a dataset as a Parquet file.

# Examples

```rust
use hmc_tomography::io::parquet::save_parquet;
use hmc_tomography::io::memory::MemoryStore;
use hmc_tomography::io::{RunMetadata, SampleStore, SampleWriter};
use ndarray::array;

let mut writer = MemoryStore.open(1, 1, &RunMetadata::default())?;
writer.write(0, array![[42.0], [0.5]].view())?;
save_parquet(&writer.close()?, "/tmp/hmc_output.parquet")?;
# Ok::<(), Box<dyn std::error::Error>>(())
```
*/
pub fn save_parquet<P: AsRef<Path>>(dataset: &Dataset, filename: P) -> Result<()> {
    let (schema, batch) = super::arrow::record_batch(dataset)?;

    let file = File::create(filename)?;
    let props = WriterProperties::builder().build();
    let mut writer = ArrowWriter::try_new(file, schema, Some(props))?;

    writer.write(&batch)?;
    // Close the writer to ensure metadata is written
    writer.close()?;
    Ok(())
}
