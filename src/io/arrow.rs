/*!
# Exporting datasets to Arrow IPC

Enable via the `arrow` feature. The table layout matches
[`super::csv::save_csv`]: `sample` (UInt32), `dim_0..dim_{D-1}` and `misfit`
(Float64). The run metadata is attached to the schema.
*/

use super::Dataset;
use crate::error::Result;
use arrow::{
    array::{ArrayRef, Float64Builder, UInt32Builder},
    datatypes::{DataType, Field, Schema, SchemaRef},
    ipc::writer::FileWriter,
    record_batch::RecordBatch,
};
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

/// Builds the single record batch shared by the Arrow and Parquet exporters.
pub(crate) fn record_batch(dataset: &Dataset) -> Result<(SchemaRef, RecordBatch)> {
    let n_dims = dataset.dimensions();

    let mut fields = vec![Field::new("sample", DataType::UInt32, false)];
    for dim_idx in 0..n_dims {
        fields.push(Field::new(
            format!("dim_{}", dim_idx),
            DataType::Float64,
            false,
        ));
    }
    fields.push(Field::new("misfit", DataType::Float64, false));

    let mut metadata: HashMap<String, String> = dataset
        .metadata
        .attributes()
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect();
    metadata.insert(
        "last_written_column".to_string(),
        dataset.last_written_column().to_string(),
    );
    let schema = Arc::new(Schema::new(fields).with_metadata(metadata));

    let mut sample_builder = UInt32Builder::new();
    let mut value_builders: Vec<Float64Builder> =
        (0..=n_dims).map(|_| Float64Builder::new()).collect();
    for (sample_idx, column) in dataset.samples().columns().into_iter().enumerate() {
        sample_builder.append_value(sample_idx as u32);
        for (builder, value) in value_builders.iter_mut().zip(column.iter()) {
            builder.append_value(*value);
        }
    }

    let mut arrays = vec![Arc::new(sample_builder.finish()) as ArrayRef];
    for mut builder in value_builders {
        arrays.push(Arc::new(builder.finish()) as ArrayRef);
    }
    let batch = RecordBatch::try_new(schema.clone(), arrays)?;
    Ok((schema, batch))
}

/**
Saves the valid columns of a dataset as an Arrow IPC file.

# Examples

```rust
use hmc_tomography::io::arrow::save_arrow;
use hmc_tomography::io::memory::MemoryStore;
use hmc_tomography::io::{RunMetadata, SampleStore, SampleWriter};
use ndarray::array;

let mut writer = MemoryStore.open(1, 1, &RunMetadata::default())?;
writer.write(0, array![[42.0], [0.5]].view())?;
save_arrow(&writer.close()?, "/tmp/hmc_output.arrow")?;
# Ok::<(), Box<dyn std::error::Error>>(())
```
*/
pub fn save_arrow<P: AsRef<Path>>(dataset: &Dataset, filename: P) -> Result<()> {
    let (schema, batch) = record_batch(dataset)?;
    let file = File::create(filename)?;
    let mut writer = FileWriter::try_new(file, &schema)?;
    writer.write(&batch)?;
    writer.finish()?;
    Ok(())
}
