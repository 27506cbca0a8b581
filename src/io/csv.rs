/*!
# Exporting datasets to CSV

Always available; the attribute file of [`super::file::FileStore`] uses the
same `csv` writer.
*/

use super::Dataset;
use crate::error::Result;
use csv::Writer;
use std::fs::File;
use std::path::Path;

/**
Saves the valid columns of a dataset as a CSV file.

The resulting CSV file will have:
- A header row containing `"sample"`, one column per dimension named
  `"dim_0"`, `"dim_1"`, etc., and `"misfit"`.
- One row per thinned sample, in chain order.

# Examples

```rust
use hmc_tomography::io::csv::save_csv;
use hmc_tomography::io::memory::MemoryStore;
use hmc_tomography::io::{RunMetadata, SampleStore, SampleWriter};
use ndarray::array;

let mut writer = MemoryStore.open(2, 2, &RunMetadata::default())?;
writer.write(0, array![[1.0, 2.0], [3.0, 4.0], [0.1, 0.2]].view())?;
let dataset = writer.close()?;

save_csv(&dataset, "/tmp/hmc_output.csv")?;
# Ok::<(), Box<dyn std::error::Error>>(())
```
*/
pub fn save_csv<P: AsRef<Path>>(dataset: &Dataset, filename: P) -> Result<()> {
    let mut wtr = Writer::from_writer(File::create(filename)?);
    let n_dims = dataset.dimensions();

    let mut header: Vec<String> = vec!["sample".to_string()];
    header.extend((0..n_dims).map(|i| format!("dim_{}", i)));
    header.push("misfit".to_string());
    wtr.write_record(&header)?;

    for (sample_idx, column) in dataset.samples().columns().into_iter().enumerate() {
        let mut row = vec![sample_idx.to_string()];
        row.extend(column.iter().map(|v| v.to_string()));
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}
