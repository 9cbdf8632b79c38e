//! CSV output of aligned time series

use anyhow::{ensure, Context, Result};
use ndarray::ArrayView1;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write `columns` as CSV with a leading `time` column.
///
/// Every column must have one value per time point.
pub fn write_series_csv(
    path: &Path,
    times: ArrayView1<f64>,
    columns: &[(&str, ArrayView1<f64>)],
) -> Result<()> {
    for (name, values) in columns {
        ensure!(
            values.len() == times.len(),
            "column {name} has {} values for {} time points",
            values.len(),
            times.len()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating output directory {}", parent.display()))?;
    }
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    let header: Vec<&str> = std::iter::once("time")
        .chain(columns.iter().map(|(name, _)| *name))
        .collect();
    writeln!(writer, "{}", header.join(","))?;

    for (i, time) in times.iter().enumerate() {
        write!(writer, "{time}")?;
        for (_, values) in columns {
            write!(writer, ",{}", values[i])?;
        }
        writeln!(writer)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write any serialisable value as pretty-printed JSON.
pub fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating output directory {}", parent.display()))?;
    }
    let text = serde_json::to_string_pretty(value)?;
    fs::write(path, text).with_context(|| format!("writing {}", path.display()))
}
