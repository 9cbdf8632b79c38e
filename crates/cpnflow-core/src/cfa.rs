//! Counting-based flow analysis
//!
//! The Petri-net simulator logs, for every place, how many tokens entered it
//! ("reentrances") and how many it held ("occupancy") at every time step.
//! Each log is a CSV file with a `time,quantity` header followed by one row
//! of unsigned integers per step. Counting-based estimates are simply these
//! counts, truncated to the analysed horizon and converted from tokens to
//! physical units.

use crate::errors::{FlowError, FlowResult};
use ndarray::Array1;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::debug;

const HEADER: &str = "time,quantity";

/// Event counts of one place, indexed by simulation step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountLog {
    pub times: Vec<u64>,
    pub counts: Vec<u64>,
}

impl CountLog {
    /// Build a log with consecutive time indices starting at zero.
    pub fn from_counts(counts: Vec<u64>) -> Self {
        let times = (0..counts.len() as u64).collect();
        Self { times, counts }
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Read a log, skipping the header row and blank lines.
    pub fn read(path: impl AsRef<Path>) -> FlowResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| FlowError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut log = CountLog::default();
        for (index, line) in BufReader::new(file).lines().enumerate().skip(1) {
            let line = line.map_err(|source| FlowError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let (time, count) = parse_row(line).map_err(|reason| FlowError::Parse {
                path: path.to_path_buf(),
                line: index + 1,
                reason,
            })?;
            log.times.push(time);
            log.counts.push(count);
        }

        debug!(path = %path.display(), rows = log.len(), "Read count log");
        Ok(log)
    }

    /// Write the log in the format accepted by [`CountLog::read`].
    pub fn write(&self, path: impl AsRef<Path>) -> FlowResult<()> {
        let path = path.as_ref();
        let io_err = |source: std::io::Error| FlowError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let mut writer = BufWriter::new(File::create(path).map_err(io_err)?);
        writeln!(writer, "{HEADER}").map_err(io_err)?;
        for (time, count) in self.times.iter().zip(&self.counts) {
            writeln!(writer, "{time},{count}").map_err(io_err)?;
        }
        writer.flush().map_err(io_err)
    }

    /// The first `max_t` counts, or all of them if the log is shorter.
    pub fn truncated(&self, max_t: usize) -> &[u64] {
        &self.counts[..max_t.min(self.counts.len())]
    }

    /// Counts converted to physical units over exactly `max_t` steps.
    ///
    /// Steps beyond the end of the log are zero.
    pub fn scaled(&self, max_t: usize, tokens_per_unit: f64) -> FlowResult<Array1<f64>> {
        if !tokens_per_unit.is_finite() || tokens_per_unit <= 0.0 {
            return Err(FlowError::invalid_parameter(
                "tokens_per_unit",
                format!("must be finite and > 0, got {tokens_per_unit}"),
            ));
        }

        let mut scaled = Array1::zeros(max_t);
        for (value, &count) in scaled.iter_mut().zip(self.truncated(max_t)) {
            *value = count as f64 / tokens_per_unit;
        }
        Ok(scaled)
    }
}

fn parse_row(line: &str) -> Result<(u64, u64), String> {
    let mut fields = line.split(',').map(str::trim);
    let mut next_field = |name: &str| -> Result<u64, String> {
        let field = fields
            .next()
            .ok_or_else(|| format!("missing `{name}` column"))?;
        field
            .parse()
            .map_err(|e| format!("invalid `{name}` value {field:?}: {e}"))
    };
    let time = next_field("time")?;
    let count = next_field("quantity")?;
    Ok((time, count))
}

/// Counting-based estimate: the first `max_t` counts of the log at `path`.
pub fn cfa(path: impl AsRef<Path>, max_t: usize) -> FlowResult<Vec<u64>> {
    let log = CountLog::read(path)?;
    Ok(log.truncated(max_t).to_vec())
}
