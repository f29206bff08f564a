use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::{debug, info};

use ab_lab_core::{GroupLabel, Sample};

use crate::error::{LoaderError, Result};

/// Label column that assigns each row to an experiment arm.
pub const GROUP_COLUMN: &str = "group";

/// Reads one metric's values for both groups from a labeled CSV table.
///
/// The table must carry a `group` column (values `Control` / `Test`,
/// case-insensitive) and a column named after the requested metric. Rows are
/// kept in file order within each group.
pub fn read_groups<P: AsRef<Path>>(path: P, metric: &str) -> Result<(Sample, Sample)> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)?;

    let headers = reader.headers()?.clone();
    let group_idx = column_index(&headers, GROUP_COLUMN)?;
    let metric_idx = column_index(&headers, metric)?;

    let mut control = Vec::new();
    let mut test = Vec::new();

    for (i, record) in reader.records().enumerate() {
        let row = i + 2; // 1-based, after the header
        let record = record?;

        let label: GroupLabel = record
            .get(group_idx)
            .unwrap_or_default()
            .parse()
            .map_err(LoaderError::Core)?;

        let raw = record.get(metric_idx).unwrap_or_default().trim();
        let value: f64 = raw.parse().map_err(|_| LoaderError::Parse {
            row,
            column: metric.to_string(),
            value: raw.to_string(),
        })?;

        match label {
            GroupLabel::Control => control.push(value),
            GroupLabel::Test => test.push(value),
        }
    }

    if control.is_empty() {
        return Err(LoaderError::EmptyGroup(GroupLabel::Control));
    }
    if test.is_empty() {
        return Err(LoaderError::EmptyGroup(GroupLabel::Test));
    }

    info!(
        path = %path.display(),
        metric,
        control_rows = control.len(),
        test_rows = test.len(),
        "loaded labeled table"
    );

    Ok((
        Sample::new(GroupLabel::Control, control)?,
        Sample::new(GroupLabel::Test, test)?,
    ))
}

/// Writes the merged labeled table: one `group,value` row per observation,
/// Control rows first. The flat-file counterpart of the loaded data.
pub fn write_merged<P: AsRef<Path>>(path: P, control: &Sample, test: &Sample) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)?;

    writer.write_record([GROUP_COLUMN, "value"])?;
    for sample in [control, test] {
        let label = sample.label().to_string();
        for value in sample.values() {
            let rendered = value.to_string();
            writer.write_record([label.as_str(), rendered.as_str()])?;
        }
    }
    writer.flush().map_err(|source| LoaderError::Io {
        path: path.display().to_string(),
        source,
    })?;

    debug!(path = %path.display(), "wrote merged table");
    Ok(())
}

/// SHA-256 over the canonical byte encoding of both samples (label byte then
/// little-endian value bits per observation), hex-encoded. Stable across
/// runs for identical inputs.
pub fn fingerprint(control: &Sample, test: &Sample) -> String {
    let mut hasher = Sha256::new();
    for sample in [control, test] {
        let tag: u8 = match sample.label() {
            GroupLabel::Control => 0,
            GroupLabel::Test => 1,
        };
        for value in sample.values() {
            hasher.update([tag]);
            hasher.update(value.to_le_bytes());
        }
    }
    hex::encode(hasher.finalize())
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(name))
        .ok_or_else(|| LoaderError::MissingColumn {
            column: name.to_string(),
            available: headers.iter().map(str::to_string).collect(),
        })
}
