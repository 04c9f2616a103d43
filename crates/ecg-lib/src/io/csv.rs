//! The exported sample table: `Time(s),Amplitude(mV),Sample_Index,Beat_Count`.

use crate::signal::Sample;
use anyhow::{Context, Result};
use csv::{ReaderBuilder, Trim, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const TABLE_HEADER: [&str; 4] = ["Time(s)", "Amplitude(mV)", "Sample_Index", "Beat_Count"];
/// `chrono` format of the timestamp embedded in export file names.
pub const EXPORT_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

#[derive(Debug, Serialize, Deserialize)]
struct TableRow {
    #[serde(rename = "Time(s)")]
    time: f64,
    #[serde(rename = "Amplitude(mV)")]
    amplitude: f64,
    #[serde(rename = "Sample_Index")]
    sample_index: usize,
    #[serde(rename = "Beat_Count")]
    beat_count: usize,
}

impl From<&Sample> for TableRow {
    fn from(s: &Sample) -> Self {
        Self {
            time: s.time,
            amplitude: s.amplitude,
            sample_index: s.sample_index,
            beat_count: s.beat_count,
        }
    }
}

/// `{name}_{lead}_{timestamp}.csv`
pub fn export_file_name(name: &str, lead: &str, timestamp: &str) -> String {
    format!("{name}_{lead}_{timestamp}.csv")
}

/// Write the table and return the number of rows written, header included.
pub fn write_samples_csv(path: &Path, samples: &[Sample]) -> Result<usize> {
    if samples.is_empty() {
        anyhow::bail!("no ECG samples to export");
    }
    let file =
        fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
    writer.write_record(TABLE_HEADER)?;
    for sample in samples {
        writer
            .serialize(TableRow::from(sample))
            .with_context(|| format!("writing sample {}", sample.sample_index))?;
    }
    writer.flush()?;
    Ok(samples.len() + 1)
}

pub fn read_samples_csv(path: &Path) -> Result<Vec<Sample>> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let mut samples = Vec::new();
    for (idx, row) in reader.deserialize::<TableRow>().enumerate() {
        let row = row.with_context(|| format!("parsing row {} of {}", idx + 1, path.display()))?;
        samples.push(Sample {
            time: row.time,
            amplitude: row.amplitude,
            sample_index: row.sample_index,
            beat_count: row.beat_count,
        });
    }
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn samples() -> Vec<Sample> {
        vec![
            Sample {
                time: 0.0,
                amplitude: 0.0012,
                sample_index: 0,
                beat_count: 0,
            },
            Sample {
                time: 0.002,
                amplitude: -0.25,
                sample_index: 1,
                beat_count: 0,
            },
            Sample {
                time: 0.004,
                amplitude: 1.2,
                sample_index: 2,
                beat_count: 1,
            },
        ]
    }

    #[test]
    fn table_has_header_and_one_row_per_sample() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("trace.csv");
        let rows = write_samples_csv(&path, &samples()).unwrap();
        assert_eq!(rows, 4);

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "Time(s),Amplitude(mV),Sample_Index,Beat_Count");
        assert_eq!(lines[3], "0.004,1.2,2,1");

        assert_eq!(read_samples_csv(&path).unwrap(), samples());
    }

    #[test]
    fn refuses_empty_export() {
        let dir = tempdir().unwrap();
        assert!(write_samples_csv(&dir.path().join("empty.csv"), &[]).is_err());
    }

    #[test]
    fn file_name_embeds_lead_and_timestamp() {
        assert_eq!(
            export_file_name("ecg_export", "Lead_II", "20240102_030405"),
            "ecg_export_Lead_II_20240102_030405.csv"
        );
    }
}
