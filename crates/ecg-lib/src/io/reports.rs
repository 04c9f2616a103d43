//! Stored report records and the input files that drive generation.
//!
//! A report is a loosely typed JSON object written by the scanning device. Lookups
//! behave like dictionary reads with a default: a missing key takes the default, a key
//! that is present is passed through as-is (including `null`).

use crate::inputs::{PhysiologicalInputs, StressLevel};
use anyhow::{Context, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

/// Load generation inputs from a `.json` report record or a `.toml` parameter file.
pub fn read_inputs(path: &Path) -> Result<PhysiologicalInputs> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let inputs: PhysiologicalInputs = match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => serde_json::from_str(&contents)
            .with_context(|| format!("parsing inputs {}", path.display()))?,
        Some("toml") => {
            toml::from_str(&contents).with_context(|| format!("parsing inputs {}", path.display()))?
        }
        _ => anyhow::bail!("{} is neither .json nor .toml", path.display()),
    };
    Ok(inputs.validated())
}

/// Listing entry for one stored report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    #[serde(skip_deserializing)]
    pub filename: String,
    #[serde(default = "unknown")]
    pub id: Value,
    #[serde(default = "zero")]
    pub heart_rate: Value,
    #[serde(default = "zero")]
    pub breathing_rate: Value,
    #[serde(default = "low_stress")]
    pub stress_level: StressLevel,
    #[serde(default = "unknown")]
    pub created_date: Value,
    #[serde(default = "unknown")]
    pub result_time: Value,
    #[serde(default = "zero")]
    pub wellness_score: Value,
    #[serde(skip_deserializing)]
    pub file_size: u64,
}

/// Report fields echoed next to a generated trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSummary {
    #[serde(default)]
    pub heart_rate: Value,
    #[serde(default)]
    pub breathing_rate: Value,
    #[serde(default)]
    pub hrv_sdnn: Value,
    #[serde(default)]
    pub mean_rri: Value,
    #[serde(default)]
    pub rmssd: Value,
    #[serde(default = "low_stress")]
    pub stress_level: StressLevel,
    #[serde(default)]
    pub wellness_score: Value,
    #[serde(default = "default_spo2")]
    pub oxygen_saturation: Value,
    #[serde(default = "not_available")]
    pub blood_pressure: Value,
    #[serde(default = "zero")]
    pub pns_index: Value,
    #[serde(default = "zero")]
    pub sns_index: Value,
    #[serde(default = "unit_ratio")]
    pub lf_hf: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicInfo {
    #[serde(default = "not_available")]
    pub id: Value,
    #[serde(default = "not_available")]
    pub scan_by: Value,
    #[serde(default = "not_available")]
    pub created_date: Value,
    #[serde(default = "not_available")]
    pub result_time: Value,
    #[serde(default = "not_available")]
    pub generated_at: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VitalSigns {
    #[serde(default = "zero")]
    pub heart_rate: Value,
    #[serde(default = "zero")]
    pub breathing_rate: Value,
    #[serde(default = "not_available")]
    pub blood_pressure: Value,
    #[serde(default = "zero")]
    pub oxygen_saturation: Value,
    #[serde(default = "zero")]
    pub heart_age: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HrvAnalysis {
    #[serde(default = "zero")]
    pub hrv_sdnn: Value,
    #[serde(default = "zero")]
    pub mean_rri: Value,
    #[serde(default = "zero")]
    pub rmssd: Value,
    #[serde(default = "zero")]
    pub pns_index: Value,
    #[serde(default = "zero")]
    pub sns_index: Value,
    #[serde(default = "zero")]
    pub lf_hf: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthMetrics {
    #[serde(default = "zero")]
    pub wellness_score: Value,
    #[serde(default = "low_stress")]
    pub stress_level: StressLevel,
    #[serde(default = "not_available")]
    pub stress_response: Value,
    #[serde(default = "not_available")]
    pub recovery_ability: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessments {
    #[serde(default = "zero")]
    pub hypertension_risk: Value,
    #[serde(default = "zero")]
    pub diabetic_risk: Value,
    #[serde(default = "zero")]
    pub ascvd_risk: Value,
    #[serde(default = "zero")]
    pub high_fasting_glucose_risk: Value,
    #[serde(default = "zero")]
    pub high_total_cholesterol_risk: Value,
    #[serde(default = "zero")]
    pub low_hemoglobin_risk: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Biomarkers {
    #[serde(default = "zero")]
    pub hemoglobin: Value,
    #[serde(default = "zero")]
    pub hba1c: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceLevels {
    #[serde(default = "zero")]
    pub heart_rate_conf_level: Value,
    #[serde(default = "zero")]
    pub breathing_rate_conf_level: Value,
    #[serde(default = "zero")]
    pub hrv_sdnn_conf_level: Value,
    #[serde(default = "zero")]
    pub prq_conf_level: Value,
}

/// A report record regrouped by topic for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportDetails {
    pub basic_info: BasicInfo,
    pub vital_signs: VitalSigns,
    pub hrv_analysis: HrvAnalysis,
    pub health_metrics: HealthMetrics,
    pub risk_assessments: RiskAssessments,
    pub biomarkers: Biomarkers,
    pub confidence_levels: ConfidenceLevels,
}

/// One stored report as read from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRecord {
    pub filename: String,
    pub file_size: u64,
    pub data: Map<String, Value>,
}

impl ReportRecord {
    pub fn from_json(filename: impl Into<String>, file_size: u64, text: &str) -> Result<Self> {
        let filename = filename.into();
        let data = match serde_json::from_str::<Value>(text)
            .with_context(|| format!("parsing report {filename}"))?
        {
            Value::Object(map) => map,
            other => anyhow::bail!("report {filename} is not a JSON object: {other}"),
        };
        Ok(Self {
            filename,
            file_size,
            data,
        })
    }

    fn view<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(Value::Object(self.data.clone()))
            .with_context(|| format!("reading report {}", self.filename))
    }

    /// Generation inputs; unreadable fields fall back to their defaults.
    pub fn inputs(&self) -> Result<PhysiologicalInputs> {
        Ok(self.view::<PhysiologicalInputs>()?.validated())
    }

    pub fn summary(&self) -> Result<ReportSummary> {
        let mut summary: ReportSummary = self.view()?;
        summary.filename = self.filename.clone();
        summary.file_size = self.file_size;
        Ok(summary)
    }

    pub fn generation_summary(&self) -> Result<GenerationSummary> {
        self.view()
    }

    pub fn details(&self) -> Result<ReportDetails> {
        Ok(ReportDetails {
            basic_info: self.view()?,
            vital_signs: self.view()?,
            hrv_analysis: self.view()?,
            health_metrics: self.view()?,
            risk_assessments: self.view()?,
            biomarkers: self.view()?,
            confidence_levels: self.view()?,
        })
    }
}

/// Source of stored report records.
pub trait ReportStore {
    /// Summaries of every readable report, newest id first.
    fn list(&self) -> Result<Vec<ReportSummary>>;
    /// Load one report by file name.
    fn load(&self, filename: &str) -> Result<ReportRecord>;
}

/// Reports stored as `*.json` files in one directory.
#[derive(Debug, Clone)]
pub struct DirectoryReportStore {
    root: PathBuf,
}

impl DirectoryReportStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn read(&self, path: &Path) -> Result<ReportRecord> {
        let text =
            fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
        let file_size = fs::metadata(path)
            .with_context(|| format!("reading metadata of {}", path.display()))?
            .len();
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        ReportRecord::from_json(filename, file_size, &text)
    }
}

impl ReportStore for DirectoryReportStore {
    fn list(&self) -> Result<Vec<ReportSummary>> {
        let entries = fs::read_dir(&self.root)
            .with_context(|| format!("listing reports in {}", self.root.display()))?;
        let mut reports = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            match self.read(&path).and_then(|record| record.summary()) {
                Ok(summary) => reports.push(summary),
                Err(err) => warn!("skipping {}: {err:#}", path.display()),
            }
        }
        reports.sort_by(|a, b| compare_ids(&b.id, &a.id).then_with(|| a.filename.cmp(&b.filename)));
        debug!("{} reports in {}", reports.len(), self.root.display());
        Ok(reports)
    }

    fn load(&self, filename: &str) -> Result<ReportRecord> {
        if Path::new(filename).file_name().and_then(|name| name.to_str()) != Some(filename) {
            anyhow::bail!("report name {filename:?} must be a bare file name");
        }
        let path = self.root.join(filename);
        if !path.is_file() {
            anyhow::bail!("report {filename} not found in {}", self.root.display());
        }
        self.read(&path)
    }
}

/// Numeric ids order numerically and rank above textual ones; text orders lexically.
fn compare_ids(a: &Value, b: &Value) -> Ordering {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => id_text(a).cmp(&id_text(b)),
    }
}

fn id_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn zero() -> Value {
    Value::from(0)
}

fn unknown() -> Value {
    Value::from("Unknown")
}

fn not_available() -> Value {
    Value::from("N/A")
}

fn default_spo2() -> Value {
    Value::from(98)
}

fn unit_ratio() -> Value {
    Value::from(1.0)
}

// Listing and detail views treat a missing stress code as 1.
fn low_stress() -> StressLevel {
    StressLevel::Low
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn record(value: Value) -> ReportRecord {
        ReportRecord::from_json("r.json", 10, &value.to_string()).unwrap()
    }

    #[test]
    fn summary_applies_listing_defaults() {
        let summary = record(json!({"id": 7, "heart_rate": 64})).summary().unwrap();
        assert_eq!(summary.filename, "r.json");
        assert_eq!(summary.id, json!(7));
        assert_eq!(summary.heart_rate, json!(64));
        assert_eq!(summary.breathing_rate, json!(0));
        assert_eq!(summary.stress_level, StressLevel::Low);
        assert_eq!(summary.created_date, json!("Unknown"));
        assert_eq!(summary.file_size, 10);
    }

    #[test]
    fn present_null_is_passed_through() {
        let details = record(json!({"heart_rate": null, "stress_level": 3}))
            .details()
            .unwrap();
        assert_eq!(details.vital_signs.heart_rate, Value::Null);
        assert_eq!(details.vital_signs.blood_pressure, json!("N/A"));
        assert_eq!(details.health_metrics.stress_level, StressLevel::High);
        assert_eq!(details.basic_info.scan_by, json!("N/A"));
        assert_eq!(details.risk_assessments.ascvd_risk, json!(0));
    }

    #[test]
    fn generation_summary_defaults() {
        let summary = record(json!({"heart_rate": 80})).generation_summary().unwrap();
        assert_eq!(summary.heart_rate, json!(80));
        assert_eq!(summary.rmssd, Value::Null);
        assert_eq!(summary.oxygen_saturation, json!(98));
        assert_eq!(summary.blood_pressure, json!("N/A"));
        assert_eq!(summary.lf_hf, json!(1.0));
    }

    #[test]
    fn record_inputs_are_lenient() {
        let inputs = record(json!({
            "heart_rate": "58",
            "stress_level": 3,
            "blood_pressure": "00/00",
            "oxygen_saturation": "n/a",
            "wellness_score": 71
        }))
        .inputs()
        .unwrap();
        assert_eq!(inputs.heart_rate, 58.0);
        assert_eq!(inputs.stress_level, StressLevel::High);
        assert_eq!(inputs.systolic(), 120.0);
        assert_eq!(inputs.oxygen_saturation, 98.0);
    }

    #[test]
    fn rejects_non_object_records() {
        assert!(ReportRecord::from_json("x.json", 2, "[1, 2]").is_err());
        assert!(ReportRecord::from_json("x.json", 2, "{").is_err());
    }

    #[test]
    fn directory_store_sorts_by_id_and_skips_bad_files() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.json"), r#"{"id": 3}"#).unwrap();
        fs::write(dir.path().join("b.json"), r#"{"id": 12}"#).unwrap();
        fs::write(dir.path().join("c.json"), r#"{"id": "legacy"}"#).unwrap();
        fs::write(dir.path().join("broken.json"), "not json").unwrap();
        fs::write(dir.path().join("notes.txt"), "{}").unwrap();

        let store = DirectoryReportStore::new(dir.path());
        let names: Vec<String> = store
            .list()
            .unwrap()
            .into_iter()
            .map(|summary| summary.filename)
            .collect();
        assert_eq!(names, vec!["b.json", "a.json", "c.json"]);
    }

    #[test]
    fn directory_store_loads_by_bare_name_only() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.json"), r#"{"id": 3, "heart_rate": 90}"#).unwrap();
        let store = DirectoryReportStore::new(dir.path());

        let loaded = store.load("a.json").unwrap();
        assert_eq!(loaded.inputs().unwrap().heart_rate, 90.0);
        assert!(store.load("missing.json").is_err());
        assert!(store.load("../a.json").is_err());
    }

    #[test]
    fn reads_toml_and_json_inputs() {
        let dir = tempdir().unwrap();
        let toml_path = dir.path().join("inputs.toml");
        fs::write(
            &toml_path,
            "heart_rate = 110\nstress_level = 3\nblood_pressure = \"150/95\"\n",
        )
        .unwrap();
        let inputs = read_inputs(&toml_path).unwrap();
        assert_eq!(inputs.heart_rate, 110.0);
        assert_eq!(inputs.stress_level, StressLevel::High);
        assert_eq!(inputs.systolic(), 150.0);
        assert_eq!(inputs.mean_rri, 833.0);

        let json_path = dir.path().join("inputs.json");
        fs::write(&json_path, r#"{"mean_rri": 1000}"#).unwrap();
        assert_eq!(read_inputs(&json_path).unwrap().mean_rri, 1000.0);

        let other = dir.path().join("inputs.yaml");
        fs::write(&other, "heart_rate: 1").unwrap();
        assert!(read_inputs(&other).is_err());
    }
}
