//! Physiological parameters that drive one synthesis call.
//!
//! Report records are loosely typed: numbers may arrive as strings, stress as a
//! numeric code and blood pressure as `"systolic/diastolic"`. Everything is read
//! leniently here and validated once, so the synthesis code only sees finite values.

use log::debug;
use serde::{de::IgnoredAny, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

pub const MIN_HEART_RATE: f64 = 20.0;
pub const MAX_HEART_RATE: f64 = 250.0;

/// Autonomic stress classification carried by a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum StressLevel {
    None,
    Low,
    #[default]
    Normal,
    High,
}

impl StressLevel {
    /// Map the numeric code used in report records (0..=3); anything else is Normal.
    ///
    /// Text is accepted too (see the `Deserialize` impl): a numeric string such as `"1"`
    /// goes through this mapping and the names `none`/`low`/`high` map directly, where
    /// the report viewer this format comes from treated every string as Normal.
    pub fn from_code(code: f64) -> Self {
        match code {
            c if c == 0.0 => StressLevel::None,
            c if c == 1.0 => StressLevel::Low,
            c if c == 2.0 => StressLevel::Normal,
            c if c == 3.0 => StressLevel::High,
            _ => StressLevel::Normal,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StressLevel::None => "None",
            StressLevel::Low => "Low",
            StressLevel::Normal => "Normal",
            StressLevel::High => "High",
        }
    }

    /// Low or absent stress flattens the complex.
    pub fn is_relaxed(&self) -> bool {
        matches!(self, StressLevel::Low | StressLevel::None)
    }
}

impl fmt::Display for StressLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for StressLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Loose::deserialize(deserializer)? {
            Loose::Number(code) => StressLevel::from_code(code),
            Loose::Text(text) => {
                let text = text.trim();
                match text.to_ascii_lowercase().as_str() {
                    "none" => StressLevel::None,
                    "low" => StressLevel::Low,
                    "high" => StressLevel::High,
                    _ => text
                        .parse::<f64>()
                        .map(StressLevel::from_code)
                        .unwrap_or_default(),
                }
            }
            Loose::Other(_) => StressLevel::default(),
        })
    }
}

/// Arterial pressure in mmHg.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BloodPressure {
    pub systolic: f64,
    pub diastolic: f64,
}

impl Default for BloodPressure {
    fn default() -> Self {
        Self {
            systolic: 120.0,
            diastolic: 80.0,
        }
    }
}

impl BloodPressure {
    /// Parse `"systolic/diastolic"`, substituting 120/80 for anything unreadable
    /// and for the `"00/00"` placeholder written by devices without a cuff.
    pub fn parse_or_default(text: &str) -> Self {
        text.parse().unwrap_or_else(|_| {
            debug!("blood pressure {text:?} unreadable, using 120/80");
            Self::default()
        })
    }
}

impl FromStr for BloodPressure {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || s == "00/00" {
            return Err(format!("no reading in {s:?}"));
        }
        let mut parts = s.split('/');
        let mut next = || -> Result<f64, String> {
            parts
                .next()
                .ok_or_else(|| format!("missing component in {s:?}"))?
                .trim()
                .parse::<f64>()
                .map_err(|e| e.to_string())
        };
        let systolic = next()?;
        let diastolic = next()?;
        Ok(Self {
            systolic,
            diastolic,
        })
    }
}

impl fmt::Display for BloodPressure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.systolic, self.diastolic)
    }
}

impl Serialize for BloodPressure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BloodPressure {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Loose::deserialize(deserializer)? {
            Loose::Text(text) => BloodPressure::parse_or_default(&text),
            _ => BloodPressure::default(),
        })
    }
}

/// Inputs to one synthesis call. Missing fields take the documented literal defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysiologicalInputs {
    /// Beats per minute. `0` selects the flatline (asystole) trace.
    #[serde(deserialize_with = "lenient_f64")]
    pub heart_rate: f64,
    /// SDNN in milliseconds.
    #[serde(deserialize_with = "lenient_f64")]
    pub hrv_sdnn: f64,
    /// Mean RR interval in milliseconds; takes precedence over `heart_rate` for timing.
    #[serde(deserialize_with = "lenient_f64")]
    pub mean_rri: f64,
    /// RMSSD in milliseconds.
    #[serde(deserialize_with = "lenient_f64")]
    pub rmssd: f64,
    pub stress_level: StressLevel,
    /// Breaths per minute.
    #[serde(deserialize_with = "lenient_f64")]
    pub breathing_rate: f64,
    /// SpO2 in percent; `0` means not measured.
    #[serde(deserialize_with = "lenient_f64")]
    pub oxygen_saturation: f64,
    pub blood_pressure: BloodPressure,
    #[serde(deserialize_with = "lenient_f64")]
    pub pns_index: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub sns_index: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub lf_hf: f64,
}

impl Default for PhysiologicalInputs {
    fn default() -> Self {
        Self {
            heart_rate: 72.0,
            hrv_sdnn: 80.0,
            mean_rri: 833.0,
            rmssd: 65.0,
            stress_level: StressLevel::Normal,
            breathing_rate: 16.0,
            oxygen_saturation: 98.0,
            blood_pressure: BloodPressure::default(),
            pns_index: 0.0,
            sns_index: 0.0,
            lf_hf: 1.0,
        }
    }
}

impl PhysiologicalInputs {
    /// Replace every non-finite field with its default.
    pub fn validated(mut self) -> Self {
        let defaults = Self::default();
        let fields: [(&str, &mut f64, f64); 11] = [
            ("heart_rate", &mut self.heart_rate, defaults.heart_rate),
            ("hrv_sdnn", &mut self.hrv_sdnn, defaults.hrv_sdnn),
            ("mean_rri", &mut self.mean_rri, defaults.mean_rri),
            ("rmssd", &mut self.rmssd, defaults.rmssd),
            ("breathing_rate", &mut self.breathing_rate, defaults.breathing_rate),
            ("oxygen_saturation", &mut self.oxygen_saturation, defaults.oxygen_saturation),
            ("pns_index", &mut self.pns_index, defaults.pns_index),
            ("sns_index", &mut self.sns_index, defaults.sns_index),
            ("lf_hf", &mut self.lf_hf, defaults.lf_hf),
            ("systolic", &mut self.blood_pressure.systolic, defaults.blood_pressure.systolic),
            ("diastolic", &mut self.blood_pressure.diastolic, defaults.blood_pressure.diastolic),
        ];
        for (name, value, default) in fields {
            if !value.is_finite() {
                debug!("{name} is not a finite number, using default {default}");
                *value = default;
            }
        }
        self
    }

    /// True when the trace should be a flatline (no cardiac activity).
    pub fn is_asystole(&self) -> bool {
        self.heart_rate == 0.0
    }

    /// Heart rate clamped to the physiological range.
    pub fn clamped_heart_rate(&self) -> f64 {
        self.heart_rate.clamp(MIN_HEART_RATE, MAX_HEART_RATE)
    }

    /// Nominal RR interval in seconds: `mean_rri` when present, otherwise derived from
    /// the clamped heart rate.
    pub fn base_rr_s(&self) -> f64 {
        if self.mean_rri > 0.0 {
            self.mean_rri / 1000.0
        } else {
            60.0 / self.clamped_heart_rate()
        }
    }

    pub fn systolic(&self) -> f64 {
        self.blood_pressure.systolic
    }

    pub fn diastolic(&self) -> f64 {
        self.blood_pressure.diastolic
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Number(f64),
    Text(String),
    Other(IgnoredAny),
}

/// Accept numbers or numeric strings. Anything else becomes NaN and is replaced by
/// [`PhysiologicalInputs::validated`].
fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(match Loose::deserialize(deserializer)? {
        Loose::Number(value) => value,
        Loose::Text(text) => text.trim().parse().unwrap_or(f64::NAN),
        Loose::Other(_) => f64::NAN,
    })
}
