use crate::metrics::stats::{mean, population_sd};
use crate::signal::Events;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coefficient of variation of peak spacing above which the rhythm is irregular.
const MAX_SPACING_CV: f64 = 0.5;
/// Amplitude standard deviation above which the trace is considered noisy.
const MAX_AMPLITUDE_SD: f64 = 1.0;
const PLAUSIBLE_RATE_BPM: (f64, f64) = (40.0, 200.0);
/// Allowed relative mismatch between detected and rate-implied beat counts.
const MAX_BEAT_COUNT_MISMATCH: f64 = 0.3;

/// Coarse signal-quality label of an analysed trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalQuality {
    #[serde(rename = "Good")]
    Good,
    #[serde(rename = "Flatline")]
    Flatline,
    #[serde(rename = "No beats detected")]
    NoBeats,
    #[serde(rename = "Poor")]
    Poor,
    #[serde(rename = "Irregular rhythm")]
    IrregularRhythm,
    #[serde(rename = "Noisy")]
    Noisy,
    #[serde(rename = "Abnormal rate")]
    AbnormalRate,
    #[serde(rename = "Inconsistent")]
    Inconsistent,
}

impl SignalQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalQuality::Good => "Good",
            SignalQuality::Flatline => "Flatline",
            SignalQuality::NoBeats => "No beats detected",
            SignalQuality::Poor => "Poor",
            SignalQuality::IrregularRhythm => "Irregular rhythm",
            SignalQuality::Noisy => "Noisy",
            SignalQuality::AbnormalRate => "Abnormal rate",
            SignalQuality::Inconsistent => "Inconsistent",
        }
    }
}

impl fmt::Display for SignalQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Population coefficient of variation of a spacing series.
pub fn compute_rr_cv(rr: &[f64]) -> f64 {
    if rr.is_empty() {
        return 0.0;
    }
    let m = mean(rr);
    if m == 0.0 {
        return 0.0;
    }
    population_sd(rr) / m
}

/// Classify a trace; the first failing check wins.
pub fn assess_signal_quality(
    peaks: &Events,
    amplitudes: &[f64],
    heart_rate: f64,
    fs: f64,
) -> SignalQuality {
    let count = peaks.len();
    if count == 0 {
        return SignalQuality::NoBeats;
    }
    if count < 3 {
        return SignalQuality::Poor;
    }

    let gaps: Vec<f64> = peaks
        .indices
        .windows(2)
        .map(|w| (w[1] - w[0]) as f64)
        .collect();
    if compute_rr_cv(&gaps) > MAX_SPACING_CV {
        return SignalQuality::IrregularRhythm;
    }
    if population_sd(amplitudes) > MAX_AMPLITUDE_SD {
        return SignalQuality::Noisy;
    }
    if !(PLAUSIBLE_RATE_BPM.0..=PLAUSIBLE_RATE_BPM.1).contains(&heart_rate) {
        return SignalQuality::AbnormalRate;
    }

    let expected = amplitudes.len() as f64 * heart_rate / (60.0 * fs);
    if expected > 0.0 && (count as f64 - expected).abs() / expected > MAX_BEAT_COUNT_MISMATCH {
        return SignalQuality::Inconsistent;
    }
    SignalQuality::Good
}
