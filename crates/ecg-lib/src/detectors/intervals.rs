//! Wave boundary search around a detected R-peak.
//!
//! All windows are expressed in seconds relative to the R-peak and converted to
//! samples with truncation. Boundaries are found by walking from a wave's peak
//! towards the window edge until the signal returns near its local baseline.

use crate::error::MeasurementError;
use crate::metrics::stats::mean;
use crate::signal::round_to;
use serde::{Deserialize, Serialize};

/// P-wave search window, seconds before the R-peak.
const P_WINDOW_S: (f64, f64) = (0.3, 0.1);
/// QRS onset/offset search reach around the R-peak.
const QRS_REACH_S: f64 = 0.05;
/// T-wave search window, seconds after the R-peak.
const T_WINDOW_S: (f64, f64) = (0.2, 0.4);
/// How far past the T peak to look for the T offset.
const T_END_REACH_S: f64 = 0.2;
/// Samples averaged for the local baseline.
const BASELINE_SAMPLES: usize = 20;
/// RR (s) assumed for QTc when no PR interval was measured.
const FALLBACK_RR_S: f64 = 0.8;

/// Intervals measured on one beat, in milliseconds (`t_amplitude` in signal units).
/// Fields that could not be measured are `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BeatIntervals {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p_duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pr_interval: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qrs_duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qt_interval: Option<f64>,
    /// Bazett-style correction. The denominator uses the PR interval rather than the
    /// true RR interval, so values are not clinically comparable QTc.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qtc_interval: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub t_amplitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub t_duration: Option<f64>,
}

/// Names of the measured fields, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntervalField {
    PDuration,
    PrInterval,
    QrsDuration,
    QtInterval,
    QtcInterval,
    TAmplitude,
    TDuration,
}

impl IntervalField {
    pub const ALL: [IntervalField; 7] = [
        IntervalField::PDuration,
        IntervalField::PrInterval,
        IntervalField::QrsDuration,
        IntervalField::QtInterval,
        IntervalField::QtcInterval,
        IntervalField::TAmplitude,
        IntervalField::TDuration,
    ];
}

impl BeatIntervals {
    pub fn get(&self, field: IntervalField) -> Option<f64> {
        match field {
            IntervalField::PDuration => self.p_duration,
            IntervalField::PrInterval => self.pr_interval,
            IntervalField::QrsDuration => self.qrs_duration,
            IntervalField::QtInterval => self.qt_interval,
            IntervalField::QtcInterval => self.qtc_interval,
            IntervalField::TAmplitude => self.t_amplitude,
            IntervalField::TDuration => self.t_duration,
        }
    }

    pub fn set(&mut self, field: IntervalField, value: Option<f64>) {
        let slot = match field {
            IntervalField::PDuration => &mut self.p_duration,
            IntervalField::PrInterval => &mut self.pr_interval,
            IntervalField::QrsDuration => &mut self.qrs_duration,
            IntervalField::QtInterval => &mut self.qt_interval,
            IntervalField::QtcInterval => &mut self.qtc_interval,
            IntervalField::TAmplitude => &mut self.t_amplitude,
            IntervalField::TDuration => &mut self.t_duration,
        };
        *slot = value;
    }

    /// True when nothing could be measured on the beat.
    pub fn is_empty(&self) -> bool {
        IntervalField::ALL.iter().all(|&f| self.get(f).is_none())
    }
}

/// Measure P, QRS and T boundaries around the R-peak at `r_peak`.
///
/// `times` holds the timestamp (seconds) of every amplitude sample. A boundary
/// that lands on sample 0 is treated as clipped by the start of the recording and
/// the intervals depending on it are left unmeasured.
pub fn measure_beat(
    amplitudes: &[f64],
    times: &[f64],
    r_peak: usize,
    fs: f64,
) -> Result<BeatIntervals, MeasurementError> {
    let len = amplitudes.len();
    if times.len() != len {
        return Err(MeasurementError::LengthMismatch {
            amplitudes: len,
            times: times.len(),
        });
    }
    if r_peak >= len {
        return Err(MeasurementError::PeakOutOfRange { index: r_peak, len });
    }
    let samples = |seconds: f64| (seconds * fs) as usize;
    let ms = |from: usize, to: usize| (times[to] - times[from]) * 1000.0;
    let mut out = BeatIntervals::default();

    // P wave
    let p_search_start = r_peak.saturating_sub(samples(P_WINDOW_S.0));
    let p_search_end = r_peak.saturating_sub(samples(P_WINDOW_S.1));
    if p_search_end > p_search_start {
        let p_peak = p_search_start + argmax_by(&amplitudes[p_search_start..p_search_end], |x| x);
        let p_start = clipped(find_wave_start(amplitudes, p_peak, p_search_start));
        let p_end = clipped(find_wave_end(amplitudes, p_peak, p_search_end));
        if let (Some(p_start), Some(p_end)) = (p_start, p_end) {
            out.p_duration = Some(ms(p_start, p_end));
            out.pr_interval = Some(ms(p_start, r_peak));
        }
    }

    // QRS complex
    let q_search_start = r_peak.saturating_sub(samples(QRS_REACH_S));
    let s_search_end = (r_peak + samples(QRS_REACH_S)).min(len);
    let q_start = clipped(find_wave_start(amplitudes, r_peak, q_search_start));
    let s_end = clipped(find_wave_end(amplitudes, r_peak, s_search_end));
    if let (Some(q_start), Some(s_end)) = (q_start, s_end) {
        out.qrs_duration = Some(ms(q_start, s_end));
    }

    // T wave, either polarity
    let t_search_start = (r_peak + samples(T_WINDOW_S.0)).min(len);
    let t_search_end = (r_peak + samples(T_WINDOW_S.1)).min(len);
    if t_search_end > t_search_start {
        let t_peak =
            t_search_start + argmax_by(&amplitudes[t_search_start..t_search_end], f64::abs);
        out.t_amplitude = Some(round_to(amplitudes[t_peak], 3));

        let t_end = clipped(find_wave_end(
            amplitudes,
            t_peak,
            (t_peak + samples(T_END_REACH_S)).min(len),
        ));
        if let (Some(q_start), Some(t_end)) = (q_start, t_end) {
            let qt = ms(q_start, t_end);
            out.qt_interval = Some(qt);
            let rr_s = out.pr_interval.map_or(FALLBACK_RR_S, |pr| pr / 1000.0);
            if rr_s > 0.0 {
                out.qtc_interval = Some(qt / rr_s.sqrt());
            }
        }
        let t_start = clipped(find_wave_start(amplitudes, t_peak, t_search_start));
        if let (Some(t_start), Some(t_end)) = (t_start, t_end) {
            out.t_duration = Some(ms(t_start, t_end));
        }
    }

    Ok(out)
}

/// Walk back from `peak` towards `search_start` and return the first sample whose
/// magnitude drops below the pre-window baseline plus 0.02.
pub fn find_wave_start(amplitudes: &[f64], peak: usize, search_start: usize) -> usize {
    let baseline = if search_start > BASELINE_SAMPLES {
        let end = search_start.min(amplitudes.len());
        mean(&amplitudes[(search_start - BASELINE_SAMPLES).min(end)..end])
    } else {
        0.0
    };
    let threshold = baseline.abs() + 0.02;
    let top = peak.min(amplitudes.len().saturating_sub(1));
    (search_start + 1..=top)
        .rev()
        .find(|&i| amplitudes[i].abs() < threshold)
        .unwrap_or(search_start)
}

/// Walk forward from `peak` towards `search_end` and return the first sample close to
/// the mean of the 20 samples starting at the peak. Falls back to the last sample of
/// the search range.
pub fn find_wave_end(amplitudes: &[f64], peak: usize, search_end: usize) -> usize {
    let search_end = search_end.min(amplitudes.len());
    let fallback = search_end.saturating_sub(1);
    if peak >= search_end {
        return fallback;
    }
    let baseline = mean(&amplitudes[peak..(peak + BASELINE_SAMPLES).min(search_end)]);
    let threshold = baseline.abs() * 0.1 + 0.02;
    (peak..search_end)
        .find(|&i| (amplitudes[i] - baseline).abs() < threshold)
        .unwrap_or(fallback)
}

fn clipped(boundary: usize) -> Option<usize> {
    (boundary != 0).then_some(boundary)
}

/// Index of the first maximum of `key(x)`.
fn argmax_by(values: &[f64], key: impl Fn(f64) -> f64) -> usize {
    let mut best = 0;
    let mut best_key = f64::NEG_INFINITY;
    for (i, &v) in values.iter().enumerate() {
        let k = key(v);
        if k > best_key {
            best = i;
            best_key = k;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    const FS: f64 = 500.0;

    /// One clean beat: P at 0.45-0.55 s, QRS around the R-peak at 0.7 s, T at
    /// 0.9-1.08 s, zero elsewhere.
    fn clean_beat() -> (Vec<f64>, Vec<f64>, usize) {
        let n = 1000;
        let times: Vec<f64> = (0..n).map(|i| i as f64 / FS).collect();
        let pulse = |t: f64, start: f64, width: f64, peak: f64| {
            if (start..start + width).contains(&t) {
                peak * (PI * (t - start) / width).sin()
            } else {
                0.0
            }
        };
        let amps = times
            .iter()
            .map(|&t| {
                pulse(t, 0.45, 0.10, 0.15)
                    + pulse(t, 0.68, 0.04, 1.2)
                    + pulse(t, 0.90, 0.18, 0.25)
            })
            .collect();
        (amps, times, 350)
    }

    #[test]
    fn measures_all_intervals_on_clean_beat() {
        let (amps, times, r) = clean_beat();
        let m = measure_beat(&amps, &times, r, FS).unwrap();
        let p = m.p_duration.unwrap();
        let pr = m.pr_interval.unwrap();
        let qrs = m.qrs_duration.unwrap();
        let qt = m.qt_interval.unwrap();
        assert!(p > 0.0 && p < 120.0, "p {p}");
        assert!((150.0..=260.0).contains(&pr), "pr {pr}");
        assert!(qrs > 0.0 && qrs <= 100.0, "qrs {qrs}");
        assert!(qt > 200.0 && qt < 500.0, "qt {qt}");
        let qtc = m.qtc_interval.unwrap();
        assert!((qtc - qt / (pr / 1000.0).sqrt()).abs() < 1e-9);
        assert!((m.t_amplitude.unwrap() - 0.25).abs() < 0.01);
        assert!(m.t_duration.is_some());
    }

    #[test]
    fn inverted_t_wave_keeps_its_sign() {
        let (mut amps, times, r) = clean_beat();
        for (a, &t) in amps.iter_mut().zip(&times) {
            if t >= 0.9 {
                *a = -*a;
            }
        }
        let m = measure_beat(&amps, &times, r, FS).unwrap();
        assert!(m.t_amplitude.unwrap() < -0.2);
    }

    #[test]
    fn qtc_falls_back_without_pr() {
        let (amps, times, _) = clean_beat();
        // R-peak too close to the start for a P window.
        let shifted: Vec<f64> = amps[300..].to_vec();
        let times: Vec<f64> = times[..shifted.len()].to_vec();
        let m = measure_beat(&shifted, &times, 50, FS).unwrap();
        assert_eq!(m.pr_interval, None);
        assert!(m.qt_interval.is_some());
        assert!(m.qtc_interval.is_some());
        let (qt, qtc) = (m.qt_interval.unwrap(), m.qtc_interval.unwrap());
        assert!((qtc - qt / FALLBACK_RR_S.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn out_of_range_peak_is_a_measurement_error() {
        let (amps, times, _) = clean_beat();
        assert_eq!(
            measure_beat(&amps, &times, 5000, FS),
            Err(MeasurementError::PeakOutOfRange {
                index: 5000,
                len: 1000
            })
        );
        assert!(matches!(
            measure_beat(&amps, &times[..10], 5, FS),
            Err(MeasurementError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn wave_start_falls_back_to_window_floor() {
        let amps = vec![1.0; 100];
        assert_eq!(find_wave_start(&amps, 80, 15), 15);
        let mut amps = vec![0.0; 100];
        amps[70..=80].iter_mut().for_each(|a| *a = 1.0);
        assert_eq!(find_wave_start(&amps, 80, 30), 69);
    }

    #[test]
    fn wave_end_falls_back_to_last_valid_index() {
        let amps: Vec<f64> = (0..50)
            .map(|i| if i % 2 == 0 { 10.0 } else { -10.0 })
            .collect();
        assert_eq!(find_wave_end(&amps, 10, 30), 29);
        assert_eq!(find_wave_end(&amps, 40, 30), 29);
        assert_eq!(find_wave_end(&amps, 10, 500), 49);
    }

    #[test]
    fn beat_intervals_field_access() {
        let mut b = BeatIntervals::default();
        assert!(b.is_empty());
        b.set(IntervalField::QtInterval, Some(400.0));
        assert_eq!(b.get(IntervalField::QtInterval), Some(400.0));
        assert!(!b.is_empty());
    }
}
