use crate::{
    detectors::{
        ecg::{detect_r_peaks_with_config, PeakDetectorConfig},
        intervals::{measure_beat, BeatIntervals, IntervalField},
    },
    error::EcgError,
    metrics::{
        hrv::hrv_time,
        sqi::{assess_signal_quality, SignalQuality},
        stats::{iqr_filtered_mean, mean, population_sd},
    },
    signal::{round_to, sample_columns, Events, RRSeries, Sample, TimeSeries, SAMPLE_RATE_HZ},
};
use log::debug;
use serde::{Deserialize, Serialize};

/// Peak-to-peak range below which a trace is treated as a flatline.
const FLATLINE_RANGE: f64 = 0.1;
/// Only the first beats are measured for interval averages.
const MAX_MEASURED_BEATS: usize = 10;

/// Summary metrics re-derived from a waveform.
///
/// Rates in bpm, intervals in ms; a measurement that could not be made is `0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    pub r_peaks_detected: usize,
    pub calculated_heart_rate: f64,
    pub avg_rr_interval: f64,
    pub rr_intervals_count: usize,
    pub calculated_rmssd: f64,
    pub calculated_sdnn: f64,
    pub max_amplitude: f64,
    pub min_amplitude: f64,
    pub mean_amplitude: f64,
    pub amplitude_std: f64,
    pub signal_quality: SignalQuality,
    pub heart_rate_from_intervals: f64,
    pub p_wave_duration: f64,
    pub pr_interval: f64,
    pub qrs_duration: f64,
    pub qt_interval: f64,
    pub qtc_interval: f64,
    pub t_wave_deflection: f64,
    pub t_wave_duration: f64,
    pub intervals_measured: usize,
}

#[derive(Debug, Clone, Copy)]
struct AmplitudeStats {
    max: f64,
    min: f64,
    mean: f64,
    sd: f64,
}

impl AmplitudeStats {
    fn of(amplitudes: &[f64]) -> Self {
        Self {
            max: amplitudes.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            min: amplitudes.iter().copied().fold(f64::INFINITY, f64::min),
            mean: mean(amplitudes),
            sd: population_sd(amplitudes),
        }
    }
}

impl MetricsReport {
    /// Profile reported for a trace without cardiac activity.
    fn flatline(amplitudes: &AmplitudeStats) -> Self {
        Self::new(amplitudes, SignalQuality::Flatline)
    }

    fn new(amplitudes: &AmplitudeStats, signal_quality: SignalQuality) -> Self {
        Self {
            r_peaks_detected: 0,
            calculated_heart_rate: 0.0,
            avg_rr_interval: 0.0,
            rr_intervals_count: 0,
            calculated_rmssd: 0.0,
            calculated_sdnn: 0.0,
            max_amplitude: round_to(amplitudes.max, 3),
            min_amplitude: round_to(amplitudes.min, 3),
            mean_amplitude: round_to(amplitudes.mean, 3),
            amplitude_std: round_to(amplitudes.sd, 3),
            signal_quality,
            heart_rate_from_intervals: 0.0,
            p_wave_duration: 0.0,
            pr_interval: 0.0,
            qrs_duration: 0.0,
            qt_interval: 0.0,
            qtc_interval: 0.0,
            t_wave_deflection: 0.0,
            t_wave_duration: 0.0,
            intervals_measured: 0,
        }
    }

    fn with_intervals(mut self, averaged: &BeatIntervals, measured: usize) -> Self {
        let or_zero = |f: IntervalField| averaged.get(f).unwrap_or(0.0);
        self.p_wave_duration = or_zero(IntervalField::PDuration);
        self.pr_interval = or_zero(IntervalField::PrInterval);
        self.qrs_duration = or_zero(IntervalField::QrsDuration);
        self.qt_interval = or_zero(IntervalField::QtInterval);
        self.qtc_interval = or_zero(IntervalField::QtcInterval);
        self.t_wave_deflection = or_zero(IntervalField::TAmplitude);
        self.t_wave_duration = or_zero(IntervalField::TDuration);
        self.intervals_measured = measured;
        self
    }
}

/// Analyse a synthesized trace sampled at 500 Hz.
pub fn aggregate(samples: &[Sample]) -> Result<MetricsReport, EcgError> {
    let (amplitudes, times) = sample_columns(samples);
    aggregate_columns(&amplitudes, &times, SAMPLE_RATE_HZ)
}

/// Analyse an arbitrary uniformly sampled waveform.
pub fn aggregate_series(ts: &TimeSeries) -> Result<MetricsReport, EcgError> {
    aggregate_columns(&ts.data, &ts.times(), ts.fs)
}

fn aggregate_columns(
    amplitudes: &[f64],
    times: &[f64],
    fs: f64,
) -> Result<MetricsReport, EcgError> {
    if amplitudes.is_empty() {
        return Err(EcgError::EmptySignal);
    }
    let stats = AmplitudeStats::of(amplitudes);
    if stats.max - stats.min < FLATLINE_RANGE {
        debug!("amplitude range {:.4} below flatline limit", stats.max - stats.min);
        return Ok(MetricsReport::flatline(&stats));
    }

    let ts = TimeSeries {
        fs,
        data: amplitudes.to_vec(),
    };
    let peaks = detect_r_peaks_with_config(&ts, &PeakDetectorConfig::default());
    let rr = RRSeries::from_event_times(&peaks, times);
    let hrv = hrv_time(&rr);
    let heart_rate = hrv.heart_rate_bpm();

    let measured = measure_beats(amplitudes, times, &peaks, fs);
    let averaged = average_intervals(&measured);
    let quality = assess_signal_quality(&peaks, amplitudes, heart_rate, fs);
    debug!(
        "{} peaks, {:.1} bpm, {} beats measured, quality {quality}",
        peaks.len(),
        heart_rate,
        measured.len()
    );

    let mut report = MetricsReport::new(&stats, quality).with_intervals(&averaged, measured.len());
    report.r_peaks_detected = peaks.len();
    report.calculated_heart_rate = round_to(heart_rate, 1);
    report.heart_rate_from_intervals = report.calculated_heart_rate;
    report.avg_rr_interval = round_to(hrv.avnn * 1000.0, 1);
    report.rr_intervals_count = hrv.n;
    report.calculated_rmssd = round_to(hrv.rmssd * 1000.0, 1);
    report.calculated_sdnn = round_to(hrv.sdnn * 1000.0, 1);
    Ok(report)
}

/// Measure the first beats; beats that fail or yield nothing are skipped.
fn measure_beats(amplitudes: &[f64], times: &[f64], peaks: &Events, fs: f64) -> Vec<BeatIntervals> {
    peaks
        .indices
        .iter()
        .take(MAX_MEASURED_BEATS)
        .filter_map(|&r_peak| match measure_beat(amplitudes, times, r_peak, fs) {
            Ok(intervals) if !intervals.is_empty() => Some(intervals),
            Ok(_) => None,
            Err(err) => {
                debug!("skipping beat at sample {r_peak}: {err}");
                None
            }
        })
        .collect()
}

/// Outlier-robust average of every interval field across beats, rounded to 0.1.
pub fn average_intervals(beats: &[BeatIntervals]) -> BeatIntervals {
    let mut averaged = BeatIntervals::default();
    for field in IntervalField::ALL {
        let values: Vec<f64> = beats.iter().filter_map(|b| b.get(field)).collect();
        averaged.set(field, iqr_filtered_mean(&values).map(|v| round_to(v, 1)));
    }
    averaged
}
