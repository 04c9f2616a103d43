use crate::signal::{Events, TimeSeries};
use crate::metrics::stats::{mean, population_sd};

/// Parameters of the adaptive-threshold R-peak detector.
#[derive(Debug, Clone, Copy)]
pub struct PeakDetectorConfig {
    /// Threshold height above the mean, in standard deviations.
    pub threshold_sd: f64,
    /// Minimum physiological RR distance / refractory period (seconds).
    pub refractory_s: f64,
}

impl Default for PeakDetectorConfig {
    fn default() -> Self {
        Self {
            threshold_sd: 1.5,
            refractory_s: 0.2,
        }
    }
}

impl PeakDetectorConfig {
    /// Refractory period in whole samples (never zero).
    pub fn min_distance(&self, fs: f64) -> usize {
        ((self.refractory_s * fs) as usize).max(1)
    }
}

/// Detect R-peaks with the default threshold and refractory period.
pub fn detect_r_peaks(ts: &TimeSeries) -> Events {
    detect_r_peaks_with_config(ts, &PeakDetectorConfig::default())
}

/// Detect R-peaks in any amplitude sequence.
///
/// A sample is a peak when it is a strict local maximum above
/// `mean + threshold_sd * sd`, lies at least one refractory period after the last
/// accepted peak, and is the maximum of the window of one refractory period centred
/// on it. Candidates are accepted left to right without backtracking.
pub fn detect_r_peaks_with_config(ts: &TimeSeries, cfg: &PeakDetectorConfig) -> Events {
    let data = &ts.data;
    if data.len() < 3 {
        return Events::from_indices(Vec::new());
    }

    let threshold = mean(data) + cfg.threshold_sd * population_sd(data);
    let min_distance = cfg.min_distance(ts.fs);
    let half_window = min_distance / 2;

    let mut peaks: Vec<usize> = Vec::new();
    for i in 1..data.len() - 1 {
        let y = data[i];
        if !(y > data[i - 1] && y > data[i + 1] && y > threshold) {
            continue;
        }
        if peaks.last().is_some_and(|&last| i - last < min_distance) {
            continue;
        }
        let start = i.saturating_sub(half_window);
        let end = (i + half_window).min(data.len());
        let window_max = data[start..end]
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        if y == window_max {
            peaks.push(i);
        }
    }
    Events::from_indices(peaks)
}
