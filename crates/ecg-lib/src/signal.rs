use serde::{Deserialize, Serialize};

/// Fixed sampling rate of every synthesized waveform.
pub const SAMPLE_RATE_HZ: f64 = 500.0;

/// Basic typed time series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSeries {
    /// Uniform sampling frequency in Hz
    pub fs: f64,
    /// Samples
    pub data: Vec<f64>,
}

impl TimeSeries {
    pub fn len(&self) -> usize {
        self.data.len()
    }
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
    /// Sample timestamps in seconds, starting at zero.
    pub fn times(&self) -> Vec<f64> {
        let fs = self.fs.max(f64::MIN_POSITIVE);
        (0..self.data.len()).map(|i| i as f64 / fs).collect()
    }
}

/// One point of a synthesized ECG trace.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Seconds since the start of the trace, rounded to 3 decimals.
    pub time: f64,
    /// Unit-less amplitude (rendered as mV), rounded to 4 decimals.
    pub amplitude: f64,
    pub sample_index: usize,
    /// Index of the beat active at this sample; always 0 for a flatline.
    pub beat_count: usize,
}

/// Split samples into parallel amplitude and time columns.
pub fn sample_columns(samples: &[Sample]) -> (Vec<f64>, Vec<f64>) {
    samples.iter().map(|s| (s.amplitude, s.time)).unzip()
}

/// Point events on a timeline (e.g., R-peaks indices)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Events {
    pub indices: Vec<usize>,
}

impl Events {
    pub fn from_indices(indices: Vec<usize>) -> Self {
        Self { indices }
    }
    pub fn len(&self) -> usize {
        self.indices.len()
    }
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// RR intervals (seconds)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RRSeries {
    pub rr: Vec<f64>,
}

impl RRSeries {
    /// Intervals between events measured on an explicit timestamp column.
    /// Events pointing past the end of `times` are ignored.
    pub fn from_event_times(events: &Events, times: &[f64]) -> Self {
        let stamps: Vec<f64> = events
            .indices
            .iter()
            .filter_map(|&idx| times.get(idx).copied())
            .collect();
        let rr = stamps.windows(2).map(|w| w[1] - w[0]).collect();
        Self { rr }
    }

    pub fn is_empty(&self) -> bool {
        self.rr.is_empty()
    }
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rr_from_event_times_uses_timestamps() {
        let times = [0.0, 0.5, 1.0, 1.5, 2.0];
        let events = Events::from_indices(vec![0, 2, 3]);
        let rr = RRSeries::from_event_times(&events, &times);
        assert_eq!(rr.rr, vec![1.0, 0.5]);
    }

    #[test]
    fn rounding_matches_fixed_decimals() {
        assert_eq!(round_to(0.123456, 4), 0.1235);
        assert_eq!(round_to(2.71828, 3), 2.718);
        assert_eq!(round_to(-0.25, 1), -0.3);
    }
}
