use crate::metrics::stats::{mean, population_sd};
use crate::signal::RRSeries;
use serde::{Deserialize, Serialize};

/// Time-domain heart-rate variability, in the units of the RR series.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct HRVTime {
    pub n: usize,
    pub avnn: f64,
    /// Population standard deviation of the intervals.
    pub sdnn: f64,
    pub rmssd: f64,
}

pub fn hrv_time(rr: &RRSeries) -> HRVTime {
    let n = rr.rr.len();
    let avnn = mean(&rr.rr);
    let sdnn = population_sd(&rr.rr);
    let rmssd = if n > 1 {
        let diffs = rr.rr.windows(2).map(|w| (w[1] - w[0]).powi(2));
        (diffs.sum::<f64>() / (n as f64 - 1.0)).sqrt()
    } else {
        0.0
    };

    HRVTime {
        n,
        avnn,
        sdnn,
        rmssd,
    }
}

impl HRVTime {
    /// Mean heart rate in beats per minute for an RR series in seconds.
    pub fn heart_rate_bpm(&self) -> f64 {
        if self.avnn > 0.0 {
            60.0 / self.avnn
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64, tol: f64) {
        let diff = (actual - expected).abs();
        assert!(
            diff <= tol,
            "expected {expected}, got {actual} (diff {diff} > tol {tol})"
        );
    }

    #[test]
    fn constant_rhythm_has_no_variability() {
        let rr = RRSeries {
            rr: vec![0.8; 10],
        };
        let m = hrv_time(&rr);
        assert_eq!(m.n, 10);
        assert_close(m.avnn, 0.8, 1e-12);
        assert_close(m.sdnn, 0.0, 1e-12);
        assert_close(m.rmssd, 0.0, 1e-12);
        assert_close(m.heart_rate_bpm(), 75.0, 1e-9);
    }

    #[test]
    fn alternating_rhythm() {
        let rr = RRSeries {
            rr: vec![0.7, 0.9, 0.7, 0.9],
        };
        let m = hrv_time(&rr);
        assert_close(m.sdnn, 0.1, 1e-12);
        assert_close(m.rmssd, 0.2, 1e-12);
    }

    #[test]
    fn single_interval_has_zero_rmssd() {
        let m = hrv_time(&RRSeries { rr: vec![1.0] });
        assert_eq!(m.rmssd, 0.0);
        assert_eq!(m.sdnn, 0.0);
        assert_eq!(hrv_time(&RRSeries { rr: vec![] }).heart_rate_bpm(), 0.0);
    }
}
