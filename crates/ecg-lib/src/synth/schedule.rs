use super::gaussian;
use crate::inputs::PhysiologicalInputs;
use rand::Rng;

/// Shortest RR interval the scheduler emits (250 bpm).
pub const MIN_RR_S: f64 = 0.24;
/// Longest RR interval the scheduler emits (20 bpm).
pub const MAX_RR_S: f64 = 3.0;

/// Beat-to-beat timing parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeatTiming {
    /// Nominal RR interval in seconds.
    pub base_rr_s: f64,
    /// Long-term variability (SDNN) in milliseconds; `0` disables jitter.
    pub sdnn_ms: f64,
    /// Short-term variability (RMSSD) in milliseconds, only applied with SDNN jitter.
    pub rmssd_ms: f64,
}

impl BeatTiming {
    pub fn from_inputs(inputs: &PhysiologicalInputs) -> Self {
        Self {
            base_rr_s: inputs.base_rr_s(),
            sdnn_ms: inputs.hrv_sdnn,
            rmssd_ms: inputs.rmssd,
        }
    }

    /// Draw the interval following one beat.
    pub fn next_rr<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let mut rr = self.base_rr_s;
        if self.sdnn_ms > 0.0 {
            rr += gaussian(rng, self.sdnn_ms / 1000.0);
            if self.rmssd_ms > 0.0 {
                rr += gaussian(rng, self.rmssd_ms / 2000.0);
            }
        }
        if rr.is_finite() {
            rr.clamp(MIN_RR_S, MAX_RR_S)
        } else {
            MAX_RR_S
        }
    }
}

/// Beat onsets covering one trace.
#[derive(Debug, Clone, PartialEq)]
pub struct BeatSchedule {
    /// Strictly increasing onset times in seconds, all within `[0, duration)`.
    pub onsets: Vec<f64>,
    /// Interval assumed after the final onset.
    pub base_rr_s: f64,
}

impl BeatSchedule {
    pub fn len(&self) -> usize {
        self.onsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.onsets.is_empty()
    }

    /// Index of the last beat starting at or before `t`.
    pub fn beat_at(&self, t: f64) -> Option<usize> {
        self.onsets.partition_point(|&onset| onset <= t).checked_sub(1)
    }

    /// Length of beat `idx`: the gap to the next onset, or the base interval for the last beat.
    pub fn beat_duration(&self, idx: usize) -> f64 {
        match (self.onsets.get(idx), self.onsets.get(idx + 1)) {
            (Some(start), Some(next)) => next - start,
            _ => self.base_rr_s,
        }
    }
}

/// Lay out beat onsets from `t = 0` until `duration_s` is covered.
pub fn schedule_beats<R: Rng + ?Sized>(
    duration_s: f64,
    timing: &BeatTiming,
    rng: &mut R,
) -> BeatSchedule {
    let mut onsets = Vec::new();
    let mut t = 0.0;
    while t < duration_s {
        onsets.push(t);
        t += timing.next_rr(rng);
    }
    BeatSchedule {
        onsets,
        base_rr_s: timing.base_rr_s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn steady(base_rr_s: f64) -> BeatTiming {
        BeatTiming {
            base_rr_s,
            sdnn_ms: 0.0,
            rmssd_ms: 0.0,
        }
    }

    #[test]
    fn steady_rhythm_spaces_beats_evenly() {
        let mut rng = StdRng::seed_from_u64(1);
        let schedule = schedule_beats(10.0, &steady(0.833), &mut rng);
        assert_eq!(schedule.len(), 13);
        assert_eq!(schedule.onsets[0], 0.0);
        for rr in schedule.onsets.windows(2).map(|w| w[1] - w[0]) {
            assert!((rr - 0.833).abs() < 1e-9);
        }
        assert!(*schedule.onsets.last().unwrap() < 10.0);
    }

    #[test]
    fn jittered_intervals_stay_in_physiological_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let timing = BeatTiming {
            base_rr_s: 0.3,
            sdnn_ms: 400.0,
            rmssd_ms: 300.0,
        };
        let schedule = schedule_beats(60.0, &timing, &mut rng);
        assert!(schedule.onsets.windows(2).all(|w| w[1] > w[0]));
        for rr in schedule.onsets.windows(2).map(|w| w[1] - w[0]) {
            assert!((MIN_RR_S - 1e-9..=MAX_RR_S + 1e-9).contains(&rr));
        }
    }

    #[test]
    fn jitter_is_centred_on_base_interval() {
        let mut rng = StdRng::seed_from_u64(42);
        let timing = BeatTiming {
            base_rr_s: 0.8,
            sdnn_ms: 50.0,
            rmssd_ms: 40.0,
        };
        let schedule = schedule_beats(600.0, &timing, &mut rng);
        let rr: Vec<f64> = schedule.onsets.windows(2).map(|w| w[1] - w[0]).collect();
        let mean = rr.iter().sum::<f64>() / rr.len() as f64;
        let sd = (rr.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / rr.len() as f64).sqrt();
        assert!((mean - 0.8).abs() < 0.01, "mean rr {mean}");
        // sqrt(0.05^2 + 0.02^2) ~ 0.054
        assert!((0.04..0.07).contains(&sd), "rr sd {sd}");
    }

    #[test]
    fn zero_duration_has_no_beats() {
        let mut rng = StdRng::seed_from_u64(3);
        assert!(schedule_beats(0.0, &steady(1.0), &mut rng).is_empty());
    }

    #[test]
    fn beat_lookup_finds_active_beat() {
        let schedule = BeatSchedule {
            onsets: vec![0.0, 0.8, 1.7],
            base_rr_s: 0.85,
        };
        assert_eq!(schedule.beat_at(0.0), Some(0));
        assert_eq!(schedule.beat_at(0.79), Some(0));
        assert_eq!(schedule.beat_at(0.8), Some(1));
        assert_eq!(schedule.beat_at(5.0), Some(2));
        assert_eq!(schedule.beat_at(-0.1), None);
        assert!((schedule.beat_duration(1) - 0.9).abs() < 1e-12);
        assert_eq!(schedule.beat_duration(2), 0.85);
    }
}
