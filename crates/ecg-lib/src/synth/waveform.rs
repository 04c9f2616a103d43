//! Piecewise PQRST construction for a single cardiac cycle.
//!
//! A beat is split, in order, into P wave, PR segment, QRS complex, ST segment,
//! T wave, an optional U wave and baseline. Each deflection is a half-sine pulse
//! whose peak is a fixed ratio of the lead amplitude, adjusted by the physiological
//! modifiers in [`BeatShape::new`].

use super::gaussian;
use crate::inputs::{PhysiologicalInputs, StressLevel};
use rand::Rng;
use std::f64::consts::PI;

/// P-wave onset as a fraction of the beat.
const P_ONSET: f64 = 0.05;
const U_WIDTH: f64 = 0.1;
const U_LIMIT: f64 = 0.95;
/// Sub-phase boundaries within the QRS complex.
const Q_END: f64 = 0.15;
const R_END: f64 = 0.6;
/// Standard deviation of isoelectric segments.
const ISOELECTRIC_SD: f64 = 0.002;

/// Wave boundaries within one beat.
///
/// Each width is `target / beat_duration` capped at a maximum fraction, so waves keep
/// their physiological length at normal rates and compress without overlapping as the
/// rate rises.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseLayout {
    pub p_start: f64,
    pub p_end: f64,
    pub qrs_start: f64,
    pub qrs_end: f64,
    pub st_end: f64,
    pub t_end: f64,
    pub u_end: f64,
}

impl PhaseLayout {
    /// Boundaries as fractions of a beat lasting `beat_duration` seconds.
    pub fn for_beat(beat_duration: f64) -> Self {
        let width = |target_s: f64, max_fraction: f64| (target_s / beat_duration).min(max_fraction);
        let p_start = P_ONSET;
        let p_end = p_start + width(0.100, 0.12);
        let qrs_start = p_start + width(0.160, 0.20);
        let qrs_end = qrs_start + width(0.090, 0.11);
        let st_end = qrs_end + width(0.100, 0.12);
        let t_end = st_end + width(0.180, 0.25);
        let u_end = (t_end + U_WIDTH).min(U_LIMIT);
        Self {
            p_start,
            p_end,
            qrs_start,
            qrs_end,
            st_end,
            t_end,
            u_end,
        }
    }

    /// The same boundaries expressed in seconds from beat onset.
    pub fn in_seconds(&self, beat_duration: f64) -> Self {
        Self {
            p_start: self.p_start * beat_duration,
            p_end: self.p_end * beat_duration,
            qrs_start: self.qrs_start * beat_duration,
            qrs_end: self.qrs_end * beat_duration,
            st_end: self.st_end * beat_duration,
            t_end: self.t_end * beat_duration,
            u_end: self.u_end * beat_duration,
        }
    }
}

/// Peak amplitudes of every deflection for one trace.
///
/// Modifiers are constant for a call, so the shape is computed once and reused for
/// every beat.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeatShape {
    pub p: f64,
    pub q: f64,
    pub r: f64,
    pub s: f64,
    pub t: f64,
    /// Rendered only in bradycardia or low stress.
    pub u: Option<f64>,
    /// Starting offset of a sloped ST segment; `None` keeps it isoelectric.
    pub st_offset: Option<f64>,
}

impl BeatShape {
    /// Apply the condition-driven modifiers to a lead amplitude.
    ///
    /// `inputs.heart_rate` should already be clamped to the physiological range.
    pub fn new(base_amplitude: f64, inputs: &PhysiologicalInputs) -> Self {
        let hr = inputs.heart_rate;
        let spo2 = inputs.oxygen_saturation;
        let systolic = inputs.systolic();
        let stress = inputs.stress_level;
        let hypoxic = |limit: f64| spo2 > 0.0 && spo2 < limit;

        let mut p = 0.12 * base_amplitude;
        if systolic > 140.0 {
            p *= 1.3;
        }
        if hr > 100.0 {
            p *= 0.8;
        }

        let mut q = -0.15 * base_amplitude;
        if hypoxic(85.0) {
            q *= 2.0;
        }

        let mut r = base_amplitude;
        if hr > 150.0 {
            r *= 0.7;
        } else if hr < 50.0 {
            r *= 1.15;
        }
        if inputs.sns_index > 0.5 {
            r *= 1.1;
        }
        if stress == StressLevel::High {
            r *= 1.05;
        } else if stress.is_relaxed() {
            r *= 0.95;
        }
        if systolic > 160.0 {
            r *= 1.3;
        }

        let s = -0.3 * base_amplitude;

        let mut t = 0.2 * base_amplitude;
        if hypoxic(80.0) {
            t *= -0.8;
        }
        if stress == StressLevel::High {
            t *= 1.4;
        } else if stress.is_relaxed() {
            t *= 0.5;
        }
        if inputs.lf_hf > 2.0 {
            t *= 1.1;
        } else if inputs.lf_hf < 0.5 {
            t *= 0.9;
        }

        let u = (hr < 60.0 || stress == StressLevel::Low).then(|| {
            let u = 0.05 * base_amplitude;
            if stress == StressLevel::Low {
                u * 2.0
            } else {
                u
            }
        });

        let st_offset = if hypoxic(70.0) {
            Some(0.15 * base_amplitude)
        } else if hypoxic(85.0) {
            Some(-0.08 * base_amplitude)
        } else {
            None
        };

        Self {
            p,
            q,
            r,
            s,
            t,
            u,
            st_offset,
        }
    }

    /// Instantaneous amplitude `time_in_beat` seconds into a beat of `beat_duration`.
    pub fn amplitude_at<R: Rng + ?Sized>(
        &self,
        time_in_beat: f64,
        beat_duration: f64,
        rng: &mut R,
    ) -> f64 {
        if beat_duration <= 0.0 {
            return 0.0;
        }
        let x = time_in_beat / beat_duration;
        let phases = PhaseLayout::for_beat(beat_duration);
        let progress = |start: f64, end: f64| (x - start) / (end - start);

        if (phases.p_start..phases.p_end).contains(&x) {
            half_sine(self.p, progress(phases.p_start, phases.p_end))
        } else if (phases.p_end..phases.qrs_start).contains(&x) {
            gaussian(rng, ISOELECTRIC_SD)
        } else if (phases.qrs_start..phases.qrs_end).contains(&x) {
            let qrs = progress(phases.qrs_start, phases.qrs_end);
            if qrs < Q_END {
                half_sine(self.q, qrs / Q_END)
            } else if qrs < R_END {
                half_sine(self.r, (qrs - Q_END) / (R_END - Q_END))
            } else {
                half_sine(self.s, (qrs - R_END) / (1.0 - R_END))
            }
        } else if (phases.qrs_end..phases.st_end).contains(&x) {
            match self.st_offset {
                Some(offset) => offset * (1.0 - progress(phases.qrs_end, phases.st_end)),
                None => gaussian(rng, ISOELECTRIC_SD),
            }
        } else if (phases.st_end..phases.t_end).contains(&x) {
            half_sine(self.t, progress(phases.st_end, phases.t_end))
        } else if (phases.t_end..phases.u_end).contains(&x) {
            // The U slot stays exactly flat when no U wave is drawn.
            self.u
                .map(|u| half_sine(u, (x - phases.t_end) / U_WIDTH))
                .unwrap_or(0.0)
        } else {
            gaussian(rng, ISOELECTRIC_SD)
        }
    }
}

fn half_sine(peak: f64, progress: f64) -> f64 {
    peak * (PI * progress).sin()
}
