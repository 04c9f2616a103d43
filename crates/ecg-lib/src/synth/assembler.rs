use super::{gaussian, schedule_beats, BeatShape, BeatTiming};
use crate::{
    error::EcgError,
    inputs::PhysiologicalInputs,
    leads::resolve_lead,
    signal::{round_to, Sample, SAMPLE_RATE_HZ},
};
use log::{debug, warn};
use rand::Rng;
use std::f64::consts::PI;

/// Synthesize `duration_s` seconds of `lead` with an unseeded generator.
///
/// Returns an empty vector when generation fails; callers must treat that as failure.
/// Use [`try_synthesize`] to get the reason.
pub fn synthesize(inputs: &PhysiologicalInputs, lead: &str, duration_s: u32) -> Vec<Sample> {
    match try_synthesize(inputs, lead, duration_s) {
        Ok(samples) => samples,
        Err(err) => {
            warn!("ECG generation failed: {err}");
            Vec::new()
        }
    }
}

pub fn try_synthesize(
    inputs: &PhysiologicalInputs,
    lead: &str,
    duration_s: u32,
) -> Result<Vec<Sample>, EcgError> {
    try_synthesize_with_rng(inputs, lead, duration_s, &mut rand::thread_rng())
}

/// Synthesize with a caller-supplied random source.
pub fn try_synthesize_with_rng<R: Rng + ?Sized>(
    inputs: &PhysiologicalInputs,
    lead: &str,
    duration_s: u32,
    rng: &mut R,
) -> Result<Vec<Sample>, EcgError> {
    if duration_s == 0 {
        return Err(EcgError::InvalidDuration(duration_s));
    }
    let inputs = inputs.clone().validated();
    let total_samples = duration_s as usize * SAMPLE_RATE_HZ as usize;

    if inputs.is_asystole() {
        debug!("heart rate 0, emitting {total_samples} flatline samples");
        return Ok(flatline(total_samples, rng));
    }

    let lead = resolve_lead(lead);
    let shaped = PhysiologicalInputs {
        heart_rate: inputs.clamped_heart_rate(),
        ..inputs.clone()
    };
    let shape = BeatShape::new(lead.base_amplitude * amplitude_modifier(&inputs), &shaped);
    let schedule = schedule_beats(duration_s as f64, &BeatTiming::from_inputs(&inputs), rng);
    debug!(
        "{} beats scheduled over {duration_s} s on {}",
        schedule.len(),
        lead.name
    );

    let resp_amp = respiratory_amplitude(inputs.pns_index);
    let noise_sd = noise_level(inputs.oxygen_saturation);
    let mut samples = Vec::with_capacity(total_samples);
    for i in 0..total_samples {
        let t = i as f64 / SAMPLE_RATE_HZ;
        let beat_index = schedule.beat_at(t).unwrap_or(0);
        let mut amplitude = 0.0;
        if let Some(&onset) = schedule.onsets.get(beat_index) {
            let beat_duration = schedule.beat_duration(beat_index);
            let time_in_beat = t - onset;
            if (0.0..beat_duration).contains(&time_in_beat) {
                amplitude = shape.amplitude_at(time_in_beat, beat_duration, rng);
            }
        }
        if inputs.breathing_rate > 0.0 {
            amplitude += resp_amp * (2.0 * PI * inputs.breathing_rate * t / 60.0).sin();
        }
        amplitude += gaussian(rng, noise_sd);
        if !amplitude.is_finite() {
            return Err(EcgError::NonFiniteSample { index: i });
        }
        samples.push(Sample {
            time: round_to(t, 3),
            amplitude: round_to(amplitude, 4),
            sample_index: i,
            beat_count: beat_index,
        });
    }
    Ok(samples)
}

/// Global voltage scaling from blood pressure and oxygenation.
pub fn amplitude_modifier(inputs: &PhysiologicalInputs) -> f64 {
    let systolic = inputs.systolic();
    let spo2 = inputs.oxygen_saturation;
    let mut modifier = 1.0;
    if systolic > 140.0 {
        modifier *= 1.15;
    } else if systolic > 0.0 && systolic < 90.0 {
        modifier *= 0.75;
    }
    if spo2 > 0.0 && spo2 < 90.0 {
        modifier *= spo2 / 100.0;
    }
    modifier
}

/// Respiratory baseline swing; parasympathetic tone widens it.
pub fn respiratory_amplitude(pns_index: f64) -> f64 {
    if pns_index < -0.5 {
        0.01
    } else if pns_index > 0.5 {
        0.03
    } else {
        0.02
    }
}

/// Measurement noise; poor perfusion doubles it.
pub fn noise_level(spo2: f64) -> f64 {
    if spo2 > 0.0 && spo2 < 95.0 {
        0.01
    } else {
        0.005
    }
}

fn flatline<R: Rng + ?Sized>(total_samples: usize, rng: &mut R) -> Vec<Sample> {
    (0..total_samples)
        .map(|i| {
            let t = i as f64 / SAMPLE_RATE_HZ;
            let wander = 0.01 * (2.0 * PI * 0.1 * t).sin();
            Sample {
                time: round_to(t, 3),
                amplitude: round_to(wander + gaussian(rng, 0.003), 4),
                sample_index: i,
                beat_count: 0,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn steady_inputs() -> PhysiologicalInputs {
        PhysiologicalInputs {
            heart_rate: 72.0,
            mean_rri: 833.0,
            hrv_sdnn: 0.0,
            rmssd: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn sample_grid_is_contiguous_at_500_hz() {
        for duration in [1, 3, 10] {
            let samples = synthesize(&PhysiologicalInputs::default(), "Lead II", duration);
            assert_eq!(samples.len(), duration as usize * 500);
            for (i, s) in samples.iter().enumerate() {
                assert_eq!(s.sample_index, i);
                assert_eq!(s.time, round_to(i as f64 / 500.0, 3));
            }
        }
    }

    #[test]
    fn zero_duration_is_a_generation_failure() {
        let inputs = PhysiologicalInputs::default();
        assert_eq!(
            try_synthesize(&inputs, "Lead II", 0),
            Err(EcgError::InvalidDuration(0))
        );
        assert!(synthesize(&inputs, "Lead II", 0).is_empty());
    }

    #[test]
    fn flatline_has_no_beats_and_small_range() {
        let inputs = PhysiologicalInputs {
            heart_rate: 0.0,
            ..Default::default()
        };
        let samples = synthesize(&inputs, "V4", 10);
        assert_eq!(samples.len(), 5000);
        assert!(samples.iter().all(|s| s.beat_count == 0));
        let max = samples.iter().map(|s| s.amplitude).fold(f64::MIN, f64::max);
        let min = samples.iter().map(|s| s.amplitude).fold(f64::MAX, f64::min);
        assert!(max - min < 0.1, "range {}", max - min);
    }

    #[test]
    fn beat_count_follows_schedule() {
        let mut rng = StdRng::seed_from_u64(11);
        let samples = try_synthesize_with_rng(&steady_inputs(), "Lead II", 10, &mut rng).unwrap();
        assert_eq!(samples[0].beat_count, 0);
        assert!(samples.windows(2).all(|w| w[1].beat_count >= w[0].beat_count));
        // 0.833 s spacing: 13 onsets within 10 s.
        assert_eq!(samples.last().unwrap().beat_count, 12);
        // Sample 417 (0.834 s) belongs to the second beat.
        assert_eq!(samples[417].beat_count, 1);
    }

    #[test]
    fn r_peaks_reach_lead_amplitude() {
        let mut rng = StdRng::seed_from_u64(5);
        let samples = try_synthesize_with_rng(&steady_inputs(), "Lead II", 5, &mut rng).unwrap();
        let max = samples.iter().map(|s| s.amplitude).fold(f64::MIN, f64::max);
        assert!((1.05..1.35).contains(&max), "max {max}");

        let samples = try_synthesize_with_rng(&steady_inputs(), "aVR", 5, &mut rng).unwrap();
        let min = samples.iter().map(|s| s.amplitude).fold(f64::MAX, f64::min);
        assert!(min < -0.4, "aVR should invert the complex, min {min}");
    }

    #[test]
    fn amplitude_modifier_combines_pressure_and_oxygen() {
        let mut inputs = PhysiologicalInputs::default();
        assert_eq!(amplitude_modifier(&inputs), 1.0);
        inputs.blood_pressure.systolic = 150.0;
        assert!((amplitude_modifier(&inputs) - 1.15).abs() < 1e-12);
        inputs.blood_pressure.systolic = 85.0;
        inputs.oxygen_saturation = 80.0;
        assert!((amplitude_modifier(&inputs) - 0.75 * 0.8).abs() < 1e-12);
    }

    #[test]
    fn autonomic_tone_sets_respiratory_swing() {
        assert_eq!(respiratory_amplitude(-1.0), 0.01);
        assert_eq!(respiratory_amplitude(0.0), 0.02);
        assert_eq!(respiratory_amplitude(1.0), 0.03);
        assert_eq!(noise_level(92.0), 0.01);
        assert_eq!(noise_level(0.0), 0.005);
    }
}
