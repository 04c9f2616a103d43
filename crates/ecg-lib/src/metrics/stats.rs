//! Small descriptive statistics shared by the detector and the aggregator.

/// Arithmetic mean; `0.0` for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divides by `n`); `0.0` for an empty slice.
pub fn population_sd(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    (values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / values.len() as f64).sqrt()
}

/// Percentile `q` in `[0, 1]` of already sorted values, linearly interpolated
/// between closest ranks.
pub fn percentile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64))
}

/// Mean of the values inside the Tukey fences `[Q1 - 1.5 IQR, Q3 + 1.5 IQR]`.
pub fn iqr_filtered_mean(values: &[f64]) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(f64::total_cmp);
    let q1 = percentile_sorted(&sorted, 0.25)?;
    let q3 = percentile_sorted(&sorted, 0.75)?;
    let iqr = q3 - q1;
    let (lower, upper) = (q1 - 1.5 * iqr, q3 + 1.5 * iqr);
    let kept: Vec<f64> = sorted
        .into_iter()
        .filter(|v| (lower..=upper).contains(v))
        .collect();
    (!kept.is_empty()).then(|| mean(&kept))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iqr_mean_drops_outlier() {
        let avg = iqr_filtered_mean(&[100.0, 102.0, 101.0, 103.0, 500.0]).unwrap();
        assert!((avg - 101.5).abs() < 1e-12);
    }

    #[test]
    fn iqr_mean_keeps_tight_cluster() {
        let avg = iqr_filtered_mean(&[400.0, 400.0, 400.0]).unwrap();
        assert_eq!(avg, 400.0);
        assert_eq!(iqr_filtered_mean(&[]), None);
    }

    #[test]
    fn percentile_interpolates_linearly() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile_sorted(&sorted, 0.25), Some(1.75));
        assert_eq!(percentile_sorted(&sorted, 0.5), Some(2.5));
        assert_eq!(percentile_sorted(&sorted, 1.0), Some(4.0));
    }

    #[test]
    fn population_sd_divides_by_n() {
        assert!((population_sd(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]) - 2.0).abs() < 1e-12);
        assert_eq!(population_sd(&[]), 0.0);
    }
}
