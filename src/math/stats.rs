//! Small statistical primitives.
//!
//! Note: Functions taking `&mut [f64]` may reorder the input slice.

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    let m = mean(values);
    if m == 0.0 {
        return 0.0;
    }
    std_dev(values) / m
}

/// Mean of the longest 10% of durations (at least one). Below ten values the
/// single longest duration is returned.
pub fn mean_of_longest(durations: &mut [f64]) -> f64 {
    let n = durations.len();
    if n == 0 {
        return 0.0;
    }
    durations.sort_by(|a, b| a.total_cmp(b));
    if n < 10 {
        return durations[n - 1];
    }
    let k = ((0.10 * n as f64).round_ties_even() as usize).max(1);
    mean(&durations[n - k..])
}

pub fn max_or_zero(values: &[f64]) -> f64 {
    values.iter().copied().fold(0.0, f64::max)
}

/// Rounds half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn longest_tenth_of_twenty() {
        let mut v: Vec<f64> = (1..=20).map(|i| i as f64).collect();
        assert!((mean_of_longest(&mut v) - 19.5).abs() < 1e-12);
    }

    #[test]
    fn fewer_than_ten_uses_the_longest() {
        let mut v = vec![3.0, 9.0, 1.0];
        assert_eq!(mean_of_longest(&mut v), 9.0);
        assert_eq!(mean_of_longest(&mut []), 0.0);
    }

    #[test]
    fn tenth_rounds_half_to_even() {
        // 1.5 rounds up to 2 and 2.5 rounds down to 2.
        let mut fifteen: Vec<f64> = (1..=15).map(|i| i as f64).collect();
        assert_eq!(mean_of_longest(&mut fifteen), 14.5);
        let mut twenty_five: Vec<f64> = (1..=25).map(|i| i as f64).collect();
        assert_eq!(mean_of_longest(&mut twenty_five), 24.5);
    }

    #[test]
    fn cv_of_constant_is_zero() {
        assert_eq!(coefficient_of_variation(&[3.0, 3.0, 3.0]), 0.0);
        assert_eq!(coefficient_of_variation(&[]), 0.0);
    }
}
