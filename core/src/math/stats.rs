pub struct StatsHelper;

impl StatsHelper {
    /// Weighted arithmetic mean `Σ wᵢxᵢ / Σ wᵢ`.
    ///
    /// Returns `None` for empty input, mismatched lengths or a zero weight sum.
    /// A single sample is returned as-is.
    pub fn weighted_mean(values: &[f64], weights: &[f64]) -> Option<f64> {
        if values.is_empty() || values.len() != weights.len() {
            return None;
        }
        if values.len() == 1 {
            return Some(values[0]);
        }

        let weight_sum: f64 = weights.iter().sum();
        if weight_sum == 0.0 {
            return None;
        }
        let weighted_sum: f64 = values.iter().zip(weights).map(|(v, w)| v * w).sum();
        Some(weighted_sum / weight_sum)
    }
}
