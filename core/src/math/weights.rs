/// Floor added to every weight so no member of a cell is ignored outright.
pub const BARNES_EPSILON: f64 = 1e-5;

/// Barnes-2 weight of a gate `dist2` (squared meters) from a cell center whose
/// squared radius of influence is `r2`.
pub fn barnes2_weight(dist2: f64, r2: f64) -> f64 {
    (-dist2 / (r2 / 4.0)).exp() + BARNES_EPSILON
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_at_center_gets_maximum_weight() {
        assert_eq!(barnes2_weight(0.0, 250_000.0), 1.0 + BARNES_EPSILON);
    }

    #[test]
    fn weight_decreases_with_distance() {
        let r2 = 1.0e6;
        let near = barnes2_weight(1.0e4, r2);
        let far = barnes2_weight(4.0e5, r2);
        assert!(near > far);
        assert!(far > BARNES_EPSILON);
    }
}
