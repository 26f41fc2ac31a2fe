//! Scoring formulas shared by expansion and backup.

/// Normalised value of a node: `-log10(1 - value + 0.01) / visits`.
/// A similarity of 1.0 maps to 2.0 before the visit division.
pub fn mean_value(value: f64, visits: u64) -> f64 {
    -(1.0 - value + 0.01).log10() / visits.max(1) as f64
}

/// Exploration bonus `c * sqrt(ln(iteration) / visits)`. Never negative.
pub fn exploration_term(iteration: u64, visits: u64, c: f64) -> f64 {
    let iteration = iteration.max(1) as f64;
    c * (iteration.ln() / visits.max(1) as f64).sqrt()
}

/// UCB selection score built on top of a mean value.
pub fn ucb_score(mean_value: f64, iteration: u64, visits: u64, c: f64) -> f64 {
    mean_value + exploration_term(iteration, visits, c)
}

/// Arithmetic mean of a non-empty slice.
pub fn average(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
