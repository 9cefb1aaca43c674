use std::cmp::Ordering;
use std::fmt;

/// Global explained variance (GEV) of a set of microstate topographies.
///
/// `Σ_t corr(x_t, s_{label_t})² · ‖x_t‖² / Σ_t ‖x_t‖²`: each sample's squared
/// correlation with its assigned center, weighted by the sample's energy.
/// The correlation is squared, so a topography and its negation explain a
/// sample equally. A recording with zero energy explains nothing and has a
/// GEV of `0`. Restarts are ranked by this value; higher is better.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct ExplainedVariance(f64);

impl ExplainedVariance {
    #[cfg(test)]
    pub(crate) fn new(value: f64) -> Self {
        Self(value)
    }

    /// Ratio of `explained` energy to `total` energy, `0` when `total` is not
    /// positive.
    pub(crate) fn from_energy(explained: f64, total: f64) -> Self {
        if total > 0.0 { Self(explained / total) } else { Self(0.0) }
    }

    /// Return the raw explained variance value.
    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }

    /// Total ordering comparison using [`f64::total_cmp`].
    #[must_use]
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for ExplainedVariance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use std::cmp::Ordering;

    use super::ExplainedVariance;

    #[test]
    fn display_format() {
        let gev = ExplainedVariance::new(0.75);
        assert_eq!(format!("{gev}"), "0.750000");
    }

    #[test]
    fn zero_energy_explains_nothing() {
        assert_eq!(ExplainedVariance::from_energy(0.0, 0.0).value(), 0.0);
        assert_eq!(ExplainedVariance::from_energy(3.0, 4.0).value(), 0.75);
    }

    #[test]
    fn total_cmp_ordering() {
        let a = ExplainedVariance::new(0.2);
        let b = ExplainedVariance::new(0.9);
        assert_eq!(a.total_cmp(&b), Ordering::Less);
        assert_eq!(b.total_cmp(&a), Ordering::Greater);
        assert_eq!(a.total_cmp(&a), Ordering::Equal);
    }
}
