//! Wall closeness from the density of dark samples in one luma column

/// Fraction of a column at or below a darkness threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnProximityEstimator {
    threshold: u8,
}

impl ColumnProximityEstimator {
    pub fn new(threshold: u8) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Returns a value in [0, 1]; an empty column reads as 0
    pub fn estimate<I>(&self, column: I) -> f64
    where
        I: IntoIterator<Item = u8>,
    {
        let (dark, total) = column
            .into_iter()
            .fold((0usize, 0usize), |(dark, total), sample| {
                (dark + usize::from(sample <= self.threshold), total + 1)
            });

        if total == 0 {
            return 0.0;
        }
        dark as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_column() {
        let estimator = ColumnProximityEstimator::new(125);
        let mut column = vec![200u8; 50];
        for sample in column.iter_mut().take(10) {
            *sample = 125;
        }
        assert!((estimator.estimate(column) - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_bounds() {
        let estimator = ColumnProximityEstimator::new(125);
        assert_eq!(estimator.estimate(vec![0u8; 16]), 1.0);
        assert_eq!(estimator.estimate(vec![255u8; 16]), 0.0);
        assert_eq!(estimator.estimate(Vec::<u8>::new()), 0.0);
    }

    #[test]
    fn test_accepts_iterators() {
        let estimator = ColumnProximityEstimator::new(10);
        let closeness = estimator.estimate((0u8..20).map(|v| v * 2));
        assert!((closeness - 6.0 / 20.0).abs() < 1e-12);
    }
}
