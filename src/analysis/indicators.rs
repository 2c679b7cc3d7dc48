//! Moving-average indicators.

/// Simple moving average over the last `window` values.
/// Returns `None` when there is not enough history.
pub fn sma(values: &[f64], window: usize) -> Option<f64> {
    if window == 0 || values.len() < window {
        return None;
    }
    let tail = &values[values.len() - window..];
    Some(tail.iter().sum::<f64>() / window as f64)
}

/// Disparity: the current price as a percentage of a moving average.
/// Below 100 means trading under the average.
pub fn disparity(price: f64, average: f64) -> f64 {
    if average == 0.0 {
        return 0.0;
    }
    price / average * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sma_last_window() {
        let v = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(sma(&v, 2), Some(4.5));
        assert_eq!(sma(&v, 5), Some(3.0));
    }

    #[test]
    fn test_sma_insufficient_history() {
        assert_eq!(sma(&[1.0, 2.0], 3), None);
        assert_eq!(sma(&[1.0], 0), None);
    }

    #[test]
    fn test_disparity() {
        assert!((disparity(95.0, 100.0) - 95.0).abs() < 1e-12);
        assert!((disparity(110.0, 100.0) - 110.0).abs() < 1e-12);
        assert_eq!(disparity(50.0, 0.0), 0.0);
    }
}
