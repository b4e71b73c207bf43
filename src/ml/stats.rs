//! Mean and Pearson correlation

use crate::structs::{CrimeError, Result};

/// Arithmetic mean, `None` for empty input
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Whether every value equals the first one
fn is_constant(values: &[f64]) -> bool {
    values.first().is_some_and(|&first| values.iter().all(|&v| v == first))
}

/// Pearson correlation coefficient between a feature and the target
///
/// `x_name` and `y_name` are only used to build error messages.
///
/// # Errors
/// Returns error if vectors have different lengths, fewer than 2 values,
/// or either side has zero variance
#[allow(clippy::cast_precision_loss)]
pub fn pearson(x: &[f64], y: &[f64], x_name: &str, y_name: &str) -> Result<f64> {
    if x.len() != y.len() {
        return Err(CrimeError::DimensionMismatch {
            features: x.len(),
            targets: y.len(),
        });
    }
    if x.len() < 2 {
        return Err(CrimeError::Numeric {
            column: x_name.to_string(),
            reason: "need at least 2 values for correlation".into(),
        });
    }

    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;

    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    // Centering an inexact constant such as 0.1 leaves a few ulps of variance
    if is_constant(y) || var_y == 0.0 {
        return Err(CrimeError::DegenerateFeature {
            column: y_name.to_string(),
        });
    }
    if is_constant(x) || var_x == 0.0 {
        return Err(CrimeError::DegenerateFeature {
            column: x_name.to_string(),
        });
    }

    // Rounding can push |r| a hair past 1
    Ok((cov / (var_x * var_y).sqrt()).clamp(-1.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        let values = vec![1.0, 2.0, 3.0, 4.0];
        assert!((mean(&values).expect("mean") - 2.5).abs() < 1e-12);
        assert!(mean(&[]).is_none());
    }

    #[test]
    fn test_correlation() {
        let x = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let y = vec![2.0, 4.0, 6.0, 8.0, 10.0];
        let corr = pearson(&x, &y, "x", "y").expect("calculate correlation");
        assert!((corr - 1.0).abs() < 1e-12);

        let y_neg = vec![10.0, 8.0, 6.0, 4.0, 2.0];
        let corr = pearson(&x, &y_neg, "x", "y").expect("calculate correlation");
        assert!((corr + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_variance_is_degenerate() {
        let x = vec![0.3, 0.3, 0.3];
        let y = vec![0.1, 0.5, 0.9];

        match pearson(&x, &y, "flat", "y") {
            Err(CrimeError::DegenerateFeature { column }) => assert_eq!(column, "flat"),
            other => panic!("expected degenerate feature, got {other:?}"),
        }
    }

    #[test]
    fn test_inexact_constant_is_degenerate() {
        // 0.1 and 0.03 do not divide back exactly from their sum
        let x = vec![0.1; 7];
        let y: Vec<f64> = (1..=7).map(|r| 0.1 * f64::from(r)).collect();
        match pearson(&x, &y, "flat", "y") {
            Err(CrimeError::DegenerateFeature { column }) => assert_eq!(column, "flat"),
            other => panic!("expected degenerate feature, got {other:?}"),
        }

        let target = vec![0.03; 5];
        let feature = vec![0.1, 0.4, 0.2, 0.9, 0.5];
        match pearson(&feature, &target, "x", "target") {
            Err(CrimeError::DegenerateFeature { column }) => assert_eq!(column, "target"),
            other => panic!("expected degenerate target, got {other:?}"),
        }
    }

    #[test]
    fn test_length_mismatch() {
        assert!(matches!(
            pearson(&[1.0, 2.0], &[1.0], "x", "y"),
            Err(CrimeError::DimensionMismatch { .. })
        ));
    }
}
