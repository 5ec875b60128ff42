//! Ordinary least squares trend line and Pearson correlation for the
//! scatter plot.

use serde::Serialize;

/// Fitted line `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RegressionResult {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
}

impl RegressionResult {
    #[must_use]
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    /// Hover text for the trend line, rounded to two places.
    #[must_use]
    pub fn tooltip(&self) -> [(String, String); 2] {
        [
            (
                "Y=".to_string(),
                format!("{}x + {}", display2(self.slope), display2(self.intercept)),
            ),
            ("R\u{00b2}".to_string(), display2(self.r_squared)),
        ]
    }
}

/// Rounds half away from zero to two decimal places.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// [`round2`] for display: always one or two decimals (`1.0`, `0.99`),
/// and never a negative zero.
#[must_use]
pub fn display2(value: f64) -> String {
    let rounded = round2(value);
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    format!("{rounded:?}")
}

/// Compared directly, not through the sum of squares: the float mean of
/// identical fractional values can miss them by a rounding error.
fn is_constant(values: &[f64]) -> bool {
    values.windows(2).all(|pair| pair[0] == pair[1])
}

/// Sums needed by both statistics.
struct Moments {
    mean_x: f64,
    mean_y: f64,
    sxx: f64,
    syy: f64,
    sxy: f64,
}

fn moments(xs: &[f64], ys: &[f64]) -> Option<Moments> {
    let n = xs.len().min(ys.len());
    if n == 0 {
        return None;
    }
    let (xs, ys) = (&xs[..n], &ys[..n]);

    let mean_x = xs.iter().sum::<f64>() / n as f64;
    let mean_y = ys.iter().sum::<f64>() / n as f64;

    let (sxx, syy, sxy) = xs.iter().zip(ys).fold((0.0, 0.0, 0.0), |(sxx, syy, sxy), (x, y)| {
        let dx = x - mean_x;
        let dy = y - mean_y;
        (sxx + dx * dx, syy + dy * dy, sxy + dx * dy)
    });

    Some(Moments { mean_x, mean_y, sxx, syy, sxy })
}

/// Fits a least squares line through the paired points.
///
/// Returns `None` with fewer than two points or when every x is identical,
/// in which case no trend line is drawn. When every y is identical the line
/// is flat and explains all of the (zero) variance, so R² is 1.
#[must_use]
pub fn fit_linear(xs: &[f64], ys: &[f64]) -> Option<RegressionResult> {
    let n = xs.len().min(ys.len());
    if n < 2 || is_constant(&xs[..n]) {
        return None;
    }
    let m = moments(xs, ys)?;

    let slope = m.sxy / m.sxx;
    let intercept = m.mean_y - slope * m.mean_x;
    let r_squared = if is_constant(&ys[..n]) {
        1.0
    } else {
        (m.sxy * m.sxy) / (m.sxx * m.syy)
    };

    Some(RegressionResult { slope, intercept, r_squared })
}

/// Pearson correlation coefficient. Falls back to 0 when it is undefined:
/// fewer than two points, or no variance on either axis.
#[must_use]
pub fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len().min(ys.len());
    if n < 2 || is_constant(&xs[..n]) || is_constant(&ys[..n]) {
        return 0.0;
    }
    match moments(xs, ys) {
        Some(m) if m.sxx > 0.0 && m.syy > 0.0 => m.sxy / (m.sxx.sqrt() * m.syy.sqrt()),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_perfect_line() {
        let fit = fit_linear(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]).unwrap();
        assert!(approx(fit.slope, 2.0));
        assert!(approx(fit.intercept, 0.0));
        assert!(approx(fit.r_squared, 1.0));
        assert!(approx(fit.predict(10.0), 20.0));
    }

    #[test]
    fn test_noisy_fit() {
        // y = 1 + x with residuals +1, -1, -1, +1
        let xs = [0.0, 1.0, 2.0, 3.0];
        let ys = [2.0, 1.0, 2.0, 5.0];
        let fit = fit_linear(&xs, &ys).unwrap();
        assert!(approx(fit.slope, 1.0));
        assert!(approx(fit.intercept, 1.0));
        // syy = 9, residual sum of squares = 4
        assert!(approx(fit.r_squared, 5.0 / 9.0));
        assert!(approx(pearson(&xs, &ys), (5.0f64 / 9.0).sqrt()));
    }

    #[test]
    fn test_too_few_points() {
        assert!(fit_linear(&[], &[]).is_none());
        assert!(fit_linear(&[1.0], &[1.0]).is_none());
        assert_eq!(pearson(&[], &[]), 0.0);
        assert_eq!(pearson(&[1.0], &[3.0]), 0.0);
    }

    #[test]
    fn test_zero_x_variance_skips_fit() {
        assert!(fit_linear(&[2.0, 2.0, 2.0], &[1.0, 5.0, 9.0]).is_none());
        assert_eq!(pearson(&[2.0, 2.0, 2.0], &[1.0, 5.0, 9.0]), 0.0);
    }

    #[test]
    fn test_identical_fractional_x_skips_fit() {
        // 0.1 has no exact binary form, so the mean drifts off the values.
        for v in [0.1, 0.7] {
            let xs = [v, v, v];
            let ys = [4.0, 5.0, 6.0];
            assert!(fit_linear(&xs, &ys).is_none(), "x = {v}");
            assert_eq!(pearson(&xs, &ys), 0.0);
            assert_eq!(pearson(&ys, &xs), 0.0);
        }
    }

    #[test]
    fn test_identical_fractional_y_is_flat_line() {
        let fit = fit_linear(&[1.0, 2.0, 3.0], &[0.1, 0.1, 0.1]).unwrap();
        assert!(approx(fit.slope, 0.0));
        assert!(approx(fit.intercept, 0.1));
        assert_eq!(fit.r_squared, 1.0);
    }

    #[test]
    fn test_display2() {
        assert_eq!(display2(1.0), "1.0");
        assert_eq!(display2(0.987), "0.99");
        assert_eq!(display2(-0.456), "-0.46");
        assert_eq!(display2(-0.001), "0.0");
        assert_eq!(display2(0.0), "0.0");
    }

    #[test]
    fn test_flat_y() {
        let fit = fit_linear(&[1.0, 2.0, 3.0], &[4.0, 4.0, 4.0]).unwrap();
        assert!(approx(fit.slope, 0.0));
        assert!(approx(fit.intercept, 4.0));
        assert!(approx(fit.r_squared, 1.0));
    }

    #[test]
    fn test_negative_correlation() {
        let r = pearson(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]);
        assert!(approx(r, -1.0));
    }

    #[test]
    fn test_tooltip() {
        let fit = RegressionResult { slope: 2.004, intercept: -0.456, r_squared: 0.987 };
        let [line, r2] = fit.tooltip();
        assert_eq!(line, ("Y=".to_string(), "2.0x + -0.46".to_string()));
        assert_eq!(r2, ("R²".to_string(), "0.99".to_string()));
    }
}
