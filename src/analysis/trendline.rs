//! Ordinary least-squares trend fitting over selected pivots.

/// A fitted line `y = slope * x + intercept` with its goodness of fit.
#[derive(Debug, Clone, Copy)]
pub struct LineFit {
    pub slope: f64,
    pub intercept: f64,
    /// Coefficient of determination, `1 - ss_res / ss_tot`.
    /// Defined as 0 when `ss_tot == 0` (all y equal).
    pub r_squared: f64,
}

impl LineFit {
    /// Evaluate the fitted line at `x` (extrapolation allowed).
    pub fn value_at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Least-squares fit through `(x, y)` points.
///
/// Fewer than two points, or zero variance in x, yields a flat line
/// through the mean with `r_squared = 0`.
pub fn fit_line(points: &[(f64, f64)]) -> LineFit {
    let n = points.len() as f64;
    if points.len() < 2 {
        let y = points.first().map(|p| p.1).unwrap_or(0.0);
        return LineFit { slope: 0.0, intercept: y, r_squared: 0.0 };
    }

    let mean_x = points.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.1).sum::<f64>() / n;

    let sxx: f64 = points.iter().map(|p| (p.0 - mean_x).powi(2)).sum();
    let sxy: f64 = points.iter().map(|p| (p.0 - mean_x) * (p.1 - mean_y)).sum();

    if sxx == 0.0 {
        return LineFit { slope: 0.0, intercept: mean_y, r_squared: 0.0 };
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;

    let ss_res: f64 = points
        .iter()
        .map(|p| (p.1 - (slope * p.0 + intercept)).powi(2))
        .sum();
    let ss_tot: f64 = points.iter().map(|p| (p.1 - mean_y).powi(2)).sum();

    let r_squared = if ss_tot == 0.0 { 0.0 } else { 1.0 - ss_res / ss_tot };

    LineFit { slope, intercept, r_squared }
}
