use crate::error::ForecastError;

/// Univariate autoregressive model with a constant term:
/// `y_t = c + phi_1 * y_{t-1} + ... + phi_p * y_{t-p}`.
#[derive(Debug, Clone, PartialEq)]
pub struct AutoReg {
    intercept: f64,
    coefficients: Vec<f64>,
}

impl AutoReg {
    /// Ordinary least squares fit on `series` with `lags` lagged regressors.
    pub fn fit(series: &[f64], lags: usize) -> Result<Self, ForecastError> {
        if lags == 0 {
            return Err(ForecastError::InvalidSettings(
                "lag count must be positive".to_string(),
            ));
        }
        // at least as many equations as unknowns
        let needed = 2 * lags + 1;
        if series.len() < needed {
            return Err(ForecastError::InsufficientData {
                needed,
                got: series.len(),
            });
        }
        if series.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::NonFinite);
        }

        let k = lags + 1;
        let mut xtx = vec![vec![0.0; k]; k];
        let mut xty = vec![0.0; k];
        let mut row = vec![0.0; k];

        for t in lags..series.len() {
            row[0] = 1.0;
            for i in 1..=lags {
                row[i] = series[t - i];
            }
            for a in 0..k {
                xty[a] += row[a] * series[t];
                for b in a..k {
                    xtx[a][b] += row[a] * row[b];
                }
            }
        }
        for a in 0..k {
            for b in 0..a {
                xtx[a][b] = xtx[b][a];
            }
        }

        let beta = solve(xtx, xty)?;
        log::debug!("fit | lags: {} | params: {:?}", lags, beta);

        Ok(AutoReg {
            intercept: beta[0],
            coefficients: beta[1..].to_vec(),
        })
    }

    pub fn lags(&self) -> usize {
        self.coefficients.len()
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Value implied by the model given the most recent observations last.
    fn step(&self, recent: &[f64]) -> f64 {
        self.coefficients
            .iter()
            .zip(recent.iter().rev())
            .fold(self.intercept, |acc, (phi, y)| acc + phi * y)
    }

    /// One-step-ahead predictions for `series[start..]`, each computed from
    /// the observed values preceding it.
    pub fn predict(&self, series: &[f64], start: usize) -> Result<Vec<f64>, ForecastError> {
        let p = self.lags();
        if start < p {
            return Err(ForecastError::InsufficientData {
                needed: p,
                got: start,
            });
        }
        Ok((start..series.len())
            .map(|t| self.step(&series[t - p..t]))
            .collect())
    }

    /// Projects `steps` values past the end of `history`, feeding each
    /// projection back as input.
    pub fn forecast(&self, history: &[f64], steps: usize) -> Result<Vec<f64>, ForecastError> {
        let p = self.lags();
        if history.len() < p {
            return Err(ForecastError::InsufficientData {
                needed: p,
                got: history.len(),
            });
        }
        let mut window = history[history.len() - p..].to_vec();
        let mut out = Vec::with_capacity(steps);
        for _ in 0..steps {
            let next = self.step(&window);
            window.remove(0);
            window.push(next);
            out.push(next);
        }
        Ok(out)
    }
}

/// Gaussian elimination with partial pivoting.
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>, ForecastError> {
    let n = b.len();
    let scale = a
        .iter()
        .flatten()
        .fold(0.0_f64, |m, v| m.max(v.abs()));
    let tolerance = scale * n as f64 * 1e-12;

    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);
        if a[pivot][col].abs() <= tolerance {
            return Err(ForecastError::Singular);
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for r in col + 1..n {
            let factor = a[r][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for c in col..n {
                a[r][c] -= factor * a[col][c];
            }
            b[r] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for r in (0..n).rev() {
        let tail: f64 = (r + 1..n).map(|c| a[r][c] * x[c]).sum();
        x[r] = (b[r] - tail) / a[r][r];
    }
    if x.iter().any(|v| !v.is_finite()) {
        return Err(ForecastError::Singular);
    }
    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    // y_t = 2 + 1.6 y_{t-1} - 0.9 y_{t-2}, damped oscillation around 20/3
    fn ar2_series(len: usize) -> Vec<f64> {
        let mut y = vec![10.0, 12.0];
        while y.len() < len {
            let n = y.len();
            y.push(2.0 + 1.6 * y[n - 1] - 0.9 * y[n - 2]);
        }
        y
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-6, "{} != {}", a, b);
    }

    #[test]
    fn fit_recovers_noiseless_coefficients() {
        let model = AutoReg::fit(&ar2_series(60), 2).unwrap();
        assert_close(model.intercept(), 2.0);
        assert_close(model.coefficients()[0], 1.6);
        assert_close(model.coefficients()[1], -0.9);
    }

    #[test]
    fn predict_matches_observations_on_noiseless_series() {
        let series = ar2_series(60);
        let model = AutoReg::fit(&series, 2).unwrap();
        let predicted = model.predict(&series, 40).unwrap();
        assert_eq!(predicted.len(), 20);
        for (p, y) in predicted.iter().zip(&series[40..]) {
            assert_close(*p, *y);
        }
    }

    #[test]
    fn forecast_continues_recurrence() {
        let series = ar2_series(80);
        let model = AutoReg::fit(&series[..50], 2).unwrap();
        let projected = model.forecast(&series[..50], 30).unwrap();
        for (p, y) in projected.iter().zip(&series[50..]) {
            assert_close(*p, *y);
        }
    }

    #[test]
    fn fit_fails_on_short_series() {
        assert_eq!(
            AutoReg::fit(&[1.0, 2.0, 3.0, 4.0], 2),
            Err(ForecastError::InsufficientData { needed: 5, got: 4 })
        );
    }

    #[test]
    fn fit_fails_on_constant_series() {
        assert_eq!(AutoReg::fit(&[5.0; 30], 3), Err(ForecastError::Singular));
    }

    #[test]
    fn fit_fails_on_nan() {
        let mut series = ar2_series(20);
        series[7] = f64::NAN;
        assert_eq!(AutoReg::fit(&series, 2), Err(ForecastError::NonFinite));
    }

    #[test]
    fn fit_rejects_zero_lags() {
        assert!(matches!(
            AutoReg::fit(&ar2_series(20), 0),
            Err(ForecastError::InvalidSettings(_))
        ));
    }

    #[test]
    fn predict_needs_enough_history() {
        let model = AutoReg::fit(&ar2_series(20), 2).unwrap();
        assert!(model.predict(&ar2_series(20), 1).is_err());
        assert!(model.forecast(&[1.0], 5).is_err());
    }
}
