//! Test fitters with scripted AIC values.

use crate::data::Dataset;
use crate::domain::Family;
use crate::error::FitFailure;
use crate::fit::{FittedModel, ModelFitter};

/// A fitter whose AIC is a function of the column set alone.
pub struct ScriptedFitter<F>(pub F);

impl<F> ModelFitter for ScriptedFitter<F>
where
    F: Fn(&[usize]) -> Result<f64, FitFailure> + Send + Sync,
{
    fn fit(&self, data: &Dataset, columns: &[usize], family: Family) -> Result<FittedModel, FitFailure> {
        let aic = (self.0)(columns)?;
        Ok(FittedModel {
            family,
            terms: columns.iter().map(|&c| data.names()[c].clone()).collect(),
            coefficients: vec![0.0; columns.len() + 1],
            deviance: 0.0,
            aic,
            iterations: 0,
        })
    }
}

/// `base - Σ gain[c] + penalty·|cols|`: each column independently improves
/// the fit by its gain and costs `penalty`.
pub fn additive(base: f64, gains: Vec<f64>, penalty: f64) -> impl Fn(&[usize]) -> Result<f64, FitFailure> + Send + Sync {
    move |cols: &[usize]| Ok(base - cols.iter().map(|&c| gains[c]).sum::<f64>() + penalty * cols.len() as f64)
}

/// A dataset with `p` unused columns named `x1..xp`; scripted fitters ignore it.
pub fn blank_data(n: usize, p: usize) -> Dataset {
    let columns = (1..=p)
        .map(|j| (format!("x{j}"), (0..n).map(|i| (i * j) as f64).collect()))
        .collect();
    Dataset::from_columns(columns, (0..n).map(|i| (i % 2) as f64).collect())
        .expect("blank data is valid")
}
