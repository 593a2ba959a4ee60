//! In-memory regression data: named predictor matrix plus response.
//!
//! A `Dataset` is validated once at construction (shape, finiteness, predictor
//! names) and is immutable afterwards. Searches and resamples only ever read it;
//! resampling produces a fresh, independently owned `Dataset`.

use std::collections::HashSet;

use nalgebra::{DMatrix, DVector};

use crate::domain::{EMPTY_ID, Family, ID_SEPARATOR};
use crate::error::{Result, SelectError};

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    names: Vec<String>,
    x: DMatrix<f64>,
    y: DVector<f64>,
}

impl Dataset {
    /// Build from an `n×p` matrix, `p` predictor names and a length-`n` response.
    pub fn new(names: Vec<String>, x: DMatrix<f64>, y: DVector<f64>) -> Result<Self> {
        if x.nrows() == 0 {
            return Err(SelectError::invalid("X has no rows."));
        }
        if x.ncols() == 0 {
            return Err(SelectError::invalid("X has no predictor columns."));
        }
        if y.len() != x.nrows() {
            return Err(SelectError::invalid(format!(
                "Response length ({}) != number of rows in X ({}).",
                y.len(),
                x.nrows()
            )));
        }
        if names.len() != x.ncols() {
            return Err(SelectError::invalid(format!(
                "Got {} predictor names for {} columns.",
                names.len(),
                x.ncols()
            )));
        }
        validate_names(&names)?;

        if let Some((i, j)) = first_non_finite(&x) {
            return Err(SelectError::invalid(format!(
                "Non-finite value in X at row {i}, column '{}'.",
                names[j]
            )));
        }
        if let Some(i) = y.iter().position(|v| !v.is_finite()) {
            return Err(SelectError::invalid(format!("Non-finite response at row {i}.")));
        }

        Ok(Self { names, x, y })
    }

    /// Build from row-major observations. Every row must have one value per name.
    pub fn from_rows(names: Vec<String>, rows: &[Vec<f64>], y: Vec<f64>) -> Result<Self> {
        let p = names.len();
        if let Some(i) = rows.iter().position(|r| r.len() != p) {
            return Err(SelectError::invalid(format!(
                "X is not rectangular: row {i} has {} values, expected {p}.",
                rows[i].len()
            )));
        }
        let x = DMatrix::from_fn(rows.len(), p, |i, j| rows[i][j]);
        Self::new(names, x, DVector::from_vec(y))
    }

    /// Build from named columns of equal length.
    pub fn from_columns(columns: Vec<(String, Vec<f64>)>, y: Vec<f64>) -> Result<Self> {
        let n = columns.first().map(|(_, c)| c.len()).unwrap_or(0);
        if let Some((name, col)) = columns.iter().find(|(_, c)| c.len() != n) {
            return Err(SelectError::invalid(format!(
                "X is not rectangular: column '{name}' has {} values, expected {n}.",
                col.len()
            )));
        }
        let x = DMatrix::from_fn(n, columns.len(), |i, j| columns[j].1[i]);
        let names = columns.into_iter().map(|(name, _)| name).collect();
        Self::new(names, x, DVector::from_vec(y))
    }

    pub fn n(&self) -> usize {
        self.x.nrows()
    }

    pub fn p(&self) -> usize {
        self.x.ncols()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn x(&self) -> &DMatrix<f64> {
        &self.x
    }

    pub fn y(&self) -> &DVector<f64> {
        &self.y
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Design matrix for a model: an intercept column followed by `columns`.
    pub fn design(&self, columns: &[usize]) -> DMatrix<f64> {
        DMatrix::from_fn(self.n(), columns.len() + 1, |i, j| {
            if j == 0 { 1.0 } else { self.x[(i, columns[j - 1])] }
        })
    }

    /// Check that the response is admissible for `family`.
    pub fn validate_response(&self, family: Family) -> Result<()> {
        match family {
            Family::Gaussian => Ok(()),
            Family::Binomial => match self.y.iter().position(|&v| v != 0.0 && v != 1.0) {
                Some(i) => Err(SelectError::invalid(format!(
                    "Binomial response must be 0/1; row {i} has {}.",
                    self.y[i]
                ))),
                None => Ok(()),
            },
        }
    }

    /// A new dataset made of the given rows (repeats allowed).
    pub fn select_rows(&self, rows: &[usize]) -> Self {
        Self {
            names: self.names.clone(),
            x: self.x.select_rows(rows.iter()),
            y: self.y.select_rows(rows.iter()),
        }
    }
}

/// Predictor names must be usable as canonical id components.
fn validate_names(names: &[String]) -> Result<()> {
    let mut seen = HashSet::with_capacity(names.len());
    for name in names {
        if name.is_empty() {
            return Err(SelectError::invalid("Predictor names must be non-empty."));
        }
        if name.contains(ID_SEPARATOR) {
            return Err(SelectError::invalid(format!(
                "Predictor name '{name}' contains reserved character '{ID_SEPARATOR}'."
            )));
        }
        if name == EMPTY_ID {
            return Err(SelectError::invalid(format!(
                "Predictor name '{EMPTY_ID}' is reserved."
            )));
        }
        if !seen.insert(name.as_str()) {
            return Err(SelectError::invalid(format!("Duplicate predictor name '{name}'.")));
        }
    }
    Ok(())
}

fn first_non_finite(x: &DMatrix<f64>) -> Option<(usize, usize)> {
    for j in 0..x.ncols() {
        for i in 0..x.nrows() {
            if !x[(i, j)].is_finite() {
                return Some((i, j));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn rejects_length_mismatch() {
        let err = Dataset::from_rows(names(&["a"]), &[vec![1.0], vec![2.0]], vec![1.0]).unwrap_err();
        assert!(matches!(err, SelectError::InvalidInput(_)));
    }

    #[test]
    fn rejects_ragged_rows() {
        let err = Dataset::from_rows(
            names(&["a", "b"]),
            &[vec![1.0, 2.0], vec![3.0]],
            vec![1.0, 2.0],
        )
        .unwrap_err();
        assert!(err.to_string().contains("not rectangular"));
    }

    #[test]
    fn rejects_non_finite_and_bad_names() {
        let err = Dataset::from_rows(names(&["a"]), &[vec![f64::NAN]], vec![1.0]).unwrap_err();
        assert!(matches!(err, SelectError::InvalidInput(_)));

        for bad in [vec!["a", "a"], vec!["a+b"], vec!["EMPTY"], vec![""]] {
            let rows = vec![vec![0.0; bad.len()]];
            assert!(Dataset::from_rows(names(&bad), &rows, vec![1.0]).is_err(), "{bad:?}");
        }
    }

    #[test]
    fn design_prepends_intercept() {
        let data = Dataset::from_columns(
            vec![("a".into(), vec![1.0, 2.0]), ("b".into(), vec![3.0, 4.0])],
            vec![0.0, 1.0],
        )
        .unwrap();
        let d = data.design(&[1]);
        assert_eq!(d.ncols(), 2);
        assert_eq!(d[(0, 0)], 1.0);
        assert_eq!(d[(1, 1)], 4.0);
    }

    #[test]
    fn select_rows_allows_repeats() {
        let data = Dataset::from_columns(vec![("a".into(), vec![1.0, 2.0, 3.0])], vec![10.0, 20.0, 30.0])
            .unwrap();
        let r = data.select_rows(&[2, 2, 0]);
        assert_eq!(r.n(), 3);
        assert_eq!(r.y().as_slice(), &[30.0, 30.0, 10.0]);
        assert_eq!(r.x()[(1, 0)], 3.0);
    }

    #[test]
    fn binomial_response_must_be_binary() {
        let data = Dataset::from_columns(vec![("a".into(), vec![1.0, 2.0])], vec![0.0, 0.5]).unwrap();
        assert!(data.validate_response(Family::Gaussian).is_ok());
        assert!(data.validate_response(Family::Binomial).is_err());
    }
}
