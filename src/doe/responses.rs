//! Response data: dense measurement storage and conversion to the
//! runs × replicates matrix the pipeline consumes.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Turn per-run replicate rows with holes into a complete response matrix.
///
/// # Errors
///
/// - `DimensionMismatch` if `rows.len() != runs`
/// - `NoResponse` if rows carry no replicate columns
/// - `InvalidParams` for ragged rows or non-finite values
/// - `IncompleteData` at the first missing entry, in run-major order
pub fn response_matrix(rows: &[Vec<Option<f64>>], runs: usize) -> Result<Array2<f64>> {
    if rows.len() != runs {
        return Err(Error::DimensionMismatch {
            expected: format!("{runs} response rows"),
            actual: rows.len().to_string(),
        });
    }
    let replicates = rows.first().map_or(0, Vec::len);
    if replicates == 0 {
        return Err(Error::NoResponse);
    }

    let mut values = Vec::with_capacity(runs * replicates);
    for (run, row) in rows.iter().enumerate() {
        if row.len() != replicates {
            return Err(Error::invalid_params(format!(
                "run {run} has {} replicates, expected {replicates}",
                row.len()
            )));
        }
        for (replicate, value) in row.iter().enumerate() {
            let v = value.ok_or(Error::IncompleteData { run, replicate })?;
            if !v.is_finite() {
                return Err(Error::invalid_params(format!(
                    "response at run {run}, replicate {replicate} is not finite"
                )));
            }
            values.push(v);
        }
    }

    Array2::from_shape_vec((runs, replicates), values).map_err(|e| Error::DimensionMismatch {
        expected: format!("{runs}x{replicates} responses"),
        actual: e.to_string(),
    })
}

/// Measurements indexed by (run, replicate, response).
///
/// Values arrive one at a time as an experiment proceeds; a response can be
/// analyzed once every one of its entries is present.
///
/// ```
/// use taguchi_doe::doe::MeasurementSet;
///
/// let mut set = MeasurementSet::new(2, 1, vec!["yield".into()]).unwrap();
/// set.set(0, 0, "yield", 12.5).unwrap();
/// assert!(!set.is_complete("yield").unwrap());
/// assert_eq!(set.missing("yield").unwrap(), vec![(1, 0)]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementSet {
    runs: usize,
    replicates: usize,
    responses: Vec<String>,
    /// Response-major, then run, then replicate.
    values: Vec<Option<f64>>,
}

impl MeasurementSet {
    /// Empty set for `runs` × `replicates` measurements of each response.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParams` for zero runs or replicates, and for duplicate
    /// response names. Returns `NoResponse` if `responses` is empty.
    pub fn new(runs: usize, replicates: usize, responses: Vec<String>) -> Result<Self> {
        if runs == 0 || replicates == 0 {
            return Err(Error::invalid_params("runs and replicates must be at least 1"));
        }
        if responses.is_empty() {
            return Err(Error::NoResponse);
        }
        for (i, name) in responses.iter().enumerate() {
            if responses[..i].contains(name) {
                return Err(Error::invalid_params(format!("duplicate response '{name}'")));
            }
        }
        let len = runs * replicates * responses.len();
        Ok(Self {
            runs,
            replicates,
            responses,
            values: vec![None; len],
        })
    }

    /// Number of runs.
    #[must_use]
    pub fn runs(&self) -> usize {
        self.runs
    }

    /// Replicates per run.
    #[must_use]
    pub fn replicates(&self) -> usize {
        self.replicates
    }

    /// Response names.
    #[must_use]
    pub fn responses(&self) -> &[String] {
        &self.responses
    }

    fn response_index(&self, response: &str) -> Result<usize> {
        self.responses
            .iter()
            .position(|r| r == response)
            .ok_or_else(|| Error::invalid_params(format!("unknown response '{response}'")))
    }

    fn offset(&self, run: usize, replicate: usize, response: &str) -> Result<usize> {
        let r = self.response_index(response)?;
        if run >= self.runs || replicate >= self.replicates {
            return Err(Error::invalid_params(format!(
                "measurement ({run}, {replicate}) outside {}x{}",
                self.runs, self.replicates
            )));
        }
        Ok((r * self.runs + run) * self.replicates + replicate)
    }

    /// Record one measurement.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParams` for an unknown response, an out-of-range
    /// index, or a non-finite value.
    pub fn set(&mut self, run: usize, replicate: usize, response: &str, value: f64) -> Result<()> {
        if !value.is_finite() {
            return Err(Error::invalid_params(format!(
                "measurement ({run}, {replicate}) of '{response}' is not finite"
            )));
        }
        let i = self.offset(run, replicate, response)?;
        self.values[i] = Some(value);
        Ok(())
    }

    /// Forget one measurement.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParams` for an unknown response or out-of-range index.
    pub fn clear(&mut self, run: usize, replicate: usize, response: &str) -> Result<()> {
        let i = self.offset(run, replicate, response)?;
        self.values[i] = None;
        Ok(())
    }

    /// One measurement, if recorded.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParams` for an unknown response or out-of-range index.
    pub fn get(&self, run: usize, replicate: usize, response: &str) -> Result<Option<f64>> {
        Ok(self.values[self.offset(run, replicate, response)?])
    }

    fn slice(&self, response: &str) -> Result<&[Option<f64>]> {
        let r = self.response_index(response)?;
        let n = self.runs * self.replicates;
        Ok(&self.values[r * n..(r + 1) * n])
    }

    /// Whether every measurement of `response` is present.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParams` for an unknown response.
    pub fn is_complete(&self, response: &str) -> Result<bool> {
        Ok(self.slice(response)?.iter().all(Option::is_some))
    }

    /// `(run, replicate)` of every missing measurement, run-major.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParams` for an unknown response.
    pub fn missing(&self, response: &str) -> Result<Vec<(usize, usize)>> {
        let reps = self.replicates;
        Ok(self
            .slice(response)?
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_none())
            .map(|(i, _)| (i / reps, i % reps))
            .collect())
    }

    /// Per-run replicate rows of `response`, holes included.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParams` for an unknown response.
    pub fn rows(&self, response: &str) -> Result<Vec<Vec<Option<f64>>>> {
        Ok(self
            .slice(response)?
            .chunks(self.replicates)
            .map(<[Option<f64>]>::to_vec)
            .collect())
    }

    /// Complete response matrix for `response`.
    ///
    /// # Errors
    ///
    /// Returns `IncompleteData` naming the first hole.
    pub fn matrix(&self, response: &str) -> Result<Array2<f64>> {
        response_matrix(&self.rows(response)?, self.runs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_matrix_complete() {
        let rows = vec![vec![Some(1.0), Some(2.0)], vec![Some(3.0), Some(4.0)]];
        let m = response_matrix(&rows, 2).unwrap();
        assert_eq!(m.dim(), (2, 2));
        assert_eq!(m[[1, 0]], 3.0);
    }

    #[test]
    fn test_response_matrix_errors() {
        let holes = vec![vec![Some(1.0), Some(2.0)], vec![Some(3.0), None]];
        assert_eq!(
            response_matrix(&holes, 2).unwrap_err(),
            Error::IncompleteData { run: 1, replicate: 1 }
        );

        let ragged = vec![vec![Some(1.0), Some(2.0)], vec![Some(3.0)]];
        assert!(matches!(
            response_matrix(&ragged, 2).unwrap_err(),
            Error::InvalidParams { .. }
        ));

        let empty = vec![vec![], vec![]];
        assert_eq!(response_matrix(&empty, 2).unwrap_err(), Error::NoResponse);

        assert!(matches!(
            response_matrix(&holes, 3).unwrap_err(),
            Error::DimensionMismatch { .. }
        ));
    }

    #[test]
    fn test_measurement_set_accumulates() {
        let mut set = MeasurementSet::new(2, 2, vec!["y".into(), "cost".into()]).unwrap();
        for run in 0..2 {
            for rep in 0..2 {
                set.set(run, rep, "y", (run * 10 + rep) as f64).unwrap();
            }
        }
        assert!(set.is_complete("y").unwrap());
        assert!(!set.is_complete("cost").unwrap());
        assert_eq!(set.missing("cost").unwrap().len(), 4);

        let m = set.matrix("y").unwrap();
        assert_eq!(m[[1, 1]], 11.0);

        set.clear(0, 1, "y").unwrap();
        assert_eq!(set.get(0, 1, "y").unwrap(), None);
        assert_eq!(
            set.matrix("y").unwrap_err(),
            Error::IncompleteData { run: 0, replicate: 1 }
        );
    }

    #[test]
    fn test_measurement_set_rejects_bad_input() {
        assert!(MeasurementSet::new(2, 1, vec!["y".into(), "y".into()]).is_err());
        assert_eq!(MeasurementSet::new(2, 1, vec![]).unwrap_err(), Error::NoResponse);

        let mut set = MeasurementSet::new(2, 1, vec!["y".into()]).unwrap();
        assert!(set.set(2, 0, "y", 1.0).is_err());
        assert!(set.set(0, 0, "z", 1.0).is_err());
        assert!(set.set(0, 0, "y", f64::NAN).is_err());
    }
}
