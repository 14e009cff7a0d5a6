// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Banded `(S, S+1)` stage matrices.
//!
//! Only the diagonal `(i, i)` and superdiagonal `(i, i + 1)` are stored, so
//! every other entry is zero by construction. All per-layer matrices
//! (rate, stream, data, workload, Γ, II) share this representation.

use crate::{MatrixError, Topology};
use std::fmt;

/// A diagonal-plus-superdiagonal matrix over a fixed [`Topology`].
#[derive(Debug, Clone, PartialEq)]
pub struct StageMatrix {
    topology: Topology,
    diag: Vec<f64>,
    upper: Vec<f64>,
}

impl StageMatrix {
    /// An all-zero matrix.
    pub fn zeros(topology: Topology) -> Self {
        let s = topology.stages();
        Self {
            topology,
            diag: vec![0.0; s],
            upper: vec![0.0; s],
        }
    }

    /// Builds a matrix from its two bands.
    ///
    /// `diag[i]` is entry `(i, i)`; `upper[i]` is entry `(i, i + 1)`.
    /// Both must have exactly `topology.stages()` entries.
    pub fn from_band(
        topology: Topology,
        diag: Vec<f64>,
        upper: Vec<f64>,
    ) -> Result<Self, MatrixError> {
        let expected = topology.stages();
        for (band, len) in [("diagonal", diag.len()), ("superdiagonal", upper.len())] {
            if len != expected {
                return Err(MatrixError::BandLength {
                    topology,
                    band,
                    expected,
                    got: len,
                });
            }
        }
        Ok(Self {
            topology,
            diag,
            upper,
        })
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    /// `(rows, cols)` = `(S, S + 1)`.
    pub fn shape(&self) -> (usize, usize) {
        self.topology.shape()
    }

    pub fn stages(&self) -> usize {
        self.diag.len()
    }

    /// Entry `(i, i)`.
    pub fn stage(&self, i: usize) -> f64 {
        self.diag[i]
    }

    /// Entry `(i, i + 1)`.
    pub fn edge(&self, i: usize) -> f64 {
        self.upper[i]
    }

    /// Entry `(0, 0)`: the input memory node.
    pub fn first(&self) -> f64 {
        self.diag[0]
    }

    /// Entry `(S - 1, S)`: the output memory node.
    pub fn last(&self) -> f64 {
        self.upper[self.upper.len() - 1]
    }

    /// Reads any entry; off-band entries are zero.
    pub fn get(&self, row: usize, col: usize) -> Result<f64, MatrixError> {
        self.check_bounds(row, col)?;
        Ok(if col == row {
            self.diag[row]
        } else if col == row + 1 {
            self.upper[row]
        } else {
            0.0
        })
    }

    /// Writes a band entry. Writing outside the band is an error.
    pub fn set(&mut self, row: usize, col: usize, value: f64) -> Result<(), MatrixError> {
        self.check_bounds(row, col)?;
        if col == row {
            self.diag[row] = value;
        } else if col == row + 1 {
            self.upper[row] = value;
        } else {
            return Err(MatrixError::OffBand { row, col });
        }
        Ok(())
    }

    fn check_bounds(&self, row: usize, col: usize) -> Result<(), MatrixError> {
        let (rows, cols) = self.shape();
        if row >= rows || col >= cols {
            return Err(MatrixError::OutOfBounds {
                row,
                col,
                rows,
                cols,
            });
        }
        Ok(())
    }

    /// Iterates over band entries as `(row, col, value)`, row-major.
    pub fn band(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        (0..self.stages())
            .flat_map(move |i| [(i, i, self.diag[i]), (i, i + 1, self.upper[i])])
    }

    /// Elementwise (Hadamard) product.
    pub fn hadamard(&self, other: &StageMatrix) -> Result<StageMatrix, MatrixError> {
        self.zip_with(other, |a, b| a * b)
    }

    /// Elementwise magnitude.
    pub fn abs(&self) -> StageMatrix {
        self.map(f64::abs)
    }

    /// Elementwise quotient `self ⊘ rates`.
    ///
    /// `0 / 0` is zero (the edge carries nothing). A non-zero numerator over
    /// a zero rate is an error, since the edge could never drain.
    pub fn divide(&self, rates: &StageMatrix) -> Result<StageMatrix, MatrixError> {
        self.check_topology(rates)?;
        let mut out = StageMatrix::zeros(self.topology);
        for (row, col, num) in self.band() {
            let den = rates.get(row, col)?;
            let value = if num == 0.0 {
                0.0
            } else if den == 0.0 {
                return Err(MatrixError::ZeroRate { row, col });
            } else {
                num / den
            };
            out.set(row, col, value)?;
        }
        Ok(out)
    }

    /// Largest band entry (zero for an all-zero matrix).
    pub fn max(&self) -> f64 {
        self.band().map(|(_, _, v)| v).fold(0.0, f64::max)
    }

    /// Applies `f` to every band entry.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> StageMatrix {
        StageMatrix {
            topology: self.topology,
            diag: self.diag.iter().copied().map(&f).collect(),
            upper: self.upper.iter().copied().map(&f).collect(),
        }
    }

    fn zip_with(
        &self,
        other: &StageMatrix,
        f: impl Fn(f64, f64) -> f64,
    ) -> Result<StageMatrix, MatrixError> {
        self.check_topology(other)?;
        let pair = |a: &[f64], b: &[f64]| -> Vec<f64> {
            a.iter().zip(b).map(|(&x, &y)| f(x, y)).collect()
        };
        Ok(StageMatrix {
            topology: self.topology,
            diag: pair(&self.diag, &other.diag),
            upper: pair(&self.upper, &other.upper),
        })
    }

    fn check_topology(&self, other: &StageMatrix) -> Result<(), MatrixError> {
        if self.topology != other.topology {
            return Err(MatrixError::TopologyMismatch {
                left: self.topology,
                right: other.topology,
            });
        }
        Ok(())
    }

    /// Dense row-major copy, mostly for logging and tests.
    pub fn to_dense(&self) -> Vec<Vec<f64>> {
        let (rows, cols) = self.shape();
        let mut dense = vec![vec![0.0; cols]; rows];
        for (row, col, v) in self.band() {
            dense[row][col] = v;
        }
        dense
    }
}

impl fmt::Display for StageMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.to_dense() {
            for v in row {
                write!(f, "{v:>14.5}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> StageMatrix {
        StageMatrix::from_band(Topology::TwoStage, vec![1.0, 2.0], vec![3.0, 4.0]).unwrap()
    }

    #[test]
    fn test_from_band_length_check() {
        let err = StageMatrix::from_band(Topology::FiveStage, vec![1.0; 4], vec![1.0; 5]);
        assert!(matches!(err, Err(MatrixError::BandLength { expected: 5, got: 4, .. })));
    }

    #[test]
    fn test_get_band_and_off_band() {
        let m = sample();
        assert_eq!(m.get(0, 0).unwrap(), 1.0);
        assert_eq!(m.get(0, 1).unwrap(), 3.0);
        assert_eq!(m.get(1, 2).unwrap(), 4.0);
        assert_eq!(m.get(0, 2).unwrap(), 0.0);
        assert_eq!(m.get(1, 0).unwrap(), 0.0);
        assert!(m.get(2, 0).is_err());
    }

    #[test]
    fn test_set_off_band_rejected() {
        let mut m = StageMatrix::zeros(Topology::FourStage);
        assert!(m.set(0, 3, 1.0).is_err());
        m.set(3, 4, 7.0).unwrap();
        assert_eq!(m.last(), 7.0);
    }

    #[test]
    fn test_dense_sparsity() {
        let m = StageMatrix::from_band(Topology::FiveStage, vec![1.0; 5], vec![2.0; 5]).unwrap();
        let dense = m.to_dense();
        assert_eq!(dense.len(), 5);
        assert_eq!(dense[0].len(), 6);
        for (i, row) in dense.iter().enumerate() {
            for (j, &v) in row.iter().enumerate() {
                if j != i && j != i + 1 {
                    assert_eq!(v, 0.0);
                }
            }
        }
    }

    #[test]
    fn test_hadamard() {
        let p = sample().hadamard(&sample()).unwrap();
        assert_eq!(p.first(), 1.0);
        assert_eq!(p.edge(0), 9.0);
        assert_eq!(p.last(), 16.0);
    }

    #[test]
    fn test_hadamard_topology_mismatch() {
        let other = StageMatrix::zeros(Topology::ThreeStage);
        assert!(matches!(
            sample().hadamard(&other),
            Err(MatrixError::TopologyMismatch { .. })
        ));
    }

    #[test]
    fn test_divide_zero_over_zero() {
        let work = StageMatrix::from_band(Topology::TwoStage, vec![0.0, 8.0], vec![4.0, 0.0]).unwrap();
        let rate = StageMatrix::from_band(Topology::TwoStage, vec![0.0, 2.0], vec![2.0, 0.0]).unwrap();
        let ii = work.divide(&rate).unwrap();
        assert_eq!(ii.first(), 0.0);
        assert_eq!(ii.stage(1), 4.0);
        assert_eq!(ii.edge(0), 2.0);
        assert_eq!(ii.last(), 0.0);
    }

    #[test]
    fn test_divide_by_zero_rate() {
        let work = StageMatrix::from_band(Topology::TwoStage, vec![1.0, 1.0], vec![1.0, 1.0]).unwrap();
        let rate = StageMatrix::from_band(Topology::TwoStage, vec![1.0, 0.0], vec![1.0, 1.0]).unwrap();
        assert_eq!(
            work.divide(&rate),
            Err(MatrixError::ZeroRate { row: 1, col: 1 })
        );
    }

    #[test]
    fn test_max_and_abs() {
        let m = StageMatrix::from_band(Topology::TwoStage, vec![1.0, -9.0], vec![3.0, 4.0]).unwrap();
        assert_eq!(m.max(), 4.0);
        assert_eq!(m.abs().max(), 9.0);
    }

    #[test]
    fn test_display_rows() {
        let s = sample().to_string();
        assert_eq!(s.lines().count(), 2);
    }
}
