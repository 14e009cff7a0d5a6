// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Activation shapes in NCDHW layout.

use crate::MatrixError;
use std::fmt;

/// Shape of a 3-D activation tensor: batch, channels, depth, rows, cols.
///
/// Serialises as a plain `[N, C, D, H, W]` array. Rank-2 inputs
/// (`[N, features]`, as produced by Gemm/MatMul nodes) deserialise to
/// `[N, features, 1, 1, 1]`.
///
/// # Examples
/// ```
/// use flow_core::TensorShape;
/// let s = TensorShape::new(1, 24, 16, 56, 56);
/// assert_eq!(s.spatial_volume(), 16 * 56 * 56);
/// assert_eq!(s.volume_elements(), 24 * 16 * 56 * 56);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "Vec<usize>", into = "Vec<usize>")]
pub struct TensorShape {
    pub batch: usize,
    pub channels: usize,
    pub depth: usize,
    pub rows: usize,
    pub cols: usize,
}

impl TensorShape {
    pub fn new(batch: usize, channels: usize, depth: usize, rows: usize, cols: usize) -> Self {
        Self {
            batch,
            channels,
            depth,
            rows,
            cols,
        }
    }

    /// A flat feature vector, as seen by fully-connected layers.
    pub fn features(batch: usize, features: usize) -> Self {
        Self::new(batch, features, 1, 1, 1)
    }

    /// Depth × rows × cols.
    pub fn spatial_volume(&self) -> usize {
        self.depth * self.rows * self.cols
    }

    /// Elements in one sample (channels × spatial volume).
    pub fn volume_elements(&self) -> usize {
        self.channels * self.spatial_volume()
    }

    /// Elements across the whole batch.
    pub fn num_elements(&self) -> usize {
        self.batch * self.volume_elements()
    }

    pub fn dims(&self) -> [usize; 5] {
        [self.batch, self.channels, self.depth, self.rows, self.cols]
    }

    /// Returns `true` if any dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.dims().contains(&0)
    }
}

impl TryFrom<Vec<usize>> for TensorShape {
    type Error = MatrixError;

    fn try_from(dims: Vec<usize>) -> Result<Self, Self::Error> {
        match dims.as_slice() {
            &[n, c, d, h, w] => Ok(Self::new(n, c, d, h, w)),
            &[n, f] => Ok(Self::features(n, f)),
            other => Err(MatrixError::InvalidRank { rank: other.len() }),
        }
    }
}

impl From<TensorShape> for Vec<usize> {
    fn from(shape: TensorShape) -> Self {
        shape.dims().to_vec()
    }
}

impl fmt::Display for TensorShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}, {}, {}, {}]",
            self.batch, self.channels, self.depth, self.rows, self.cols
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volumes() {
        let s = TensorShape::new(2, 8, 4, 10, 10);
        assert_eq!(s.spatial_volume(), 400);
        assert_eq!(s.volume_elements(), 3200);
        assert_eq!(s.num_elements(), 6400);
    }

    #[test]
    fn test_from_rank_five() {
        let s = TensorShape::try_from(vec![1, 3, 16, 112, 112]).unwrap();
        assert_eq!(s.channels, 3);
        assert_eq!(s.cols, 112);
    }

    #[test]
    fn test_from_rank_two() {
        let s = TensorShape::try_from(vec![1, 2048]).unwrap();
        assert_eq!(s, TensorShape::new(1, 2048, 1, 1, 1));
    }

    #[test]
    fn test_bad_rank() {
        let err = TensorShape::try_from(vec![1, 2, 3]).unwrap_err();
        assert_eq!(err, MatrixError::InvalidRank { rank: 3 });
    }

    #[test]
    fn test_is_empty() {
        assert!(TensorShape::new(1, 0, 4, 4, 4).is_empty());
        assert!(!TensorShape::new(1, 1, 1, 1, 1).is_empty());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            TensorShape::new(1, 24, 16, 56, 56).to_string(),
            "[1, 24, 16, 56, 56]"
        );
    }

    #[test]
    fn test_serde_as_array() {
        let s = TensorShape::new(1, 24, 16, 56, 56);
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, "[1,24,16,56,56]");
        let back: TensorShape = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
        assert!(serde_json::from_str::<TensorShape>("[1,2,3]").is_err());
    }
}
