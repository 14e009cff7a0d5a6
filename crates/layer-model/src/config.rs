// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Hardware configurations of a single layer.
//!
//! A configuration is a handful of parallelism fractions plus the share of
//! external memory bandwidth (words per cycle) given to each side of the
//! layer. Every fraction `f` of a dimension `N` becomes `ceil(N × f)`
//! parallel hardware streams.

use crate::LayerError;
use std::fmt;

/// Tolerance applied before rounding `N × f` up, so that fractions such as
/// `8 / 24` map back onto exactly 8 streams.
const STREAM_EPSILON: f64 = 1e-9;

/// Number of parallel streams for a fraction of a dimension. Never zero.
pub fn streams(dim: usize, fraction: f64) -> usize {
    let exact = dim as f64 * fraction;
    ((exact - STREAM_EPSILON).ceil() as usize).max(1)
}

/// The three shapes a configuration's parallelism can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParallelismKind {
    /// fine + coarse-in + coarse-out (convolutions).
    Conv,
    /// coarse-in + coarse-out (fully-connected, squeeze-excitation).
    Channels,
    /// a single coarse-inout factor (GAP, elementwise, activation, batch-norm).
    Shared,
}

impl fmt::Display for ParallelismKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Conv => "conv (fine, coarse_in, coarse_out)",
            Self::Channels => "channels (coarse_in, coarse_out)",
            Self::Shared => "shared (coarse_inout)",
        })
    }
}

/// Parallelism fractions, each in `(0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Parallelism {
    Conv {
        /// Fraction of the kernel's multiply-accumulates unrolled.
        fine: f64,
        /// Fraction of input channels processed in parallel.
        coarse_in: f64,
        /// Fraction of output filters processed in parallel.
        coarse_out: f64,
    },
    Channels {
        coarse_in: f64,
        coarse_out: f64,
    },
    Shared {
        coarse_inout: f64,
    },
}

/// The fractions of any [`Parallelism`] in one flat form.
///
/// `Shared` maps its factor onto both coarse fields; non-convolution
/// variants have `fine = 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Factors {
    pub fine: f64,
    pub coarse_in: f64,
    pub coarse_out: f64,
}

impl Parallelism {
    pub fn kind(&self) -> ParallelismKind {
        match self {
            Self::Conv { .. } => ParallelismKind::Conv,
            Self::Channels { .. } => ParallelismKind::Channels,
            Self::Shared { .. } => ParallelismKind::Shared,
        }
    }

    pub fn factors(&self) -> Factors {
        match *self {
            Self::Conv {
                fine,
                coarse_in,
                coarse_out,
            } => Factors {
                fine,
                coarse_in,
                coarse_out,
            },
            Self::Channels {
                coarse_in,
                coarse_out,
            } => Factors {
                fine: 1.0,
                coarse_in,
                coarse_out,
            },
            Self::Shared { coarse_inout } => Factors {
                fine: 1.0,
                coarse_in: coarse_inout,
                coarse_out: coarse_inout,
            },
        }
    }

    /// Re-expresses these fractions in the shape `kind` expects. Used to
    /// hand one block-level configuration down to the block's primitives.
    pub fn project(&self, kind: ParallelismKind) -> Parallelism {
        let f = self.factors();
        match kind {
            ParallelismKind::Conv => Self::Conv {
                fine: f.fine,
                coarse_in: f.coarse_in,
                coarse_out: f.coarse_out,
            },
            ParallelismKind::Channels => Self::Channels {
                coarse_in: f.coarse_in,
                coarse_out: f.coarse_out,
            },
            ParallelismKind::Shared => Self::Shared {
                coarse_inout: f.coarse_in,
            },
        }
    }

    /// Checks every fraction lies in `(0, 1]`.
    pub fn validate(&self) -> Result<(), LayerError> {
        let check = |factor: &'static str, value: f64| {
            if value > 0.0 && value <= 1.0 {
                Ok(())
            } else {
                Err(LayerError::InvalidFactor { factor, value })
            }
        };
        match *self {
            Self::Conv {
                fine,
                coarse_in,
                coarse_out,
            } => {
                check("fine", fine)?;
                check("coarse_in", coarse_in)?;
                check("coarse_out", coarse_out)
            }
            Self::Channels {
                coarse_in,
                coarse_out,
            } => {
                check("coarse_in", coarse_in)?;
                check("coarse_out", coarse_out)
            }
            Self::Shared { coarse_inout } => check("coarse_inout", coarse_inout),
        }
    }
}

/// One point of a layer's design space.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Configuration {
    pub parallelism: Parallelism,
    /// Input memory bandwidth in words per cycle. `+∞` for on-chip edges.
    #[serde(with = "bandwidth")]
    pub mem_bw_in: f64,
    /// Output memory bandwidth in words per cycle. `+∞` for on-chip edges.
    #[serde(with = "bandwidth")]
    pub mem_bw_out: f64,
}

/// JSON has no infinity, so an on-chip edge is written as the string `"inf"`.
mod bandwidth {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if *value == f64::INFINITY {
            serializer.serialize_str("inf")
        } else {
            serializer.serialize_f64(*value)
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Number(value) => Ok(value),
            Raw::Text(text) if text == "inf" => Ok(f64::INFINITY),
            Raw::Text(text) => Err(de::Error::custom(format!("invalid bandwidth `{text}`"))),
        }
    }
}

impl Configuration {
    pub fn new(parallelism: Parallelism, mem_bw_in: f64, mem_bw_out: f64) -> Self {
        Self {
            parallelism,
            mem_bw_in,
            mem_bw_out,
        }
    }

    /// Same parallelism, different bandwidth allocation.
    pub fn with_bandwidth(&self, mem_bw_in: f64, mem_bw_out: f64) -> Self {
        Self {
            parallelism: self.parallelism,
            mem_bw_in,
            mem_bw_out,
        }
    }

    pub fn validate(&self) -> Result<(), LayerError> {
        self.parallelism.validate()?;
        for (side, value) in [("in", self.mem_bw_in), ("out", self.mem_bw_out)] {
            if value.is_nan() || value <= 0.0 {
                return Err(LayerError::InvalidBandwidth { side, value });
            }
        }
        Ok(())
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.parallelism {
            Parallelism::Conv {
                fine,
                coarse_in,
                coarse_out,
            } => write!(f, "fine={fine:.3} cin={coarse_in:.3} cout={coarse_out:.3}")?,
            Parallelism::Channels {
                coarse_in,
                coarse_out,
            } => write!(f, "cin={coarse_in:.3} cout={coarse_out:.3}")?,
            Parallelism::Shared { coarse_inout } => write!(f, "cinout={coarse_inout:.3}")?,
        }
        write!(f, " bw_in={:.2} bw_out={:.2}", self.mem_bw_in, self.mem_bw_out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_streams_ceil() {
        assert_eq!(streams(32, 1.0), 32);
        assert_eq!(streams(32, 0.5), 16);
        assert_eq!(streams(24, 0.3), 8);
        assert_eq!(streams(3, 0.01), 1);
    }

    #[test]
    fn test_streams_divisor_fractions_exact() {
        for n in [12usize, 24, 48, 96, 192, 432] {
            for d in (1..=n).filter(|d| n % d == 0) {
                assert_eq!(streams(n, d as f64 / n as f64), d, "n={n} d={d}");
            }
        }
    }

    #[test]
    fn test_factor_validation() {
        let ok = Parallelism::Conv {
            fine: 1.0,
            coarse_in: 0.5,
            coarse_out: 0.25,
        };
        assert!(ok.validate().is_ok());

        let zero = Parallelism::Shared { coarse_inout: 0.0 };
        assert!(matches!(
            zero.validate(),
            Err(LayerError::InvalidFactor { factor: "coarse_inout", .. })
        ));

        let over = Parallelism::Channels {
            coarse_in: 1.5,
            coarse_out: 1.0,
        };
        assert!(over.validate().is_err());
    }

    #[test]
    fn test_bandwidth_validation() {
        let p = Parallelism::Shared { coarse_inout: 1.0 };
        assert!(Configuration::new(p, f64::INFINITY, 4.0).validate().is_ok());
        assert!(Configuration::new(p, 0.0, 4.0).validate().is_err());
        assert!(Configuration::new(p, 1.0, f64::NAN).validate().is_err());
    }

    #[test]
    fn test_project() {
        let block = Parallelism::Channels {
            coarse_in: 0.5,
            coarse_out: 0.25,
        };
        assert_eq!(
            block.project(ParallelismKind::Conv),
            Parallelism::Conv {
                fine: 1.0,
                coarse_in: 0.5,
                coarse_out: 0.25
            }
        );
        assert_eq!(
            block.project(ParallelismKind::Shared),
            Parallelism::Shared { coarse_inout: 0.5 }
        );
    }

    #[test]
    fn test_serde_tagged() {
        let c = Configuration::new(Parallelism::Shared { coarse_inout: 0.5 }, 8.0, 8.0);
        let json = serde_json::to_string(&c).unwrap();
        assert!(json.contains(r#""kind":"shared""#));
        let back: Configuration = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn test_serde_on_chip_bandwidth() {
        let c = Configuration::new(Parallelism::Shared { coarse_inout: 0.5 }, 8.0, f64::INFINITY);
        let json = serde_json::to_string(&c).unwrap();
        assert!(json.contains(r#""mem_bw_out":"inf""#));
        let back: Configuration = serde_json::from_str(&json).unwrap();
        assert_eq!(back.mem_bw_in, 8.0);
        assert_eq!(back.mem_bw_out, f64::INFINITY);
        let bad = json.replace(r#""inf""#, r#""fast""#);
        assert!(serde_json::from_str::<Configuration>(&bad).is_err());
    }
}
