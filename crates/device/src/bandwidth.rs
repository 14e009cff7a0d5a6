// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! External memory bandwidth and its parsing.

use crate::DeviceError;
use std::fmt;

/// Sustained external memory bandwidth in bytes per second.
///
/// # Parsing
/// Decimal (SI) suffixes, case-insensitive, with an optional `/s`:
/// - `"12.8GB/s"`, `"12.8G"` → 12.8 × 10⁹ bytes/s
/// - `"800MB/s"`, `"800M"` → 800 × 10⁶ bytes/s
/// - `"500KB/s"`, `"500K"` → 500 × 10³ bytes/s
/// - `"1000000"` → raw bytes/s
///
/// # Examples
/// ```
/// use device::Bandwidth;
///
/// let bw = Bandwidth::parse("12.8GB/s").unwrap();
/// assert_eq!(bw.bytes_per_sec(), 12.8e9);
/// assert_eq!(bw.to_string(), "12.8 GB/s");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Bandwidth {
    bytes_per_sec: f64,
}

impl Bandwidth {
    pub fn from_bytes_per_sec(bytes_per_sec: f64) -> Self {
        Self { bytes_per_sec }
    }

    pub fn from_gb_per_sec(gb: f64) -> Self {
        Self {
            bytes_per_sec: gb * 1e9,
        }
    }

    pub fn bytes_per_sec(&self) -> f64 {
        self.bytes_per_sec
    }

    pub fn bits_per_sec(&self) -> f64 {
        self.bytes_per_sec * 8.0
    }

    /// Parses a human-readable bandwidth string.
    pub fn parse(s: &str) -> Result<Self, DeviceError> {
        let trimmed = s.trim();
        let upper = trimmed.to_uppercase();
        let body = upper.strip_suffix("/S").unwrap_or(&upper);

        let (num_str, multiplier) = if let Some(n) = body.strip_suffix("GB") {
            (n, 1e9)
        } else if let Some(n) = body.strip_suffix('G') {
            (n, 1e9)
        } else if let Some(n) = body.strip_suffix("MB") {
            (n, 1e6)
        } else if let Some(n) = body.strip_suffix('M') {
            (n, 1e6)
        } else if let Some(n) = body.strip_suffix("KB") {
            (n, 1e3)
        } else if let Some(n) = body.strip_suffix('K') {
            (n, 1e3)
        } else if let Some(n) = body.strip_suffix('B') {
            (n, 1.0)
        } else {
            (body, 1.0)
        };

        let value: f64 = num_str
            .trim()
            .parse()
            .map_err(|_| DeviceError::InvalidBandwidth(trimmed.to_string()))?;

        if !value.is_finite() || value <= 0.0 {
            return Err(DeviceError::InvalidBandwidth(trimmed.to_string()));
        }

        Ok(Self {
            bytes_per_sec: value * multiplier,
        })
    }
}

impl TryFrom<String> for Bandwidth {
    type Error = DeviceError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Bandwidth> for String {
    fn from(bw: Bandwidth) -> Self {
        bw.to_string()
    }
}

impl fmt::Display for Bandwidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.bytes_per_sec;
        if b >= 1e9 {
            write!(f, "{} GB/s", b / 1e9)
        } else if b >= 1e6 {
            write!(f, "{} MB/s", b / 1e6)
        } else if b >= 1e3 {
            write!(f, "{} KB/s", b / 1e3)
        } else {
            write!(f, "{b} B/s")
        }
    }
}
