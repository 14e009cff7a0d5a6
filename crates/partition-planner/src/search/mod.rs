// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The [`SearchStrategy`] trait and the exhaustive strategies.
//!
//! Both strategies enumerate the full Cartesian product of the per-layer
//! candidate sets in lexicographic order (the last layer's candidate
//! varies fastest) and keep the best feasible composition under
//! [`rank`]. They differ only in how the enumeration is scheduled, so
//! they return identical outcomes.

pub mod exhaustive;
pub mod parallel;

use crate::{Composer, Observer, PartitionPoint, PlannerError};
use layer_model::{Configuration, LayerModel};
use std::cmp::Ordering;

/// One partition together with the candidate configurations of each layer.
#[derive(Debug, Clone)]
pub struct SearchSpace<'a> {
    partition: String,
    layers: Vec<&'a LayerModel>,
    candidates: Vec<Vec<Configuration>>,
}

impl<'a> SearchSpace<'a> {
    pub fn new(
        partition: impl Into<String>,
        layers: Vec<&'a LayerModel>,
        candidates: Vec<Vec<Configuration>>,
    ) -> Result<Self, PlannerError> {
        let partition = partition.into();
        if layers.is_empty() {
            return Err(PlannerError::EmptyPartition(partition));
        }
        if layers.len() != candidates.len() {
            return Err(PlannerError::CandidateMismatch {
                partition,
                layers: layers.len(),
                candidates: candidates.len(),
            });
        }
        Ok(Self {
            partition,
            layers,
            candidates,
        })
    }

    pub fn partition(&self) -> &str {
        &self.partition
    }

    pub fn layers(&self) -> &[&'a LayerModel] {
        &self.layers
    }

    pub fn candidates(&self) -> &[Vec<Configuration>] {
        &self.candidates
    }

    /// Number of combinations, or `None` if it overflows `u64`.
    pub fn size(&self) -> Option<u64> {
        self.candidates
            .iter()
            .try_fold(1u64, |acc, c| acc.checked_mul(c.len() as u64))
    }

    /// Layers with no candidate at all.
    pub fn empty_layers(&self) -> Vec<&str> {
        self.layers
            .iter()
            .zip(&self.candidates)
            .filter(|(_, c)| c.is_empty())
            .map(|(l, _)| l.name())
            .collect()
    }

    /// The combination at enumeration position `index`.
    ///
    /// Mixed-radix decoding with the last layer as the least significant
    /// digit, matching the order of
    /// [`multi_cartesian_product`](itertools::Itertools::multi_cartesian_product).
    pub fn combination(&self, mut index: u64) -> Vec<&Configuration> {
        let mut picked = Vec::with_capacity(self.candidates.len());
        for set in self.candidates.iter().rev() {
            let radix = set.len() as u64;
            picked.push(&set[(index % radix) as usize]);
            index /= radix;
        }
        picked.reverse();
        picked
    }
}

/// Result of searching one partition.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub enum SearchOutcome {
    Found {
        best: PartitionPoint,
        evaluated: u64,
        feasible: u64,
    },
    /// No combination is feasible, including the case of a layer without
    /// candidates.
    NoFeasible { evaluated: u64 },
}

impl SearchOutcome {
    pub fn best(&self) -> Option<&PartitionPoint> {
        match self {
            Self::Found { best, .. } => Some(best),
            Self::NoFeasible { .. } => None,
        }
    }

    pub fn evaluated(&self) -> u64 {
        match self {
            Self::Found { evaluated, .. } | Self::NoFeasible { evaluated } => *evaluated,
        }
    }

    /// Returns a human-readable summary.
    pub fn summary(&self) -> String {
        match self {
            Self::Found {
                best,
                evaluated,
                feasible,
            } => format!(
                "{} ({feasible}/{evaluated} feasible, best #{})",
                best.summary(),
                best.index
            ),
            Self::NoFeasible { evaluated } => {
                format!("no feasible implementation ({evaluated} evaluated)")
            }
        }
    }
}

/// Total order on feasible compositions: lower latency first, then lower
/// DSP utilization, then earlier enumeration position.
pub fn rank(a: &PartitionPoint, b: &PartitionPoint) -> Ordering {
    a.latency_cycles()
        .cmp(&b.latency_cycles())
        .then_with(|| a.dsp_util().total_cmp(&b.dsp_util()))
        .then_with(|| a.index.cmp(&b.index))
}

/// Running best plus counters, mergeable in any order.
#[derive(Debug, Clone, Default)]
pub(crate) struct Tally {
    pub best: Option<PartitionPoint>,
    pub evaluated: u64,
    pub feasible: u64,
}

impl Tally {
    pub fn offer(&mut self, point: Option<PartitionPoint>) {
        self.evaluated += 1;
        if let Some(point) = point {
            self.feasible += 1;
            self.best = Some(match self.best.take() {
                Some(best) if rank(&best, &point) != Ordering::Greater => best,
                _ => point,
            });
        }
    }

    pub fn merge(mut self, other: Tally) -> Tally {
        self.evaluated += other.evaluated;
        self.feasible += other.feasible;
        self.best = match (self.best, other.best) {
            (Some(a), Some(b)) => Some(if rank(&a, &b) == Ordering::Greater { b } else { a }),
            (a, b) => a.or(b),
        };
        self
    }

    pub fn into_outcome(self) -> SearchOutcome {
        match self.best {
            Some(best) => SearchOutcome::Found {
                best,
                evaluated: self.evaluated,
                feasible: self.feasible,
            },
            None => SearchOutcome::NoFeasible {
                evaluated: self.evaluated,
            },
        }
    }
}

/// Evaluates one combination and reports it if feasible.
pub(crate) fn evaluate(
    space: &SearchSpace<'_>,
    composer: &Composer<'_>,
    observer: &dyn Observer,
    index: u64,
    configs: &[&Configuration],
) -> Result<Option<PartitionPoint>, PlannerError> {
    match composer.compose(space.partition(), index, space.layers(), configs)? {
        crate::Composition::Feasible(point) => {
            observer.partition_point(&point);
            Ok(Some(point))
        }
        crate::Composition::Infeasible(_) => Ok(None),
    }
}

/// Checks shared by every strategy before enumerating. Returns `None` when
/// there is nothing to enumerate.
pub(crate) fn prepare(space: &SearchSpace<'_>, strategy: &str) -> Result<Option<u64>, PlannerError> {
    let empty = space.empty_layers();
    if !empty.is_empty() {
        tracing::warn!(
            partition = space.partition(),
            layers = ?empty,
            "no candidate configurations; partition cannot be implemented"
        );
        return Ok(None);
    }
    let size = space
        .size()
        .ok_or_else(|| PlannerError::SearchSpaceTooLarge(space.partition().to_string()))?;
    tracing::info!(
        partition = space.partition(),
        strategy,
        combinations = size,
        "searching partition"
    );
    Ok(Some(size))
}

/// A way of exploring a partition's search space.
pub trait SearchStrategy: Send + Sync {
    /// Human-readable name of this strategy.
    fn name(&self) -> &str;

    /// Finds the best feasible composition of `space`.
    fn search(
        &self,
        space: &SearchSpace<'_>,
        composer: &Composer<'_>,
        observer: &dyn Observer,
    ) -> Result<SearchOutcome, PlannerError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::tests::{relu, shared};
    use layer_model::Metrics;

    fn point(index: u64, latency: u64, dsp: f64) -> PartitionPoint {
        let mut metrics = Metrics {
            latency_cycles: latency,
            latency_sec: 0.0,
            throughput_gops: 0.0,
            throughput_vols: 0.0,
            utilization: Default::default(),
            rate_in: 0.0,
            rate_out: 0.0,
            depth: 0,
            muls: 0,
            adds: 0,
            memory_words: 0,
            memory_kb: 0.0,
            mem_bounded_in: false,
            mem_bounded_out: false,
            mem_bw_util: 0.0,
            total_ops: 0.0,
        };
        metrics.utilization.dsp_util = dsp;
        PartitionPoint {
            partition: "part_0".into(),
            index,
            layers: vec![],
            metrics,
        }
    }

    #[test]
    fn test_rank_equal_latency_prefers_lower_dsp() {
        let a = point(0, 1000, 55.0);
        let b = point(1, 1000, 40.0);
        assert_eq!(rank(&b, &a), Ordering::Less);

        let mut tally = Tally::default();
        tally.offer(Some(a));
        tally.offer(Some(b));
        assert_eq!(tally.best.unwrap().dsp_util(), 40.0);
    }

    #[test]
    fn test_rank_full_tie_prefers_earlier_index() {
        let mut tally = Tally::default();
        tally.offer(Some(point(7, 500, 10.0)));
        tally.offer(Some(point(3, 500, 10.0)));
        assert_eq!(tally.best.unwrap().index, 3);
    }

    #[test]
    fn test_merge_is_order_independent() {
        let mut left = Tally::default();
        left.offer(Some(point(4, 800, 30.0)));
        left.offer(None);
        let mut right = Tally::default();
        right.offer(Some(point(2, 800, 30.0)));
        let ab = left.clone().merge(right.clone());
        let ba = right.merge(left);
        assert_eq!(ab.best, ba.best);
        assert_eq!(ab.best.unwrap().index, 2);
        assert_eq!((ab.evaluated, ab.feasible), (3, 2));
    }

    #[test]
    fn test_combination_decoding_is_lexicographic() {
        let a = relu("a", 8);
        let b = relu("b", 8);
        let space = SearchSpace::new(
            "part_0",
            vec![&a, &b],
            vec![vec![shared(0.25), shared(0.5)], vec![shared(0.125), shared(0.25), shared(1.0)]],
        )
        .unwrap();
        assert_eq!(space.size(), Some(6));
        let pick = space.combination(4);
        // 4 = 1 × 3 + 1
        assert_eq!(*pick[0], shared(0.5));
        assert_eq!(*pick[1], shared(0.25));
    }

    #[test]
    fn test_space_validation() {
        let a = relu("a", 8);
        assert!(matches!(
            SearchSpace::new("p", vec![], vec![]),
            Err(PlannerError::EmptyPartition(_))
        ));
        assert!(matches!(
            SearchSpace::new("p", vec![&a], vec![]),
            Err(PlannerError::CandidateMismatch { .. })
        ));
    }
}
