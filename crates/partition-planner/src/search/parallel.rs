// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Data-parallel exhaustive search on the current rayon pool.
//!
//! Combinations are addressed by their enumeration index and decoded on
//! the worker that evaluates them. Partial results are merged with
//! [`Tally::merge`], whose choice depends only on the
//! [`rank`](super::rank) order, so the outcome does not depend on the
//! number of threads or on how rayon splits the range.

use super::{evaluate, prepare, SearchOutcome, SearchSpace, SearchStrategy, Tally};
use crate::{Composer, Observer, PlannerError};
use rayon::prelude::*;

/// Evaluates combinations on the rayon pool the call runs in. Wrap the call
/// in [`rayon::ThreadPool::install`] to bound the number of threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParallelExhaustive;

impl ParallelExhaustive {
    pub fn new() -> Self {
        Self
    }
}

impl SearchStrategy for ParallelExhaustive {
    fn name(&self) -> &str {
        "parallel-exhaustive"
    }

    fn search(
        &self,
        space: &SearchSpace<'_>,
        composer: &Composer<'_>,
        observer: &dyn Observer,
    ) -> Result<SearchOutcome, PlannerError> {
        let Some(size) = prepare(space, self.name())? else {
            return Ok(SearchOutcome::NoFeasible { evaluated: 0 });
        };

        let tally = (0..size)
            .into_par_iter()
            .map(|index| {
                let configs = space.combination(index);
                let mut tally = Tally::default();
                tally.offer(evaluate(space, composer, observer, index, &configs)?);
                Ok::<_, PlannerError>(tally)
            })
            .try_reduce(Tally::default, |a, b| Ok(a.merge(b)))?;

        let outcome = tally.into_outcome();
        tracing::info!(partition = space.partition(), "{}", outcome.summary());
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::tests::{relu, shared};
    use crate::search::exhaustive::Exhaustive;
    use crate::NoopObserver;
    use device::DeviceConfig;

    #[test]
    fn test_matches_sequential_for_any_thread_count() {
        let d = DeviceConfig::zc706();
        let composer = Composer::new(&d, 8.0, 8.0);
        let layers: Vec<_> = (0..3).map(|i| relu(&format!("l{i}"), 24)).collect();
        let set: Vec<_> = [1.0 / 24.0, 1.0 / 12.0, 0.125, 0.25, 0.5, 1.0]
            .into_iter()
            .map(shared)
            .collect();
        let space =
            SearchSpace::new("part_0", layers.iter().collect(), vec![set.clone(); 3]).unwrap();

        let expected = Exhaustive::new()
            .search(&space, &composer, &NoopObserver)
            .unwrap();
        for threads in [1, 2, 5] {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .unwrap();
            let got = pool
                .install(|| ParallelExhaustive::new().search(&space, &composer, &NoopObserver))
                .unwrap();
            assert_eq!(got, expected, "threads = {threads}");
        }
        assert_eq!(expected.evaluated(), 216);
    }

    #[test]
    fn test_empty_candidate_set() {
        let d = DeviceConfig::zc706();
        let composer = Composer::new(&d, 8.0, 8.0);
        let a = relu("a", 8);
        let space = SearchSpace::new("part_0", vec![&a], vec![vec![]]).unwrap();
        let outcome = ParallelExhaustive::new()
            .search(&space, &composer, &NoopObserver)
            .unwrap();
        assert_eq!(outcome, SearchOutcome::NoFeasible { evaluated: 0 });
    }
}
