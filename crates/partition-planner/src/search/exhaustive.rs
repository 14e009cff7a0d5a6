// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Single-threaded exhaustive search.

use super::{evaluate, prepare, SearchOutcome, SearchSpace, SearchStrategy, Tally};
use crate::{Composer, Observer, PlannerError};
use itertools::Itertools;

/// Walks the Cartesian product on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct Exhaustive;

impl Exhaustive {
    pub fn new() -> Self {
        Self
    }
}

impl SearchStrategy for Exhaustive {
    fn name(&self) -> &str {
        "exhaustive"
    }

    fn search(
        &self,
        space: &SearchSpace<'_>,
        composer: &Composer<'_>,
        observer: &dyn Observer,
    ) -> Result<SearchOutcome, PlannerError> {
        if prepare(space, self.name())?.is_none() {
            return Ok(SearchOutcome::NoFeasible { evaluated: 0 });
        }

        let mut tally = Tally::default();
        let combinations = space
            .candidates()
            .iter()
            .map(|set| set.iter())
            .multi_cartesian_product();
        for (index, configs) in combinations.enumerate() {
            tally.offer(evaluate(space, composer, observer, index as u64, &configs)?);
        }

        let outcome = tally.into_outcome();
        tracing::info!(partition = space.partition(), "{}", outcome.summary());
        Ok(outcome)
    }
}
