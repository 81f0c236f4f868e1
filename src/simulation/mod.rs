//! Monte-Carlo loot simulation
//!
//! Runs a large number of selector draws for one (map, pool, luck) setup to
//! check observed frequencies against the analytical weights. Draws are
//! split into fixed-size chunks, each with its own seeded RNG, and run in
//! parallel with rayon; the result only depends on the seed.

use std::collections::BTreeMap;

use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::loot::{CandidatePool, LootSelector, LootTables};

const CHUNK_SIZE: u64 = 4096;

/// Simulation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionSim {
    pub map_name: String,
    pub pool: CandidatePool,
    pub luck: f64,
    pub trials: u64,
    pub seed: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectionReport {
    pub trials: u64,
    pub counts: BTreeMap<String, u64>,
    /// Draws that produced no candidate
    pub misses: u64,
    /// Sum of sampled weight stats per candidate
    pub weight_sums: BTreeMap<String, f64>,
}

impl SelectionReport {
    /// Observed share of all trials that produced `name`
    pub fn frequency(&self, name: &str) -> f64 {
        if self.trials == 0 {
            return 0.0;
        }
        self.counts.get(name).copied().unwrap_or(0) as f64 / self.trials as f64
    }

    pub fn mean_weight(&self, name: &str) -> Option<f64> {
        let count = *self.counts.get(name)?;
        let sum = self.weight_sums.get(name)?;
        (count > 0).then(|| sum / count as f64)
    }

    fn merge(mut self, other: Self) -> Self {
        self.trials += other.trials;
        self.misses += other.misses;
        for (name, count) in other.counts {
            *self.counts.entry(name).or_default() += count;
        }
        for (name, sum) in other.weight_sums {
            *self.weight_sums.entry(name).or_default() += sum;
        }
        self
    }
}

/// Run the simulation with rayon parallelism
pub fn simulate_selection(tables: &LootTables, sim: &SelectionSim) -> SelectionReport {
    let selector = LootSelector::new(tables);
    let chunks = sim.trials.div_ceil(CHUNK_SIZE);

    (0..chunks)
        .into_par_iter()
        .map(|chunk| {
            let start = chunk * CHUNK_SIZE;
            let len = CHUNK_SIZE.min(sim.trials - start);
            let mut rng = Xoshiro256PlusPlus::seed_from_u64(sim.seed.wrapping_add(chunk));
            let mut report = SelectionReport {
                trials: len,
                ..SelectionReport::default()
            };
            for _ in 0..len {
                match selector.roll(&sim.map_name, sim.pool, sim.luck, &mut rng) {
                    Some(roll) => {
                        *report.counts.entry(roll.name.clone()).or_default() += 1;
                        *report.weight_sums.entry(roll.name).or_default() += roll.weight;
                    }
                    None => report.misses += 1,
                }
            }
            report
        })
        .reduce(SelectionReport::default, SelectionReport::merge)
}

/// Analytical selection probabilities for the same setup
pub fn expected_probabilities(
    tables: &LootTables,
    map_name: &str,
    pool: CandidatePool,
    luck: f64,
) -> BTreeMap<String, f64> {
    LootSelector::new(tables)
        .cumulative(map_name, pool, luck)
        .map(|table| {
            table
                .probabilities()
                .into_iter()
                .map(|(name, p)| (name.to_string(), p))
                .collect()
        })
        .unwrap_or_default()
}
