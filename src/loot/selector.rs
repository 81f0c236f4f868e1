use rand::Rng;
use tracing::debug;

use super::{CandidatePool, LootRoll, LootTables};
use crate::luck::clamp_unit;

/// Cumulative selection boundaries for one (map, pool, luck) combination
#[derive(Debug, Clone, PartialEq)]
pub struct CumulativeTable<'a> {
    entries: Vec<(f64, &'a str)>,
    total: f64,
}

impl<'a> CumulativeTable<'a> {
    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First candidate whose boundary is >= `draw`
    pub fn pick(&self, draw: f64) -> Option<&'a str> {
        self.entries
            .iter()
            .find(|(boundary, _)| *boundary >= draw)
            .or_else(|| self.entries.last())
            .map(|(_, name)| *name)
    }

    /// Exact selection probability per candidate
    pub fn probabilities(&self) -> Vec<(&'a str, f64)> {
        let mut previous = 0.0;
        self.entries
            .iter()
            .map(|(boundary, name)| {
                let p = (boundary - previous) / self.total;
                previous = *boundary;
                (*name, p)
            })
            .collect()
    }
}

/// Weighted target selector over the static loot tables
#[derive(Debug, Clone, Copy)]
pub struct LootSelector<'a> {
    tables: &'a LootTables,
}

impl<'a> LootSelector<'a> {
    pub fn new(tables: &'a LootTables) -> Self {
        Self { tables }
    }

    /// Build cumulative boundaries for every eligible candidate.
    ///
    /// Returns `None` when the map is unknown or nothing in the pool is
    /// allowed there.
    pub fn cumulative(
        &self,
        map_name: &str,
        pool: CandidatePool,
        luck: f64,
    ) -> Option<CumulativeTable<'a>> {
        let luck = clamp_unit(luck);
        let tables: &'a LootTables = self.tables;
        let allowed = tables.maps.get(map_name)?;

        let mut total = 0.0;
        let mut entries = Vec::with_capacity(allowed.len());
        for name in allowed {
            let Some(candidate) = tables.candidates.get(name) else {
                continue;
            };
            if !candidate.in_pool(pool) {
                continue;
            }
            total += candidate.selection_weight(luck);
            entries.push((total, name.as_str()));
        }

        if entries.is_empty() || !(total.is_finite() && total > 0.0) {
            return None;
        }
        // Stable ascending sort keeps insertion order on equal boundaries
        entries.sort_by(|a, b| a.0.total_cmp(&b.0));
        Some(CumulativeTable { entries, total })
    }

    /// Draw one candidate and sample its weight stat.
    ///
    /// `None` is a soft miss (no eligible candidate for the map).
    pub fn roll<R: Rng + ?Sized>(
        &self,
        map_name: &str,
        pool: CandidatePool,
        luck: f64,
        rng: &mut R,
    ) -> Option<LootRoll> {
        let luck = clamp_unit(luck);
        let Some(table) = self.cumulative(map_name, pool, luck) else {
            debug!(map = map_name, ?pool, "no eligible loot candidates");
            return None;
        };

        let draw = rng.gen_range(0.0..=table.total);
        let name = table.pick(draw)?;
        let candidate = self.tables.candidates.get(name)?;

        Some(LootRoll {
            name: name.to_string(),
            weight: candidate.sample_weight(luck, rng),
            reward: candidate.reward,
        })
    }
}
