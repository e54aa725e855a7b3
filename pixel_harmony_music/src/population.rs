// Populations, ranking and parent selection.
//
// A `Population` is one generation of unscored genomes. Ranking consumes it
// and produces a `RankedPopulation`: every genome paired with its fitness,
// sorted best first. The sort is stable, so equal scores keep their
// insertion order and a run stays deterministic.
//
// Scoring is the only parallel step. Each genome is scored independently
// (read-only over the genome and the mood targets) with rayon; collecting an
// indexed parallel iterator preserves order, so the parallel and sequential
// paths rank identically.

use crate::fitness::{FitnessScore, FitnessWeights, score_melody};
use crate::mood::MoodTargets;
use crate::note::Melody;
use crate::operators::{GenePool, random_melody};
use pixel_harmony_prng::RandomSource;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// How parents are picked from a ranked population.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SelectionStrategy {
    /// Best of `size` uniformly drawn contestants (drawn with replacement).
    Tournament { size: usize },
    /// Roulette wheel over fitness totals.
    FitnessProportionate,
}

impl Default for SelectionStrategy {
    fn default() -> Self {
        SelectionStrategy::Tournament { size: 3 }
    }
}

/// One generation of genomes, not yet scored.
#[derive(Debug, Clone)]
pub struct Population {
    pub generation: usize,
    pub members: Vec<Melody>,
}

/// A genome with its fitness for the current generation.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredMelody {
    pub melody: Melody,
    pub fitness: FitnessScore,
}

/// A scored generation, best first.
#[derive(Debug, Clone)]
pub struct RankedPopulation {
    pub generation: usize,
    pub members: Vec<ScoredMelody>,
}

impl Population {
    /// Generation 0: `size` random genomes of `length` notes.
    pub fn random(pool: &GenePool, size: usize, length: usize, rng: &mut impl RandomSource) -> Self {
        let members = (0..size).map(|_| random_melody(pool, length, rng)).collect();
        Population {
            generation: 0,
            members,
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Score every genome and sort best first (stable).
    pub fn rank(self, targets: &MoodTargets, weights: &FitnessWeights, parallel: bool) -> RankedPopulation {
        let score = |melody: Melody| {
            let fitness = score_melody(&melody, targets, weights);
            ScoredMelody { melody, fitness }
        };
        let mut members: Vec<ScoredMelody> = if parallel {
            self.members.into_par_iter().map(score).collect()
        } else {
            self.members.into_iter().map(score).collect()
        };
        members.sort_by(|a, b| b.fitness.total.total_cmp(&a.fitness.total));
        RankedPopulation {
            generation: self.generation,
            members,
        }
    }
}

impl RankedPopulation {
    /// The top genome. Populations always hold at least two members.
    pub fn best(&self) -> &ScoredMelody {
        &self.members[0]
    }

    pub fn into_best(mut self) -> ScoredMelody {
        self.members.swap_remove(0)
    }

    pub fn mean_fitness(&self) -> f64 {
        if self.members.is_empty() {
            return 0.0;
        }
        self.members.iter().map(|m| m.fitness.total).sum::<f64>() / self.members.len() as f64
    }

    /// The top `count` genomes, unchanged.
    pub fn elites(&self, count: usize) -> impl Iterator<Item = &Melody> {
        self.members.iter().take(count).map(|m| &m.melody)
    }

    /// Pick one parent according to `strategy`.
    pub fn select(&self, strategy: SelectionStrategy, rng: &mut impl RandomSource) -> &ScoredMelody {
        let idx = match strategy {
            SelectionStrategy::Tournament { size } => self.tournament_index(size, rng),
            SelectionStrategy::FitnessProportionate => self.roulette_index(rng),
        };
        &self.members[idx]
    }

    /// Members are sorted best first, so the lowest drawn index wins; ties
    /// between equal scores therefore go to the earlier genome.
    fn tournament_index(&self, size: usize, rng: &mut impl RandomSource) -> usize {
        (0..size.max(1))
            .map(|_| rng.range_usize(0, self.members.len()))
            .min()
            .unwrap_or(0)
    }

    fn roulette_index(&self, rng: &mut impl RandomSource) -> usize {
        let total: f64 = self.members.iter().map(|m| m.fitness.total.max(0.0)).sum();
        if total <= 0.0 {
            return rng.range_usize(0, self.members.len());
        }
        let mut spin = rng.next_f64() * total;
        for (i, m) in self.members.iter().enumerate() {
            spin -= m.fitness.total.max(0.0);
            if spin < 0.0 {
                return i;
            }
        }
        self.members.len() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mood::FeatureVector;
    use pixel_harmony_prng::MelodyRng;

    fn targets() -> MoodTargets {
        MoodTargets::from_features(&FeatureVector::new(0.6, 0.4, 0.7).unwrap())
    }

    #[test]
    fn test_rank_sorts_descending() {
        let t = targets();
        let mut rng = MelodyRng::new(11);
        let ranked = Population::random(&GenePool::new(&t), 24, 12, &mut rng).rank(&t, &FitnessWeights::default(), false);
        assert_eq!(ranked.members.len(), 24);
        for w in ranked.members.windows(2) {
            assert!(w[0].fitness.total >= w[1].fitness.total);
        }
        assert!(ranked.best().fitness.total >= ranked.mean_fitness());
    }

    #[test]
    fn test_parallel_and_sequential_rank_identically() {
        let t = targets();
        let w = FitnessWeights::default();
        let pop = Population::random(&GenePool::new(&t), 40, 16, &mut MelodyRng::new(5));
        let seq = pop.clone().rank(&t, &w, false);
        let par = pop.rank(&t, &w, true);
        assert_eq!(seq.members, par.members);
    }

    #[test]
    fn test_stable_sort_keeps_insertion_order_on_ties() {
        let t = targets();
        // Zero weights make every total 0.0, so ranking must not reorder.
        let flat = FitnessWeights {
            consonance: 0.0,
            rhythm: 0.0,
            mood: 0.0,
            scale: 0.0,
            contour: 0.0,
            cadence: 0.0,
            phrasing: 0.0,
            ..Default::default()
        };
        let pop = Population::random(&GenePool::new(&t), 12, 6, &mut MelodyRng::new(4));
        let original = pop.members.clone();
        let ranked = pop.rank(&t, &flat, true);
        let order: Vec<Melody> = ranked.members.into_iter().map(|m| m.melody).collect();
        assert_eq!(order, original);
    }

    #[test]
    fn test_tournament_prefers_better_genomes() {
        let t = targets();
        let mut rng = MelodyRng::new(21);
        let ranked = Population::random(&GenePool::new(&t), 20, 8, &mut rng).rank(&t, &FitnessWeights::default(), false);
        let strategy = SelectionStrategy::Tournament { size: 3 };
        let n = 2000;
        let picked_mean = (0..n)
            .map(|_| ranked.select(strategy, &mut rng).fitness.total)
            .sum::<f64>()
            / n as f64;
        assert!(picked_mean > ranked.mean_fitness());
    }

    #[test]
    fn test_tournament_of_one_is_uniform_pick() {
        let t = targets();
        let mut rng = MelodyRng::new(2);
        let ranked = Population::random(&GenePool::new(&t), 4, 4, &mut rng).rank(&t, &FitnessWeights::default(), false);
        let mut seen = [false; 4];
        for _ in 0..200 {
            let pick = ranked.select(SelectionStrategy::Tournament { size: 1 }, &mut rng);
            let idx = ranked.members.iter().position(|m| std::ptr::eq(m, pick)).unwrap();
            seen[idx] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_roulette_selects_members() {
        let t = targets();
        let mut rng = MelodyRng::new(8);
        let ranked = Population::random(&GenePool::new(&t), 10, 8, &mut rng).rank(&t, &FitnessWeights::default(), false);
        for _ in 0..100 {
            let pick = ranked.select(SelectionStrategy::FitnessProportionate, &mut rng);
            assert!(ranked.members.iter().any(|m| std::ptr::eq(m, pick)));
        }
    }

    #[test]
    fn test_strategy_serde_shape() {
        let json = serde_json::to_string(&SelectionStrategy::default()).unwrap();
        assert_eq!(json, r#"{"kind":"tournament","size":3}"#);
        let back: SelectionStrategy =
            serde_json::from_str(r#"{"kind":"fitness_proportionate"}"#).unwrap();
        assert_eq!(back, SelectionStrategy::FitnessProportionate);
    }
}
