// Generational genetic search for a mood-matching melody.
//
// One run:
//   1. Validate the feature vector and the config (nothing is built on
//      failure).
//   2. Derive mood targets and seed generation 0 with random genomes drawn
//      from the mood's pitch window and duration palette.
//   3. Each generation: rank (score + stable sort), record the best total,
//      check the plateau stop, then breed the next generation from elites
//      plus selected, recombined and mutated children.
//   4. Return the best genome of the final ranked generation.
//
// Generations are strictly sequential: the next population is built in a
// fresh Vec and only replaces the current one once it is complete. With at
// least one elite the best total never decreases, since elites are carried
// unchanged and scoring is deterministic.
//
// All randomness comes from the caller's `RandomSource`; identical inputs
// and seed give an identical melody and an identical best-score history.

use crate::config::{Convergence, EvolverConfig};
use crate::error::EvolveError;
use crate::fitness::FitnessScore;
use crate::mood::{FeatureVector, MoodTargets};
use crate::note::Melody;
use crate::operators::{GenePool, crossover, mutate};
use crate::population::{Population, RankedPopulation};
use log::{debug, info};
use pixel_harmony_prng::RandomSource;

/// Generations without improvement before adaptive mutation starts rising.
const ADAPTIVE_STALL_WINDOW: usize = 20;

/// Upper bound for the adaptive mutation rate (unless the configured rate
/// is already higher).
const ADAPTIVE_RATE_CEILING: f64 = 0.5;

/// Outcome of an evolution run.
#[derive(Debug, Clone)]
pub struct EvolutionResult {
    /// The single best genome of the final generation.
    pub melody: Melody,
    pub fitness: FitnessScore,
    /// Best fitness total of each generation, in order.
    pub best_history: Vec<f64>,
    /// Generations scored (1..=max_generations).
    pub generations: usize,
    /// True when the plateau stop ended the run early.
    pub converged: bool,
    /// The mood targets the run steered toward.
    pub targets: MoodTargets,
}

/// Tracks the plateau stop: the best total must beat the last recorded
/// improvement by more than `threshold` within `patience` generations.
struct PlateauTracker {
    threshold: f64,
    patience: usize,
    reference: Option<f64>,
    stalled: usize,
}

impl PlateauTracker {
    fn new(convergence: Convergence) -> Self {
        PlateauTracker {
            threshold: convergence.threshold,
            patience: convergence.patience,
            reference: None,
            stalled: 0,
        }
    }

    /// Record this generation's best; true when the run should stop.
    fn observe(&mut self, best: f64) -> bool {
        match self.reference {
            Some(reference) if best - reference <= self.threshold => self.stalled += 1,
            _ => {
                self.reference = Some(best);
                self.stalled = 0;
            }
        }
        self.stalled >= self.patience
    }
}

/// Mutation rate schedule. Fixed unless adaptive mutation is enabled, in
/// which case the rate climbs 10% per generation during a long plateau and
/// decays 10% per generation back to the configured floor otherwise.
struct MutationSchedule {
    floor: f64,
    ceiling: f64,
    rate: f64,
    adaptive: bool,
    best: f64,
    stalled: usize,
}

impl MutationSchedule {
    fn new(base_rate: f64, adaptive: bool) -> Self {
        MutationSchedule {
            floor: base_rate,
            ceiling: ADAPTIVE_RATE_CEILING.max(base_rate),
            rate: base_rate,
            adaptive,
            best: f64::NEG_INFINITY,
            stalled: 0,
        }
    }

    fn record(&mut self, best: f64) {
        if best > self.best {
            self.best = best;
            self.stalled = 0;
        } else {
            self.stalled += 1;
        }
        if !self.adaptive {
            return;
        }
        self.rate = if self.stalled > ADAPTIVE_STALL_WINDOW {
            (self.rate * 1.1).min(self.ceiling)
        } else {
            (self.rate * 0.9).max(self.floor)
        };
    }

    fn rate(&self) -> f64 {
        self.rate
    }
}

/// Evolve a melody for an image's mood.
///
/// Fails with `EvolveError::InvalidInput` for a malformed feature vector and
/// `EvolveError::Config` for an inconsistent config, before any population
/// is created or any random value is drawn.
pub fn evolve(
    features: &FeatureVector,
    config: &EvolverConfig,
    rng: &mut impl RandomSource,
) -> Result<EvolutionResult, EvolveError> {
    features.validate()?;
    config.validate()?;

    let targets = MoodTargets::from_features(features);
    info!(
        "Evolving {} genomes x {} notes for up to {} generations \
         (target pitch {:.1}, target duration {:.2} beats, {:?})",
        config.population_size,
        config.genome_length,
        config.max_generations,
        targets.mean_pitch,
        targets.mean_duration_beats,
        targets.scale.scale,
    );

    let pool = GenePool::new(&targets);
    let mut population = Population::random(
        &pool,
        config.population_size,
        config.genome_length,
        rng,
    );
    let mut best_history = Vec::with_capacity(config.max_generations);
    let mut plateau = config.convergence.map(PlateauTracker::new);
    let mut schedule = MutationSchedule::new(config.mutation_rate, config.adaptive_mutation);
    let mut converged = false;

    let final_generation = loop {
        let ranked = population.rank(&targets, &config.weights, config.parallel_scoring);
        let best = ranked.best().fitness.total;
        best_history.push(best);
        debug!(
            "Generation {}: best {:.4}, mean {:.4}, mutation rate {:.3}",
            ranked.generation,
            best,
            ranked.mean_fitness(),
            schedule.rate(),
        );

        schedule.record(best);
        if plateau.as_mut().is_some_and(|p| p.observe(best)) {
            info!("Converged after {} generations", ranked.generation + 1);
            converged = true;
            break ranked;
        }
        if ranked.generation + 1 >= config.max_generations {
            break ranked;
        }

        population = next_generation(&ranked, config, &pool, schedule.rate(), rng);
    };

    let generations = final_generation.generation + 1;
    let best = final_generation.into_best();
    info!(
        "Best melody after {} generations: {:.4} ({})",
        generations,
        best.fitness.total,
        best.fitness.summary(),
    );

    Ok(EvolutionResult {
        melody: best.melody,
        fitness: best.fitness,
        best_history,
        generations,
        converged,
        targets,
    })
}

/// `evolve`, returning only the melody.
pub fn evolve_melody(
    features: &FeatureVector,
    config: &EvolverConfig,
    rng: &mut impl RandomSource,
) -> Result<Melody, EvolveError> {
    evolve(features, config, rng).map(|result| result.melody)
}

/// Build generation N+1 from ranked generation N.
///
/// Elites are copied first. The rest is filled two children at a time:
/// select two parents, recombine them with probability `crossover_rate`
/// (otherwise clone both), mutate each child. When a single slot remains it
/// is filled by a clone of one selected parent, mutated like any clone.
fn next_generation(
    ranked: &RankedPopulation,
    config: &EvolverConfig,
    pool: &GenePool,
    mutation_rate: f64,
    rng: &mut impl RandomSource,
) -> Population {
    let size = config.population_size;
    let mut members: Vec<Melody> = Vec::with_capacity(size);
    members.extend(ranked.elites(config.elite_count).cloned());

    while members.len() < size {
        let first = &ranked.select(config.selection, rng).melody;
        if size - members.len() == 1 {
            members.push(mutate(first, mutation_rate, pool, rng));
            break;
        }
        let second = &ranked.select(config.selection, rng).melody;
        let (a, b) = if rng.random_bool(config.crossover_rate) {
            crossover(first, second, rng)
        } else {
            (first.clone(), second.clone())
        };
        members.push(mutate(&a, mutation_rate, pool, rng));
        members.push(mutate(&b, mutation_rate, pool, rng));
    }

    Population {
        generation: ranked.generation + 1,
        members,
    }
}
