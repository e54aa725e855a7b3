// End-to-end properties of the melody evolver.
//
// These run full evolutions through the public API only: output shape,
// reproducibility under a fixed seed, elitism, mood alignment and the
// rejection paths.

use pixel_harmony_music::config::{Convergence, EvolverConfig};
use pixel_harmony_music::error::{ConfigError, EvolveError, InvalidInputError};
use pixel_harmony_music::evolve::{evolve, evolve_melody};
use pixel_harmony_music::mood::FeatureVector;
use pixel_harmony_music::note::{Duration, MIDI_MAX};
use pixel_harmony_music::population::SelectionStrategy;
use pixel_harmony_prng::{MelodyRng, RandomSource};

fn example_config() -> EvolverConfig {
    EvolverConfig {
        population_size: 20,
        genome_length: 16,
        max_generations: 50,
        mutation_rate: 0.05,
        crossover_rate: 0.7,
        elite_count: 2,
        ..Default::default()
    }
}

fn bright() -> FeatureVector {
    FeatureVector::new(0.9, 0.8, 0.7).unwrap()
}

struct CountingRng {
    inner: MelodyRng,
    draws: usize,
}

impl RandomSource for CountingRng {
    fn next_u64(&mut self) -> u64 {
        self.draws += 1;
        self.inner.next_u64()
    }
}

#[test]
fn test_output_has_genome_length_and_valid_notes() {
    for length in [1, 5, 16, 33] {
        let config = EvolverConfig {
            genome_length: length,
            max_generations: 10,
            ..example_config()
        };
        let melody = evolve_melody(&bright(), &config, &mut MelodyRng::new(1)).unwrap();
        assert_eq!(melody.len(), length);
        for note in &melody.notes {
            assert!(note.pitch <= MIDI_MAX);
            assert!(note.velocity >= 1 && note.velocity <= MIDI_MAX);
            assert!(Duration::PALETTE.contains(&note.duration));
        }
    }
}

#[test]
fn test_same_seed_same_melody_and_history() {
    let config = example_config();
    let a = evolve(&bright(), &config, &mut MelodyRng::new(77)).unwrap();
    let b = evolve(&bright(), &config, &mut MelodyRng::new(77)).unwrap();
    assert_eq!(a.melody, b.melody);
    assert_eq!(a.best_history, b.best_history);
    assert_eq!(a.generations, b.generations);
}

#[test]
fn test_parallel_scoring_does_not_change_result() {
    let parallel = EvolverConfig {
        parallel_scoring: true,
        ..example_config()
    };
    let sequential = EvolverConfig {
        parallel_scoring: false,
        ..example_config()
    };
    let a = evolve(&bright(), &parallel, &mut MelodyRng::new(5)).unwrap();
    let b = evolve(&bright(), &sequential, &mut MelodyRng::new(5)).unwrap();
    assert_eq!(a.melody, b.melody);
    assert_eq!(a.best_history, b.best_history);
}

#[test]
fn test_different_seeds_explore_differently() {
    let config = example_config();
    let a = evolve_melody(&bright(), &config, &mut MelodyRng::new(1)).unwrap();
    let b = evolve_melody(&bright(), &config, &mut MelodyRng::new(2)).unwrap();
    assert_ne!(a, b);
}

#[test]
fn test_elitism_never_loses_best_score() {
    let config = EvolverConfig {
        elite_count: 1,
        mutation_rate: 0.3,
        max_generations: 80,
        convergence: None,
        ..example_config()
    };
    let result = evolve(&bright(), &config, &mut MelodyRng::new(31)).unwrap();
    assert_eq!(result.best_history.len(), 80);
    for (generation, pair) in result.best_history.windows(2).enumerate() {
        assert!(
            pair[1] >= pair[0],
            "best score dropped at generation {}: {} -> {}",
            generation + 1,
            pair[0],
            pair[1]
        );
    }
}

#[test]
fn test_evolution_improves_on_random_start() {
    let config = EvolverConfig {
        max_generations: 100,
        convergence: None,
        ..example_config()
    };
    let result = evolve(&bright(), &config, &mut MelodyRng::new(8)).unwrap();
    let first = result.best_history[0];
    let last = *result.best_history.last().unwrap();
    assert!(last > first, "no improvement: {} -> {}", first, last);
}

#[test]
fn test_brightness_raises_mean_pitch() {
    let config = example_config();
    let dim = FeatureVector::new(0.1, 0.8, 0.7).unwrap();
    let high = evolve(&bright(), &config, &mut MelodyRng::new(2024)).unwrap();
    let low = evolve(&dim, &config, &mut MelodyRng::new(2024)).unwrap();
    assert!(high.generations <= 50);
    assert_eq!(high.melody.len(), 16);
    assert!(
        high.melody.mean_pitch() > low.melody.mean_pitch(),
        "bright {:.1} vs dim {:.1}",
        high.melody.mean_pitch(),
        low.melody.mean_pitch()
    );
}

#[test]
fn test_minimal_config_runs() {
    let config = EvolverConfig {
        population_size: 2,
        genome_length: 1,
        max_generations: 1,
        elite_count: 0,
        convergence: None,
        ..Default::default()
    };
    let result = evolve(&bright(), &config, &mut MelodyRng::new(3)).unwrap();
    assert_eq!(result.generations, 1);
    assert_eq!(result.best_history.len(), 1);
    assert_eq!(result.melody.len(), 1);
}

#[test]
fn test_odd_population_with_roulette() {
    let config = EvolverConfig {
        population_size: 9,
        elite_count: 0,
        selection: SelectionStrategy::FitnessProportionate,
        max_generations: 20,
        ..example_config()
    };
    let melody = evolve_melody(&bright(), &config, &mut MelodyRng::new(13)).unwrap();
    assert_eq!(melody.len(), 16);
}

#[test]
fn test_plateau_stop_before_generation_cap() {
    let config = EvolverConfig {
        max_generations: 10_000,
        convergence: Some(Convergence {
            threshold: 1e-9,
            patience: 15,
        }),
        ..example_config()
    };
    let result = evolve(&bright(), &config, &mut MelodyRng::new(99)).unwrap();
    assert!(result.converged);
    assert!(result.generations < 10_000);
    assert_eq!(result.best_history.len(), result.generations);
}

#[test]
fn test_non_finite_feature_rejected_without_drawing() {
    let mut rng = CountingRng {
        inner: MelodyRng::new(0),
        draws: 0,
    };
    let features = FeatureVector {
        brightness: 0.5,
        energy: f64::INFINITY,
        valence: 0.5,
    };
    let err = evolve(&features, &example_config(), &mut rng).unwrap_err();
    assert_eq!(
        err,
        EvolveError::InvalidInput(InvalidInputError::NotFinite { name: "energy" })
    );
    assert_eq!(rng.draws, 0);
}

#[test]
fn test_wrong_dimensionality_rejected() {
    let err = FeatureVector::from_slice(&[0.1, 0.2]).unwrap_err();
    assert_eq!(
        err,
        InvalidInputError::Dimensionality {
            expected: 3,
            actual: 2
        }
    );
}

#[test]
fn test_out_of_range_feature_rejected() {
    let features = FeatureVector {
        brightness: 1.5,
        energy: 0.5,
        valence: 0.5,
    };
    let err = evolve(&features, &example_config(), &mut MelodyRng::new(0)).unwrap_err();
    assert!(matches!(
        err,
        EvolveError::InvalidInput(InvalidInputError::OutOfRange {
            name: "brightness",
            ..
        })
    ));
}

#[test]
fn test_config_errors_reported() {
    let config = EvolverConfig {
        population_size: 1,
        ..example_config()
    };
    let err = evolve(&bright(), &config, &mut MelodyRng::new(0)).unwrap_err();
    assert_eq!(err, EvolveError::Config(ConfigError::PopulationTooSmall(1)));

    let config = EvolverConfig {
        genome_length: 0,
        ..example_config()
    };
    let err = evolve(&bright(), &config, &mut MelodyRng::new(0)).unwrap_err();
    assert_eq!(err, EvolveError::Config(ConfigError::EmptyGenome));
}
