// Data-driven evolver configuration.
//
// Every tunable of the genetic search lives in `EvolverConfig`: population
// shape, operator rates, elitism, the optional convergence stop, parent
// selection and the fitness weights. It loads from JSON with every field
// optional (missing fields take the defaults below), and is validated both
// on load and again at the top of `evolve`.
//
// Defaults: 50 genomes of 16 notes, up to 1000 generations, 10% per-note
// mutation, 70% crossover, two elites, and an early stop after 100
// generations without improvement.

use crate::error::{ConfigError, ConfigLoadError};
use crate::fitness::FitnessWeights;
use crate::population::SelectionStrategy;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Fitness-plateau stop condition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Convergence {
    /// Improvements of the best total no larger than this count as no
    /// improvement.
    pub threshold: f64,
    /// Generations without improvement before stopping.
    pub patience: usize,
}

impl Default for Convergence {
    fn default() -> Self {
        Convergence {
            threshold: 1e-6,
            patience: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolverConfig {
    /// Genomes per generation (>= 2).
    pub population_size: usize,
    /// Notes per melody (>= 1).
    pub genome_length: usize,
    /// Hard cap on generations (>= 1).
    pub max_generations: usize,
    /// Per-note mutation probability.
    pub mutation_rate: f64,
    /// Probability of recombining a parent pair instead of cloning it.
    pub crossover_rate: f64,
    /// Top genomes copied unchanged into the next generation
    /// (< population_size).
    pub elite_count: usize,
    /// Optional plateau stop; `None` always runs `max_generations`.
    pub convergence: Option<Convergence>,
    pub selection: SelectionStrategy,
    pub weights: FitnessWeights,
    /// Raise the mutation rate during plateaus and relax it back toward the
    /// configured rate while the best score improves. The configured rate
    /// is the floor.
    pub adaptive_mutation: bool,
    /// Score genomes across threads. Results are identical either way.
    pub parallel_scoring: bool,
}

impl Default for EvolverConfig {
    fn default() -> Self {
        EvolverConfig {
            population_size: 50,
            genome_length: 16,
            max_generations: 1000,
            mutation_rate: 0.1,
            crossover_rate: 0.7,
            elite_count: 2,
            convergence: Some(Convergence::default()),
            selection: SelectionStrategy::default(),
            weights: FitnessWeights::default(),
            adaptive_mutation: false,
            parallel_scoring: true,
        }
    }
}

impl EvolverConfig {
    /// Load a config from a JSON file and validate it.
    pub fn load(path: &Path) -> Result<Self, ConfigLoadError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigLoadError> {
        let config: EvolverConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every constraint between fields.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population_size < 2 {
            return Err(ConfigError::PopulationTooSmall(self.population_size));
        }
        if self.genome_length < 1 {
            return Err(ConfigError::EmptyGenome);
        }
        if self.max_generations < 1 {
            return Err(ConfigError::NoGenerations);
        }
        check_probability("mutation_rate", self.mutation_rate)?;
        check_probability("crossover_rate", self.crossover_rate)?;
        if self.elite_count >= self.population_size {
            return Err(ConfigError::TooManyElites {
                elite: self.elite_count,
                population: self.population_size,
            });
        }
        if let Some(conv) = &self.convergence {
            if !conv.threshold.is_finite() || conv.threshold < 0.0 {
                return Err(ConfigError::InvalidThreshold(conv.threshold));
            }
            if conv.patience == 0 {
                return Err(ConfigError::ZeroPatience);
            }
        }
        if let SelectionStrategy::Tournament { size: 0 } = self.selection {
            return Err(ConfigError::EmptyTournament);
        }
        self.weights.validate()
    }
}

fn check_probability(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::ProbabilityOutOfRange { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert_eq!(EvolverConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_population_and_elite_constraints() {
        let config = EvolverConfig {
            population_size: 1,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::PopulationTooSmall(1)));

        let config = EvolverConfig {
            population_size: 4,
            elite_count: 4,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::TooManyElites {
                elite: 4,
                population: 4
            })
        );
    }

    #[test]
    fn test_zero_lengths_rejected() {
        let config = EvolverConfig {
            genome_length: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::EmptyGenome));
        let config = EvolverConfig {
            max_generations: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::NoGenerations));
    }

    #[test]
    fn test_probabilities_checked() {
        let config = EvolverConfig {
            mutation_rate: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ProbabilityOutOfRange {
                name: "mutation_rate",
                ..
            })
        ));
        let config = EvolverConfig {
            crossover_rate: f64::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_convergence_and_selection_checked() {
        let config = EvolverConfig {
            convergence: Some(Convergence {
                threshold: 0.0,
                patience: 0,
            }),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroPatience));
        let config = EvolverConfig {
            selection: SelectionStrategy::Tournament { size: 0 },
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::EmptyTournament));
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = EvolverConfig::from_json(
            r#"{
                "population_size": 20,
                "genome_length": 8,
                "convergence": null,
                "selection": {"kind": "fitness_proportionate"},
                "weights": {"mood": 5.0}
            }"#,
        )
        .unwrap();
        assert_eq!(config.population_size, 20);
        assert_eq!(config.genome_length, 8);
        assert_eq!(config.max_generations, 1000);
        assert!(config.convergence.is_none());
        assert_eq!(config.selection, SelectionStrategy::FitnessProportionate);
        assert_eq!(config.weights.mood, 5.0);
        assert_eq!(config.weights.consonance, 3.0);
    }

    #[test]
    fn test_invalid_json_config_rejected() {
        let err = EvolverConfig::from_json(r#"{"elite_count": 60}"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigLoadError::Invalid(ConfigError::TooManyElites { .. })
        ));
        let err = EvolverConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, ConfigLoadError::Parse(_)));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = EvolverConfig::load(Path::new("/nonexistent/pixel_harmony.json")).unwrap_err();
        assert!(matches!(err, ConfigLoadError::Io(_)));
    }
}
