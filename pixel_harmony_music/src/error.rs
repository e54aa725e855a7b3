// Error types for the melody evolver and its boundary adaptors.
//
// `InvalidInputError` and `ConfigError` are the two failure modes of
// `evolve`; both are raised before any population exists. `EvolveError`
// unifies them for callers that only want one `?`. Config file loading and
// MIDI export have their own errors since they touch the filesystem.

use thiserror::Error;

/// The feature vector handed over by image analysis is unusable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidInputError {
    #[error("feature vector has {actual} components, expected {expected}")]
    Dimensionality { expected: usize, actual: usize },
    #[error("feature component `{name}` is not a finite number")]
    NotFinite { name: &'static str },
    #[error("feature component `{name}` = {value} is outside [0, 1]")]
    OutOfRange { name: &'static str, value: f64 },
}

/// The evolver configuration is internally inconsistent.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("population_size must be at least 2, got {0}")]
    PopulationTooSmall(usize),
    #[error("genome_length must be at least 1")]
    EmptyGenome,
    #[error("max_generations must be at least 1")]
    NoGenerations,
    #[error("{name} must be a probability in [0, 1], got {value}")]
    ProbabilityOutOfRange { name: &'static str, value: f64 },
    #[error("elite_count ({elite}) must be smaller than population_size ({population})")]
    TooManyElites { elite: usize, population: usize },
    #[error("convergence threshold must be finite and non-negative, got {0}")]
    InvalidThreshold(f64),
    #[error("convergence patience must be at least 1 generation")]
    ZeroPatience,
    #[error("tournament size must be at least 1")]
    EmptyTournament,
    #[error("fitness weight `{0}` must be finite and non-negative")]
    InvalidWeight(&'static str),
}

/// Anything `evolve` can report.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvolveError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Failure to read an evolver config file.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] ConfigError),
}

/// Failure to serialize or write a melody as MIDI.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("cannot export an empty melody")]
    EmptyMelody,
    #[error("tempo must be between 4 and 1000 BPM, got {0}")]
    InvalidTempo(u16),
    #[error("failed to write MIDI file: {0}")]
    Io(#[from] std::io::Error),
}
