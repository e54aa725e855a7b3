// Pixel Harmony melody evolver
//
// Turns an image's mood features (brightness, energy, valence, each in
// [0, 1]) into a short single-voice melody. A genetic algorithm breeds a
// population of candidate melodies toward a fitness function that rewards
// consonant motion, rhythm close to the mood's pace, pitch and loudness
// close to the mood's register, scale membership, a shaped contour, a
// tonal cadence and repeated motifs.
//
// Architecture:
// - note.rs: Note/Duration/Melody genome types, pitch names, interval tables
// - scale.rs: Major and natural minor scales, membership, snapping, degrees
// - mood.rs: FeatureVector validation and the mood-to-target mapping
// - fitness.rs: Weighted fitness components and `score_melody`
// - operators.rs: GenePool, random genomes, single-point crossover, per-note
//   mutation
// - population.rs: Generations, parallel ranking, tournament/roulette selection
// - evolve.rs: The generational loop with elitism, plateau stop and optional
//   adaptive mutation
// - config.rs: JSON-loadable `EvolverConfig` with validation
// - midi.rs: Standard MIDI File export
// - error.rs: Error types for input, config, loading and export
//
// The evolver is deterministic given a seed: all randomness flows through an
// injected `RandomSource` (see the `pixel_harmony_prng` crate), and parallel
// scoring does not affect ranking order.

pub mod config;
pub mod error;
pub mod evolve;
pub mod fitness;
pub mod midi;
pub mod mood;
pub mod note;
pub mod operators;
pub mod population;
pub mod scale;

pub use config::{Convergence, EvolverConfig};
pub use error::{ConfigError, ConfigLoadError, EvolveError, ExportError, InvalidInputError};
pub use evolve::{EvolutionResult, evolve, evolve_melody};
pub use mood::FeatureVector;
pub use note::{Duration, Melody, Note};
