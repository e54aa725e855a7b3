// Genetic operators: random genomes, crossover and per-note mutation.
//
// Every operator draws from the caller's `RandomSource` and keeps notes
// inside valid ranges: pitches come from the mood's in-scale candidate
// window, durations from `Duration::PALETTE`, velocities stay in 1-127.
// Operators never modify a melody in place; they return new genomes.
//
// The candidate pitches and durations depend only on the mood targets, so
// they are gathered once per run into a `GenePool` and shared by every
// operator call.

use crate::mood::MoodTargets;
use crate::note::{Duration, MIDI_MAX, Melody, Note};
use crate::scale::ScaleInstance;
use pixel_harmony_prng::RandomSource;

/// Maximum velocity offset from the mood target for fresh notes.
const VELOCITY_SPREAD: u8 = 8;

/// Velocity jitter applied alongside any accepted note mutation.
const VELOCITY_JITTER: u8 = 4;

/// Probability that a pitch mutation moves by a scale step rather than
/// jumping to any candidate pitch.
const STEP_MUTATION_BIAS: f64 = 0.7;

/// Scale steps a pitch mutation may move by.
const STEP_OFFSETS: [isize; 4] = [-2, -1, 1, 2];

/// Durations whose length is within a factor of two of the target.
pub fn duration_candidates(targets: &MoodTargets) -> Vec<Duration> {
    let target = targets.mean_duration_beats;
    let near: Vec<Duration> = Duration::PALETTE
        .into_iter()
        .filter(|d| d.beats() >= target / 2.0 && d.beats() <= target * 2.0)
        .collect();
    if near.is_empty() {
        Duration::PALETTE.to_vec()
    } else {
        near
    }
}

/// The note material a run may draw from, derived once from the mood.
#[derive(Debug, Clone, PartialEq)]
pub struct GenePool {
    /// In-scale pitches inside the mood window, ascending.
    pitches: Vec<u8>,
    durations: Vec<Duration>,
    velocity: u8,
    scale: ScaleInstance,
    /// Used only if the window held no in-scale pitch.
    center_pitch: u8,
}

impl GenePool {
    pub fn new(targets: &MoodTargets) -> Self {
        let center = targets.mean_pitch.round().clamp(0.0, MIDI_MAX as f64) as u8;
        GenePool {
            pitches: targets.candidate_pitches(),
            durations: duration_candidates(targets),
            velocity: targets.target_velocity(),
            scale: targets.scale,
            center_pitch: targets.scale.snap(center),
        }
    }

    pub fn pitches(&self) -> &[u8] {
        &self.pitches
    }

    pub fn durations(&self) -> &[Duration] {
        &self.durations
    }

    fn draw_pitch(&self, rng: &mut impl RandomSource) -> u8 {
        rng.choose(&self.pitches).copied().unwrap_or(self.center_pitch)
    }

    fn draw_duration(&self, rng: &mut impl RandomSource) -> Duration {
        rng.choose(&self.durations)
            .copied()
            .unwrap_or(Duration::QUARTER)
    }

    /// Index of the candidate nearest `pitch`: the pitch is snapped into
    /// the scale, then located in (or clamped to) the window.
    fn position_of(&self, pitch: u8) -> usize {
        let snapped = self.scale.snap(pitch);
        match self.pitches.binary_search(&snapped) {
            Ok(i) => i,
            Err(i) => i.min(self.pitches.len().saturating_sub(1)),
        }
    }
}

fn random_velocity(around: u8, spread: u8, rng: &mut impl RandomSource) -> u8 {
    let low = around.saturating_sub(spread).max(1);
    let high = around.saturating_add(spread).min(MIDI_MAX);
    rng.range_u8_inclusive(low.min(high), high)
}

/// A fresh genome of `length` notes drawn from the pool.
pub fn random_melody(pool: &GenePool, length: usize, rng: &mut impl RandomSource) -> Melody {
    let notes = (0..length)
        .map(|_| {
            let pitch = pool.draw_pitch(rng);
            let duration = pool.draw_duration(rng);
            let velocity = random_velocity(pool.velocity, VELOCITY_SPREAD, rng);
            Note::new(pitch, duration, velocity)
        })
        .collect();
    Melody::new(notes)
}

/// Single-point crossover. Both children keep the parents' length; the cut
/// falls strictly inside the genome so each child mixes both parents.
pub fn crossover(a: &Melody, b: &Melody, rng: &mut impl RandomSource) -> (Melody, Melody) {
    let len = a.len().min(b.len());
    if len < 2 {
        return (a.clone(), b.clone());
    }
    let cut = rng.range_usize(1, len);
    let child_a = a.notes[..cut].iter().chain(&b.notes[cut..]).copied().collect();
    let child_b = b.notes[..cut].iter().chain(&a.notes[cut..]).copied().collect();
    (Melody::new(child_a), Melody::new(child_b))
}

/// Per-note mutation: each note is rewritten with probability `rate`.
///
/// A rewritten note changes its pitch (60%), its duration (25%) or both
/// (15%), and its velocity is nudged slightly.
pub fn mutate(melody: &Melody, rate: f64, pool: &GenePool, rng: &mut impl RandomSource) -> Melody {
    let notes = melody
        .notes
        .iter()
        .map(|&note| {
            if !rng.random_bool(rate) {
                return note;
            }
            let roll = rng.next_f64();
            let mut out = note;
            if roll < 0.6 || roll >= 0.85 {
                out = out.with_pitch(mutate_pitch(note.pitch, pool, rng));
            }
            if roll >= 0.6 {
                out = out.with_duration(pool.draw_duration(rng));
            }
            out.with_velocity(random_velocity(note.velocity, VELOCITY_JITTER, rng))
        })
        .collect();
    Melody::new(notes)
}

/// Move by one or two scale steps within the window, or jump anywhere in it.
fn mutate_pitch(pitch: u8, pool: &GenePool, rng: &mut impl RandomSource) -> u8 {
    if pool.pitches.is_empty() || !rng.random_bool(STEP_MUTATION_BIAS) {
        return pool.draw_pitch(rng);
    }
    let here = pool.position_of(pitch) as isize;
    let offset = rng.choose(&STEP_OFFSETS).copied().unwrap_or(1);
    let idx = (here + offset).clamp(0, pool.pitches.len() as isize - 1) as usize;
    pool.pitches[idx]
}
