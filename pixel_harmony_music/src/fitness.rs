// Fitness function: a weighted sum of named, bounded components.
//
// Every component scores a melody in [0, 1]; the total is the weighted sum.
// The component set is closed (`FitnessComponent`) so a score can always be
// broken down and audited:
//
// - Consonance: singability of each consecutive interval (steps best,
//   tritones and leaps beyond an octave worst).
// - RhythmicRegularity: penalizes duration spread beyond a tolerance.
// - MoodAlignment: distance between the melody's mean pitch / duration /
//   velocity and the targets derived from the image mood.
// - ScaleFit: structural weight of each pitch in the mood's scale.
// - Contour: a moderate number of direction changes, and leaps followed by
//   a step back the other way.
// - Cadence: opening on the tonic or dominant, closing on the tonic, with
//   extra credit when the tonic is approached from the dominant or the
//   seventh degree (a V-I close).
// - Phrasing: recurrence of a four-note interval pattern later in the
//   melody, transposed or not.
//
// Scoring is a pure function of (melody, targets, weights), so it can run in
// parallel across a population and is identical run to run.

use crate::error::ConfigError;
use crate::mood::MoodTargets;
use crate::note::{Melody, interval};
use serde::{Deserialize, Serialize};

/// Scale for duration spread beyond tolerance: each extra beat of standard
/// deviation costs this much in the regularity denominator.
pub const RHYTHM_PENALTY_SCALE: f64 = 4.0;

/// Semitones of mean-pitch error that count as one unit of misalignment.
pub const PITCH_ERROR_UNIT: f64 = 12.0;

/// Velocity difference that counts as one unit of misalignment.
pub const VELOCITY_ERROR_UNIT: f64 = 32.0;

/// Intervals wider than this many semitones are leaps that want recovery.
pub const LEAP_SEMITONES: u16 = 4;

/// Notes in a motif compared by the phrasing component.
pub const MOTIF_LENGTH: usize = 4;

/// Non-overlapping motif recurrences that earn the full phrasing score.
pub const MOTIF_REPEATS_FOR_FULL_SCORE: f64 = 2.0;

/// The fixed set of fitness criteria.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FitnessComponent {
    Consonance,
    RhythmicRegularity,
    MoodAlignment,
    ScaleFit,
    Contour,
    Cadence,
    Phrasing,
}

impl FitnessComponent {
    pub const COUNT: usize = 7;
    pub const ALL: [FitnessComponent; Self::COUNT] = [
        FitnessComponent::Consonance,
        FitnessComponent::RhythmicRegularity,
        FitnessComponent::MoodAlignment,
        FitnessComponent::ScaleFit,
        FitnessComponent::Contour,
        FitnessComponent::Cadence,
        FitnessComponent::Phrasing,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            FitnessComponent::Consonance => "consonance",
            FitnessComponent::RhythmicRegularity => "rhythm",
            FitnessComponent::MoodAlignment => "mood",
            FitnessComponent::ScaleFit => "scale",
            FitnessComponent::Contour => "contour",
            FitnessComponent::Cadence => "cadence",
            FitnessComponent::Phrasing => "phrasing",
        }
    }
}

/// Weights for each component. Tunable; the defaults favor consonance and
/// mood alignment, which carry most of the musical identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitnessWeights {
    pub consonance: f64,
    pub rhythm: f64,
    pub mood: f64,
    pub scale: f64,
    pub contour: f64,
    pub cadence: f64,
    pub phrasing: f64,
    /// Duration standard deviation (beats) tolerated before the rhythm
    /// component starts to fall.
    pub rhythm_tolerance: f64,
}

impl Default for FitnessWeights {
    fn default() -> Self {
        FitnessWeights {
            consonance: 3.0,
            rhythm: 2.0,
            mood: 3.0,
            scale: 1.0,
            contour: 1.0,
            cadence: 1.0,
            phrasing: 1.0,
            rhythm_tolerance: 0.25,
        }
    }
}

impl FitnessWeights {
    pub fn weight(&self, component: FitnessComponent) -> f64 {
        match component {
            FitnessComponent::Consonance => self.consonance,
            FitnessComponent::RhythmicRegularity => self.rhythm,
            FitnessComponent::MoodAlignment => self.mood,
            FitnessComponent::ScaleFit => self.scale,
            FitnessComponent::Contour => self.contour,
            FitnessComponent::Cadence => self.cadence,
            FitnessComponent::Phrasing => self.phrasing,
        }
    }

    /// Highest total a melody can reach under these weights.
    pub fn max_total(&self) -> f64 {
        FitnessComponent::ALL.iter().map(|&c| self.weight(c)).sum()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for c in FitnessComponent::ALL {
            let w = self.weight(c);
            if !w.is_finite() || w < 0.0 {
                return Err(ConfigError::InvalidWeight(c.name()));
            }
        }
        if !self.rhythm_tolerance.is_finite() || self.rhythm_tolerance < 0.0 {
            return Err(ConfigError::InvalidWeight("rhythm_tolerance"));
        }
        Ok(())
    }
}

/// A melody's score for one generation, with its per-component breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitnessScore {
    pub components: [f64; FitnessComponent::COUNT],
    pub total: f64,
}

impl FitnessScore {
    pub fn component(&self, component: FitnessComponent) -> f64 {
        self.components[component.index()]
    }

    /// `name=value` pairs for logging.
    pub fn summary(&self) -> String {
        FitnessComponent::ALL
            .iter()
            .map(|&c| format!("{}={:.3}", c.name(), self.component(c)))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Score a melody against mood targets.
pub fn score_melody(melody: &Melody, targets: &MoodTargets, weights: &FitnessWeights) -> FitnessScore {
    let mut components = [0.0; FitnessComponent::COUNT];
    components[FitnessComponent::Consonance.index()] = score_consonance(melody);
    components[FitnessComponent::RhythmicRegularity.index()] =
        score_rhythm(melody, weights.rhythm_tolerance);
    components[FitnessComponent::MoodAlignment.index()] = score_mood(melody, targets);
    components[FitnessComponent::ScaleFit.index()] = score_scale_fit(melody, targets);
    components[FitnessComponent::Contour.index()] = score_contour(melody);
    components[FitnessComponent::Cadence.index()] = score_cadence(melody, targets);
    components[FitnessComponent::Phrasing.index()] = score_phrasing(melody);

    let total = FitnessComponent::ALL
        .iter()
        .map(|&c| weights.weight(c) * components[c.index()])
        .sum();

    FitnessScore { components, total }
}

// ── Components ──

fn score_consonance(melody: &Melody) -> f64 {
    if melody.len() < 2 {
        return 1.0;
    }
    let sum: f64 = melody
        .notes
        .windows(2)
        .map(|w| interval::melodic_quality(interval::semitones(w[0].pitch, w[1].pitch)))
        .sum();
    sum / (melody.len() - 1) as f64
}

fn score_rhythm(melody: &Melody, tolerance: f64) -> f64 {
    let excess = (melody.duration_std_dev() - tolerance).max(0.0);
    1.0 / (1.0 + RHYTHM_PENALTY_SCALE * excess)
}

fn score_mood(melody: &Melody, targets: &MoodTargets) -> f64 {
    if melody.is_empty() {
        return 0.0;
    }
    let pitch_err = (melody.mean_pitch() - targets.mean_pitch).abs() / PITCH_ERROR_UNIT;
    let duration_err = (melody.mean_duration_beats() - targets.mean_duration_beats).abs()
        / targets.mean_duration_beats;
    let velocity_err = (melody.mean_velocity() - targets.velocity).abs() / VELOCITY_ERROR_UNIT;
    (-(pitch_err + duration_err + 0.5 * velocity_err)).exp()
}

fn score_scale_fit(melody: &Melody, targets: &MoodTargets) -> f64 {
    if melody.is_empty() {
        return 0.0;
    }
    let sum: f64 = melody.pitches().map(|p| targets.scale.pitch_weight(p)).sum();
    sum / melody.len() as f64
}

/// Half the score rewards roughly one direction change per four notes; the
/// other half is the fraction of leaps answered by a contrary step.
fn score_contour(melody: &Melody) -> f64 {
    if melody.len() < 3 {
        return 1.0;
    }
    let steps: Vec<i16> = melody
        .notes
        .windows(2)
        .map(|w| interval::semitones(w[0].pitch, w[1].pitch))
        .collect();

    let changes = steps
        .windows(2)
        .filter(|w| w[0] * w[1] < 0)
        .count() as f64;
    let optimal = (melody.len() / 4).max(1) as f64;
    let change_score = 1.0 - ((changes - optimal).abs() / optimal).min(1.0);

    let mut leaps = 0u32;
    let mut recovered = 0u32;
    for w in steps.windows(2) {
        if w[0].unsigned_abs() > LEAP_SEMITONES {
            leaps += 1;
            if w[0] * w[1] < 0 && w[1].unsigned_abs() <= 2 {
                recovered += 1;
            }
        }
    }
    let recovery_score = if leaps == 0 {
        1.0
    } else {
        recovered as f64 / leaps as f64
    };

    0.5 * change_score + 0.5 * recovery_score
}

/// Opening on the tonic or dominant earns 0.25, closing on the tonic 0.5
/// (another tonic-triad tone 0.25), and reaching the final tonic from the
/// dominant or the seventh degree another 0.25.
fn score_cadence(melody: &Melody, targets: &MoodTargets) -> f64 {
    let (Some(first), Some(last)) = (melody.notes.first(), melody.notes.last()) else {
        return 0.0;
    };
    let scale = &targets.scale;
    let mut score = 0.0;
    if scale.is_tonic(first.pitch) || scale.is_dominant(first.pitch) {
        score += 0.25;
    }
    if scale.is_tonic(last.pitch) {
        score += 0.5;
        let approach = melody.len().checked_sub(2).map(|i| melody.notes[i].pitch);
        if approach.is_some_and(|p| scale.is_dominant(p) || scale.is_leading_tone(p)) {
            score += 0.25;
        }
    } else if scale.is_chord_tone(last.pitch) {
        score += 0.25;
    }
    score
}

/// Fraction of the wanted motif recurrences found: a four-note window whose
/// interval pattern reappears in a later, non-overlapping window. Static
/// patterns (repeated notes only) do not count.
fn score_phrasing(melody: &Melody) -> f64 {
    if melody.len() < 2 * MOTIF_LENGTH {
        return 0.0;
    }
    let steps: Vec<i16> = melody
        .notes
        .windows(2)
        .map(|w| interval::semitones(w[0].pitch, w[1].pitch))
        .collect();
    let patterns: Vec<&[i16]> = steps.windows(MOTIF_LENGTH - 1).collect();

    let mut repeats = 0usize;
    for (i, motif) in patterns.iter().enumerate() {
        if motif.iter().all(|&s| s == 0) {
            continue;
        }
        repeats += patterns
            .iter()
            .skip(i + MOTIF_LENGTH)
            .filter(|later| *later == motif)
            .count();
    }
    (repeats as f64 / MOTIF_REPEATS_FOR_FULL_SCORE).min(1.0)
}
