// Scale support for mood-driven melody generation.
//
// Bright, positive images are voiced in a major scale; darker ones in the
// natural minor. A `ScaleInstance` pairs a scale with its tonic pitch class
// and answers the questions the evolver asks: is this pitch in the scale,
// which in-scale pitches lie in a window, what is the nearest in-scale
// pitch, and how structurally important is a given degree.
//
// Used by operators.rs to draw and mutate pitches and by fitness.rs for the
// scale-fit and cadence components.

use crate::note::MIDI_MAX;
use serde::{Deserialize, Serialize};

/// The scales the evolver composes in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scale {
    /// C D E F G A B C
    Major,
    /// C D Eb F G Ab Bb C
    NaturalMinor,
}

impl Scale {
    /// Semitone offsets of degrees 1-7 from the tonic.
    pub fn intervals(self) -> [u8; 7] {
        match self {
            Scale::Major => [0, 2, 4, 5, 7, 9, 11],
            Scale::NaturalMinor => [0, 2, 3, 5, 7, 8, 10],
        }
    }

    /// In-scale flags indexed by pitch class relative to the tonic.
    pub fn pitch_classes(self) -> [bool; 12] {
        let mut pcs = [false; 12];
        for &interval in &self.intervals() {
            pcs[interval as usize] = true;
        }
        pcs
    }
}

/// A scale rooted on a specific tonic pitch class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaleInstance {
    pub scale: Scale,
    /// Pitch class of the tonic (0 = C, 2 = D, ...).
    pub tonic_pc: u8,
}

impl ScaleInstance {
    pub fn new(scale: Scale, tonic_pc: u8) -> Self {
        ScaleInstance {
            scale,
            tonic_pc: tonic_pc % 12,
        }
    }

    pub fn c_major() -> Self {
        ScaleInstance::new(Scale::Major, 0)
    }

    pub fn c_minor() -> Self {
        ScaleInstance::new(Scale::NaturalMinor, 0)
    }

    fn relative_pc(&self, pitch: u8) -> u8 {
        (pitch % 12 + 12 - self.tonic_pc) % 12
    }

    pub fn contains(&self, pitch: u8) -> bool {
        self.scale.pitch_classes()[self.relative_pc(pitch) as usize]
    }

    /// All in-scale pitches in `[low, high]`.
    pub fn pitches_in_range(&self, low: u8, high: u8) -> Vec<u8> {
        (low..=high.min(MIDI_MAX)).filter(|&p| self.contains(p)).collect()
    }

    /// Nearest in-scale pitch, preferring the lower neighbour on ties.
    pub fn snap(&self, pitch: u8) -> u8 {
        let pitch = pitch.min(MIDI_MAX);
        if self.contains(pitch) {
            return pitch;
        }
        for offset in 1u8..=6 {
            if pitch >= offset && self.contains(pitch - offset) {
                return pitch - offset;
            }
            if pitch + offset <= MIDI_MAX && self.contains(pitch + offset) {
                return pitch + offset;
            }
        }
        pitch
    }

    /// Scale degree 0-6, or `None` for an out-of-scale pitch.
    pub fn degree(&self, pitch: u8) -> Option<u8> {
        let pc = self.relative_pc(pitch);
        self.scale
            .intervals()
            .iter()
            .position(|&iv| iv == pc)
            .map(|d| d as u8)
    }

    pub fn is_tonic(&self, pitch: u8) -> bool {
        self.degree(pitch) == Some(0)
    }

    pub fn is_dominant(&self, pitch: u8) -> bool {
        self.degree(pitch) == Some(4)
    }

    /// Seventh scale degree: the leading tone in major, the subtonic in
    /// natural minor.
    pub fn is_leading_tone(&self, pitch: u8) -> bool {
        self.degree(pitch) == Some(6)
    }

    /// Tonic-triad membership (degrees 1, 3, 5).
    pub fn is_chord_tone(&self, pitch: u8) -> bool {
        matches!(self.degree(pitch), Some(0 | 2 | 4))
    }

    /// Structural weight of a pitch in [0, 1]: tonic highest, then the
    /// dominant and mediant, other degrees lower, out-of-scale zero.
    pub fn pitch_weight(&self, pitch: u8) -> f64 {
        match self.degree(pitch) {
            Some(0) => 1.0,
            Some(4) => 0.9,
            Some(2) => 0.8,
            Some(_) => 0.7,
            None => 0.0,
        }
    }
}
