// Image mood features and the musical targets they imply.
//
// The image-analysis service reduces a photo to three numbers in [0, 1]:
// brightness, energy (color energy / visual busyness) and valence (how
// positive the scene reads). The evolver treats the vector as opaque input
// once it has been validated.
//
// `MoodTargets` is the fixed mapping from mood to music. All constants live
// here and are deliberately simple so they can be tuned in one place:
//
//   mean pitch      = 55 + 24 * brightness        (G3 .. G5)
//   mean duration   = 2.0 - 1.5 * energy beats    (half note .. eighth note)
//   velocity        = 60 + 50 * energy            (mp .. ff)
//   scale           = C major if valence >= 0.5, else C natural minor
//   pitch window    = mean pitch +/- 12 semitones, clamped to MIDI range

use crate::error::InvalidInputError;
use crate::note::MIDI_MAX;
use crate::scale::ScaleInstance;
use serde::{Deserialize, Serialize};

pub const PITCH_BASE: f64 = 55.0;
pub const PITCH_SPAN: f64 = 24.0;
pub const DURATION_SLOWEST_BEATS: f64 = 2.0;
pub const DURATION_SPAN_BEATS: f64 = 1.5;
pub const VELOCITY_BASE: f64 = 60.0;
pub const VELOCITY_SPAN: f64 = 50.0;
pub const MAJOR_VALENCE_THRESHOLD: f64 = 0.5;
pub const PITCH_WINDOW: u8 = 12;

/// Mood summary of one image. All components must be finite and in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub brightness: f64,
    pub energy: f64,
    pub valence: f64,
}

impl FeatureVector {
    pub const DIMENSIONS: usize = 3;
    pub const NAMES: [&'static str; 3] = ["brightness", "energy", "valence"];

    /// Build and validate a feature vector.
    pub fn new(brightness: f64, energy: f64, valence: f64) -> Result<Self, InvalidInputError> {
        let fv = FeatureVector {
            brightness,
            energy,
            valence,
        };
        fv.validate()?;
        Ok(fv)
    }

    /// Accept the raw tuple emitted by image analysis, in
    /// `[brightness, energy, valence]` order.
    pub fn from_slice(values: &[f64]) -> Result<Self, InvalidInputError> {
        match values {
            &[brightness, energy, valence] => FeatureVector::new(brightness, energy, valence),
            _ => Err(InvalidInputError::Dimensionality {
                expected: Self::DIMENSIONS,
                actual: values.len(),
            }),
        }
    }

    pub fn as_array(&self) -> [f64; 3] {
        [self.brightness, self.energy, self.valence]
    }

    /// Check every component is finite and inside [0, 1].
    pub fn validate(&self) -> Result<(), InvalidInputError> {
        for (name, value) in Self::NAMES.into_iter().zip(self.as_array()) {
            if !value.is_finite() {
                return Err(InvalidInputError::NotFinite { name });
            }
            if !(0.0..=1.0).contains(&value) {
                return Err(InvalidInputError::OutOfRange { name, value });
            }
        }
        Ok(())
    }
}

/// Musical statistics the evolver steers toward for a given mood.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoodTargets {
    pub mean_pitch: f64,
    pub mean_duration_beats: f64,
    pub velocity: f64,
    pub scale: ScaleInstance,
    /// Lowest pitch the operators may draw.
    pub pitch_low: u8,
    /// Highest pitch the operators may draw.
    pub pitch_high: u8,
}

impl MoodTargets {
    /// Apply the fixed mood mapping. Expects a validated vector.
    pub fn from_features(features: &FeatureVector) -> Self {
        let mean_pitch = PITCH_BASE + PITCH_SPAN * features.brightness;
        let mean_duration_beats = DURATION_SLOWEST_BEATS - DURATION_SPAN_BEATS * features.energy;
        let velocity = VELOCITY_BASE + VELOCITY_SPAN * features.energy;
        let scale = if features.valence >= MAJOR_VALENCE_THRESHOLD {
            ScaleInstance::c_major()
        } else {
            ScaleInstance::c_minor()
        };

        let center = mean_pitch.round().clamp(0.0, MIDI_MAX as f64) as u8;
        MoodTargets {
            mean_pitch,
            mean_duration_beats,
            velocity,
            scale,
            pitch_low: center.saturating_sub(PITCH_WINDOW),
            pitch_high: center.saturating_add(PITCH_WINDOW).min(MIDI_MAX),
        }
    }

    /// In-scale pitches inside the mood window.
    pub fn candidate_pitches(&self) -> Vec<u8> {
        self.scale.pitches_in_range(self.pitch_low, self.pitch_high)
    }

    pub fn target_velocity(&self) -> u8 {
        self.velocity.round().clamp(0.0, MIDI_MAX as f64) as u8
    }
}
