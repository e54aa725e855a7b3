// Note and melody representation: the genome and its export contract.
//
// A `Melody` is an ordered list of `Note`s. Each note carries a MIDI pitch,
// a duration (a positive rational beat count stored as sixteenth-note
// ticks), and a MIDI velocity. This is the value handed to MIDI export and
// audition; the evolver never stores anything else in a genome.
//
// The statistics on `Melody` (mean pitch, mean duration, duration spread)
// are what fitness.rs compares against mood targets.

use serde::{Deserialize, Serialize};

/// Highest valid MIDI pitch and velocity.
pub const MIDI_MAX: u8 = 127;

/// Duration resolution: sixteenth notes.
pub const TICKS_PER_BEAT: u16 = 4;

/// A positive note length in sixteenth-note ticks (4 ticks = 1 beat).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct Duration(u16);

impl Duration {
    pub const SIXTEENTH: Duration = Duration(1);
    pub const EIGHTH: Duration = Duration(2);
    pub const DOTTED_EIGHTH: Duration = Duration(3);
    pub const QUARTER: Duration = Duration(4);
    pub const DOTTED_QUARTER: Duration = Duration(6);
    pub const HALF: Duration = Duration(8);

    /// The durations the evolver draws from, shortest first.
    pub const PALETTE: [Duration; 6] = [
        Duration::SIXTEENTH,
        Duration::EIGHTH,
        Duration::DOTTED_EIGHTH,
        Duration::QUARTER,
        Duration::DOTTED_QUARTER,
        Duration::HALF,
    ];

    /// `None` for a zero-length duration.
    pub fn from_ticks(ticks: u16) -> Option<Self> {
        (ticks > 0).then_some(Duration(ticks))
    }

    pub fn ticks(self) -> u16 {
        self.0
    }

    pub fn beats(self) -> f64 {
        self.0 as f64 / TICKS_PER_BEAT as f64
    }
}

impl TryFrom<u16> for Duration {
    type Error = &'static str;

    fn try_from(ticks: u16) -> Result<Self, Self::Error> {
        Duration::from_ticks(ticks).ok_or("duration must be at least one tick")
    }
}

impl From<Duration> for u16 {
    fn from(d: Duration) -> u16 {
        d.0
    }
}

/// One melody note. Immutable once built; operators replace whole notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Note {
    /// MIDI pitch, 0-127.
    pub pitch: u8,
    pub duration: Duration,
    /// MIDI velocity, 0-127.
    pub velocity: u8,
}

impl Note {
    /// Build a note, clamping pitch and velocity into MIDI range.
    pub fn new(pitch: u8, duration: Duration, velocity: u8) -> Self {
        Note {
            pitch: pitch.min(MIDI_MAX),
            duration,
            velocity: velocity.min(MIDI_MAX),
        }
    }

    pub fn with_pitch(self, pitch: u8) -> Self {
        Note::new(pitch, self.duration, self.velocity)
    }

    pub fn with_duration(self, duration: Duration) -> Self {
        Note { duration, ..self }
    }

    pub fn with_velocity(self, velocity: u8) -> Self {
        Note::new(self.pitch, self.duration, velocity)
    }

    /// True when every field is inside its MIDI/positive range.
    pub fn is_valid(&self) -> bool {
        self.pitch <= MIDI_MAX && self.velocity <= MIDI_MAX && self.duration.ticks() > 0
    }
}

/// An ordered sequence of notes: one genome.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Melody {
    pub notes: Vec<Note>,
}

impl Melody {
    pub fn new(notes: Vec<Note>) -> Self {
        Melody { notes }
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn pitches(&self) -> impl Iterator<Item = u8> + '_ {
        self.notes.iter().map(|n| n.pitch)
    }

    /// Mean MIDI pitch, or 0.0 for an empty melody.
    pub fn mean_pitch(&self) -> f64 {
        mean(self.notes.iter().map(|n| n.pitch as f64))
    }

    /// Mean note length in beats.
    pub fn mean_duration_beats(&self) -> f64 {
        mean(self.notes.iter().map(|n| n.duration.beats()))
    }

    /// Population standard deviation of note lengths, in beats.
    pub fn duration_std_dev(&self) -> f64 {
        if self.notes.is_empty() {
            return 0.0;
        }
        let m = self.mean_duration_beats();
        let var = mean(self.notes.iter().map(|n| {
            let d = n.duration.beats() - m;
            d * d
        }));
        var.sqrt()
    }

    pub fn mean_velocity(&self) -> f64 {
        mean(self.notes.iter().map(|n| n.velocity as f64))
    }

    /// Total length of the melody in beats.
    pub fn total_beats(&self) -> f64 {
        self.notes.iter().map(|n| n.duration.beats()).sum()
    }

    /// Note names, e.g. `["C4", "E4", "G4"]`.
    pub fn pitch_names(&self) -> Vec<String> {
        self.pitches().map(pitch_name).collect()
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

/// Convert a MIDI pitch to a compact note name (e.g., "C4", "F#3").
pub fn pitch_name(pitch: u8) -> String {
    const NAMES: [&str; 12] = ["C", "C#", "D", "Eb", "E", "F", "F#", "G", "Ab", "A", "Bb", "B"];
    if pitch > MIDI_MAX {
        return "??".to_string();
    }
    let octave = pitch as i16 / 12 - 1;
    format!("{}{}", NAMES[(pitch % 12) as usize], octave)
}

/// Melodic interval helpers.
pub mod interval {
    /// Signed distance in semitones; positive when `to` is higher.
    pub fn semitones(from: u8, to: u8) -> i16 {
        to as i16 - from as i16
    }

    /// How singable a melodic interval is, in [0, 1].
    ///
    /// Steps score highest, then thirds, perfect fourths/fifths, sixths and
    /// the octave. Tritones, sevenths and anything wider than an octave score
    /// zero or close to it.
    pub fn melodic_quality(semitones: i16) -> f64 {
        match semitones.unsigned_abs() {
            1 | 2 => 1.0,
            3 | 4 => 0.8,
            0 => 0.6,
            5 | 7 => 0.6,
            12 => 0.5,
            8 | 9 => 0.4,
            10 | 11 => 0.1,
            _ => 0.0, // tritone, or wider than an octave
        }
    }
}
