// MIDI output for evolved melodies.
//
// Converts a Melody into a single-track Standard MIDI File: a track name,
// a tempo meta event, then one note-on/note-off pair per note played back
// to back. Velocities are taken from the notes. Sixteenth-note ticks in the
// genome map to 120 MIDI ticks (480 per quarter).
//
// Uses the `midly` crate for MIDI writing.

use crate::error::ExportError;
use crate::note::{MIDI_MAX, Melody, TICKS_PER_BEAT};
use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
    num::{u4, u7, u15, u24, u28},
};
use std::path::Path;

/// Ticks per quarter note in MIDI output.
const TICKS_PER_QUARTER: u16 = 480;

/// MIDI ticks per genome duration tick (one sixteenth).
const MIDI_TICKS_PER_STEP: u32 = TICKS_PER_QUARTER as u32 / TICKS_PER_BEAT as u32;

const TRACK_NAME: &str = "Generated Melody";

/// Slowest tempo whose microseconds-per-quarter still fits a 24-bit field.
const MIN_TEMPO_BPM: u16 = 4;
const MAX_TEMPO_BPM: u16 = 1000;

/// Convert a melody to MIDI and write it to `path`.
pub fn write_midi(melody: &Melody, tempo_bpm: u16, path: &Path) -> Result<(), ExportError> {
    let bytes = encode(melody, tempo_bpm)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Convert a melody to MIDI file bytes.
pub fn encode(melody: &Melody, tempo_bpm: u16) -> Result<Vec<u8>, ExportError> {
    let smf = melody_to_smf(melody, tempo_bpm)?;
    let mut buf = Vec::new();
    smf.write_std(&mut buf)?;
    Ok(buf)
}

/// Convert a melody to an in-memory SMF.
pub fn melody_to_smf(melody: &Melody, tempo_bpm: u16) -> Result<Smf<'static>, ExportError> {
    if melody.is_empty() {
        return Err(ExportError::EmptyMelody);
    }
    if !(MIN_TEMPO_BPM..=MAX_TEMPO_BPM).contains(&tempo_bpm) {
        return Err(ExportError::InvalidTempo(tempo_bpm));
    }

    let channel = u4::new(0);
    let mut track: Track<'static> = Vec::with_capacity(melody.len() * 2 + 3);
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::TrackName(TRACK_NAME.as_bytes())),
    });
    let tempo_microseconds = 60_000_000 / tempo_bpm as u32;
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(tempo_microseconds))),
    });

    for note in &melody.notes {
        let key = u7::new(note.pitch.min(MIDI_MAX));
        track.push(TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOn {
                    key,
                    vel: u7::new(note.velocity.clamp(1, MIDI_MAX)),
                },
            },
        });
        track.push(TrackEvent {
            delta: u28::new(note.duration.ticks() as u32 * MIDI_TICKS_PER_STEP),
            kind: TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOff {
                    key,
                    vel: u7::new(0),
                },
            },
        });
    }

    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });

    let mut smf = Smf::new(Header::new(
        Format::SingleTrack,
        Timing::Metrical(u15::new(TICKS_PER_QUARTER)),
    ));
    smf.tracks.push(track);
    Ok(smf)
}
