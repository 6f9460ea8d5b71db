// MIDI output for resolved notes.
//
// Writes a Standard MIDI File (format 1): track 0 carries tempo and time
// signature, then one track per distinct instrument, ordered by name, with a
// General MIDI program change. Times are whole-note rationals, so a time `t`
// lands on tick `t * 4 * ticks_per_quarter`.
//
// Uses the `midly` crate for MIDI writing.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use midly::{
    num::{u15, u24, u28, u4, u7},
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
};
use num_traits::{Signed, ToPrimitive};

use crate::compiler::{Score, TimeSignature};
use crate::config::RenderConfig;
use crate::contraction::Note;
use crate::error::Result;
use crate::instrument::Instrument;
use crate::rhythm::{time, Time};

/// Channels available to pitched instruments; channel 10 (index 9) is percussion.
const MELODIC_CHANNELS: [u8; 15] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 10, 11, 12, 13, 14, 15];

/// Wall-clock seconds of `time` at a quarter-note tempo of `bpm`.
pub fn beats_to_seconds(time: &Time, bpm: f64) -> f64 {
    time.to_f64().unwrap_or(f64::NAN) * 240.0 / bpm
}

/// Render a compiled score. Pickup notes (negative onsets down to
/// `-anacrusis`) are moved so the anacrusis starts at tick zero.
pub fn score_to_midi(score: &Score, config: &RenderConfig) -> Result<Vec<u8>> {
    let bpm = config.bpm.unwrap_or_else(|| score.tempo.quarter_bpm());
    let notes = score.contraction.notes();
    render(&notes, -&score.anacrusis, bpm, Some(&score.time_signature), config)
}

/// Render a bare note collection at a quarter-note tempo of `bpm`.
///
/// Everything is shifted so the earliest onset is at tick zero, whether it
/// starts before or after zero.
pub fn notes_to_midi(notes: &BTreeSet<Note>, bpm: f64, config: &RenderConfig) -> Result<Vec<u8>> {
    let origin = notes.iter().map(Note::start).min().unwrap_or_else(|| time(0, 1));
    render(notes, origin, config.bpm.unwrap_or(bpm), None, config)
}

/// Render a score and write it to `path`.
pub fn write_midi(score: &Score, config: &RenderConfig, path: impl AsRef<Path>) -> Result<()> {
    let bytes = score_to_midi(score, config)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

fn render(
    notes: &BTreeSet<Note>,
    origin: Time,
    bpm: f64,
    time_signature: Option<&TimeSignature>,
    config: &RenderConfig,
) -> Result<Vec<u8>> {
    let ticks_per_quarter = config.ticks_per_quarter.clamp(1, 0x7FFF);
    let mut smf = Smf::new(Header::new(
        Format::Parallel,
        Timing::Metrical(u15::new(ticks_per_quarter)),
    ));
    smf.tracks.push(tempo_track(bpm, time_signature));

    let mut by_instrument: BTreeMap<&Instrument, Vec<&Note>> = BTreeMap::new();
    for note in notes {
        by_instrument.entry(&note.instrument).or_default().push(note);
    }

    let velocity = u7::new(config.velocity.clamp(1, 127));
    for (index, (instrument, notes)) in by_instrument.into_iter().enumerate() {
        let channel = u4::new(MELODIC_CHANNELS[index % MELODIC_CHANNELS.len()]);
        if index >= MELODIC_CHANNELS.len() {
            log::warn!(
                "'{}' reuses MIDI channel {}; its program change overrides an earlier track",
                instrument,
                channel.as_int()
            );
        }
        let program = u7::new(instrument.program()?);
        let mut track: Track = vec![
            TrackEvent {
                delta: u28::new(0),
                kind: TrackEventKind::Meta(MetaMessage::TrackName(instrument.name().as_bytes())),
            },
            TrackEvent {
                delta: u28::new(0),
                kind: TrackEventKind::Midi {
                    channel,
                    message: MidiMessage::ProgramChange { program },
                },
            },
        ];

        // (tick, is_note_on, key): offs sort before ons at the same tick
        let mut events: Vec<(u32, bool, u8)> = Vec::with_capacity(notes.len() * 2);
        for note in notes {
            let start = to_ticks(&(&note.onset - &origin), ticks_per_quarter);
            let end = to_ticks(&(note.end() - &origin), ticks_per_quarter);
            if end <= start {
                log::debug!("Skipping zero-length note {}", note);
                continue;
            }
            let key = note.pitch.number().clamp(0, 127) as u8;
            events.push((start, true, key));
            events.push((end, false, key));
        }
        events.sort_unstable();

        let mut last_tick = 0;
        for (tick, is_on, key) in events {
            let message = if is_on {
                MidiMessage::NoteOn { key: u7::new(key), vel: velocity }
            } else {
                MidiMessage::NoteOff { key: u7::new(key), vel: u7::new(0) }
            };
            track.push(TrackEvent {
                delta: u28::new(tick - last_tick),
                kind: TrackEventKind::Midi { channel, message },
            });
            last_tick = tick;
        }
        track.push(end_of_track());
        smf.tracks.push(track);
    }

    let mut buf = Vec::new();
    smf.write_std(&mut buf)?;
    Ok(buf)
}

fn tempo_track(bpm: f64, time_signature: Option<&TimeSignature>) -> Track<'static> {
    let micros_per_quarter = (60_000_000.0 / bpm).round().clamp(1.0, 16_777_215.0) as u32;
    let mut track = vec![TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(micros_per_quarter))),
    }];
    if let Some(signature) = time_signature {
        track.push(TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::TimeSignature(
                signature.numerator.min(255) as u8,
                signature.denominator.max(1).trailing_zeros() as u8,
                24,
                8,
            )),
        });
    }
    track.push(end_of_track());
    track
}

fn end_of_track() -> TrackEvent<'static> {
    TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    }
}

fn to_ticks(at: &Time, ticks_per_quarter: u16) -> u32 {
    let ticks = (at * time(4 * i64::from(ticks_per_quarter), 1)).round().to_integer();
    match ticks.to_u32() {
        Some(ticks) => ticks,
        None if ticks.is_negative() => 0,
        None => u32::MAX,
    }
}
