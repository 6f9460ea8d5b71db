//! # Harmonic Tensors
//!
//! Pitch half of the algebra: a [`Pitch`] is a semitone number, a [`Chord`]
//! is the set of pitches sounding in one voice, and a [`Harmony`] is the
//! ordered list of chords, one per voice, index-aligned with a texture.
//!
//! Pitches are not clamped here. They may go negative or past 127 while a
//! piece is being assembled around pitch-class 0 and are only clamped when
//! written to MIDI.
//!
//! Adding a pitch to a chord or harmony transposes it:
//!
//! ```rust
//! use harmtex::{Chord, Harmony, Pitch};
//!
//! let triad = Harmony::from_chord(&Chord::from_numbers([0, 4, 7]));
//! let c_major = Pitch(60) + triad;
//!
//! assert_eq!(c_major.chords()[2], Chord::from_numbers([67]));
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::ops::Add;

use serde::{Deserialize, Serialize};

use crate::error::{HarmtexError, Result};

const PITCH_CLASS_NAMES: [&str; 12] = [
    "C", "C#", "D", "Eb", "E", "F", "F#", "G", "Ab", "A", "Bb", "B",
];

/// Semitone number; 60 is middle C when rendered to MIDI.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Pitch(pub i32);

impl Pitch {
    pub fn number(&self) -> i32 {
        self.0
    }

    /// Scientific pitch name, e.g. `60` -> `"C4"`, `63` -> `"Eb4"`.
    pub fn note_name(&self) -> String {
        let chroma = self.0.rem_euclid(12) as usize;
        let octave = self.0.div_euclid(12) - 1;
        format!("{}{}", PITCH_CLASS_NAMES[chroma], octave)
    }
}

impl From<i32> for Pitch {
    fn from(number: i32) -> Self {
        Pitch(number)
    }
}

impl Add for Pitch {
    type Output = Pitch;

    fn add(self, other: Pitch) -> Pitch {
        Pitch(self.0 + other.0)
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Deduplicated set of pitches sounding together in one voice.
///
/// An empty chord is a rest: it contributes no notes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Chord {
    pitches: BTreeSet<Pitch>,
}

impl Chord {
    pub fn new(pitches: impl IntoIterator<Item = Pitch>) -> Self {
        Self {
            pitches: pitches.into_iter().collect(),
        }
    }

    pub fn from_single(pitch: Pitch) -> Self {
        Self::new([pitch])
    }

    pub fn from_numbers(numbers: impl IntoIterator<Item = i32>) -> Self {
        Self::new(numbers.into_iter().map(Pitch))
    }

    /// Pitches in ascending order.
    pub fn pitches(&self) -> impl Iterator<Item = &Pitch> {
        self.pitches.iter()
    }

    pub fn len(&self) -> usize {
        self.pitches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pitches.is_empty()
    }

    pub fn contains(&self, pitch: Pitch) -> bool {
        self.pitches.contains(&pitch)
    }

    pub fn lowest(&self) -> Option<Pitch> {
        self.pitches.first().copied()
    }

    pub fn transpose(&self, offset: Pitch) -> Self {
        Self::new(self.pitches.iter().map(|&p| p + offset))
    }

    /// Keep only the pitches at the given ranks (0 = lowest).
    pub fn select(&self, ranks: &[usize]) -> Result<Self> {
        let ordered: Vec<Pitch> = self.pitches.iter().copied().collect();
        ranks
            .iter()
            .map(|&rank| {
                ordered
                    .get(rank)
                    .copied()
                    .ok_or(HarmtexError::VoiceIndexOutOfRange {
                        index: rank,
                        len: ordered.len(),
                    })
            })
            .collect()
    }
}

impl FromIterator<Pitch> for Chord {
    fn from_iter<I: IntoIterator<Item = Pitch>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl Add<Pitch> for Chord {
    type Output = Chord;

    fn add(self, offset: Pitch) -> Chord {
        self.transpose(offset)
    }
}

impl Add<Chord> for Pitch {
    type Output = Chord;

    fn add(self, chord: Chord) -> Chord {
        chord.transpose(self)
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pitches: Vec<String> = self.pitches.iter().map(|p| p.to_string()).collect();
        write!(f, "{{{}}}", pitches.join(", "))
    }
}

/// Ordered chords, one per voice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Harmony {
    chords: Vec<Chord>,
}

impl Harmony {
    pub fn new(chords: Vec<Chord>) -> Self {
        Self { chords }
    }

    pub fn from_single(chord: Chord) -> Self {
        Self::new(vec![chord])
    }

    /// `voices` empty chords.
    pub fn silent(voices: usize) -> Self {
        Self::new(vec![Chord::default(); voices])
    }

    /// One voice per pitch of `chord`, lowest pitch first.
    pub fn from_chord(chord: &Chord) -> Self {
        chord.pitches().map(|&p| Chord::from_single(p)).collect()
    }

    pub fn chords(&self) -> &[Chord] {
        &self.chords
    }

    pub fn len(&self) -> usize {
        self.chords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chords.is_empty()
    }

    pub fn transpose(&self, offset: Pitch) -> Self {
        self.chords.iter().map(|c| c.transpose(offset)).collect()
    }

    /// Append octave doublings of the first `voices` chords.
    ///
    /// Asking for more voices than exist doubles every voice once.
    pub fn extend(&self, voices: usize) -> Self {
        let doublings = self.chords.iter().take(voices).map(|c| c.transpose(Pitch(12)));
        self.chords.iter().cloned().chain(doublings).collect()
    }

    /// Reorder voices: voice `i` of the result is voice `order[i]` of `self`.
    pub fn permute(&self, order: &[usize]) -> Result<Self> {
        order
            .iter()
            .map(|&index| {
                self.chords
                    .get(index)
                    .cloned()
                    .ok_or(HarmtexError::VoiceIndexOutOfRange {
                        index,
                        len: self.chords.len(),
                    })
            })
            .collect()
    }

    pub(crate) fn truncate(&mut self, len: usize) {
        self.chords.truncate(len);
    }
}

impl FromIterator<Chord> for Harmony {
    fn from_iter<I: IntoIterator<Item = Chord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Voice stacking.
impl Add for Harmony {
    type Output = Harmony;

    fn add(mut self, other: Harmony) -> Harmony {
        self.chords.extend(other.chords);
        self
    }
}

impl Add<Pitch> for Harmony {
    type Output = Harmony;

    fn add(self, offset: Pitch) -> Harmony {
        self.transpose(offset)
    }
}

impl Add<Harmony> for Pitch {
    type Output = Harmony;

    fn add(self, harmony: Harmony) -> Harmony {
        harmony.transpose(self)
    }
}

impl fmt::Display for Harmony {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let chords: Vec<String> = self.chords.iter().map(|c| c.to_string()).collect();
        write!(f, "[{}]", chords.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_names() {
        assert_eq!(Pitch(60).note_name(), "C4");
        assert_eq!(Pitch(63).note_name(), "Eb4");
        assert_eq!(Pitch(-1).note_name(), "B-2");
        assert_eq!(Pitch(69).note_name(), "A4");
    }

    #[test]
    fn test_chord_deduplicates() {
        let chord = Chord::new([Pitch(60), Pitch(64), Pitch(60)]);
        assert_eq!(chord.len(), 2);
        assert_eq!(chord, Chord::from_numbers([64, 60]));
    }

    #[test]
    fn test_chord_transpose_both_sides() {
        let chord = Chord::from_numbers([0, 4, 7]);
        assert_eq!(Pitch(60) + chord.clone(), Chord::from_numbers([60, 64, 67]));
        assert_eq!(chord + Pitch(-12), Chord::from_numbers([-12, -8, -5]));
    }

    #[test]
    fn test_chord_select_by_rank() {
        let chord = Chord::from_numbers([7, 0, 4]);
        assert_eq!(chord.select(&[0, 2]).unwrap(), Chord::from_numbers([0, 7]));
        assert!(matches!(
            chord.select(&[3]),
            Err(HarmtexError::VoiceIndexOutOfRange { index: 3, len: 3 })
        ));
    }

    #[test]
    fn test_harmony_from_chord_is_ascending() {
        let harmony = Harmony::from_chord(&Chord::from_numbers([67, 60, 64]));
        assert_eq!(
            harmony.chords(),
            &[
                Chord::from_numbers([60]),
                Chord::from_numbers([64]),
                Chord::from_numbers([67]),
            ]
        );
    }

    #[test]
    fn test_harmony_add_appends_voices() {
        let a = Harmony::from_single(Chord::from_numbers([60]));
        let b = Harmony::new(vec![Chord::from_numbers([64, 67]), Chord::default()]);
        let joined = a + b;
        assert_eq!(joined.len(), 3);
        assert!(joined.chords()[2].is_empty());
    }

    #[test]
    fn test_harmony_extend_doubles_lowest_voices() {
        let harmony = Harmony::from_chord(&Chord::from_numbers([-12, -5, 0, 3])).extend(1);
        assert_eq!(harmony.len(), 5);
        assert_eq!(harmony.chords()[4], Chord::from_numbers([0]));
    }

    #[test]
    fn test_harmony_permute() {
        let harmony = Harmony::from_chord(&Chord::from_numbers([0, 2, 3]));
        let permuted = harmony.permute(&[2, 0, 1]).unwrap();
        assert_eq!(permuted.chords()[0], Chord::from_numbers([3]));
        assert_eq!(permuted.chords()[1], Chord::from_numbers([0]));
        assert!(harmony.permute(&[0, 5]).is_err());
    }

    #[test]
    fn test_harmony_transpose_leaves_rests_silent() {
        let harmony = Harmony::new(vec![Chord::default(), Chord::from_numbers([0])]);
        let moved = Pitch(55) + harmony;
        assert!(moved.chords()[0].is_empty());
        assert_eq!(moved.chords()[1], Chord::from_numbers([55]));
    }
}
