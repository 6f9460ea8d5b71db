//! # Tensor Contraction
//!
//! A [`TensorContraction`] binds an index-aligned harmony, texture and
//! instrumentation into one layer of music. Voice `i` plays the hits of
//! `texture[i]`, sounding every pitch of `harmony[i]` on every instrument of
//! `instrumentation[i]`.
//!
//! ## Operators
//! - `a | b` ([`TensorContraction::parallel`]): simultaneous layers. Each
//!   component is stacked, so the result has `a.voices() + b.voices()` voices.
//! - `a - b` ([`TensorContraction::concatenate`]): `b` starts where `a`'s
//!   texture ends. Harmony and instrumentation are stacked, and `b`'s
//!   rhythms are shifted by `a`'s endpoint and appended as new voices.
//! - `pitch + a`: transposes every chord of `a`.
//! - `texture * harmony`: contraction with the default instrumentation.
//!
//! The empty contraction is the identity of both `|` and `-`, which makes
//! left folds ([`parallelization`], [`concatenation`]) the natural way to
//! assemble blocks into phrases and phrases into pieces.
//!
//! ## Length Mismatch
//! Construction truncates all three components to the shortest one and logs a
//! warning. It never pads and never fails.
//!
//! ## Example
//! ```rust
//! use harmtex::*;
//!
//! let texture = Texture::from_single(Rhythm::from_single(Hit::new(time(0, 1), time(1, 4))));
//! let harmony = Harmony::from_single(Chord::from_numbers([60, 64, 67]));
//! let piano = Instrumentation::from_single(Section::from_single(Instrument::new("Piano")));
//!
//! let block = contraction(harmony, texture, piano);
//! let notes = block.ordered_notes();
//!
//! assert_eq!(notes.len(), 3);
//! assert_eq!(notes[0].pitch, Pitch(60));
//! assert_eq!(notes[2].instrument.name(), "Piano");
//! ```

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::ops::{Add, BitOr, Mul, Sub};

use serde::Serialize;

use crate::harmony::{Harmony, Pitch};
use crate::instrument::{Instrument, Instrumentation};
use crate::rhythm::{time_literal, Texture, Time};

/// A fully resolved, playable event.
///
/// Notes order by onset, then pitch, then instrument name, then duration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Note {
    pub pitch: Pitch,
    #[serde(serialize_with = "time_literal::serialize")]
    pub onset: Time,
    #[serde(serialize_with = "time_literal::serialize")]
    pub duration: Time,
    pub instrument: Instrument,
}

impl Note {
    pub fn new(pitch: Pitch, onset: Time, duration: Time, instrument: Instrument) -> Self {
        Self {
            pitch,
            onset,
            duration,
            instrument,
        }
    }

    pub fn start(&self) -> Time {
        self.onset.clone()
    }

    pub fn end(&self) -> Time {
        &self.onset + &self.duration
    }
}

impl Ord for Note {
    fn cmp(&self, other: &Self) -> Ordering {
        self.onset
            .cmp(&other.onset)
            .then_with(|| self.pitch.cmp(&other.pitch))
            .then_with(|| self.instrument.cmp(&other.instrument))
            .then_with(|| self.duration.cmp(&other.duration))
    }
}

impl PartialOrd for Note {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {})",
            self.pitch, self.onset, self.duration, self.instrument
        )
    }
}

/// One layer of music: harmony, texture and instrumentation with the same
/// number of voices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TensorContraction {
    harmony: Harmony,
    texture: Texture,
    instrumentation: Instrumentation,
}

impl TensorContraction {
    /// Contract three components, truncating to the shortest.
    pub fn new(
        mut harmony: Harmony,
        mut texture: Texture,
        mut instrumentation: Instrumentation,
    ) -> Self {
        let voices = harmony.len().min(texture.len()).min(instrumentation.len());
        if harmony.len() != voices || texture.len() != voices || instrumentation.len() != voices {
            log::warn!(
                "Contraction length mismatch (harmony {}, texture {}, instrumentation {}); truncating to {} voices",
                harmony.len(),
                texture.len(),
                instrumentation.len(),
                voices
            );
            harmony.truncate(voices);
            texture.truncate(voices);
            instrumentation.truncate(voices);
        }
        Self {
            harmony,
            texture,
            instrumentation,
        }
    }

    /// Contract with optional components.
    ///
    /// Omitted components are replaced before lengths are compared: a texture
    /// by unit rhythms `(0, 1)`, a harmony by silent chords, an
    /// instrumentation by the default instrument. Replacements take the
    /// length of the shortest supplied component.
    pub fn contract(
        harmony: Option<Harmony>,
        texture: Option<Texture>,
        instrumentation: Option<Instrumentation>,
    ) -> Self {
        let voices = [
            harmony.as_ref().map(Harmony::len),
            texture.as_ref().map(Texture::len),
            instrumentation.as_ref().map(Instrumentation::len),
        ]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(0);

        Self::new(
            harmony.unwrap_or_else(|| Harmony::silent(voices)),
            texture.unwrap_or_else(|| Texture::unit(voices)),
            instrumentation.unwrap_or_else(|| Instrumentation::uniform(voices)),
        )
    }

    pub fn harmony(&self) -> &Harmony {
        &self.harmony
    }

    pub fn texture(&self) -> &Texture {
        &self.texture
    }

    pub fn instrumentation(&self) -> &Instrumentation {
        &self.instrumentation
    }

    pub fn voices(&self) -> usize {
        self.texture.len()
    }

    pub fn is_empty(&self) -> bool {
        self.harmony.is_empty() && self.texture.is_empty() && self.instrumentation.is_empty()
    }

    /// End of the texture; where a following block would start.
    pub fn endpoint(&self) -> Time {
        self.texture.endpoint()
    }

    /// Simultaneous layering (`|`).
    pub fn parallel(self, other: TensorContraction) -> TensorContraction {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        Self {
            harmony: self.harmony + other.harmony,
            texture: self.texture + other.texture,
            instrumentation: self.instrumentation + other.instrumentation,
        }
    }

    /// Sequential joining (`-`): `other` starts at this contraction's endpoint.
    pub fn concatenate(self, other: TensorContraction) -> TensorContraction {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        Self {
            harmony: self.harmony + other.harmony,
            texture: self.texture - other.texture,
            instrumentation: self.instrumentation + other.instrumentation,
        }
    }

    pub fn transpose(&self, offset: Pitch) -> TensorContraction {
        Self {
            harmony: self.harmony.transpose(offset),
            texture: self.texture.clone(),
            instrumentation: self.instrumentation.clone(),
        }
    }

    /// Every (hit, pitch, instrument) combination of every voice.
    ///
    /// Identical notes produced by different voices collapse into one. A
    /// voice with an empty chord or section yields nothing.
    pub fn notes(&self) -> BTreeSet<Note> {
        let voices = self
            .texture
            .rhythms()
            .iter()
            .zip(self.harmony.chords())
            .zip(self.instrumentation.sections());

        let mut notes = BTreeSet::new();
        for ((rhythm, chord), section) in voices {
            for hit in rhythm.hits() {
                for &pitch in chord.pitches() {
                    for instrument in section.instruments() {
                        notes.insert(Note::new(
                            pitch,
                            hit.onset.clone(),
                            hit.duration.clone(),
                            instrument.clone(),
                        ));
                    }
                }
            }
        }
        notes
    }

    /// [`notes`](Self::notes) sorted by onset, then pitch.
    pub fn ordered_notes(&self) -> Vec<Note> {
        self.notes().into_iter().collect()
    }
}

impl BitOr for TensorContraction {
    type Output = TensorContraction;

    fn bitor(self, other: TensorContraction) -> TensorContraction {
        self.parallel(other)
    }
}

impl Sub for TensorContraction {
    type Output = TensorContraction;

    fn sub(self, other: TensorContraction) -> TensorContraction {
        self.concatenate(other)
    }
}

impl Add<TensorContraction> for Pitch {
    type Output = TensorContraction;

    fn add(self, contraction: TensorContraction) -> TensorContraction {
        contraction.transpose(self)
    }
}

impl Add<Pitch> for TensorContraction {
    type Output = TensorContraction;

    fn add(self, offset: Pitch) -> TensorContraction {
        self.transpose(offset)
    }
}

impl Mul<Harmony> for Texture {
    type Output = TensorContraction;

    fn mul(self, harmony: Harmony) -> TensorContraction {
        TensorContraction::contract(Some(harmony), Some(self), None)
    }
}

impl Mul<Texture> for Harmony {
    type Output = TensorContraction;

    fn mul(self, texture: Texture) -> TensorContraction {
        TensorContraction::contract(Some(self), Some(texture), None)
    }
}

/// Contract a harmony, texture and instrumentation.
pub fn contraction(
    harmony: Harmony,
    texture: Texture,
    instrumentation: Instrumentation,
) -> TensorContraction {
    TensorContraction::new(harmony, texture, instrumentation)
}

/// Left fold with `|`, starting from the empty contraction.
pub fn parallelization(
    contractions: impl IntoIterator<Item = TensorContraction>,
) -> TensorContraction {
    contractions
        .into_iter()
        .fold(TensorContraction::default(), TensorContraction::parallel)
}

/// Left fold with `-`, starting from the empty contraction.
pub fn concatenation(
    contractions: impl IntoIterator<Item = TensorContraction>,
) -> TensorContraction {
    contractions
        .into_iter()
        .fold(TensorContraction::default(), TensorContraction::concatenate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harmony::Chord;
    use crate::instrument::Section;
    use crate::rhythm::{time, Hit, Rhythm};

    fn hit(onset: &str, duration: &str) -> Hit {
        Hit::parse(onset, duration).unwrap()
    }

    fn section(names: &[&str]) -> Section {
        names.iter().map(|&n| Instrument::new(n)).collect()
    }

    fn block(onset: &str, duration: &str, pitch: i32) -> TensorContraction {
        contraction(
            Harmony::from_single(Chord::from_numbers([pitch])),
            Texture::from_single(Rhythm::from_single(hit(onset, duration))),
            Instrumentation::uniform(1),
        )
    }

    #[test]
    fn test_end_to_end_triad() {
        let tc = contraction(
            Harmony::from_single(Chord::from_numbers([60, 64, 67])),
            Texture::from_single(Rhythm::from_single(hit("0", "1/4"))),
            Instrumentation::from_single(section(&["Piano"])),
        );
        let expected: Vec<Note> = [60, 64, 67]
            .iter()
            .map(|&p| Note::new(Pitch(p), time(0, 1), time(1, 4), Instrument::new("Piano")))
            .collect();
        assert_eq!(tc.ordered_notes(), expected);
    }

    #[test]
    fn test_notes_cross_product_per_voice() {
        let tc = contraction(
            Harmony::from_single(Chord::from_numbers([60, 64])),
            Texture::from_single(Rhythm::from_single(hit("0", "1/8"))),
            Instrumentation::from_single(section(&["Violin", "Viola", "Cello"])),
        );
        assert_eq!(tc.notes().len(), 6);
    }

    #[test]
    fn test_notes_with_two_voices() {
        let harmony = Harmony::new(vec![Chord::from_numbers([60]), Chord::from_numbers([64, 67])]);
        let texture = Texture::new(vec![
            Rhythm::from_single(hit("0/8", "1/8")),
            Rhythm::new([hit("1/8", "1/8"), hit("2/8", "1/8")]),
        ]);
        assert_eq!(contraction(harmony.clone(), texture.clone(), Instrumentation::uniform(2)).notes().len(), 5);

        let instrumentation = Instrumentation::new(vec![section(&["Tuba"]), section(&["French Horn", "Trumpet"])]);
        assert_eq!(contraction(harmony, texture, instrumentation).notes().len(), 9);
    }

    #[test]
    fn test_identical_notes_from_different_voices_collapse() {
        let tc = block("0", "1/4", 60) | block("0", "1/4", 60);
        assert_eq!(tc.voices(), 2);
        assert_eq!(tc.notes().len(), 1);
    }

    #[test]
    fn test_empty_chord_or_section_is_a_rest() {
        let tc = contraction(
            Harmony::new(vec![Chord::default(), Chord::from_numbers([60])]),
            Texture::new(vec![Rhythm::unit(), Rhythm::unit()]),
            Instrumentation::new(vec![section(&["Flute"]), Section::default()]),
        );
        assert!(tc.notes().is_empty());
    }

    #[test]
    fn test_mismatch_truncates_to_shortest() {
        let tc = contraction(
            Harmony::from_chord(&Chord::from_numbers([0, 4, 7])),
            Texture::new(vec![Rhythm::unit(), Rhythm::unit()]),
            Instrumentation::uniform(5),
        );
        assert_eq!(tc.harmony().len(), 2);
        assert_eq!(tc.texture().len(), 2);
        assert_eq!(tc.instrumentation().len(), 2);
        assert_eq!(tc.harmony().chords()[1], Chord::from_numbers([4]));
    }

    #[test]
    fn test_contract_defaults() {
        let tc = TensorContraction::contract(Some(Harmony::from_chord(&Chord::from_numbers([0, 7]))), None, None);
        assert_eq!(tc.texture(), &Texture::unit(2));
        assert_eq!(tc.instrumentation(), &Instrumentation::uniform(2));

        let silent = TensorContraction::contract(None, Some(Texture::unit(3)), None);
        assert_eq!(silent.voices(), 3);
        assert!(silent.notes().is_empty());

        assert!(TensorContraction::contract(None, None, None).is_empty());
    }

    #[test]
    fn test_texture_times_harmony_uses_default_instrument() {
        let tc = Texture::unit(3) * Harmony::from_chord(&Chord::from_numbers([0, 4, 7]));
        assert_eq!(tc.voices(), 3);
        assert!(tc.notes().iter().all(|n| n.instrument == Instrument::default()));
        assert_eq!(tc, Harmony::from_chord(&Chord::from_numbers([0, 4, 7])) * Texture::unit(3));
    }

    #[test]
    fn test_parallel_identity() {
        let x = block("0", "1/4", 60);
        assert_eq!(TensorContraction::default() | x.clone(), x);
        assert_eq!(x.clone() | TensorContraction::default(), x);
    }

    #[test]
    fn test_concatenate_identity() {
        let x = block("1/8", "1/4", 60);
        assert_eq!(TensorContraction::default() - x.clone(), x);
        assert_eq!(x.clone() - TensorContraction::default(), x);
    }

    #[test]
    fn test_parallel_associative() {
        let (a, b, c) = (block("0", "1/4", 60), block("1/8", "1/8", 64), block("0", "1/2", 67));
        assert_eq!((a.clone() | b.clone()) | c.clone(), a | (b | c));
    }

    #[test]
    fn test_concatenate_associative() {
        let (a, b, c) = (block("0", "1/4", 60), block("1/8", "1/8", 64), block("-1/8", "1/2", 67));
        assert_eq!((a.clone() - b.clone()) - c.clone(), a - (b - c));
    }

    #[test]
    fn test_endpoint_additivity() {
        let (a, b) = (block("0", "1/4", 60), block("0", "3/8", 64));
        assert_eq!((a.clone() - b.clone()).endpoint(), a.endpoint() + b.endpoint());
    }

    #[test]
    fn test_voice_counts_add() {
        let a = Texture::unit(2) * Harmony::silent(2);
        let b = Texture::unit(3) * Harmony::silent(3);
        assert_eq!((a.clone() | b.clone()).voices(), 5);
        assert_eq!((a - b).voices(), 5);
    }

    #[test]
    fn test_concatenate_shifts_second_operand() {
        let a = block("0", "3/8", 60);
        let b = contraction(
            Harmony::from_single(Chord::from_numbers([62])),
            Texture::from_single(Rhythm::new([hit("0", "1/8"), hit("1/4", "1/8")])),
            Instrumentation::uniform(1),
        );
        let joined = a.clone() - b.clone();
        assert_eq!(joined.texture().rhythms()[1], b.texture().rhythms()[0].shift(&a.endpoint()));

        let onsets: Vec<Time> = joined.ordered_notes().iter().map(Note::start).collect();
        assert_eq!(onsets, vec![time(0, 1), time(3, 8), time(5, 8)]);
    }

    #[test]
    fn test_transposition() {
        let x = block("0", "1/4", 0);
        let moved = Pitch(60) + x.clone();
        assert_eq!(moved.harmony().chords()[0], Chord::from_single(Pitch(60)));
        assert_eq!(moved.texture(), x.texture());
        assert_eq!(x + Pitch(-5), block("0", "1/4", -5));
    }

    #[test]
    fn test_ordered_notes_tie_breaks() {
        let tc = contraction(
            Harmony::new(vec![Chord::from_numbers([64]), Chord::from_numbers([60])]),
            Texture::new(vec![
                Rhythm::from_single(hit("0", "1/4")),
                Rhythm::new([hit("0", "1/2"), hit("0", "1/4")]),
            ]),
            Instrumentation::new(vec![section(&["Violin"]), section(&["Viola", "Cello"])]),
        );
        let notes = tc.ordered_notes();
        let keys: Vec<(i32, &str, Time)> = notes
            .iter()
            .map(|n| (n.pitch.number(), n.instrument.name(), n.duration.clone()))
            .collect();
        assert_eq!(
            keys,
            vec![
                (60, "Cello", time(1, 4)),
                (60, "Cello", time(1, 2)),
                (60, "Viola", time(1, 4)),
                (60, "Viola", time(1, 2)),
                (64, "Violin", time(1, 4)),
            ]
        );
    }

    #[test]
    fn test_folds() {
        let blocks = vec![block("0", "1/4", 60), block("0", "1/4", 62), block("0", "1/4", 64)];
        let melody = concatenation(blocks.clone());
        assert_eq!(melody.endpoint(), time(3, 4));
        assert_eq!(melody.notes().len(), 3);

        let cluster = parallelization(blocks);
        assert_eq!(cluster.endpoint(), time(1, 4));
        assert_eq!(cluster.voices(), 3);

        assert!(concatenation(Vec::new()).is_empty());
    }
}
