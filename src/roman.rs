//! Roman-numeral chord construction.
//!
//! Each numeral maps to its named chord factors (`"1"` root, `"3"` third,
//! `"5"` fifth, `"7"` seventh) as pitch classes relative to the tonic, so `V`
//! in any key is `{7, 11, 2}` before voicing.

use crate::error::{HarmtexError, Result};
use crate::harmony::{Chord, Harmony, Pitch};

type Factors = &'static [(&'static str, i32)];

/// Factor table, root first.
const ROMAN_NUMERALS: &[(&str, Factors)] = &[
    ("I", &[("1", 0), ("3", 4), ("5", 7)]),
    ("i", &[("1", 0), ("3", 3), ("5", 7)]),
    ("iio7", &[("1", 2), ("3", 5), ("5", 8), ("7", 0)]),
    ("N", &[("1", 1), ("3", 5), ("5", 8)]),
    ("iv", &[("1", 5), ("3", 8), ("5", 0)]),
    ("IV", &[("1", 5), ("3", 9), ("5", 0)]),
    ("V7", &[("1", 7), ("3", 11), ("5", 2), ("7", 5)]),
    ("V", &[("1", 7), ("3", 11), ("5", 2)]),
];

fn lookup(numeral: &str) -> Result<Factors> {
    ROMAN_NUMERALS
        .iter()
        .find(|(name, _)| *name == numeral)
        .map(|(_, factors)| *factors)
        .ok_or_else(|| HarmtexError::UnknownRomanNumeral(numeral.to_string()))
}

/// Every numeral the table knows, in table order.
pub fn roman_numerals() -> impl Iterator<Item = &'static str> {
    ROMAN_NUMERALS.iter().map(|(name, _)| *name)
}

impl Chord {
    /// Close-position voicing of a roman numeral.
    ///
    /// The factor list is rotated left by `inversion` so the new bass comes
    /// first, placed at `bass + 12 * octave`, and stacked upward using the
    /// rotated wrap-around spacings between factors. `n_notes` defaults to
    /// the number of factors; larger values keep cycling the spacings, which
    /// doubles factors in higher octaves.
    ///
    /// ```rust
    /// use harmtex::{Chord, Pitch};
    ///
    /// let first_inversion = Chord::from_roman_numeral("I", 1, 0, None).unwrap();
    /// assert_eq!(first_inversion, Chord::from_numbers([4, 7, 12]));
    /// assert_eq!(first_inversion.lowest(), Some(Pitch(4)));
    /// ```
    pub fn from_roman_numeral(
        numeral: &str,
        inversion: usize,
        octave: i32,
        n_notes: Option<usize>,
    ) -> Result<Chord> {
        let factors: Vec<i32> = lookup(numeral)?.iter().map(|&(_, pc)| pc).collect();
        let count = factors.len();
        let mut spacings: Vec<i32> = (0..count)
            .map(|i| (factors[(i + 1) % count] - factors[i]).rem_euclid(12))
            .collect();

        let mut rotated = factors;
        rotated.rotate_left(inversion % count);
        spacings.rotate_left(inversion % count);

        let mut current = rotated[0] + 12 * octave;
        let mut pitches = Vec::new();
        for k in 0..n_notes.unwrap_or(count) {
            pitches.push(Pitch(current));
            current += spacings[k % count];
        }
        Ok(Chord::new(pitches))
    }
}

impl Harmony {
    /// One voice per factor label; `"-"` is a silent voice.
    ///
    /// ```rust
    /// use harmtex::{Chord, Harmony};
    ///
    /// let block = Harmony::from_roman_numeral("V", &["1", "-", "3", "5"], -1).unwrap();
    /// assert_eq!(block.chords()[0], Chord::from_numbers([-5]));
    /// assert!(block.chords()[1].is_empty());
    /// assert_eq!(block.chords()[3], Chord::from_numbers([-10]));
    /// ```
    pub fn from_roman_numeral(numeral: &str, voices: &[&str], octave: i32) -> Result<Harmony> {
        let factors = lookup(numeral)?;
        voices
            .iter()
            .map(|&label| {
                if label == "-" {
                    return Ok(Chord::default());
                }
                factors
                    .iter()
                    .find(|(name, _)| *name == label)
                    .map(|&(_, pc)| Chord::from_single(Pitch(pc + 12 * octave)))
                    .ok_or_else(|| HarmtexError::UnknownChordFactor {
                        numeral: numeral.to_string(),
                        factor: label.to_string(),
                    })
            })
            .collect()
    }
}
