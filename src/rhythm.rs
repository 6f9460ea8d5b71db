//! # Rhythmic Tensors
//!
//! Timing half of the algebra: a [`Hit`] is one onset/duration pair, a
//! [`Rhythm`] is the set of hits of one voice, and a [`Texture`] is the ordered
//! list of rhythms, one per voice.
//!
//! ## Time Unit
//! All times are exact [`Time`] rationals measured in whole notes, so a
//! quarter note lasts `1/4`. Onsets may be negative (pickup notes).
//! Numerators and denominators are arbitrary precision, so sums of times
//! with large coprime denominators never overflow.
//!
//! ## Texture Algebra
//! - `a + b` stacks voices: `a.rhythms ++ b.rhythms`, no time shift.
//! - `a - b` plays `b` after `a`: every rhythm of `b` is shifted by
//!   `a.endpoint()` and appended as a *new* voice. Voices are never merged by
//!   index.
//!
//! ```rust
//! use harmtex::{time, Hit, Rhythm, Texture};
//!
//! let bar = Texture::new(vec![Rhythm::from_single(Hit::new(time(0, 1), time(1, 4)))]);
//! let two_bars = bar.clone() - bar;
//!
//! assert_eq!(two_bars.len(), 2);
//! assert_eq!(two_bars.endpoint(), time(1, 2));
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::ops::{Add, Sub};

use num_rational::BigRational;
use serde::{Deserialize, Serialize};

use crate::error::{HarmtexError, Result};

/// Exact onset/duration value, in whole notes.
pub type Time = BigRational;

/// Shorthand for `numer / denom` as a [`Time`].
///
/// Panics if `denom` is zero; use [`parse_time`] for untrusted input.
pub fn time(numer: i64, denom: i64) -> Time {
    Time::new(numer.into(), denom.into())
}

/// Parse a rational literal such as `"3/8"`, `"-1/8"` or `"2"`.
pub fn parse_time(literal: &str) -> Result<Time> {
    literal
        .trim()
        .parse::<Time>()
        .map_err(|_| HarmtexError::InvalidTime(literal.to_string()))
}

/// Serde adapter writing a [`Time`] as its `"n/d"` literal.
pub(crate) mod time_literal {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::Time;

    pub fn serialize<S: Serializer>(time: &Time, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(time)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Time, D::Error> {
        let literal = String::deserialize(deserializer)?;
        super::parse_time(&literal).map_err(serde::de::Error::custom)
    }
}

/// A single rhythmic event: when a voice starts sounding and for how long.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Hit {
    #[serde(with = "time_literal")]
    pub onset: Time,
    #[serde(with = "time_literal")]
    pub duration: Time,
}

impl Hit {
    pub fn new(onset: Time, duration: Time) -> Self {
        Self { onset, duration }
    }

    /// Build a hit from two rational literals, e.g. `Hit::parse("1/8", "1/8")`.
    pub fn parse(onset: &str, duration: &str) -> Result<Self> {
        Ok(Self::new(parse_time(onset)?, parse_time(duration)?))
    }

    pub fn end(&self) -> Time {
        &self.onset + &self.duration
    }

    pub fn shift(&self, offset: &Time) -> Self {
        Self::new(&self.onset + offset, self.duration.clone())
    }
}

impl fmt::Display for Hit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.onset, self.duration)
    }
}

/// The deduplicated set of hits played by one voice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Rhythm {
    hits: BTreeSet<Hit>,
}

impl Rhythm {
    pub fn new(hits: impl IntoIterator<Item = Hit>) -> Self {
        Self {
            hits: hits.into_iter().collect(),
        }
    }

    pub fn from_single(hit: Hit) -> Self {
        Self::new([hit])
    }

    /// The rhythm substituted for an omitted texture: one hit `(0, 1)`.
    pub fn unit() -> Self {
        Self::from_single(Hit::new(time(0, 1), time(1, 1)))
    }

    pub fn hits(&self) -> impl Iterator<Item = &Hit> {
        self.hits.iter()
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn contains(&self, hit: &Hit) -> bool {
        self.hits.contains(hit)
    }

    pub fn shift(&self, offset: &Time) -> Self {
        Self::new(self.hits.iter().map(|hit| hit.shift(offset)))
    }

    /// Latest `onset + duration` of any hit, if there is one.
    pub fn endpoint(&self) -> Option<Time> {
        self.hits.iter().map(Hit::end).max()
    }
}

impl FromIterator<Hit> for Rhythm {
    fn from_iter<I: IntoIterator<Item = Hit>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl Add<Time> for Rhythm {
    type Output = Rhythm;

    fn add(self, offset: Time) -> Rhythm {
        self.shift(&offset)
    }
}

impl fmt::Display for Rhythm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hits: Vec<String> = self.hits.iter().map(|h| h.to_string()).collect();
        write!(f, "{{{}}}", hits.join(", "))
    }
}

/// Ordered rhythms, one per voice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Texture {
    rhythms: Vec<Rhythm>,
}

impl Texture {
    pub fn new(rhythms: Vec<Rhythm>) -> Self {
        Self { rhythms }
    }

    pub fn from_single(rhythm: Rhythm) -> Self {
        Self::new(vec![rhythm])
    }

    /// `voices` copies of [`Rhythm::unit`].
    pub fn unit(voices: usize) -> Self {
        Self::new(vec![Rhythm::unit(); voices])
    }

    pub fn rhythms(&self) -> &[Rhythm] {
        &self.rhythms
    }

    pub fn len(&self) -> usize {
        self.rhythms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rhythms.is_empty()
    }

    /// Maximum `onset + duration` over every hit of every voice; zero when
    /// there are no hits at all.
    pub fn endpoint(&self) -> Time {
        self.rhythms
            .iter()
            .filter_map(Rhythm::endpoint)
            .fold(time(0, 1), |acc, end| acc.max(end))
    }

    pub fn shift(&self, offset: &Time) -> Self {
        Self::new(self.rhythms.iter().map(|r| r.shift(offset)).collect())
    }

    pub(crate) fn truncate(&mut self, len: usize) {
        self.rhythms.truncate(len);
    }
}

impl FromIterator<Rhythm> for Texture {
    fn from_iter<I: IntoIterator<Item = Rhythm>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Voice stacking.
impl Add for Texture {
    type Output = Texture;

    fn add(mut self, other: Texture) -> Texture {
        self.rhythms.extend(other.rhythms);
        self
    }
}

/// Concatenation in time: `other` is shifted to start at `self.endpoint()`
/// and appended as additional voices.
impl Sub for Texture {
    type Output = Texture;

    fn sub(mut self, other: Texture) -> Texture {
        let offset = self.endpoint();
        self.rhythms
            .extend(other.rhythms.into_iter().map(|r| r.shift(&offset)));
        self
    }
}

impl fmt::Display for Texture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rhythms: Vec<String> = self.rhythms.iter().map(|r| r.to_string()).collect();
        write!(f, "[{}]", rhythms.join(", "))
    }
}
