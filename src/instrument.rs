//! Instrumentation tensors: which timbres realise each voice.

use std::collections::BTreeSet;
use std::fmt;
use std::ops::Add;

use serde::{Deserialize, Serialize};

use crate::error::{HarmtexError, Result};

/// Instrument used when a contraction is built without an instrumentation.
pub const DEFAULT_INSTRUMENT: &str = "Acoustic Grand Piano";

/// General MIDI level 1 program names, indexed by program number.
const GENERAL_MIDI_PROGRAMS: [&str; 128] = [
    "Acoustic Grand Piano", "Bright Acoustic Piano", "Electric Grand Piano", "Honky-tonk Piano",
    "Electric Piano 1", "Electric Piano 2", "Harpsichord", "Clavinet",
    "Celesta", "Glockenspiel", "Music Box", "Vibraphone",
    "Marimba", "Xylophone", "Tubular Bells", "Dulcimer",
    "Drawbar Organ", "Percussive Organ", "Rock Organ", "Church Organ",
    "Reed Organ", "Accordion", "Harmonica", "Tango Accordion",
    "Acoustic Guitar (nylon)", "Acoustic Guitar (steel)", "Electric Guitar (jazz)", "Electric Guitar (clean)",
    "Electric Guitar (muted)", "Overdriven Guitar", "Distortion Guitar", "Guitar Harmonics",
    "Acoustic Bass", "Electric Bass (finger)", "Electric Bass (pick)", "Fretless Bass",
    "Slap Bass 1", "Slap Bass 2", "Synth Bass 1", "Synth Bass 2",
    "Violin", "Viola", "Cello", "Contrabass",
    "Tremolo Strings", "Pizzicato Strings", "Orchestral Harp", "Timpani",
    "String Ensemble 1", "String Ensemble 2", "Synth Strings 1", "Synth Strings 2",
    "Choir Aahs", "Voice Oohs", "Synth Choir", "Orchestra Hit",
    "Trumpet", "Trombone", "Tuba", "Muted Trumpet",
    "French Horn", "Brass Section", "Synth Brass 1", "Synth Brass 2",
    "Soprano Sax", "Alto Sax", "Tenor Sax", "Baritone Sax",
    "Oboe", "English Horn", "Bassoon", "Clarinet",
    "Piccolo", "Flute", "Recorder", "Pan Flute",
    "Blown bottle", "Shakuhachi", "Whistle", "Ocarina",
    "Lead 1 (square)", "Lead 2 (sawtooth)", "Lead 3 (calliope)", "Lead 4 chiff",
    "Lead 5 (charang)", "Lead 6 (voice)", "Lead 7 (fifths)", "Lead 8 (bass + lead)",
    "Pad 1 (new age)", "Pad 2 (warm)", "Pad 3 (polysynth)", "Pad 4 (choir)",
    "Pad 5 (bowed)", "Pad 6 (metallic)", "Pad 7 (halo)", "Pad 8 (sweep)",
    "FX 1 (rain)", "FX 2 (soundtrack)", "FX 3 (crystal)", "FX 4 (atmosphere)",
    "FX 5 (brightness)", "FX 6 (goblins)", "FX 7 (echoes)", "FX 8 (sci-fi)",
    "Sitar", "Banjo", "Shamisen", "Koto",
    "Kalimba", "Bagpipe", "Fiddle", "Shanai",
    "Tinkle Bell", "Agogo", "Steel Drums", "Woodblock",
    "Taiko Drum", "Melodic Tom", "Synth Drum", "Reverse Cymbal",
    "Guitar Fret Noise", "Breath Noise", "Seashore", "Bird Tweet",
    "Telephone Ring", "Helicopter", "Applause", "Gunshot",
];

/// A named timbre. Two instruments are the same if their names are.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Instrument {
    name: String,
}

impl Instrument {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// General MIDI program number for this instrument's name.
    pub fn program(&self) -> Result<u8> {
        GENERAL_MIDI_PROGRAMS
            .iter()
            .position(|&name| name == self.name)
            .map(|index| index as u8)
            .ok_or_else(|| HarmtexError::UnknownInstrument(self.name.clone()))
    }
}

impl Default for Instrument {
    fn default() -> Self {
        Self::new(DEFAULT_INSTRUMENT)
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Instruments doubling one voice. An empty section silences the voice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Section {
    instruments: BTreeSet<Instrument>,
}

impl Section {
    pub fn new(instruments: impl IntoIterator<Item = Instrument>) -> Self {
        Self {
            instruments: instruments.into_iter().collect(),
        }
    }

    pub fn from_single(instrument: Instrument) -> Self {
        Self::new([instrument])
    }

    pub fn instruments(&self) -> impl Iterator<Item = &Instrument> {
        self.instruments.iter()
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }
}

impl FromIterator<Instrument> for Section {
    fn from_iter<I: IntoIterator<Item = Instrument>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.instruments.iter().map(Instrument::name).collect();
        write!(f, "{{{}}}", names.join(", "))
    }
}

/// Ordered sections, one per voice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Instrumentation {
    sections: Vec<Section>,
}

impl Instrumentation {
    pub fn new(sections: Vec<Section>) -> Self {
        Self { sections }
    }

    pub fn from_single(section: Section) -> Self {
        Self::new(vec![section])
    }

    /// `voices` voices, each played by the default instrument alone.
    pub fn uniform(voices: usize) -> Self {
        Self::new(vec![Section::from_single(Instrument::default()); voices])
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub(crate) fn truncate(&mut self, len: usize) {
        self.sections.truncate(len);
    }
}

impl FromIterator<Section> for Instrumentation {
    fn from_iter<I: IntoIterator<Item = Section>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Voice stacking.
impl Add for Instrumentation {
    type Output = Instrumentation;

    fn add(mut self, other: Instrumentation) -> Instrumentation {
        self.sections.extend(other.sections);
        self
    }
}
