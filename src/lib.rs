pub mod compiler;
pub mod config;
pub mod contraction;
pub mod error;
pub mod harmony;
pub mod instrument;
pub mod midi;
pub mod rhythm;
pub mod roman;

pub use compiler::{compile_score, compile_score_file, Score, Tempo, TimeSignature};
pub use config::RenderConfig;
pub use contraction::{concatenation, contraction, parallelization, Note, TensorContraction};
pub use error::*;
pub use harmony::{Chord, Harmony, Pitch};
pub use instrument::{Instrument, Instrumentation, Section, DEFAULT_INSTRUMENT};
pub use midi::{beats_to_seconds, notes_to_midi, score_to_midi, write_midi};
pub use rhythm::{parse_time, time, Hit, Rhythm, Texture, Time};
pub use roman::roman_numerals;

/// Compile an XML score to Standard MIDI File bytes.
/// This is the main entry point for the library.
pub fn compile(source: &str) -> Result<Vec<u8>> {
    compile_with_config(source, &RenderConfig::default())
}

/// Compile with custom rendering (velocity, resolution, tempo override).
pub fn compile_with_config(source: &str, config: &RenderConfig) -> Result<Vec<u8>> {
    let score = compile_score(source)?;
    score_to_midi(&score, config)
}
