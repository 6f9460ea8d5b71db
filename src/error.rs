//! # Error Types
//!
//! This module defines all error types for the harmtex algebra, the XML score
//! compiler and the MIDI writer.
//!
//! Length mismatches inside a contraction are not errors. They are truncated
//! and logged with `log::warn!`.
//!
//! ## Usage
//! ```rust
//! use harmtex::{Chord, HarmtexError};
//!
//! match Chord::from_roman_numeral("bVII", 0, 0, None) {
//!     Ok(chord) => println!("{:?}", chord),
//!     Err(HarmtexError::UnknownRomanNumeral(numeral)) => {
//!         eprintln!("no such numeral: {}", numeral);
//!     }
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, HarmtexError>;

#[derive(Error, Debug)]
pub enum HarmtexError {
    /// Roman numeral not present in the factor table.
    ///
    /// # Example
    /// ```
    /// # use harmtex::HarmtexError;
    /// let err = HarmtexError::UnknownRomanNumeral("bVII".to_string());
    /// assert_eq!(err.to_string(), "Roman numeral 'bVII' not found");
    /// ```
    #[error("Roman numeral '{0}' not found")]
    UnknownRomanNumeral(String),

    /// Chord factor label (1, 3, 5, 7) that the numeral does not define.
    #[error("Roman numeral '{numeral}' has no factor '{factor}'")]
    UnknownChordFactor { numeral: String, factor: String },

    /// Voice or pitch index past the end of a harmony or chord.
    #[error("Index {index} out of range for length {len}")]
    VoiceIndexOutOfRange { index: usize, len: usize },

    /// Rational literal that cannot be parsed.
    #[error("Invalid time value: {0}")]
    InvalidTime(String),

    /// The score document is not well-formed XML.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Element tag the compiler does not know about.
    ///
    /// # Example
    /// ```
    /// # use harmtex::HarmtexError;
    /// let err = HarmtexError::UnknownTag("glissando".to_string());
    /// assert_eq!(err.to_string(), "Tag 'glissando' not implemented");
    /// ```
    #[error("Tag '{0}' not implemented")]
    UnknownTag(String),

    /// `<id>` reference to something that was never declared.
    #[error("Undefined id '{0}'")]
    UndefinedId(String),

    /// Element with missing children, attributes, or unparsable text.
    #[error("Malformed <{tag}>: {message}")]
    MalformedElement { tag: String, message: String },

    /// A child decoded to a different kind of object than its parent expects.
    #[error("<{tag}> expected {expected}, found {found}")]
    TypeMismatch {
        tag: String,
        expected: &'static str,
        found: &'static str,
    },

    /// The document never declared an `<ast>` root.
    #[error("Score has no <ast> element")]
    MissingAst,

    /// Instrument name with no General MIDI program.
    #[error("Unknown General MIDI instrument '{0}'")]
    UnknownInstrument(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_yaml::Error),
}
