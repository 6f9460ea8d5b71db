//! # XML Score Compiler
//!
//! Decodes a declarative XML score into a [`Score`]: metadata plus the root
//! [`TensorContraction`] found under `<ast>`.
//!
//! ## Document Shape
//! ```text
//! score
//!   ├── title, composer                 text
//!   ├── tempo                           <beat num den/> + BPM element
//!   ├── time-signature                  two integer elements
//!   ├── anacrusis                       num/den attributes
//!   ├── hits | rhythms | textures | pitches | chords | harmonies
//!   │   | instruments | sections | instrumentations
//!   │                                   named definitions (`id` attribute)
//!   └── ast                             one contraction expression
//! ```
//!
//! Expressions are `hit`, `rhythm`, `texture`, `number`, `pitch`, `chord`,
//! `harmony`, `instrument`, `section`, `instrumentation`, `product`,
//! `parallel` and `concatenate`. Any expression element carrying an `id`
//! attribute is remembered, and `<id>name</id>` refers back to it in one of
//! two roles:
//! - as the first child of an element naming an object of that element's own
//!   kind, it stands for the whole element (`<rhythm><id>r</id></rhythm>`);
//! - otherwise it is an ordinary child, so a container of references builds
//!   its members by name (`<rhythm><id>q0</id><id>q1</id></rhythm>`).
//!
//! Definitions must precede their first reference in document order.
//!
//! ## Example
//! ```rust
//! use harmtex::compile_score;
//!
//! let score = compile_score(r#"
//! <score>
//!   <title>Fragment</title>
//!   <ast>
//!     <product>
//!       <texture><rhythm><hit><onset num="0" den="1"/><duration num="1" den="4"/></hit></rhythm></texture>
//!       <harmony><chord><pitch><number>60</number></pitch></chord></harmony>
//!     </product>
//!   </ast>
//! </score>"#)?;
//!
//! assert_eq!(score.title, "Fragment");
//! assert_eq!(score.contraction.notes().len(), 1);
//! # Ok::<(), harmtex::HarmtexError>(())
//! ```

use std::collections::HashMap;
use std::path::Path;

use num_traits::ToPrimitive;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::contraction::TensorContraction;
use crate::error::{HarmtexError, Result};
use crate::harmony::{Chord, Harmony, Pitch};
use crate::instrument::{Instrument, Instrumentation, Section};
use crate::rhythm::{parse_time, time, Hit, Rhythm, Texture, Time};

/// Tempo as "`beat` = `bpm`", e.g. a dotted quarter at 60.
#[derive(Debug, Clone, PartialEq)]
pub struct Tempo {
    pub beat: Time,
    pub bpm: u32,
}

impl Default for Tempo {
    fn default() -> Self {
        Self {
            beat: time(1, 4),
            bpm: 100,
        }
    }
}

impl Tempo {
    /// Tempo expressed in quarter notes per minute.
    pub fn quarter_bpm(&self) -> f64 {
        let quarters = &self.beat * time(4 * i64::from(self.bpm), 1);
        quarters.to_f64().unwrap_or(f64::INFINITY)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimeSignature {
    pub numerator: u32,
    pub denominator: u32,
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self {
            numerator: 4,
            denominator: 4,
        }
    }
}

/// A compiled score.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Score {
    pub title: String,
    pub composer: String,
    pub tempo: Tempo,
    pub time_signature: TimeSignature,
    /// Length of the pickup; notes at `-anacrusis` are rendered at time zero.
    pub anacrusis: Time,
    pub contraction: TensorContraction,
}

/// Compile an XML score held in memory.
pub fn compile_score(source: &str) -> Result<Score> {
    let root = parse_document(source)?;
    let mut compiler = Compiler::default();
    compiler.decode_statement(&root)?;
    let contraction = compiler.ast.take().ok_or(HarmtexError::MissingAst)?;
    log::debug!(
        "Compiled score '{}': {} voices, {} named objects",
        compiler.score.title,
        contraction.voices(),
        compiler.objects.len()
    );
    Ok(Score {
        contraction,
        ..compiler.score
    })
}

/// Read and compile an XML score file.
pub fn compile_score_file(path: impl AsRef<Path>) -> Result<Score> {
    let source = std::fs::read_to_string(path)?;
    compile_score(&source)
}

/// Minimal element tree; the decoder needs random access to children.
#[derive(Debug, Default)]
struct Element {
    tag: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<Element>,
}

impl Element {
    fn from_start(start: &BytesStart) -> Result<Self> {
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            attributes.push((key, value));
        }
        Ok(Self {
            tag: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
            attributes,
            ..Self::default()
        })
    }

    fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn child(&self, index: usize) -> Result<&Element> {
        self.children.get(index).ok_or_else(|| self.malformed(format!("missing child #{}", index + 1)))
    }

    fn reference(&self) -> Option<&Element> {
        self.children.first().filter(|child| child.tag == "id")
    }

    fn integer<T: std::str::FromStr>(&self) -> Result<T> {
        self.text
            .trim()
            .parse()
            .map_err(|_| self.malformed(format!("expected an integer, found '{}'", self.text)))
    }

    fn malformed(&self, message: impl Into<String>) -> HarmtexError {
        HarmtexError::MalformedElement {
            tag: self.tag.clone(),
            message: message.into(),
        }
    }
}

fn parse_document(source: &str) -> Result<Element> {
    let mut reader = Reader::from_str(source);
    reader.trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => stack.push(Element::from_start(&start)?),
            Event::Empty(start) => {
                let element = Element::from_start(&start)?;
                attach(&mut stack, &mut root, element);
            }
            Event::Text(text) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text.unescape()?);
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Event::End(_) => {
                if let Some(element) = stack.pop() {
                    attach(&mut stack, &mut root, element);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(open.malformed("element is never closed"));
    }
    root.ok_or_else(|| HarmtexError::MalformedElement {
        tag: "document".to_string(),
        message: "no root element".to_string(),
    })
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => *root = Some(element),
    }
}

/// Anything an expression element can evaluate to.
#[derive(Debug, Clone)]
enum Value {
    Time(Time),
    Number(i64),
    Hit(Hit),
    Rhythm(Rhythm),
    Texture(Texture),
    Pitch(Pitch),
    Chord(Chord),
    Harmony(Harmony),
    Instrument(Instrument),
    Section(Section),
    Instrumentation(Instrumentation),
    Contraction(TensorContraction),
}

macro_rules! expect_value {
    ($name:ident, $variant:ident, $ty:ty, $label:literal) => {
        fn $name(self, tag: &str) -> Result<$ty> {
            match self {
                Value::$variant(value) => Ok(value),
                other => Err(HarmtexError::TypeMismatch {
                    tag: tag.to_string(),
                    expected: $label,
                    found: other.kind(),
                }),
            }
        }
    };
}

impl Value {
    fn kind(&self) -> &'static str {
        match self {
            Value::Time(_) => "time",
            Value::Number(_) => "number",
            Value::Hit(_) => "hit",
            Value::Rhythm(_) => "rhythm",
            Value::Texture(_) => "texture",
            Value::Pitch(_) => "pitch",
            Value::Chord(_) => "chord",
            Value::Harmony(_) => "harmony",
            Value::Instrument(_) => "instrument",
            Value::Section(_) => "section",
            Value::Instrumentation(_) => "instrumentation",
            Value::Contraction(_) => "contraction",
        }
    }

    expect_value!(into_time, Time, Time, "time");
    expect_value!(into_number, Number, i64, "number");
    expect_value!(into_hit, Hit, Hit, "hit");
    expect_value!(into_rhythm, Rhythm, Rhythm, "rhythm");
    expect_value!(into_texture, Texture, Texture, "texture");
    expect_value!(into_pitch, Pitch, Pitch, "pitch");
    expect_value!(into_chord, Chord, Chord, "chord");
    expect_value!(into_harmony, Harmony, Harmony, "harmony");
    expect_value!(into_instrument, Instrument, Instrument, "instrument");
    expect_value!(into_section, Section, Section, "section");
    expect_value!(into_instrumentation, Instrumentation, Instrumentation, "instrumentation");
    expect_value!(into_contraction, Contraction, TensorContraction, "contraction");
}

const CONTAINER_TAGS: [&str; 9] = [
    "hits",
    "rhythms",
    "textures",
    "pitches",
    "chords",
    "harmonies",
    "instruments",
    "sections",
    "instrumentations",
];

const STATEMENT_TAGS: [&str; 7] = [
    "score",
    "title",
    "composer",
    "tempo",
    "time-signature",
    "anacrusis",
    "ast",
];

#[derive(Default)]
struct Compiler {
    objects: HashMap<String, Value>,
    score: Score,
    ast: Option<TensorContraction>,
}

impl Compiler {
    /// Score-level elements: metadata, definitions and the root expression.
    fn decode_statement(&mut self, element: &Element) -> Result<()> {
        match element.tag.as_str() {
            "score" => {
                for child in &element.children {
                    self.decode_statement(child)?;
                }
            }
            "title" => self.score.title = element.text.trim().to_string(),
            "composer" => self.score.composer = element.text.trim().to_string(),
            "tempo" => {
                let beat = self.decode_value(element.child(0)?)?.into_time("tempo")?;
                let bpm = element.child(1)?.integer()?;
                self.score.tempo = Tempo { beat, bpm };
            }
            "time-signature" => {
                self.score.time_signature = TimeSignature {
                    numerator: element.child(0)?.integer()?,
                    denominator: element.child(1)?.integer()?,
                };
            }
            "anacrusis" => self.score.anacrusis = rational_attributes(element)?,
            "ast" => {
                let root = self.decode_value(element.child(0)?)?.into_contraction("ast")?;
                self.ast = Some(root);
            }
            tag if CONTAINER_TAGS.contains(&tag) => {
                for child in &element.children {
                    let id = child
                        .attribute("id")
                        .ok_or_else(|| child.malformed(format!("definitions inside <{}> need an id", tag)))?
                        .to_string();
                    let value = self.decode_value(child)?;
                    self.remember(id, value);
                }
            }
            other => return Err(HarmtexError::UnknownTag(other.to_string())),
        }
        Ok(())
    }

    fn decode_value(&mut self, element: &Element) -> Result<Value> {
        let tag = element.tag.as_str();
        if tag == "id" {
            return self.resolve(element.text.trim());
        }
        if let Some(reference) = element.reference() {
            let value = self.resolve(reference.text.trim())?;
            if value.kind() == value_kind(tag) {
                return Ok(value);
            }
        }

        let value = match tag {
            "onset" | "duration" | "beat" => Value::Time(rational_attributes(element)?),
            "number" => Value::Number(element.integer()?),
            "hit" => {
                let onset = self.decode_value(element.child(0)?)?.into_time(tag)?;
                let duration = self.decode_value(element.child(1)?)?.into_time(tag)?;
                Value::Hit(Hit::new(onset, duration))
            }
            "rhythm" => Value::Rhythm(
                self.decode_children(element, Value::into_hit)?
                    .into_iter()
                    .collect(),
            ),
            "texture" => Value::Texture(Texture::new(self.decode_children(element, Value::into_rhythm)?)),
            "pitch" => {
                let number = self.decode_value(element.child(0)?)?.into_number(tag)?;
                let number = i32::try_from(number)
                    .map_err(|_| element.malformed(format!("pitch {} out of range", number)))?;
                Value::Pitch(Pitch(number))
            }
            "chord" => Value::Chord(
                self.decode_children(element, Value::into_pitch)?
                    .into_iter()
                    .collect(),
            ),
            "harmony" => Value::Harmony(Harmony::new(self.decode_children(element, Value::into_chord)?)),
            "instrument" => {
                let name = match element.children.first() {
                    Some(child) => child.text.trim(),
                    None => element.text.trim(),
                };
                if name.is_empty() {
                    return Err(element.malformed("instrument has no name"));
                }
                Value::Instrument(Instrument::new(name))
            }
            "section" => Value::Section(
                self.decode_children(element, Value::into_instrument)?
                    .into_iter()
                    .collect(),
            ),
            "instrumentation" => Value::Instrumentation(Instrumentation::new(
                self.decode_children(element, Value::into_section)?,
            )),
            "product" => {
                let texture = self.decode_value(element.child(0)?)?.into_texture(tag)?;
                let harmony = self.decode_value(element.child(1)?)?.into_harmony(tag)?;
                let instrumentation = match element.children.get(2) {
                    Some(child) => Some(self.decode_value(child)?.into_instrumentation(tag)?),
                    None => None,
                };
                Value::Contraction(TensorContraction::contract(
                    Some(harmony),
                    Some(texture),
                    instrumentation,
                ))
            }
            "parallel" => Value::Contraction(
                self.decode_children(element, Value::into_contraction)?
                    .into_iter()
                    .fold(TensorContraction::default(), TensorContraction::parallel),
            ),
            "concatenate" => Value::Contraction(
                self.decode_children(element, Value::into_contraction)?
                    .into_iter()
                    .fold(TensorContraction::default(), TensorContraction::concatenate),
            ),
            other if STATEMENT_TAGS.contains(&other) || CONTAINER_TAGS.contains(&other) => {
                return Err(element.malformed("not allowed inside an expression"));
            }
            other => return Err(HarmtexError::UnknownTag(other.to_string())),
        };

        if let Some(id) = element.attribute("id") {
            self.remember(id.to_string(), value.clone());
        }
        Ok(value)
    }

    fn decode_children<T>(
        &mut self,
        element: &Element,
        expect: fn(Value, &str) -> Result<T>,
    ) -> Result<Vec<T>> {
        element
            .children
            .iter()
            .map(|child| expect(self.decode_value(child)?, &element.tag))
            .collect()
    }

    fn resolve(&self, id: &str) -> Result<Value> {
        self.objects
            .get(id)
            .cloned()
            .ok_or_else(|| HarmtexError::UndefinedId(id.to_string()))
    }

    fn remember(&mut self, id: String, value: Value) {
        log::debug!("Defined {} '{}'", value.kind(), id);
        self.objects.insert(id, value);
    }
}

/// Kind of value an expression tag evaluates to.
fn value_kind(tag: &str) -> &str {
    match tag {
        "onset" | "duration" | "beat" => "time",
        "product" | "parallel" | "concatenate" => "contraction",
        other => other,
    }
}

fn rational_attributes(element: &Element) -> Result<Time> {
    let part = |key: &str| -> Result<&str> {
        element
            .attribute(key)
            .map(str::trim)
            .ok_or_else(|| element.malformed(format!("missing '{}' attribute", key)))
    };
    parse_time(&format!("{}/{}", part("num")?, part("den")?))
}
