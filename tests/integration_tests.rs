//! Integration tests for harmtex
//!
//! Tests the full pipeline from XML score or hand-built tensors to notes and
//! Standard MIDI File output.

use harmtex::*;
use midly::{MetaMessage, MidiMessage, Smf, TrackEventKind};

const SCORE: &str = r#"
<score>
  <title>Minuet Fragment</title>
  <composer>Anonymous</composer>
  <tempo><beat num="1" den="4"/><bpm>120</bpm></tempo>
  <time-signature><beats>3</beats><beat-type>4</beat-type></time-signature>
  <hits>
    <hit id="q0"><onset num="0" den="1"/><duration num="1" den="4"/></hit>
    <hit id="q1"><onset num="1" den="4"/><duration num="1" den="4"/></hit>
    <hit id="q2"><onset num="1" den="2"/><duration num="1" den="4"/></hit>
  </hits>
  <instruments>
    <instrument id="vn"><name>Violin</name></instrument>
    <instrument id="vc"><name>Cello</name></instrument>
  </instruments>
  <ast>
    <parallel>
      <product>
        <texture><rhythm><id>q0</id><id>q1</id><id>q2</id></rhythm></texture>
        <harmony><chord><pitch><number>72</number></pitch></chord></harmony>
        <instrumentation><section><id>vn</id></section></instrumentation>
      </product>
      <product>
        <texture><rhythm><id>q0</id></rhythm></texture>
        <harmony><chord><pitch><number>48</number></pitch><pitch><number>55</number></pitch></chord></harmony>
        <instrumentation><section><id>vc</id></section></instrumentation>
      </product>
    </parallel>
  </ast>
</score>
"#;

fn alberti() -> Texture {
    Texture::new(vec![
        Rhythm::from_single(Hit::parse("0/8", "1/8").unwrap()),
        Rhythm::from_single(Hit::parse("2/8", "1/8").unwrap()),
        Rhythm::new([
            Hit::parse("1/8", "1/8").unwrap(),
            Hit::parse("3/8", "1/8").unwrap(),
        ]),
    ])
}

fn block(numeral: &str, inversion: usize, octave: i32) -> TensorContraction {
    let chord = Chord::from_roman_numeral(numeral, inversion, octave, None).unwrap();
    Harmony::from_chord(&chord) * alberti()
}

#[test]
fn test_compile_score_notes() {
    let score = compile_score(SCORE).unwrap();
    assert_eq!(score.title, "Minuet Fragment");
    assert_eq!(score.time_signature, TimeSignature { numerator: 3, denominator: 4 });

    let notes = score.contraction.ordered_notes();
    assert_eq!(notes.len(), 5);
    assert_eq!(score.contraction.endpoint(), time(3, 4));

    // Cello pitches sound below the violin at time zero
    assert_eq!(notes[0].pitch, Pitch(48));
    assert_eq!(notes[1].pitch, Pitch(55));
    assert_eq!(notes[2].pitch, Pitch(72));
    assert_eq!(notes[2].instrument.name(), "Violin");
    assert_eq!(notes[4].onset, time(1, 2));
}

#[test]
fn test_compile_to_midi() {
    let bytes = compile(SCORE).unwrap();
    let smf = Smf::parse(&bytes).unwrap();

    // Tempo track plus one track per instrument
    assert_eq!(smf.tracks.len(), 3);
    assert!(smf.tracks[0].iter().any(|e| matches!(
        e.kind,
        TrackEventKind::Meta(MetaMessage::Tempo(t)) if t.as_int() == 500_000
    )));
    assert!(smf.tracks[0].iter().any(|e| matches!(
        e.kind,
        TrackEventKind::Meta(MetaMessage::TimeSignature(3, 2, _, _))
    )));
    assert_eq!(
        smf.tracks[1][0].kind,
        TrackEventKind::Meta(MetaMessage::TrackName(b"Cello"))
    );
    assert_eq!(
        smf.tracks[2][0].kind,
        TrackEventKind::Meta(MetaMessage::TrackName(b"Violin"))
    );
}

#[test]
fn test_render_config_overrides() {
    let config = RenderConfig::from_yaml_str("velocity: 90\nticks-per-quarter: 96\nbpm: 60").unwrap();
    let bytes = compile_with_config(SCORE, &config).unwrap();
    let smf = Smf::parse(&bytes).unwrap();

    assert!(matches!(smf.header.timing, midly::Timing::Metrical(t) if t.as_int() == 96));
    assert!(smf.tracks[0].iter().any(|e| matches!(
        e.kind,
        TrackEventKind::Meta(MetaMessage::Tempo(t)) if t.as_int() == 1_000_000
    )));
    assert!(smf.tracks[2].iter().any(|e| matches!(
        e.kind,
        TrackEventKind::Midi { message: MidiMessage::NoteOn { vel, .. }, .. } if vel.as_int() == 90
    )));
}

#[test]
fn test_anacrusis_starts_at_tick_zero() {
    let source = r#"
<score>
  <anacrusis num="1" den="4"/>
  <ast>
    <product>
      <texture>
        <rhythm>
          <hit><onset num="-1" den="4"/><duration num="1" den="4"/></hit>
          <hit><onset num="0" den="1"/><duration num="1" den="2"/></hit>
        </rhythm>
      </texture>
      <harmony><chord><pitch><number>67</number></pitch></chord></harmony>
    </product>
  </ast>
</score>
"#;
    let score = compile_score(source).unwrap();
    assert_eq!(score.anacrusis, time(1, 4));

    let bytes = score_to_midi(&score, &RenderConfig::default()).unwrap();
    let smf = Smf::parse(&bytes).unwrap();

    let mut tick = 0;
    let mut note_ons = Vec::new();
    for event in &smf.tracks[1] {
        tick += event.delta.as_int();
        if let TrackEventKind::Midi { message: MidiMessage::NoteOn { .. }, .. } = event.kind {
            note_ons.push(tick);
        }
    }
    assert_eq!(note_ons, vec![0, 480]);
}

#[test]
fn test_alberti_accompaniment() {
    let theme = [
        block("I", 0, 0),
        block("I", 0, 0),
        block("V7", 2, 0),
        block("I", 0, 0),
        block("IV", 2, 0),
        block("I", 0, 0),
        block("V", 1, -1),
        block("I", 0, 0),
    ];
    let accompaniment = Pitch(60) + concatenation(theme);

    assert_eq!(accompaniment.endpoint(), time(4, 1));
    assert_eq!(accompaniment.voices(), 24);

    let notes = accompaniment.ordered_notes();
    assert_eq!(notes.len(), 32);

    let first_bar: Vec<(Time, i32)> = notes
        .iter()
        .take(4)
        .map(|n| (n.onset.clone(), n.pitch.number()))
        .collect();
    assert_eq!(
        first_bar,
        vec![
            (time(0, 1), 60),
            (time(1, 8), 67),
            (time(1, 4), 64),
            (time(3, 8), 67),
        ]
    );

    // Second inversion of V7 voices the fifth in the bass
    let third_block_bass = notes.iter().find(|n| n.onset == time(1, 1)).unwrap();
    assert_eq!(third_block_bass.pitch, Pitch(62));
}

#[test]
fn test_notes_listing_serializes() {
    let score = compile_score(SCORE).unwrap();
    let yaml = serde_yaml::to_string(&score.contraction.ordered_notes()).unwrap();
    assert!(yaml.contains("instrument: Cello"));
    assert!(yaml.contains("pitch: 72"));
}

#[test]
fn test_compile_errors() {
    assert!(matches!(compile("<score></score>"), Err(HarmtexError::MissingAst)));
    assert!(matches!(
        compile("<score><ast><product><id>nowhere</id></product></ast></score>"),
        Err(HarmtexError::UndefinedId(_))
    ));

    let theremin = r#"
<score>
  <ast>
    <product>
      <texture><rhythm><hit><onset num="0" den="1"/><duration num="1" den="4"/></hit></rhythm></texture>
      <harmony><chord><pitch><number>60</number></pitch></chord></harmony>
      <instrumentation><section><instrument>Theremin</instrument></section></instrumentation>
    </product>
  </ast>
</score>
"#;
    assert!(compile_score(theremin).is_ok());
    assert!(matches!(compile(theremin), Err(HarmtexError::UnknownInstrument(_))));
}
