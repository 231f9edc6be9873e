//! Part-level processing: inherited time signatures, voices tied across
//! barlines, pickup measures

use omr_rhythm::diagnostics;
use omr_rhythm::{
    ratio, ChordId, ForwardPosition, Measure, Note, NoteId, NoteShape, Part, Pitch, Point,
    RhythmConfig, Scale, StaffId, Stem, StemId, TimeSignature,
};

/// Helper to create a stem-up chord, pitch C4
fn up_chord(measure: &mut Measure, note: u32, staff: u32, shape: NoteShape, x: f64, head_y: f64) -> ChordId {
    let head = Note::head(
        NoteId(note),
        StaffId(staff),
        shape,
        Pitch::new(0, 4),
        Point::new(x - 6.0, head_y),
    );
    let stem = Stem::new(StemId(note), Point::new(x, head_y - 60.0), Point::new(x, head_y));
    measure.add_chord(vec![head], Some(stem)).unwrap()
}

/// Helper to create a measure with one half note per staff in a single slot
fn two_staff_halves(id: u32) -> (Measure, ChordId, ChordId) {
    let mut measure = Measure::new(id, Scale::new(20.0));
    let upper = up_chord(&mut measure, 1, 1, NoteShape::VoidHead, 40.0, 100.0);
    let lower = up_chord(&mut measure, 2, 2, NoteShape::VoidHead, 40.0, 300.0);
    measure.add_slot(&[upper, lower]);
    (measure, upper, lower)
}

#[test]
fn test_time_signature_is_inherited() {
    let config = RhythmConfig::default();
    let part = Part::new(vec![
        Measure::new(1, Scale::default()),
        Measure::new(2, Scale::default()).with_time_signature(TimeSignature::new(3, 4)),
        Measure::new(3, Scale::default()),
    ]);

    assert_eq!(part.time_signature_at(0, &config), TimeSignature::new(4, 4));
    assert_eq!(part.time_signature_at(1, &config), TimeSignature::new(3, 4));
    assert_eq!(part.time_signature_at(2, &config), TimeSignature::new(3, 4));
}

#[test]
fn test_tie_across_barline_renumbers_voices() {
    let config = RhythmConfig::default();
    let (first, upper, _) = two_staff_halves(1);
    let (mut second, next_upper, next_lower) = two_staff_halves(2);
    // Cross-staff tie from the upper staff into the lower staff
    second.add_incoming_slur(NoteId(1), NoteId(2), true);

    let mut part = Part::new(vec![
        first.with_time_signature(TimeSignature::new(2, 4)),
        second,
    ]);
    part.process(&config);

    let first = &part.measures[0];
    let second = &part.measures[1];
    assert_eq!(first.voice_id_of(upper), Some(1));
    assert_eq!(second.voice_id_of(next_lower), Some(1));
    assert_eq!(second.voice_id_of(next_upper), Some(2));
    assert_eq!(second.voices().len(), 2);
    assert!(part.diagnostics().is_empty());
}

#[test]
fn test_pickup_measure_is_partial() {
    let config = RhythmConfig::default();
    let mut pickup = Measure::new(1, Scale::new(20.0));
    let chord = up_chord(&mut pickup, 1, 1, NoteShape::BlackHead, 40.0, 100.0);
    pickup.add_slot(&[chord]);
    let (full, _, _) = two_staff_halves(2);

    let mut part = Part::new(vec![pickup.with_time_signature(TimeSignature::new(2, 4)), full]);
    part.process(&config);

    let pickup = &part.measures[0];
    assert!(pickup.is_partial());
    assert_eq!(pickup.voices()[0].termination(), Some(ratio(-1, 4)));
    assert!(pickup.voices()[0].forwards().is_empty());
    assert!(!part.measures[1].is_partial());
}

#[test]
fn test_voices_ending_apart_are_reported() {
    let config = RhythmConfig::default();
    let mut measure = Measure::new(1, Scale::new(20.0));
    let quarter = up_chord(&mut measure, 1, 1, NoteShape::BlackHead, 40.0, 100.0);
    let half = up_chord(&mut measure, 2, 2, NoteShape::VoidHead, 40.0, 300.0);
    measure.add_slot(&[quarter, half]);

    let mut part = Part::new(vec![measure]);
    part.process(&config);

    let measure = &part.measures[0];
    assert!(!measure.is_partial());
    assert_eq!(measure.diagnostics().count(diagnostics::PARTIAL_MISMATCH), 1);
    // Deficits stay filled with closing forwards
    assert_eq!(measure.voices()[0].forwards().len(), 1);
}

#[test]
fn test_config_file_drives_processing() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    std::io::Write::write_all(
        &mut file,
        b"default_time_signature:\n  numerator: 3\n  denominator: 4\n",
    )
    .unwrap();
    let config = RhythmConfig::from_yaml_file(file.path()).unwrap();

    let mut measure = Measure::new(1, Scale::new(20.0));
    for i in 0..3u32 {
        let chord = up_chord(&mut measure, i + 1, 1, NoteShape::BlackHead, 40.0 + 60.0 * i as f64, 100.0);
        measure.add_slot(&[chord]);
    }
    let mut part = Part::new(vec![measure]);
    part.process(&config);

    let measure = &part.measures[0];
    assert_eq!(measure.expected_duration(&config), ratio(3, 4));
    assert_eq!(measure.excess(), None);
    assert!(!measure.is_partial());
    assert_eq!(
        measure.inferred_time_signature(measure.voice_by_id(1).unwrap()),
        Some(TimeSignature::new(3, 4))
    );
}

#[test]
fn test_slotted_measure_rest_stays_a_whole_voice() {
    let config = RhythmConfig::default();
    let mut measure = Measure::new(1, Scale::new(20.0));
    let rest = measure
        .add_chord(
            vec![Note::rest(NoteId(1), StaffId(2), NoteShape::WholeRest, Point::new(40.0, 290.0))],
            None,
        )
        .unwrap();
    let mut quarters = Vec::new();
    for i in 0..4u32 {
        let x = 40.0 + 60.0 * i as f64;
        quarters.push(up_chord(&mut measure, 10 + i, 1, NoteShape::BlackHead, x, 100.0));
    }
    measure.add_slot(&[quarters[0], rest]);
    for q in &quarters[1..] {
        measure.add_slot(&[*q]);
    }

    let mut part = Part::new(vec![measure]);
    part.process(&config);

    let measure = &part.measures[0];
    let rest_voice = measure.voice(measure.chord(rest).voice().unwrap());
    assert!(rest_voice.is_whole());
    assert_eq!(rest_voice.termination(), None);
    assert!(rest_voice.forwards().is_empty());

    let quarter_voice = measure.voice(measure.chord(quarters[0]).voice().unwrap());
    assert_eq!(quarter_voice.chords(), quarters);
    assert_eq!(quarter_voice.termination(), Some(ratio(0, 1)));
    assert!(!quarter_voice
        .forwards()
        .iter()
        .any(|f| matches!(f.position, ForwardPosition::After(_))));

    assert!(!measure.is_partial());
    assert_eq!(measure.diagnostics().count(diagnostics::PARTIAL_MISMATCH), 0);
    assert!(part.diagnostics().is_empty());
}
