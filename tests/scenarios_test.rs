//! Measure reconstruction scenarios
//!
//! Each test builds a measure the way symbol recognition would deliver it
//! (chords with stems, beam items touching stems, slots, slurs) and checks
//! the rebuilt rhythm.

use omr_rhythm::diagnostics;
use omr_rhythm::{
    ratio, BeamId, BeamItem, ChordId, Measure, Note, NoteId, NoteShape, Pitch, Point, RhythmConfig,
    Scale, Side, StaffId, Stem, StemId, TimeSignature,
};

/// Helper to create a stem-up chord with a single head
///
/// The stem (id = note id) sits at `x`, running from `tail_y` down to the
/// head at `head_y`.
fn up_chord(
    measure: &mut Measure,
    note: u32,
    staff: u32,
    shape: NoteShape,
    x: f64,
    head_y: f64,
    tail_y: f64,
) -> ChordId {
    let head = Note::head(
        NoteId(note),
        StaffId(staff),
        shape,
        Pitch::new(0, 4),
        Point::new(x - 6.0, head_y),
    );
    let stem = Stem::new(StemId(note), Point::new(x, tail_y), Point::new(x, head_y));
    measure.add_chord(vec![head], Some(stem)).unwrap()
}

/// Helper to create a stemless chord (whole note or rest)
fn plain_chord(measure: &mut Measure, note: u32, staff: u32, shape: NoteShape, x: f64, y: f64) -> ChordId {
    let center = Point::new(x, y);
    let n = if shape.is_rest() {
        Note::rest(NoteId(note), StaffId(staff), shape, center)
    } else {
        Note::head(NoteId(note), StaffId(staff), shape, Pitch::new(0, 4), center)
    };
    measure.add_chord(vec![n], None).unwrap()
}

/// Helper to create a horizontal beam made of one item per consecutive stem pair
fn beam(measure: &mut Measure, stems: &[(f64, u32)], y: f64) -> BeamId {
    let items = stems
        .windows(2)
        .map(|pair| {
            BeamItem::new(
                Point::new(pair[0].0, y),
                Point::new(pair[1].0, y),
                Some(StemId(pair[0].1)),
                Some(StemId(pair[1].1)),
            )
        })
        .collect();
    measure.add_beam(items, false)
}

#[test]
fn test_two_halves_make_one_voice() {
    let config = RhythmConfig::default();
    let mut measure = Measure::new(1, Scale::new(20.0)).with_time_signature(TimeSignature::new(4, 4));
    let first = up_chord(&mut measure, 1, 1, NoteShape::VoidHead, 40.0, 100.0, 40.0);
    let second = up_chord(&mut measure, 2, 1, NoteShape::VoidHead, 200.0, 100.0, 40.0);
    measure.add_slot(&[first]);
    measure.add_slot(&[second]);

    measure.process(&config);

    assert_eq!(measure.voices().len(), 1);
    assert_eq!(measure.chord(second).start_time(), Some(ratio(1, 2)));
    assert_eq!(measure.voice_id_of(first), measure.voice_id_of(second));
    assert_eq!(measure.voices()[0].termination(), Some(ratio(0, 1)));
    assert!(measure.voices()[0].forwards().is_empty());
    assert!(!measure.diagnostics().has_errors());
}

#[test]
fn test_whole_note_against_quarters_in_other_staff() {
    let config = RhythmConfig::default();
    let mut measure = Measure::new(1, Scale::new(20.0));
    let whole = plain_chord(&mut measure, 1, 1, NoteShape::WholeHead, 40.0, 100.0);
    let mut quarters = Vec::new();
    for i in 0..4u32 {
        let x = 40.0 + 60.0 * i as f64;
        quarters.push(up_chord(&mut measure, 10 + i, 2, NoteShape::BlackHead, x, 300.0, 240.0));
    }
    measure.add_slot(&[whole, quarters[0]]);
    for q in &quarters[1..] {
        measure.add_slot(&[*q]);
    }

    measure.process(&config);

    assert_eq!(measure.voices().len(), 2);
    let quarter_voice = measure.chord(quarters[0]).voice().unwrap();
    for q in &quarters {
        assert_eq!(measure.chord(*q).voice(), Some(quarter_voice));
    }
    assert_ne!(measure.chord(whole).voice(), Some(quarter_voice));
    assert_eq!(measure.voice(quarter_voice).termination(), Some(ratio(0, 1)));
    assert_eq!(measure.chord(quarters[3]).start_time(), Some(ratio(3, 4)));

    let whole_voice = measure.chord(whole).voice().unwrap();
    assert_eq!(
        measure.voice(whole_voice).strip(measure.slots()),
        "V1 |Ch#1   |=======|=======|=======|"
    );
}

#[test]
fn test_measure_rest_has_its_own_voice() {
    let config = RhythmConfig::default();
    let mut measure = Measure::new(1, Scale::new(20.0));
    let rest = plain_chord(&mut measure, 1, 1, NoteShape::WholeRest, 120.0, 90.0);
    let q = up_chord(&mut measure, 2, 2, NoteShape::VoidHead, 40.0, 300.0, 240.0);
    let r = up_chord(&mut measure, 3, 2, NoteShape::VoidHead, 160.0, 300.0, 240.0);
    measure.add_slot(&[q]);
    measure.add_slot(&[r]);

    measure.process(&config);

    let rest_voice = measure.chord(rest).voice().unwrap();
    assert!(measure.voice(rest_voice).is_whole());
    assert_eq!(measure.voice(rest_voice).termination(), None);
    assert_eq!(measure.chord(rest).start_time(), Some(ratio(0, 1)));
    assert_eq!(measure.voices().len(), 2);
    assert_eq!(measure.voice_id_of(q), measure.voice_id_of(r));
    assert_eq!(measure.diagnostics().count(diagnostics::CHORD_WITHOUT_SLOT), 0);
}

#[test]
fn test_beamed_eighths_with_interleaved_rest() {
    let config = RhythmConfig::default();
    let mut measure = Measure::new(1, Scale::new(20.0)).with_time_signature(TimeSignature::new(3, 8));
    let a = up_chord(&mut measure, 1, 1, NoteShape::BlackHead, 0.0, 100.0, 20.0);
    let rest = plain_chord(&mut measure, 2, 1, NoteShape::EighthRest, 40.0, 60.0);
    let c = up_chord(&mut measure, 3, 1, NoteShape::BlackHead, 80.0, 100.0, 20.0);
    beam(&mut measure, &[(0.0, 1), (80.0, 3)], 20.0);
    measure.add_slot(&[a]);
    measure.add_slot(&[rest]);
    measure.add_slot(&[c]);

    measure.process(&config);

    assert_eq!(measure.groups().len(), 1);
    assert_eq!(measure.chord(rest).start_time(), Some(ratio(1, 8)));
    assert_eq!(measure.chord(c).start_time(), Some(ratio(1, 4)));
    assert_eq!(measure.voices().len(), 1);
    assert_eq!(measure.voice_id_of(rest), Some(1));
    assert_eq!(measure.voices()[0].rests(measure.chords()), vec![rest]);
    assert_eq!(measure.voices()[0].chords(), vec![a, rest, c]);
    assert_eq!(measure.voices()[0].termination(), Some(ratio(0, 1)));
    assert!(measure.diagnostics().is_empty());
}

/// Beam A over stems at x = 0, 10 and 30; beam B from x = 18 to the stem
/// at x = 30, 2.5 interlines under beam A.
fn split_measure() -> (Measure, [ChordId; 4], BeamId, BeamId) {
    let mut measure = Measure::new(1, Scale::new(20.0));
    let c0 = up_chord(&mut measure, 1, 1, NoteShape::BlackHead, 0.0, 100.0, 0.0);
    let c10 = up_chord(&mut measure, 2, 1, NoteShape::BlackHead, 10.0, 100.0, 0.0);
    let c18 = up_chord(&mut measure, 3, 1, NoteShape::BlackHead, 18.0, 100.0, 50.0);
    let c30 = up_chord(&mut measure, 4, 1, NoteShape::BlackHead, 30.0, 150.0, 0.0);
    let a = beam(&mut measure, &[(0.0, 1), (10.0, 2), (30.0, 4)], 0.0);
    let b = beam(&mut measure, &[(18.0, 3), (30.0, 4)], 50.0);
    (measure, [c0, c10, c18, c30], a, b)
}

#[test]
fn test_chord_clear_of_beam_splits_group() {
    let config = RhythmConfig::default();
    let (mut measure, [c0, c10, c18, c30], a, b) = split_measure();

    measure.link_beams();
    measure.build_beam_groups(&config);

    assert_eq!(measure.groups().len(), 2);
    assert_ne!(measure.beam(a).group(), measure.beam(b).group());
    assert_eq!(measure.chords().len(), 5);

    // The shared chord at x=30 is duplicated, the clone joins beam B
    let clone = ChordId(5);
    assert_eq!(measure.beam(a).chords(), &[c0, c10, c30]);
    assert_eq!(measure.beam(b).chords(), &[c18, clone]);
    assert_eq!(measure.chord(c30).beams(), &[a]);
    assert_eq!(measure.chord(clone).beams(), &[b]);
    assert_eq!(measure.chord(clone).tail_location().y, 50.0);
    assert_eq!(measure.chord(c30).tail_location().y, 0.0);
    assert_eq!(measure.chord(clone).head_location(), measure.chord(c30).head_location());
    assert_eq!(measure.diagnostics().count(diagnostics::SPLIT_LOOP_EXHAUSTED), 0);
}

#[test]
fn test_split_loop_bound_is_reported() {
    let config = RhythmConfig::from_yaml_str("max_split_loops: 0\n").unwrap();
    let (mut measure, _, a, b) = split_measure();

    measure.link_beams();
    measure.build_beam_groups(&config);

    // Left as grouped, nothing cloned
    assert_eq!(measure.groups().len(), 1);
    assert_eq!(measure.chords().len(), 4);
    assert_eq!(measure.beam(a).group(), measure.beam(b).group());
    assert_eq!(measure.diagnostics().count(diagnostics::SPLIT_LOOP_EXHAUSTED), 1);
    assert!(measure.diagnostics().has_errors());
}

#[test]
fn test_unbeamed_chord_under_beam_does_not_split() {
    let config = RhythmConfig::default();
    let mut measure = Measure::new(1, Scale::new(20.0));
    up_chord(&mut measure, 1, 1, NoteShape::BlackHead, 0.0, 100.0, 0.0);
    up_chord(&mut measure, 2, 1, NoteShape::BlackHead, 10.0, 100.0, 0.0);
    up_chord(&mut measure, 3, 1, NoteShape::BlackHead, 18.0, 100.0, 50.0);
    up_chord(&mut measure, 4, 1, NoteShape::BlackHead, 30.0, 150.0, 0.0);
    beam(&mut measure, &[(0.0, 1), (10.0, 2), (30.0, 4)], 0.0);

    measure.link_beams();
    measure.build_beam_groups(&config);

    assert_eq!(measure.groups().len(), 1);
    assert_eq!(measure.chords().len(), 4);
}

#[test]
fn test_loose_tolerance_closes_instead_of_splitting() {
    let config = RhythmConfig::from_yaml_str("max_chord_dy: 3.0\n").unwrap();
    let (mut measure, [_, _, c18, _], a, b) = split_measure();

    measure.link_beams();
    measure.build_beam_groups(&config);

    assert_eq!(measure.groups().len(), 1);
    assert_eq!(measure.chords().len(), 4);
    assert!(measure.beam(a).contains_chord(c18));
    assert_eq!(measure.beam(a).group(), measure.beam(b).group());
}

#[test]
fn test_head_tied_from_two_chords_is_mirrored() {
    let config = RhythmConfig::default();
    let mut measure = Measure::new(1, Scale::new(20.0));
    let first = up_chord(&mut measure, 1, 1, NoteShape::BlackHead, 0.0, 100.0, 40.0);
    let second = up_chord(&mut measure, 2, 1, NoteShape::BlackHead, 40.0, 100.0, 40.0);
    let target = up_chord(&mut measure, 3, 1, NoteShape::BlackHead, 120.0, 100.0, 40.0);
    measure.add_slur(Some(NoteId(1)), Some(NoteId(3)), true);
    measure.add_slur(Some(NoteId(2)), Some(NoteId(3)), true);

    measure.check_tied_chords(&config);

    assert_eq!(measure.chords().len(), 4);
    let mirror = ChordId(4);
    assert_eq!(measure.tied_chords(target), vec![first]);
    assert_eq!(measure.tied_chords(mirror), vec![second]);
    assert_eq!(measure.chord(mirror).notes()[0].mirror_of, Some(NoteId(3)));

    // Each chord now carries exactly one incoming tie
    for chord in [target, mirror] {
        let incoming = measure
            .slurs()
            .iter()
            .filter(|s| s.tie)
            .filter(|s| s.end(Side::Right).map_or(false, |n| measure.chord(chord).contains_note(n)))
            .count();
        assert_eq!(incoming, 1);
    }
}

#[test]
fn test_split_keeps_every_note_once() {
    let config = RhythmConfig::default();
    let mut measure = Measure::new(1, Scale::new(20.0));
    let notes = vec![
        Note::head(NoteId(1), StaffId(1), NoteShape::BlackHead, Pitch::new(0, 4), Point::new(94.0, 140.0)),
        Note::head(NoteId(2), StaffId(1), NoteShape::BlackHead, Pitch::new(2, 4), Point::new(94.0, 120.0)),
        Note::head(NoteId(3), StaffId(1), NoteShape::BlackHead, Pitch::new(4, 4), Point::new(94.0, 100.0)),
    ];
    let stem = Stem::new(StemId(1), Point::new(100.0, 20.0), Point::new(100.0, 140.0));
    let chord = measure.add_chord(notes, Some(stem)).unwrap();
    let slot = measure.add_slot(&[chord]);

    let alien = measure
        .split_chord(chord, omr_rhythm::SplitPoint::FromNote(NoteId(2)), &config)
        .unwrap();

    let mut all = measure.chord(chord).note_ids();
    all.extend(measure.chord(alien).note_ids());
    all.sort();
    assert_eq!(all, vec![NoteId(1), NoteId(2), NoteId(3)]);
    assert_eq!(measure.chord(chord).note_ids(), vec![NoteId(1)]);
    assert_eq!(measure.chord(alien).slot(), Some(slot));
    assert!(measure.slot(slot).chords().contains(&alien));
    assert_eq!(measure.chord(chord).stem_dir(), measure.chord(alien).stem_dir());
}

#[test]
fn test_start_time_is_write_once() {
    let mut measure = Measure::new(1, Scale::new(20.0));
    let chord = up_chord(&mut measure, 1, 1, NoteShape::BlackHead, 0.0, 100.0, 40.0);

    assert!(measure.chord_mut(chord).set_start_time(ratio(1, 4)).unwrap());
    assert!(!measure.chord_mut(chord).set_start_time(ratio(1, 4)).unwrap());
    assert!(measure.chord_mut(chord).set_start_time(ratio(1, 2)).is_err());
    assert_eq!(measure.chord(chord).start_time(), Some(ratio(1, 4)));
}
