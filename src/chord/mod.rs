//! Chords: the atomic timed units of a measure
//!
//! A chord owns its notes, ordered from the head (the note farthest from the
//! stem end) to the tail. Head and tail locations are derived lazily and
//! dropped on every note or stem mutation.
//!
//! Start time and voice are write-once: setting the same value again is a
//! no-op, a different value is refused with an error and the first value is
//! kept.

mod split;

pub use split::SplitPoint;

use crate::errors::{Result, RhythmError};
use crate::models::{
    BeamId, ChordId, Note, NoteId, Point, Rational, Rect, SlotId, StaffId, Stem, VoiceRef,
};
use once_cell::unsync::OnceCell;

/// Derived head and tail locations
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Locations {
    /// Head note ordinate, at stem abscissa when there is a stem
    pub head: Point,
    /// Stem end opposite the head
    pub tail: Point,
}

#[derive(Debug, Clone)]
pub struct Chord {
    pub(crate) id: ChordId,

    /// Notes ordered from head to tail
    notes: Vec<Note>,

    stem: Option<Stem>,

    /// +1 stem up, -1 stem down, 0 no stem
    stem_dir: i32,

    /// Beams ordered by level, from the tail towards the head
    pub(crate) beams: Vec<BeamId>,

    pub(crate) slot: Option<SlotId>,

    start_time: Option<Rational>,

    /// Tuplet ratio applied to the raw duration (e.g. 2/3 for triplets)
    pub tuplet_factor: Option<Rational>,

    pub dots: u8,

    /// Number of flags on the stem
    pub flags: u8,

    voice: Option<VoiceRef>,

    /// Shortened tail, once the stem was cut by a split
    tail_cut: Option<Point>,

    locations: OnceCell<Locations>,
}

impl Chord {
    /// Build a chord; notes are reordered head first
    pub fn new(id: ChordId, notes: Vec<Note>, stem: Option<Stem>) -> Result<Self> {
        if notes.is_empty() {
            return Err(RhythmError::EmptyChord);
        }
        let stem_dir = stem.map(|s| compute_stem_dir(&s, &notes)).unwrap_or(0);
        let mut chord = Chord {
            id,
            notes,
            stem,
            stem_dir,
            beams: Vec::new(),
            slot: None,
            start_time: None,
            tuplet_factor: None,
            dots: 0,
            flags: 0,
            voice: None,
            tail_cut: None,
            locations: OnceCell::new(),
        };
        chord.sort_notes();
        Ok(chord)
    }

    pub fn with_dots(mut self, dots: u8) -> Self {
        self.dots = dots;
        self
    }

    pub fn with_flags(mut self, flags: u8) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_tuplet(mut self, factor: Rational) -> Self {
        self.tuplet_factor = Some(factor);
        self
    }

    pub fn id(&self) -> ChordId {
        self.id
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Note ids, head first
    pub fn note_ids(&self) -> Vec<NoteId> {
        self.notes.iter().map(|n| n.id).collect()
    }

    pub fn contains_note(&self, note: NoteId) -> bool {
        self.notes.iter().any(|n| n.id == note)
    }

    pub fn note(&self, note: NoteId) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == note)
    }

    /// Index of a note counted from the head
    pub fn note_index(&self, note: NoteId) -> Option<usize> {
        self.notes.iter().position(|n| n.id == note)
    }

    pub fn stem(&self) -> Option<&Stem> {
        self.stem.as_ref()
    }

    pub fn stem_dir(&self) -> i32 {
        self.stem_dir
    }

    pub fn beams(&self) -> &[BeamId] {
        &self.beams
    }

    pub fn slot(&self) -> Option<SlotId> {
        self.slot
    }

    pub fn voice(&self) -> Option<VoiceRef> {
        self.voice
    }

    /// Staff of the head note
    pub fn staff(&self) -> StaffId {
        self.notes[0].staff
    }

    pub fn is_rest(&self) -> bool {
        self.notes.iter().all(|n| n.is_rest())
    }

    /// Whole or multi-measure rest, lasting the whole measure
    pub fn is_whole_rest(&self) -> bool {
        self.notes.len() == 1 && self.notes[0].shape.is_whole_rest()
    }

    fn locations(&self) -> &Locations {
        self.locations.get_or_init(|| self.compute_locations())
    }

    pub fn head_location(&self) -> Point {
        self.locations().head
    }

    pub fn tail_location(&self) -> Point {
        self.locations().tail
    }

    /// Chord center, used for slot reference points
    pub fn center(&self) -> Point {
        self.head_location()
    }

    /// Box around notes and the (possibly cut) stem
    pub fn bounds(&self) -> Rect {
        let mut rect = self.notes[0].bounds;
        for note in &self.notes[1..] {
            rect = rect.union(&note.bounds);
        }
        if self.stem.is_some() {
            let loc = self.locations();
            rect = rect.include(loc.head).include(loc.tail);
        }
        rect
    }

    /// Shorten the tail to the given ordinate, the stem being cut there
    pub(crate) fn cut_tail(&mut self, y: f64) {
        let x = self.stem.map(|s| s.x()).unwrap_or(self.notes[0].center.x);
        self.tail_cut = Some(Point::new(x, y));
        self.invalidate();
    }

    pub fn is_stem_cut(&self) -> bool {
        self.tail_cut.is_some()
    }

    /// Drop derived locations
    pub(crate) fn invalidate(&mut self) {
        self.locations.take();
    }

    pub(crate) fn take_notes(&mut self, from: usize) -> Vec<Note> {
        let moved = self.notes.split_off(from);
        self.invalidate();
        moved
    }

    fn sort_notes(&mut self) {
        // Head first: bottom note when the stem is up, top note otherwise
        if self.stem_dir > 0 {
            self.notes
                .sort_by(|a, b| b.center.y.total_cmp(&a.center.y));
        } else {
            self.notes
                .sort_by(|a, b| a.center.y.total_cmp(&b.center.y));
        }
        self.invalidate();
    }

    fn compute_locations(&self) -> Locations {
        let head_note = &self.notes[0];
        match &self.stem {
            None => Locations {
                head: head_note.center,
                tail: head_note.center,
            },
            Some(stem) => {
                let x = stem.x();
                let head = Point::new(x, head_note.center.y);
                let tail = self.tail_cut.unwrap_or(if self.stem_dir > 0 {
                    Point::new(x, stem.top.y)
                } else {
                    Point::new(x, stem.bottom.y)
                });
                Locations { head, tail }
            }
        }
    }

    // ------------------------------------------------------------------
    // Durations
    // ------------------------------------------------------------------

    /// Duration before tuplet, `None` for measure rests
    pub fn raw_duration(&self) -> Option<Rational> {
        let mut duration = self.notes[0].shape.base_duration()?;
        let fbn = self.flags as usize + self.beams.len();
        for _ in 0..fbn {
            duration /= Rational::from_integer(2);
        }
        match self.dots {
            0 => {}
            1 => duration *= Rational::new(3, 2),
            _ => duration *= Rational::new(7, 4),
        }
        Some(duration)
    }

    /// Actual duration, `None` for measure rests
    pub fn duration(&self) -> Option<Rational> {
        let raw = self.raw_duration()?;
        Some(match self.tuplet_factor {
            Some(factor) => raw * factor,
            None => raw,
        })
    }

    pub fn start_time(&self) -> Option<Rational> {
        self.start_time
    }

    pub fn end_time(&self) -> Option<Rational> {
        Some(self.start_time? + self.duration()?)
    }

    /// Set the start time once
    ///
    /// Returns `Ok(true)` when the value was stored, `Ok(false)` when it was
    /// already the same.
    pub fn set_start_time(&mut self, time: Rational) -> Result<bool> {
        match self.start_time {
            None => {
                self.start_time = Some(time);
                Ok(true)
            }
            Some(current) if current == time => Ok(false),
            Some(current) => Err(RhythmError::StartTimeConflict {
                chord: self.id,
                current,
                requested: time,
            }),
        }
    }

    /// Set the voice once, same contract as `set_start_time`
    pub fn set_voice(&mut self, voice: VoiceRef) -> Result<bool> {
        match self.voice {
            None => {
                self.voice = Some(voice);
                Ok(true)
            }
            Some(current) if current == voice => Ok(false),
            Some(current) => Err(RhythmError::VoiceConflict {
                chord: self.id,
                current,
                requested: voice,
            }),
        }
    }
}

/// Stem goes up when its middle lies above the note farthest from it
fn compute_stem_dir(stem: &Stem, notes: &[Note]) -> i32 {
    let middle = stem.middle();
    let farthest = notes
        .iter()
        .max_by(|a, b| {
            (a.center.y - middle.y)
                .abs()
                .total_cmp(&(b.center.y - middle.y).abs())
        })
        .map(|n| n.center.y)
        .unwrap_or(middle.y);
    if middle.y < farthest {
        1
    } else {
        -1
    }
}
