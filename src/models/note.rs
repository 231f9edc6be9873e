//! Notes, rests and stems as delivered by the recognition layer

use super::geometry::{Point, Rect};
use super::ids::{NoteId, StaffId, StemId};
use super::time::{ratio, Rational};
use serde::{Deserialize, Serialize};

/// Recognized shape of a note head or rest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteShape {
    Breve,
    WholeHead,
    VoidHead,
    BlackHead,
    BreveRest,
    WholeRest,
    MultiRest,
    HalfRest,
    QuarterRest,
    EighthRest,
    SixteenthRest,
    ThirtySecondRest,
    SixtyFourthRest,
}

impl NoteShape {
    pub fn is_rest(self) -> bool {
        !matches!(
            self,
            NoteShape::Breve | NoteShape::WholeHead | NoteShape::VoidHead | NoteShape::BlackHead
        )
    }

    /// Rests that fill a whole measure whatever its time signature
    pub fn is_whole_rest(self) -> bool {
        matches!(
            self,
            NoteShape::WholeRest | NoteShape::MultiRest | NoteShape::BreveRest
        )
    }

    /// Intrinsic value of the shape, before flags, beams, dots and tuplets
    ///
    /// Measure rests have no intrinsic value and return `None`.
    pub fn base_duration(self) -> Option<Rational> {
        match self {
            NoteShape::Breve => Some(ratio(2, 1)),
            NoteShape::WholeHead => Some(ratio(1, 1)),
            NoteShape::VoidHead | NoteShape::HalfRest => Some(ratio(1, 2)),
            NoteShape::BlackHead | NoteShape::QuarterRest => Some(ratio(1, 4)),
            NoteShape::EighthRest => Some(ratio(1, 8)),
            NoteShape::SixteenthRest => Some(ratio(1, 16)),
            NoteShape::ThirtySecondRest => Some(ratio(1, 32)),
            NoteShape::SixtyFourthRest => Some(ratio(1, 64)),
            NoteShape::BreveRest | NoteShape::WholeRest | NoteShape::MultiRest => None,
        }
    }
}

/// Diatonic pitch, enough to recognize ties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pitch {
    /// Scale degree (0=C, 1=D, 2=E, 3=F, 4=G, 5=A, 6=B)
    pub step: u8,
    /// Octave number (4 = middle C octave)
    pub octave: i8,
}

impl Pitch {
    pub fn new(step: u8, octave: i8) -> Self {
        Pitch { step, octave }
    }
}

/// A note head or a rest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub staff: StaffId,
    pub shape: NoteShape,
    /// Absent for rests
    pub pitch: Option<Pitch>,
    /// Head center (or rest center)
    pub center: Point,
    pub bounds: Rect,
    /// Set on notes duplicated by a chord split, pointing to the source note
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mirror_of: Option<NoteId>,
}

/// Default head box, in pixels, for notes built without explicit bounds
const DEFAULT_HEAD_WIDTH: f64 = 12.0;
const DEFAULT_HEAD_HEIGHT: f64 = 10.0;

impl Note {
    /// Note head with a pitch
    pub fn head(id: NoteId, staff: StaffId, shape: NoteShape, pitch: Pitch, center: Point) -> Self {
        Note {
            id,
            staff,
            shape,
            pitch: Some(pitch),
            center,
            bounds: Rect::centered(center, DEFAULT_HEAD_WIDTH, DEFAULT_HEAD_HEIGHT),
            mirror_of: None,
        }
    }

    /// Rest
    pub fn rest(id: NoteId, staff: StaffId, shape: NoteShape, center: Point) -> Self {
        Note {
            id,
            staff,
            shape,
            pitch: None,
            center,
            bounds: Rect::centered(center, DEFAULT_HEAD_WIDTH, DEFAULT_HEAD_HEIGHT * 2.0),
            mirror_of: None,
        }
    }

    pub fn with_bounds(mut self, bounds: Rect) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn is_rest(&self) -> bool {
        self.shape.is_rest()
    }

    /// Copy of this note under a new id, remembering its source
    pub fn mirror(&self, id: NoteId) -> Note {
        Note {
            id,
            mirror_of: Some(self.id),
            ..self.clone()
        }
    }

    /// Same step and octave (the tie criterion)
    pub fn same_pitch(&self, other: &Note) -> bool {
        matches!((self.pitch, other.pitch), (Some(a), Some(b)) if a == b)
    }
}

/// Physical stem, shared by all chords hanging on it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stem {
    pub id: StemId,
    pub top: Point,
    pub bottom: Point,
}

impl Stem {
    pub fn new(id: StemId, top: Point, bottom: Point) -> Self {
        Stem { id, top, bottom }
    }

    pub fn x(&self) -> f64 {
        (self.top.x + self.bottom.x) / 2.0
    }

    pub fn middle(&self) -> Point {
        Point::new(self.x(), (self.top.y + self.bottom.y) / 2.0)
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(
            self.top.x.min(self.bottom.x),
            self.top.y,
            (self.top.x - self.bottom.x).abs(),
            self.bottom.y - self.top.y,
        )
    }
}
