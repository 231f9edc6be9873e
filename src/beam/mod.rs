//! Beams and beam groups
//!
//! A beam is one visual line made of recognized items. Each item may touch a
//! stem on either side; the chords on those stems become the beam's chords.
//! Beams sharing a chord belong to the same `BeamGroup`.

mod group;

pub use group::BeamGroup;

use crate::models::{BeamId, ChordId, GroupId, Line, Point, StemId};
use once_cell::unsync::OnceCell;
use serde::{Deserialize, Serialize};

/// One recognized piece of a beam
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeamItem {
    pub left: Point,
    pub right: Point,
    /// Stem touched by the left end, if any
    pub left_stem: Option<StemId>,
    /// Stem touched by the right end, if any
    pub right_stem: Option<StemId>,
}

impl BeamItem {
    pub fn new(left: Point, right: Point, left_stem: Option<StemId>, right_stem: Option<StemId>) -> Self {
        BeamItem {
            left,
            right,
            left_stem,
            right_stem,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Beam {
    pub(crate) id: BeamId,

    /// Items ordered left to right
    items: Vec<BeamItem>,

    /// Beam hook, attached to a single stem
    hook: bool,

    left: Point,
    right: Point,

    line: OnceCell<Line>,

    pub(crate) group: Option<GroupId>,

    /// Linked chords, ordered by abscissa
    pub(crate) chords: Vec<ChordId>,

    /// Rests lying between two consecutive chords of the beam
    pub(crate) interleaved_rests: Vec<ChordId>,
}

impl Beam {
    pub fn new(id: BeamId, mut items: Vec<BeamItem>, hook: bool) -> Self {
        items.sort_by(|a, b| a.left.x.total_cmp(&b.left.x));
        let left = items.first().map(|i| i.left).unwrap_or_default();
        let right = items.last().map(|i| i.right).unwrap_or(left);
        Beam {
            id,
            items,
            hook,
            left,
            right,
            line: OnceCell::new(),
            group: None,
            chords: Vec::new(),
            interleaved_rests: Vec::new(),
        }
    }

    pub fn id(&self) -> BeamId {
        self.id
    }

    pub fn items(&self) -> &[BeamItem] {
        &self.items
    }

    pub fn is_hook(&self) -> bool {
        self.hook
    }

    pub fn group(&self) -> Option<GroupId> {
        self.group
    }

    pub fn chords(&self) -> &[ChordId] {
        &self.chords
    }

    pub fn interleaved_rests(&self) -> &[ChordId] {
        &self.interleaved_rests
    }

    pub fn left(&self) -> Point {
        self.left
    }

    pub fn right(&self) -> Point {
        self.right
    }

    /// Line through both ends, cached until the ends move
    pub fn line(&self) -> Line {
        *self.line.get_or_init(|| Line::new(self.left, self.right))
    }

    pub fn length(&self) -> f64 {
        self.right.x - self.left.x
    }

    /// Horizontal extent (min, max)
    pub fn x_range(&self) -> (f64, f64) {
        (self.left.x.min(self.right.x), self.left.x.max(self.right.x))
    }

    /// Move both ends; the cached line is dropped
    pub(crate) fn set_ends(&mut self, left: Point, right: Point) {
        self.left = left;
        self.right = right;
        self.line.take();
    }

    /// Stems touched by this beam, with the side they sit on
    pub(crate) fn stem_links(&self) -> Vec<(StemId, bool)> {
        let mut links = Vec::new();
        for item in &self.items {
            if let Some(stem) = item.left_stem {
                links.push((stem, true));
            }
            if let Some(stem) = item.right_stem {
                links.push((stem, false));
            }
        }
        links
    }

    pub fn contains_chord(&self, chord: ChordId) -> bool {
        self.chords.contains(&chord)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_beam() -> Beam {
        Beam::new(
            BeamId(1),
            vec![
                BeamItem::new(Point::new(20.0, 12.0), Point::new(40.0, 14.0), None, Some(StemId(2))),
                BeamItem::new(Point::new(0.0, 10.0), Point::new(20.0, 12.0), Some(StemId(1)), None),
            ],
            false,
        )
    }

    #[test]
    fn test_items_ordered_and_ends() {
        let beam = make_beam();
        assert_eq!(beam.items()[0].left.x, 0.0);
        assert_eq!(beam.left(), Point::new(0.0, 10.0));
        assert_eq!(beam.right(), Point::new(40.0, 14.0));
        assert_eq!(beam.line().y_at(20.0), 12.0);
    }

    #[test]
    fn test_set_ends_refreshes_line() {
        let mut beam = make_beam();
        assert_eq!(beam.line().slope(), 0.1);
        beam.set_ends(Point::new(0.0, 10.0), Point::new(40.0, 10.0));
        assert_eq!(beam.line().slope(), 0.0);
    }

    #[test]
    fn test_stem_links() {
        let beam = make_beam();
        assert_eq!(beam.stem_links(), vec![(StemId(1), true), (StemId(2), false)]);
    }
}
