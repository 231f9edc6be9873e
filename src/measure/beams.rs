//! Beam linking, grouping and repair
//!
//! 1. link: beam items → stems → chords
//! 2. group: transitive closure of beams sharing a chord
//! 3. close: chords lying under a beam between its extreme chords, plus
//!    interleaved rests
//! 4. check & split: a chord of a group standing clear of one of the group's
//!    beams belongs to another group; split until stable (bounded)
//! 5. align: beams of a group take the slope of its longest beam

use super::Measure;
use crate::beam::BeamGroup;
use crate::chord::SplitPoint;
use crate::config::RhythmConfig;
use crate::diagnostics::{self, Entity};
use crate::models::{BeamId, ChordId, GroupId, Point, Polygon};
use petgraph::unionfind::UnionFind;
use std::collections::HashMap;

impl Measure {
    /// Connect every beam with the chords of the stems it touches
    pub fn link_beams(&mut self) {
        for index in 0..self.beams.len() {
            let beam_id = BeamId::from_index(index);
            let mut left_linked = false;
            let mut right_linked = false;

            for (stem, is_left) in self.beams[index].stem_links() {
                let chords: Vec<ChordId> = self
                    .chords
                    .iter()
                    .filter(|c| c.stem().map(|s| s.id) == Some(stem))
                    .map(|c| c.id)
                    .collect();
                if chords.is_empty() {
                    self.error(
                        Entity::Beam(beam_id),
                        diagnostics::STEM_WITHOUT_CHORD,
                        format!("{} touches {} which has no chord", beam_id, stem),
                    );
                    continue;
                }
                for chord in chords {
                    self.link(beam_id, chord);
                }
                if is_left {
                    left_linked = true;
                } else {
                    right_linked = true;
                }
            }

            let beam = &self.beams[index];
            let missing = if beam.is_hook() {
                if left_linked || right_linked {
                    None
                } else {
                    Some("any")
                }
            } else if !left_linked {
                Some("left")
            } else if !right_linked {
                Some("right")
            } else {
                None
            };
            if let Some(side) = missing {
                self.error(
                    Entity::Beam(beam_id),
                    diagnostics::BEAM_MISSING_SIDE,
                    format!("{} has no chord on {} side", beam_id, side),
                );
            }
        }
    }

    /// Group, close, check & split, then align beams
    pub fn build_beam_groups(&mut self, config: &RhythmConfig) {
        self.group_beams();
        if self.close_beams(config) {
            self.group_beams();
        }
        self.check_beam_groups(config);
        self.align_beams();
        for index in 0..self.chords.len() {
            self.sort_chord_beams(ChordId::from_index(index));
        }
        for index in 0..self.groups.len() {
            self.order_group_beams(GroupId::from_index(index));
        }
    }

    /// Record a mutual beam ↔ chord link
    pub(crate) fn link(&mut self, beam: BeamId, chord: ChordId) {
        if !self.beams[beam.index()].chords.contains(&chord) {
            self.beams[beam.index()].chords.push(chord);
            let mut chords = std::mem::take(&mut self.beams[beam.index()].chords);
            self.sort_by_abscissa(&mut chords);
            self.beams[beam.index()].chords = chords;
        }
        if !self.chords[chord.index()].beams.contains(&beam) {
            self.chords[chord.index()].beams.push(beam);
            self.sort_chord_beams(chord);
        }
    }

    pub(crate) fn unlink(&mut self, beam: BeamId, chord: ChordId) {
        self.beams[beam.index()].chords.retain(|c| *c != chord);
        self.chords[chord.index()].beams.retain(|b| *b != beam);
    }

    /// Order a chord's beams from the tail, i.e. farthest from the head first
    pub(crate) fn sort_chord_beams(&mut self, chord: ChordId) {
        let c = &self.chords[chord.index()];
        let head = c.head_location();
        let mut keyed: Vec<(f64, BeamId)> = c
            .beams
            .iter()
            .map(|b| {
                let y = self.beams[b.index()].line().y_at(head.x);
                ((y - head.y).abs(), *b)
            })
            .collect();
        keyed.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));
        self.chords[chord.index()].beams = keyed.into_iter().map(|(_, b)| b).collect();
    }

    /// Rebuild groups as connected components of beams sharing chords
    fn group_beams(&mut self) {
        let mut components = UnionFind::<usize>::new(self.beams.len());
        for chord in &self.chords {
            for pair in chord.beams.windows(2) {
                components.union(pair[0].index(), pair[1].index());
            }
        }

        self.groups.clear();
        let mut group_of_root: HashMap<usize, GroupId> = HashMap::new();
        for index in 0..self.beams.len() {
            if self.beams[index].chords.is_empty() {
                self.beams[index].group = None;
                continue;
            }
            let root = components.find(index);
            let group = match group_of_root.get(&root) {
                Some(group) => *group,
                None => {
                    let group = GroupId::from_index(self.groups.len());
                    self.groups.push(BeamGroup::new(group));
                    group_of_root.insert(root, group);
                    group
                }
            };
            self.groups[group.index()].add_beam(BeamId::from_index(index));
            self.beams[index].group = Some(group);
        }
        log::debug!("M{} {} beam groups", self.id, self.groups.len());
    }

    /// Extend beams to the chords and rests lying between their extreme chords
    ///
    /// Returns true if any chord was added to a beam.
    fn close_beams(&mut self, config: &RhythmConfig) -> bool {
        let mut modified = false;
        for index in 0..self.beams.len() {
            let beam_id = BeamId::from_index(index);
            let beam = &self.beams[index];
            if beam.is_hook() || beam.chords.len() < 2 {
                continue;
            }
            let (Some(first), Some(last)) = (beam.chords.first(), beam.chords.last()) else {
                continue;
            };
            let x_min = self.chord(*first).head_location().x;
            let x_max = self.chord(*last).head_location().x;
            let line = beam.line();

            let inner: Vec<ChordId> = self
                .chords
                .iter()
                .filter(|c| {
                    if beam.contains_chord(c.id) || c.stem().is_none() || c.is_rest() {
                        return false;
                    }
                    let head = c.head_location();
                    if head.x <= x_min || head.x >= x_max {
                        return false;
                    }
                    let tail = c.tail_location();
                    let dy = self.scale.to_interline((line.y_at(tail.x) - tail.y).abs());
                    dy <= config.max_chord_dy
                })
                .map(|c| c.id)
                .collect();
            for chord in inner {
                log::info!("M{} closing {} on {}", self.id, chord, beam_id);
                self.link(beam_id, chord);
                modified = true;
            }

            let chords = self.beams[index].chords.clone();
            for pair in chords.windows(2) {
                if let Some(rest) = self.lookup_interleaved_rest(pair[0], pair[1]) {
                    if !self.beams[index].interleaved_rests.contains(&rest) {
                        self.beams[index].interleaved_rests.push(rest);
                    }
                }
            }
        }
        modified
    }

    /// Rest lying in the area spanned by two beamed chords
    pub(crate) fn lookup_interleaved_rest(&self, left: ChordId, right: ChordId) -> Option<ChordId> {
        let (l, r) = (self.chord(left), self.chord(right));
        let area = Polygon::new(vec![
            l.head_location(),
            l.tail_location(),
            r.tail_location(),
            r.head_location(),
        ]);
        self.chords
            .iter()
            .filter(|c| c.id != left && c.id != right && c.is_rest() && !c.is_whole_rest())
            .find(|c| area.intersects(&c.bounds()))
            .map(|c| c.id)
    }

    /// Split groups until no chord stands clear of a beam of its own group
    fn check_beam_groups(&mut self, config: &RhythmConfig) {
        let mut rounds = 0;
        while let Some((group, chord)) = self.find_split_order(config) {
            if rounds >= config.max_split_loops {
                self.error(
                    Entity::Group(group),
                    diagnostics::SPLIT_LOOP_EXHAUSTED,
                    format!("Loop detected in beam group split of {} at {}", group, chord),
                );
                return;
            }
            rounds += 1;
            self.split_group(group, chord, config);
        }
    }

    /// First (group, chord) pair calling for a split
    fn find_split_order(&self, config: &RhythmConfig) -> Option<(GroupId, ChordId)> {
        for group in &self.groups {
            for chord_id in self.group_chords(group.id) {
                let chord = self.chord(chord_id);
                if chord.stem().is_none() {
                    continue;
                }
                let tail = chord.tail_location();
                let bounds = chord.bounds();
                for beam_id in &group.beams {
                    let beam = self.beam(*beam_id);
                    if beam.is_hook() || beam.contains_chord(chord_id) {
                        continue;
                    }
                    let (x0, x1) = beam.x_range();
                    if x1.min(bounds.right()) - x0.max(bounds.x) <= 0.0 {
                        continue;
                    }
                    let line_y = beam.line().y_at(tail.x);
                    // Beam crossing the chord box: nothing to separate
                    if line_y >= bounds.y && line_y <= bounds.bottom() {
                        continue;
                    }
                    let dy = self.scale.to_interline((line_y - tail.y).abs());
                    if dy > config.max_chord_dy {
                        log::debug!(
                            "M{} {} stands {:.2} off {} in {}",
                            self.id,
                            chord_id,
                            dy,
                            beam_id,
                            group.id
                        );
                        return Some((group.id, chord_id));
                    }
                }
            }
        }
        None
    }

    /// Move the beams of `alien` into a new group and split the shared chord
    fn split_group(&mut self, group: GroupId, alien: ChordId, config: &RhythmConfig) {
        let new_group = GroupId::from_index(self.groups.len());
        self.groups.push(BeamGroup::new(new_group));

        let alien_beams: Vec<BeamId> = self.groups[group.index()]
            .beams
            .iter()
            .copied()
            .filter(|b| self.beams[b.index()].contains_chord(alien))
            .collect();
        for beam in &alien_beams {
            self.groups[group.index()].remove_beam(*beam);
            self.groups[new_group.index()].add_beam(*beam);
            self.beams[beam.index()].group = Some(new_group);
        }
        log::info!(
            "M{} splitting {} at {}: {:?} moved to {}",
            self.id,
            group,
            alien,
            alien_beams,
            new_group
        );

        let old_chords = self.group_chords(group);
        let pivot = self
            .group_chords(new_group)
            .into_iter()
            .find(|c| old_chords.contains(c));
        if let Some(pivot) = pivot {
            self.split_pivot(pivot, config);
        }
        self.order_group_beams(group);
        self.order_group_beams(new_group);
    }

    /// Duplicate the pivot chord so each group gets its own chord
    ///
    /// The group owning the beam at the pivot tail keeps the pivot with its
    /// full stem. The other group gets a mirror chord whose stem stops at
    /// its first beam.
    fn split_pivot(&mut self, pivot: ChordId, config: &RhythmConfig) {
        let pivot_beams = self.chord(pivot).beams.clone();
        let Some(tail_beam) = pivot_beams.first() else {
            return;
        };
        let tail_group = self.beams[tail_beam.index()].group;
        let head_beams: Vec<BeamId> = pivot_beams
            .iter()
            .copied()
            .filter(|b| self.beams[b.index()].group != tail_group)
            .collect();
        let Some(first_head_beam) = head_beams.first().copied() else {
            return;
        };

        let clone = match self.split_chord(pivot, SplitPoint::Mirror, config) {
            Ok(clone) => clone,
            Err(err) => {
                self.error(Entity::Chord(pivot), diagnostics::SPLIT_FAILED, err.to_string());
                return;
            }
        };
        for beam in &head_beams {
            self.unlink(*beam, pivot);
            self.link(*beam, clone);
        }
        let x = self.chord(clone).head_location().x;
        let y = self.beams[first_head_beam.index()].line().y_at(x);
        self.chords[clone.index()].cut_tail(y);
        self.sort_chord_beams(pivot);
        self.sort_chord_beams(clone);
        log::info!("M{} pivot {} cloned as {}", self.id, pivot, clone);
    }

    /// Give every beam of each group the slope of the group's longest beam
    fn align_beams(&mut self) {
        for group in &self.groups {
            let reference = group
                .beams
                .iter()
                .map(|b| &self.beams[b.index()])
                .filter(|b| !b.is_hook())
                .max_by(|a, b| a.length().total_cmp(&b.length()));
            let Some(reference) = reference else {
                continue;
            };
            let slope = reference.line().slope();
            let reference_id = reference.id;

            for beam_id in &group.beams {
                if *beam_id == reference_id {
                    continue;
                }
                let beam = &mut self.beams[beam_id.index()];
                let middle = beam.line().middle();
                let half = (beam.right().x - beam.left().x) / 2.0;
                let left = Point::new(beam.left().x, middle.y - half * slope);
                let right = Point::new(beam.right().x, middle.y + half * slope);
                beam.set_ends(left, right);
            }
        }
    }

    /// Level of a beam: 1 for the beam nearest the tail of its chords
    pub fn beam_level(&self, beam: BeamId) -> usize {
        self.beams[beam.index()]
            .chords
            .iter()
            .filter_map(|c| self.chord(*c).beams.iter().position(|b| *b == beam))
            .min()
            .map(|p| p + 1)
            .unwrap_or(1)
    }

    /// Order a group's beams by level, then abscissa
    fn order_group_beams(&mut self, group: GroupId) {
        let mut beams = std::mem::take(&mut self.groups[group.index()].beams);
        beams.sort_by(|a, b| {
            self.beam_level(*a)
                .cmp(&self.beam_level(*b))
                .then(self.beam(*a).left().x.total_cmp(&self.beam(*b).left().x))
        });
        self.groups[group.index()].beams = beams;
    }
}
