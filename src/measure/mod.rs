//! Measure: owner of every rhythm entity and driver of the passes
//!
//! # Pipeline
//!
//! ```text
//! link beams ─► group beams ─► check ties ─► assign slots ─► propagate times ─► check durations
//!               (close, check
//!                & split, align)
//! ```
//!
//! Every entity lives in an arena owned by the measure and is referenced by a
//! measure-scoped id. No pass aborts: inconsistencies end up in
//! `Measure::diagnostics` and processing goes on with the best state at hand.

mod beams;
mod durations;
mod ties;
mod timing;
mod voices;

use crate::beam::{Beam, BeamGroup, BeamItem};
use crate::chord::{Chord, SplitPoint};
use crate::config::RhythmConfig;
use crate::diagnostics::{self, DiagnosticMark, Diagnostics, Entity};
use crate::errors::{Result, RhythmError};
use crate::models::{
    BeamId, ChordId, GroupId, Note, NoteId, Point, Rational, Scale, SlotId, Slur, SlurId, Stem,
    TimeSignature, VoiceRef,
};
use crate::slot::Slot;
use crate::voice::Voice;

#[derive(Debug, Clone)]
pub struct Measure {
    pub(crate) id: u32,
    pub(crate) scale: Scale,

    /// Time signature declared at the start of this measure
    time_signature: Option<TimeSignature>,
    /// Signature in force, resolved by the enclosing part
    pub(crate) governing: Option<TimeSignature>,

    pub(crate) chords: Vec<Chord>,
    pub(crate) beams: Vec<Beam>,
    pub(crate) groups: Vec<BeamGroup>,
    /// Ordered by abscissa
    pub(crate) slots: Vec<Slot>,
    pub(crate) voices: Vec<Voice>,
    pub(crate) slurs: Vec<Slur>,

    next_note: u32,
    next_slur: u32,

    /// Largest voice overrun
    pub(crate) excess: Option<Rational>,
    /// Short measure (pickup) whose voices all end early by the same amount
    pub(crate) partial: bool,

    pub(crate) diagnostics: Diagnostics,
}

impl Measure {
    pub fn new(id: u32, scale: Scale) -> Self {
        Measure {
            id,
            scale,
            time_signature: None,
            governing: None,
            chords: Vec::new(),
            beams: Vec::new(),
            groups: Vec::new(),
            slots: Vec::new(),
            voices: Vec::new(),
            slurs: Vec::new(),
            next_note: 1,
            next_slur: 1,
            excess: None,
            partial: false,
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn with_time_signature(mut self, signature: TimeSignature) -> Self {
        self.time_signature = Some(signature);
        self
    }

    // ------------------------------------------------------------------
    // Input
    // ------------------------------------------------------------------

    /// Add a recognized chord
    ///
    /// A chord without notes is not created; it is reported instead.
    pub fn add_chord(&mut self, notes: Vec<Note>, stem: Option<Stem>) -> Option<ChordId> {
        let id = ChordId::from_index(self.chords.len());
        if let Some(max) = notes.iter().map(|n| n.id.0).max() {
            self.next_note = self.next_note.max(max + 1);
        }
        match Chord::new(id, notes, stem) {
            Ok(chord) => {
                self.chords.push(chord);
                Some(id)
            }
            Err(err) => {
                self.error(Entity::Measure, diagnostics::EMPTY_CHORD, err.to_string());
                None
            }
        }
    }

    /// Add a recognized beam
    pub fn add_beam(&mut self, items: Vec<BeamItem>, hook: bool) -> BeamId {
        let id = BeamId::from_index(self.beams.len());
        self.beams.push(Beam::new(id, items, hook));
        id
    }

    /// Add a slot gathering chords that start together
    ///
    /// Slots are kept in abscissa order, so ids of previously added slots
    /// may shift. Returns the id of the new slot.
    pub fn add_slot(&mut self, chords: &[ChordId]) -> SlotId {
        let reference = self.mean_center(chords);
        let marker = self.slots.len();
        self.slots
            .push(Slot::new(SlotId(u32::MAX), chords.to_vec(), reference));

        let mut order: Vec<usize> = (0..self.slots.len()).collect();
        order.sort_by(|a, b| {
            self.slots[*a]
                .reference
                .x
                .total_cmp(&self.slots[*b].reference.x)
        });
        let mut slots: Vec<Slot> = Vec::with_capacity(order.len());
        let mut new_id = SlotId(0);
        for (index, old) in order.iter().enumerate() {
            let mut slot = self.slots[*old].clone();
            slot.id = SlotId::from_index(index);
            if *old == marker {
                new_id = slot.id;
            }
            slots.push(slot);
        }
        self.slots = slots;

        for slot in &self.slots {
            for chord in &slot.chords {
                self.chords[chord.index()].slot = Some(slot.id);
            }
        }
        for index in 0..self.slots.len() {
            self.sort_slot_chords(SlotId::from_index(index));
        }
        new_id
    }

    /// Add a slur between two notes of this measure (either end may be missing)
    pub fn add_slur(&mut self, left: Option<NoteId>, right: Option<NoteId>, tie: bool) -> SlurId {
        let id = SlurId(self.next_slur);
        self.next_slur += 1;
        self.slurs.push(Slur::new(id, left, right, tie));
        id
    }

    /// Add a slur whose left end lies in the previous measure
    pub fn add_incoming_slur(&mut self, previous: NoteId, right: NoteId, tie: bool) -> SlurId {
        let id = self.add_slur(None, Some(right), tie);
        if let Some(slur) = self.slurs.iter_mut().find(|s| s.id == id) {
            slur.left_extension = Some(previous);
        }
        id
    }

    pub fn chord_mut(&mut self, id: ChordId) -> &mut Chord {
        &mut self.chords[id.index()]
    }

    /// Split a chord, register the alien chord and put it in the same slot
    ///
    /// Beam links are not transferred; see `Chord::split`.
    pub fn split_chord(
        &mut self,
        chord: ChordId,
        point: SplitPoint,
        config: &RhythmConfig,
    ) -> Result<ChordId> {
        if chord.index() >= self.chords.len() {
            return Err(RhythmError::UnknownChord(chord));
        }
        let alien_id = ChordId::from_index(self.chords.len());
        let scale = self.scale;
        let mut next_note = self.next_note;
        let alien = self.chords[chord.index()].split(
            point,
            alien_id,
            || {
                let id = NoteId(next_note);
                next_note += 1;
                id
            },
            &scale,
            config.min_stem_fragment,
        )?;
        self.next_note = next_note;

        let slot = alien.slot;
        self.chords.push(alien);
        if let Some(slot) = slot {
            self.slots[slot.index()].chords.push(alien_id);
            self.sort_slot_chords(slot);
        }
        Ok(alien_id)
    }

    // ------------------------------------------------------------------
    // Processing
    // ------------------------------------------------------------------

    /// Run every pass, in order
    pub fn process(&mut self, config: &RhythmConfig) -> &Diagnostics {
        log::debug!("Processing measure {}", self.id);
        self.link_beams();
        self.build_beam_groups(config);
        self.check_tied_chords(config);
        self.assign_slots(config);
        self.propagate_times();
        self.check_duration(config);
        &self.diagnostics
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn scale(&self) -> Scale {
        self.scale
    }

    pub fn time_signature(&self) -> Option<TimeSignature> {
        self.time_signature
    }

    /// Signature governing this measure (declared here or inherited)
    pub fn governing_time_signature(&self, config: &RhythmConfig) -> TimeSignature {
        self.governing
            .or(self.time_signature)
            .unwrap_or(config.default_time_signature)
    }

    pub fn expected_duration(&self, config: &RhythmConfig) -> Rational {
        self.governing_time_signature(config).duration()
    }

    pub fn chord(&self, id: ChordId) -> &Chord {
        &self.chords[id.index()]
    }

    pub fn chords(&self) -> &[Chord] {
        &self.chords
    }

    pub fn beam(&self, id: BeamId) -> &Beam {
        &self.beams[id.index()]
    }

    pub fn beams(&self) -> &[Beam] {
        &self.beams
    }

    pub fn group(&self, id: GroupId) -> &BeamGroup {
        &self.groups[id.index()]
    }

    pub fn groups(&self) -> &[BeamGroup] {
        &self.groups
    }

    pub fn slot(&self, id: SlotId) -> &Slot {
        &self.slots[id.index()]
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn voice(&self, voice: VoiceRef) -> &Voice {
        &self.voices[voice.0]
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    /// Voice handle for a displayed voice id
    pub fn voice_by_id(&self, id: u32) -> Option<VoiceRef> {
        self.voices.iter().position(|v| v.id == id).map(VoiceRef)
    }

    /// Displayed voice id of a chord
    pub fn voice_id_of(&self, chord: ChordId) -> Option<u32> {
        self.chord(chord).voice().map(|v| self.voices[v.0].id)
    }

    pub fn slurs(&self) -> &[Slur] {
        &self.slurs
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn excess(&self) -> Option<Rational> {
        self.excess
    }

    pub fn is_partial(&self) -> bool {
        self.partial
    }

    /// Chord holding a note
    pub fn chord_of_note(&self, note: NoteId) -> Option<ChordId> {
        self.chords
            .iter()
            .find(|c| c.contains_note(note))
            .map(|c| c.id)
    }

    pub fn note(&self, note: NoteId) -> Option<&Note> {
        self.chords.iter().find_map(|c| c.note(note))
    }

    /// Group of a chord, through any of its beams
    pub fn group_of(&self, chord: ChordId) -> Option<GroupId> {
        self.chord(chord)
            .beams
            .iter()
            .find_map(|b| self.beams[b.index()].group)
    }

    /// Chords of a group, derived from its beams, ordered by abscissa
    pub fn group_chords(&self, group: GroupId) -> Vec<ChordId> {
        let mut chords: Vec<ChordId> = Vec::new();
        for beam in &self.groups[group.index()].beams {
            for chord in &self.beams[beam.index()].chords {
                if !chords.contains(chord) {
                    chords.push(*chord);
                }
            }
        }
        self.sort_by_abscissa(&mut chords);
        chords
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    pub(crate) fn sort_by_abscissa(&self, chords: &mut [ChordId]) {
        chords.sort_by(|a, b| {
            self.chord(*a)
                .head_location()
                .x
                .total_cmp(&self.chord(*b).head_location().x)
                .then(a.cmp(b))
        });
    }

    /// Top to bottom: staff, head ordinate, id
    pub(crate) fn sort_slot_chords(&mut self, slot: SlotId) {
        let mut chords = std::mem::take(&mut self.slots[slot.index()].chords);
        chords.sort_by(|a, b| {
            let (ca, cb) = (self.chord(*a), self.chord(*b));
            ca.staff()
                .cmp(&cb.staff())
                .then(ca.head_location().y.total_cmp(&cb.head_location().y))
                .then(a.cmp(b))
        });
        self.slots[slot.index()].chords = chords;
    }

    fn mean_center(&self, chords: &[ChordId]) -> Point {
        if chords.is_empty() {
            return Point::default();
        }
        let (sx, sy) = chords.iter().fold((0.0, 0.0), |(sx, sy), c| {
            let p = self.chord(*c).center();
            (sx + p.x, sy + p.y)
        });
        let n = chords.len() as f64;
        Point::new(sx / n, sy / n)
    }

    pub(crate) fn error(&mut self, entity: Entity, kind: &str, message: impl Into<String>) {
        self.diagnostics
            .add(DiagnosticMark::error(self.id, entity, kind, message));
    }

    pub(crate) fn warning(&mut self, entity: Entity, kind: &str, message: impl Into<String>) {
        self.diagnostics
            .add(DiagnosticMark::warning(self.id, entity, kind, message));
    }
}
