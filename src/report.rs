//! Serializable summary of a processed measure
//!
//! Durations are rendered as fraction strings ("3/4") to keep the JSON
//! readable.

use crate::config::RhythmConfig;
use crate::diagnostics::DiagnosticMark;
use crate::errors::Result;
use crate::measure::Measure;
use crate::models::{BeamId, ChordId, GroupId, Rational, SlotId, StaffId};
use crate::voice::Forward;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ChordReport {
    pub id: ChordId,
    pub staff: StaffId,
    pub slot: Option<SlotId>,
    /// Displayed voice id
    pub voice: Option<u32>,
    pub start: Option<String>,
    pub duration: Option<String>,
    pub beams: Vec<BeamId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BeamReport {
    pub id: BeamId,
    /// 1 for the beam nearest the heads' opposite end
    pub level: usize,
    pub hook: bool,
    pub chords: Vec<ChordId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupReport {
    pub id: GroupId,
    pub beams: Vec<BeamReport>,
    pub chords: Vec<ChordId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VoiceReport {
    pub id: u32,
    pub strip: String,
    pub termination: Option<String>,
    pub forwards: Vec<Forward>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MeasureReport {
    pub id: u32,
    pub expected: String,
    pub actual: String,
    pub excess: Option<String>,
    pub partial: bool,
    pub chords: Vec<ChordReport>,
    pub groups: Vec<GroupReport>,
    pub voices: Vec<VoiceReport>,
    pub diagnostics: Vec<DiagnosticMark>,
}

fn fraction(value: Rational) -> String {
    value.to_string()
}

impl MeasureReport {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Measure {
    /// Snapshot of the current state of the measure
    pub fn report(&self, config: &RhythmConfig) -> MeasureReport {
        let chords = self
            .chords
            .iter()
            .map(|c| ChordReport {
                id: c.id(),
                staff: c.staff(),
                slot: c.slot(),
                voice: self.voice_id_of(c.id()),
                start: c.start_time().map(fraction),
                duration: c.duration().map(fraction),
                beams: c.beams().to_vec(),
            })
            .collect();

        let groups = self
            .groups
            .iter()
            .map(|g| GroupReport {
                id: g.id(),
                beams: g
                    .beams()
                    .iter()
                    .map(|b| {
                        let beam = self.beam(*b);
                        BeamReport {
                            id: *b,
                            level: self.beam_level(*b),
                            hook: beam.is_hook(),
                            chords: beam.chords().to_vec(),
                        }
                    })
                    .collect(),
                chords: self.group_chords(g.id()),
            })
            .collect();

        let voices = self
            .voices
            .iter()
            .map(|v| VoiceReport {
                id: v.id(),
                strip: v.strip(&self.slots),
                termination: v.termination().map(fraction),
                forwards: v.forwards().to_vec(),
            })
            .collect();

        MeasureReport {
            id: self.id,
            expected: fraction(self.expected_duration(config)),
            actual: fraction(self.actual_duration()),
            excess: self.excess.map(fraction),
            partial: self.partial,
            chords,
            groups,
            voices,
            diagnostics: self.diagnostics.marks.clone(),
        }
    }
}
