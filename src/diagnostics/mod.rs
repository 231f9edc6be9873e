//! Diagnostics module for measure reconstruction problems
//!
//! Problems found while rebuilding a measure never abort processing. They are
//! recorded as marks attached to the offending entity, so a partially
//! reconstructed measure remains usable and inspectable.

use crate::models::{BeamId, ChordId, GroupId, SlotId, SlurId};
use serde::{Deserialize, Serialize};

/// Split loop ran out of rounds
pub const SPLIT_LOOP_EXHAUSTED: &str = "split_loop_exhausted";
/// Chord delivered without any note
pub const EMPTY_CHORD: &str = "empty_chord";
/// Beam item touching a stem with no chord
pub const STEM_WITHOUT_CHORD: &str = "stem_without_chord";
/// Beam ending up without a chord on one of its sides
pub const BEAM_MISSING_SIDE: &str = "beam_missing_side";
/// Voice longer than the measure
pub const VOICE_OVERRUN: &str = "voice_overrun";
/// Second, different start time for a chord
pub const START_TIME_CONFLICT: &str = "start_time_conflict";
/// Second, different voice for a chord
pub const VOICE_CONFLICT: &str = "voice_conflict";
/// Slur starting and ending on the same chord
pub const DEGENERATE_TIE: &str = "degenerate_tie";
/// Beam group whose first chord has no start time
pub const GROUP_TIME_UNSET: &str = "group_time_unset";
/// Non whole-rest chord that no slot contains
pub const CHORD_WITHOUT_SLOT: &str = "chord_without_slot";
/// Chord split request that could not be honored
pub const SPLIT_FAILED: &str = "split_failed";
/// Voices of a short measure that do not end together
pub const PARTIAL_MISMATCH: &str = "partial_mismatch";

/// Severity level for diagnostic marks
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Error,
    Warning,
    Info,
}

/// Entity a mark is attached to
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum Entity {
    Measure,
    Chord(ChordId),
    Beam(BeamId),
    Group(GroupId),
    Slot(SlotId),
    Slur(SlurId),
    /// Voice, by its displayed id
    Voice(u32),
}

/// A diagnostic mark highlighting an issue on one entity of a measure
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DiagnosticMark {
    /// Measure id
    pub measure: u32,
    /// Offending entity
    pub entity: Entity,
    /// Severity level
    pub severity: DiagnosticSeverity,
    /// Kind identifier (e.g., "voice_overrun", "split_loop_exhausted")
    pub kind: String,
    /// Human-readable message
    pub message: String,
}

impl DiagnosticMark {
    /// Create a new diagnostic mark
    pub fn new(
        measure: u32,
        entity: Entity,
        severity: DiagnosticSeverity,
        kind: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            measure,
            entity,
            severity,
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Shorthand for an error mark
    pub fn error(measure: u32, entity: Entity, kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(measure, entity, DiagnosticSeverity::Error, kind, message)
    }

    /// Shorthand for a warning mark
    pub fn warning(measure: u32, entity: Entity, kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(measure, entity, DiagnosticSeverity::Warning, kind, message)
    }
}

/// Collection of diagnostic marks for a measure
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Diagnostics {
    /// All diagnostic marks
    pub marks: Vec<DiagnosticMark>,
}

impl Diagnostics {
    /// Create empty diagnostics
    pub fn new() -> Self {
        Self { marks: Vec::new() }
    }

    /// Add a mark, echoing it to the log
    pub fn add(&mut self, mark: DiagnosticMark) {
        match mark.severity {
            DiagnosticSeverity::Error | DiagnosticSeverity::Warning => {
                log::warn!("M{} {:?} {}: {}", mark.measure, mark.entity, mark.kind, mark.message)
            }
            DiagnosticSeverity::Info => {
                log::info!("M{} {:?} {}: {}", mark.measure, mark.entity, mark.kind, mark.message)
            }
        }
        self.marks.push(mark);
    }

    /// Check if there are any errors
    pub fn has_errors(&self) -> bool {
        self.marks
            .iter()
            .any(|m| m.severity == DiagnosticSeverity::Error)
    }

    /// Check if there are any diagnostics
    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    /// Marks of a given kind
    pub fn of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a DiagnosticMark> + 'a {
        self.marks.iter().filter(move |m| m.kind == kind)
    }

    pub fn count(&self, kind: &str) -> usize {
        self.of_kind(kind).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_mark_creation() {
        let mark = DiagnosticMark::new(
            3,
            Entity::Chord(ChordId(5)),
            DiagnosticSeverity::Error,
            "test_error",
            "Test error message",
        );

        assert_eq!(mark.measure, 3);
        assert_eq!(mark.entity, Entity::Chord(ChordId(5)));
        assert_eq!(mark.severity, DiagnosticSeverity::Error);
        assert_eq!(mark.kind, "test_error");
    }

    #[test]
    fn test_diagnostics_has_errors() {
        let mut diags = Diagnostics::new();
        assert!(!diags.has_errors());

        diags.add(DiagnosticMark::warning(1, Entity::Measure, "warn", "Warning"));
        assert!(!diags.has_errors());

        diags.add(DiagnosticMark::error(1, Entity::Voice(2), VOICE_OVERRUN, "Error"));
        assert!(diags.has_errors());
        assert_eq!(diags.count(VOICE_OVERRUN), 1);
        assert_eq!(diags.count("warn"), 1);
    }

    #[test]
    fn test_entity_serialization() {
        let json = serde_json::to_string(&Entity::Beam(BeamId(4))).unwrap();
        assert_eq!(json, r#"{"type":"beam","id":4}"#);
        let json = serde_json::to_string(&Entity::Measure).unwrap();
        assert_eq!(json, r#"{"type":"measure"}"#);
    }
}
