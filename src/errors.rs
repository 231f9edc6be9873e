//! Error types for rhythm reconstruction
//!
//! `RhythmError` covers API failures and write-once violations. Measure
//! passes never stop on these: they turn them into diagnostic marks (see
//! `crate::diagnostics`) and keep going with the first assigned value.

use crate::models::{ChordId, NoteId, Rational, VoiceRef};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RhythmError {
    /// Configuration file could not be read
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration document is not valid YAML for `RhythmConfig`
    #[error("invalid config: {0}")]
    Config(#[from] serde_yaml::Error),

    /// Report could not be serialized
    #[error("report serialization failed: {0}")]
    Report(#[from] serde_json::Error),

    #[error("unknown chord {0}")]
    UnknownChord(ChordId),

    #[error("note {note} does not belong to chord {chord}")]
    ForeignNote { chord: ChordId, note: NoteId },

    #[error("chord has no notes")]
    EmptyChord,

    #[error("start time of {chord} already set to {current}, refusing {requested}")]
    StartTimeConflict {
        chord: ChordId,
        current: Rational,
        requested: Rational,
    },

    #[error("voice of {chord} already set to {current}, refusing {requested}")]
    VoiceConflict {
        chord: ChordId,
        current: VoiceRef,
        requested: VoiceRef,
    },
}

pub type Result<T> = std::result::Result<T, RhythmError>;
