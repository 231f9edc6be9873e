//! Measure Rhythm Reconstruction
//!
//! Rebuilds the rhythm of recognized music measures: beam groups, chord
//! splits, time slots, start times and voices.
//!
//! Input is the raw material delivered by symbol recognition (chords with
//! their notes and stems, beams, slots, slurs). `Measure::process` runs the
//! passes in order; `Part::process` does it for a whole sequence of
//! measures and links voices across barlines.

pub mod assignment;
pub mod beam;
pub mod chord;
pub mod config;
pub mod diagnostics;
pub mod errors;
pub mod measure;
pub mod models;
pub mod part;
pub mod report;
pub mod slot;
pub mod voice;

// Re-export commonly used types
pub use beam::{Beam, BeamGroup, BeamItem};
pub use chord::{Chord, SplitPoint};
pub use config::RhythmConfig;
pub use diagnostics::{DiagnosticMark, Diagnostics, Entity};
pub use errors::{Result, RhythmError};
pub use measure::Measure;
pub use models::*;
pub use part::Part;
pub use report::MeasureReport;
pub use slot::Slot;
pub use voice::{Forward, ForwardPosition, Status, Voice};
