//! Part: a sequence of measures sharing time signatures and voices
//!
//! Measures are rebuilt independently (in parallel), then stitched together:
//! a chord tied from the previous measure takes the voice number of the
//! chord it continues, and short measures are detected.

use crate::config::RhythmConfig;
use crate::diagnostics::DiagnosticMark;
use crate::measure::Measure;
use crate::models::TimeSignature;
use rayon::prelude::*;

#[derive(Debug, Clone, Default)]
pub struct Part {
    pub measures: Vec<Measure>,
}

impl Part {
    pub fn new(measures: Vec<Measure>) -> Self {
        Part { measures }
    }

    /// Signature in force at a measure: the nearest declaration at or
    /// before it, else the configured default
    pub fn time_signature_at(&self, index: usize, config: &RhythmConfig) -> TimeSignature {
        self.measures
            .iter()
            .take(index + 1)
            .rev()
            .find_map(|m| m.time_signature())
            .unwrap_or(config.default_time_signature)
    }

    /// Rebuild every measure, then link voices across barlines
    pub fn process(&mut self, config: &RhythmConfig) {
        for index in 0..self.measures.len() {
            let governing = self.time_signature_at(index, config);
            self.measures[index].governing = Some(governing);
        }

        self.measures.par_iter_mut().for_each(|measure| {
            measure.process(config);
        });

        for index in 1..self.measures.len() {
            self.connect_tied_voices(index);
        }
        for measure in &mut self.measures {
            measure.check_partial();
        }

        let errors = self
            .measures
            .iter()
            .filter(|m| m.diagnostics().has_errors())
            .count();
        log::info!(
            "Processed {} measures, {} with errors",
            self.measures.len(),
            errors
        );
    }

    /// Renumber voices of a measure after the voices they continue
    fn connect_tied_voices(&mut self, index: usize) {
        let (before, after) = self.measures.split_at_mut(index);
        let previous = &before[index - 1];
        let measure = &mut after[0];

        let links: Vec<_> = measure
            .slurs()
            .iter()
            .filter(|s| s.tie)
            .filter_map(|s| Some((s.left_extension?, s.right?)))
            .collect();

        for (left_note, right_note) in links {
            let Some(left_chord) = previous.chord_of_note(left_note) else {
                continue;
            };
            let Some(left_id) = previous.voice_id_of(left_chord) else {
                continue;
            };
            let Some(right_chord) = measure.chord_of_note(right_note) else {
                continue;
            };
            let Some(voice) = measure.chord(right_chord).voice() else {
                continue;
            };
            if measure.voice(voice).id() != left_id {
                log::debug!(
                    "M{} {} tied from M{} {}, voice becomes V{}",
                    measure.id(),
                    right_chord,
                    previous.id(),
                    left_chord,
                    left_id
                );
                measure.swap_voice_id(voice, left_id);
            }
        }
    }

    /// All marks of all measures
    pub fn diagnostics(&self) -> Vec<DiagnosticMark> {
        self.measures
            .iter()
            .flat_map(|m| m.diagnostics().marks.iter().cloned())
            .collect()
    }
}
