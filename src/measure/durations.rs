//! Voice durations against the expected measure duration

use super::Measure;
use crate::config::RhythmConfig;
use crate::diagnostics::{self, Entity};
use crate::models::{zero, ChordId, Rational, StaffId, TimeSignature, VoiceRef};

impl Measure {
    /// Compute forwards and termination of every voice, record overruns
    pub fn check_duration(&mut self, config: &RhythmConfig) {
        let expected = self.expected_duration(config);
        self.excess = None;

        for index in 0..self.voices.len() {
            let excess = self.voices[index].check_duration(&self.slots, &self.chords, expected);
            log::debug!("M{} {}", self.id, self.voices[index].strip(&self.slots));

            if let Some(excess) = excess {
                let id = self.voices[index].id;
                self.error(
                    Entity::Voice(id),
                    diagnostics::VOICE_OVERRUN,
                    format!("V{} exceeds expected duration {} by {}", id, expected, excess),
                );
                if self.excess.map_or(true, |max| excess > max) {
                    self.excess = Some(excess);
                }
            }
        }
    }

    /// Detect a short measure whose voices all stop early by the same amount
    ///
    /// Such a measure is flagged partial and loses its closing forwards.
    pub fn check_partial(&mut self) -> bool {
        let terminations: Vec<Rational> = self
            .voices
            .iter()
            .filter(|v| !v.is_whole())
            .filter_map(|v| v.termination())
            .collect();
        let Some(first) = terminations.first().copied() else {
            return false;
        };
        if terminations.iter().any(|t| *t >= zero()) {
            return false;
        }

        if terminations.iter().all(|t| *t == first) {
            log::info!("M{} is a partial measure, short by {}", self.id, -first);
            self.partial = true;
            for voice in &mut self.voices {
                voice.remove_final_forward();
            }
            true
        } else {
            self.warning(
                Entity::Measure,
                diagnostics::PARTIAL_MISMATCH,
                format!("Voices end early by different amounts: {:?}", terminations),
            );
            false
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Longest voice duration
    pub fn actual_duration(&self) -> Rational {
        self.voices
            .iter()
            .filter(|v| !v.is_whole())
            .filter_map(|v| v.duration(&self.chords))
            .max()
            .unwrap_or_else(zero)
    }

    /// Latest end time of a sounding (non-rest) chord
    pub fn last_sound_time(&self) -> Option<Rational> {
        self.chords
            .iter()
            .filter(|c| !c.is_rest())
            .filter_map(|c| c.end_time())
            .max()
    }

    /// Voices with at least one chord on the staff
    pub fn voices_in_staff(&self, staff: StaffId) -> Vec<VoiceRef> {
        self.voices
            .iter()
            .enumerate()
            .filter(|(_, v)| v.chords().iter().any(|c| self.chord(*c).staff() == staff))
            .map(|(index, _)| VoiceRef(index))
            .collect()
    }

    /// Guess a time signature from a complete voice
    ///
    /// The voice must start at zero and end exactly on time. Each beam group
    /// counts as one beat spanning from its first start to its last end; other
    /// chords count on their own. All beats must be equal.
    pub fn inferred_time_signature(&self, voice: VoiceRef) -> Option<TimeSignature> {
        let voice = &self.voices[voice.0];
        if voice.termination() != Some(zero()) {
            return None;
        }
        let chords = voice.chords();
        let first = *chords.first()?;
        if self.chord(first).start_time() != Some(zero()) {
            return None;
        }

        let mut beats: Vec<Rational> = Vec::new();
        let mut counted_until: Option<Rational> = None;
        for chord in &chords {
            let c = self.chord(*chord);
            let start = c.start_time()?;
            if counted_until.map_or(false, |until| start < until) {
                continue;
            }
            let beat = match self.group_of(*chord) {
                Some(group) => {
                    let members = self.group_chords(group);
                    let last: ChordId = *members.last()?;
                    let end = self.chord(last).end_time()?;
                    counted_until = Some(end);
                    end - start
                }
                None => c.duration()?,
            };
            beats.push(beat);
        }

        let beat = *beats.first()?;
        if beats.iter().all(|b| *b == beat) {
            Some(TimeSignature::from_beats(beats.len() as u32, beat))
        } else {
            None
        }
    }
}
