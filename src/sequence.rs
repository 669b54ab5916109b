// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Voices and the steps they are built from.
//!
//! A voice is a repeating list of steps. Each step either triggers a sample and then waits, or
//! just waits (a rest). Durations are measured in beats and converted to wall clock time by a
//! [`crate::tempo::Tempo`].

use std::fmt;

/// Errors raised while building a voice.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum SequenceError {
    #[error("voice has no steps")]
    EmptyVoice,

    #[error("step {index} has an invalid duration of {beats} beats")]
    InvalidDuration { index: usize, beats: f64 },

    #[error("a single cycle of the voice lasts zero beats")]
    ZeroLengthCycle,
}

/// A single unit of a voice: an optional sample to trigger and how long to wait afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    sample: Option<String>,
    beats: f64,
}

impl Step {
    /// Creates a step that triggers the given sample and then waits for the given beats.
    pub fn new(sample: &str, beats: f64) -> Step {
        Step {
            sample: Some(sample.to_string()),
            beats,
        }
    }

    /// Creates a step that only waits.
    pub fn rest(beats: f64) -> Step {
        Step {
            sample: None,
            beats,
        }
    }

    /// Gets the sample triggered by this step, if any.
    pub fn sample(&self) -> Option<&str> {
        self.sample.as_deref()
    }

    /// Gets the number of beats to wait after this step.
    pub fn beats(&self) -> f64 {
        self.beats
    }

    /// Returns true if the step doesn't trigger anything.
    pub fn is_rest(&self) -> bool {
        self.sample.is_none()
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sample {
            Some(sample) => write!(f, "{} ({} beats)", sample, self.beats),
            None => write!(f, "rest ({} beats)", self.beats),
        }
    }
}

/// An independent, endlessly repeating sequence of steps.
#[derive(Debug, Clone, PartialEq)]
pub struct Voice {
    name: String,
    steps: Vec<Step>,
    cycle_beats: f64,
}

impl Voice {
    /// Creates a new voice. The steps must be non-empty, every duration must be finite and
    /// non-negative, and one full cycle must last longer than zero beats.
    pub fn new(name: &str, steps: Vec<Step>) -> Result<Voice, SequenceError> {
        if steps.is_empty() {
            return Err(SequenceError::EmptyVoice);
        }

        if let Some((index, step)) = steps
            .iter()
            .enumerate()
            .find(|(_, step)| !step.beats.is_finite() || step.beats < 0.0)
        {
            return Err(SequenceError::InvalidDuration {
                index,
                beats: step.beats,
            });
        }

        let cycle_beats = cycle_length(&steps);
        if cycle_beats <= 0.0 {
            return Err(SequenceError::ZeroLengthCycle);
        }

        Ok(Voice {
            name: name.to_string(),
            steps,
            cycle_beats,
        })
    }

    /// Gets the name of the voice.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets the steps of a single cycle.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// The number of beats in one cycle of the voice.
    pub fn cycle_beats(&self) -> f64 {
        self.cycle_beats
    }

    /// The number of samples triggered in one cycle.
    pub fn hits_per_cycle(&self) -> usize {
        self.steps.iter().filter(|step| !step.is_rest()).count()
    }

    /// Returns true if the voice is made entirely of rests.
    pub fn is_silent(&self) -> bool {
        self.hits_per_cycle() == 0
    }

    /// Returns the endless sequence of triggers for this voice, positioned in beats from the
    /// start of the first cycle. Silent voices produce nothing.
    pub fn hits(&self) -> Hits<'_> {
        Hits {
            voice: self,
            silent: self.is_silent(),
            cycle: 0,
            index: 0,
            offset: 0.0,
        }
    }
}

impl fmt::Display for Voice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (steps: {}, triggers per cycle: {}, cycle: {} beats)",
            self.name,
            self.steps.len(),
            self.hits_per_cycle(),
            self.cycle_beats
        )
    }
}

/// Sums step durations in declaration order. Offsets within a cycle are accumulated the same
/// way so the last offset plus the last duration is exactly the cycle length.
fn cycle_length(steps: &[Step]) -> f64 {
    steps.iter().fold(0.0, |total, step| total + step.beats)
}

/// A sample trigger on a voice's timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit<'a> {
    /// Beats from the start of the voice.
    pub beat: f64,
    /// The repetition this trigger belongs to, starting at zero.
    pub cycle: u64,
    /// The sample to trigger.
    pub sample: &'a str,
}

/// Iterator over the triggers of a voice. Never ends unless the voice is silent.
pub struct Hits<'a> {
    voice: &'a Voice,
    silent: bool,
    cycle: u64,
    index: usize,
    offset: f64,
}

impl<'a> Iterator for Hits<'a> {
    type Item = Hit<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.silent {
            return None;
        }

        let voice = self.voice;
        loop {
            if self.index == voice.steps.len() {
                self.cycle += 1;
                self.index = 0;
                self.offset = 0.0;
            }

            let step = &voice.steps[self.index];
            let at = self.offset;
            self.offset += step.beats;
            self.index += 1;

            if let Some(sample) = step.sample() {
                return Some(Hit {
                    beat: self.cycle as f64 * voice.cycle_beats + at,
                    cycle: self.cycle,
                    sample,
                });
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::{SequenceError, Step, Voice};

    fn beat_voice() -> Voice {
        Voice::new(
            "beat",
            vec![
                Step::new("kick", 1.0),
                Step::new("hat", 1.0),
                Step::new("hat", 1.0),
            ],
        )
        .expect("valid voice")
    }

    #[test]
    fn test_hits_wrap_around() {
        let voice = beat_voice();
        assert_eq!(3.0, voice.cycle_beats());

        let hits: Vec<(f64, u64, &str)> = voice
            .hits()
            .take(7)
            .map(|hit| (hit.beat, hit.cycle, hit.sample))
            .collect();
        assert_eq!(
            vec![
                (0.0, 0, "kick"),
                (1.0, 0, "hat"),
                (2.0, 0, "hat"),
                (3.0, 1, "kick"),
                (4.0, 1, "hat"),
                (5.0, 1, "hat"),
                (6.0, 2, "kick"),
            ],
            hits
        );
    }

    #[test]
    fn test_first_step_repeats_every_cycle() {
        let voice = Voice::new(
            "mel",
            vec![
                Step::new("cowbell", 0.33),
                Step::new("cowbell", 0.33),
                Step::new("cowbell", 0.34),
                Step::new("cowbell", 0.66),
            ],
        )
        .expect("valid voice");

        for hit in voice.hits().step_by(4).take(10) {
            let expected = hit.cycle as f64 * voice.cycle_beats();
            assert!((hit.beat - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn test_rests_shift_triggers() {
        let voice = Voice::new(
            "mel",
            vec![
                Step::rest(3.0),
                Step::new("cowbell", 0.5),
                Step::new("cowbell", 0.5),
            ],
        )
        .expect("valid voice");

        assert_eq!(2, voice.hits_per_cycle());
        let beats: Vec<f64> = voice.hits().take(4).map(|hit| hit.beat).collect();
        assert_eq!(vec![3.0, 3.5, 7.0, 7.5], beats);
    }

    #[test]
    fn test_silent_voice() {
        let voice = Voice::new("quiet", vec![Step::rest(1.0)]).expect("valid voice");
        assert!(voice.is_silent());
        assert!(voice.hits().next().is_none());
    }

    #[test]
    fn test_invalid_voices() {
        assert_eq!(
            Err(SequenceError::EmptyVoice),
            Voice::new("empty", Vec::new())
        );
        assert_eq!(
            Err(SequenceError::InvalidDuration {
                index: 1,
                beats: -1.0
            }),
            Voice::new("negative", vec![Step::new("kick", 1.0), Step::new("hat", -1.0)])
        );
        assert!(matches!(
            Voice::new("nan", vec![Step::new("kick", f64::NAN)]),
            Err(SequenceError::InvalidDuration { index: 0, .. })
        ));
        assert_eq!(
            Err(SequenceError::ZeroLengthCycle),
            Voice::new("zero", vec![Step::new("kick", 0.0), Step::rest(0.0)])
        );
    }

    #[test]
    fn test_zero_length_steps_are_allowed() {
        let voice = Voice::new("flam", vec![Step::new("snare", 0.0), Step::new("snare", 1.0)])
            .expect("valid voice");
        let beats: Vec<f64> = voice.hits().take(4).map(|hit| hit.beat).collect();
        assert_eq!(vec![0.0, 0.0, 1.0, 1.0], beats);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            "beat (steps: 3, triggers per cycle: 3, cycle: 3 beats)",
            beat_voice().to_string()
        );
        assert_eq!("rest (2 beats)", Step::rest(2.0).to_string());
        assert_eq!("kick (1 beats)", Step::new("kick", 1.0).to_string());
    }
}
