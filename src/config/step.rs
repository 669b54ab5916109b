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
use serde::{Deserialize, Serialize};

use super::error::ConfigError;
use crate::sequence::Step;

/// A YAML representation of an entry in a voice's step list. Each shape rejects fields that
/// belong to another shape, so a mistyped entry fails to load instead of quietly matching.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum StepEntry {
    Repeat(RepeatEntry),
    Pattern(PatternEntry),
    Hit(HitEntry),
    Rest(RestEntry),
}

/// Plays the nested entries the given number of times.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RepeatEntry {
    pub repeat: u32,
    pub steps: Vec<StepEntry>,
}

/// Triggers one sample once per duration in the list.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PatternEntry {
    pub sample: String,
    pub times: Vec<f64>,
}

/// Triggers a sample, then waits.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct HitEntry {
    pub sample: String,
    pub beats: f64,
}

/// Waits without triggering anything.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RestEntry {
    pub rest: f64,
}

impl StepEntry {
    pub fn repeat(repeat: u32, steps: Vec<StepEntry>) -> StepEntry {
        StepEntry::Repeat(RepeatEntry { repeat, steps })
    }

    pub fn pattern(sample: &str, times: Vec<f64>) -> StepEntry {
        StepEntry::Pattern(PatternEntry {
            sample: sample.to_string(),
            times,
        })
    }

    pub fn hit(sample: &str, beats: f64) -> StepEntry {
        StepEntry::Hit(HitEntry {
            sample: sample.to_string(),
            beats,
        })
    }

    pub fn rest(beats: f64) -> StepEntry {
        StepEntry::Rest(RestEntry { rest: beats })
    }

    /// Flattens this entry into steps, appending them to the given list.
    pub(super) fn expand(&self, voice: &str, steps: &mut Vec<Step>) -> Result<(), ConfigError> {
        match self {
            StepEntry::Repeat(entry) => {
                if entry.repeat == 0 {
                    return Err(ConfigError::InvalidRepeat(voice.to_string()));
                }
                for _ in 0..entry.repeat {
                    for nested in &entry.steps {
                        nested.expand(voice, steps)?;
                    }
                }
            }
            StepEntry::Pattern(entry) => {
                steps.extend(
                    entry
                        .times
                        .iter()
                        .map(|beats| Step::new(&entry.sample, *beats)),
                );
            }
            StepEntry::Hit(entry) => steps.push(Step::new(&entry.sample, entry.beats)),
            StepEntry::Rest(entry) => steps.push(Step::rest(entry.rest)),
        }
        Ok(())
    }
}

impl From<&Step> for StepEntry {
    fn from(step: &Step) -> Self {
        match step.sample() {
            Some(sample) => StepEntry::hit(sample, step.beats()),
            None => StepEntry::rest(step.beats()),
        }
    }
}
