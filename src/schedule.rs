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

//! Evaluates voices into trigger times without waiting on a clock. The live player walks the
//! same hit iterator, so a schedule is exactly what a run would trigger.

use std::{cmp::Ordering, fmt, time::Duration};

use crate::{sequence::Voice, tempo::Tempo, util::duration_offset};

/// A trigger at a fixed offset from the start of playback.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledTrigger {
    pub at: Duration,
    pub voice: String,
    pub sample: String,
}

impl fmt::Display for ScheduledTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}  {:<12} {}",
            duration_offset(self.at),
            self.voice,
            self.sample
        )
    }
}

/// The timeline of a set of voices at a tempo.
pub struct Schedule<'a> {
    tempo: Tempo,
    voices: &'a [Voice],
}

impl<'a> Schedule<'a> {
    /// Creates a new schedule.
    pub fn new(tempo: Tempo, voices: &'a [Voice]) -> Schedule<'a> {
        Schedule { tempo, voices }
    }

    /// The wall clock length of one cycle of the voice.
    pub fn cycle_duration(&self, voice: &Voice) -> Duration {
        self.tempo.duration_for(voice.cycle_beats())
    }

    /// Every trigger that happens before the horizon, across all voices. Triggers are ordered by
    /// time, and simultaneous triggers keep the order the voices were declared in.
    pub fn until(&self, horizon: Duration) -> Vec<ScheduledTrigger> {
        let mut triggers: Vec<(usize, ScheduledTrigger)> = Vec::new();
        for (index, voice) in self.voices.iter().enumerate() {
            for hit in voice.hits() {
                let at = self.tempo.duration_for(hit.beat);
                if at >= horizon {
                    break;
                }
                triggers.push((
                    index,
                    ScheduledTrigger {
                        at,
                        voice: voice.name().to_string(),
                        sample: hit.sample.to_string(),
                    },
                ));
            }
        }

        // Stable, so triggers of a single voice stay in hit order.
        triggers.sort_by(|(a_index, a), (b_index, b)| match a.at.cmp(&b.at) {
            Ordering::Equal => a_index.cmp(b_index),
            ordering => ordering,
        });
        triggers.into_iter().map(|(_, trigger)| trigger).collect()
    }

    /// The triggers of the first `cycles` repetitions of a voice.
    pub fn cycles(&self, voice: &Voice, cycles: u64) -> Vec<ScheduledTrigger> {
        voice
            .hits()
            .take_while(|hit| hit.cycle < cycles)
            .map(|hit| ScheduledTrigger {
                at: self.tempo.duration_for(hit.beat),
                voice: voice.name().to_string(),
                sample: hit.sample.to_string(),
            })
            .collect()
    }
}
