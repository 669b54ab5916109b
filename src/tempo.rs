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
use std::{fmt, time::Duration};

const SECONDS_PER_MINUTE: f64 = 60.0;

/// The tempo used when a program doesn't specify one.
pub const DEFAULT_BPM: f64 = 60.0;

/// Errors produced when constructing a tempo.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum TempoError {
    #[error("tempo must be a finite number of beats per minute above zero, got {0}")]
    Invalid(f64),
}

/// The speed of a program in beats per minute. One beat is the abstract time unit that
/// step durations are written in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tempo {
    bpm: f64,
}

impl Tempo {
    /// Creates a new tempo. The BPM must be finite and strictly positive.
    pub fn new(bpm: f64) -> Result<Tempo, TempoError> {
        if !bpm.is_finite() || bpm <= 0.0 {
            return Err(TempoError::Invalid(bpm));
        }
        Ok(Tempo { bpm })
    }

    /// Gets the beats per minute.
    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    /// The length of a single beat in seconds.
    pub fn seconds_per_beat(&self) -> f64 {
        SECONDS_PER_MINUTE / self.bpm
    }

    /// Converts a number of beats into wall clock time. Negative beat counts clamp to zero and
    /// durations too large to represent saturate.
    pub fn duration_for(&self, beats: f64) -> Duration {
        let seconds = (beats * self.seconds_per_beat()).max(0.0);
        Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX)
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Tempo { bpm: DEFAULT_BPM }
    }
}

impl fmt::Display for Tempo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} BPM", self.bpm)
    }
}
