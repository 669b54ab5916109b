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
use std::{
    collections::HashSet,
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

use tracing::info;

use super::UnknownSampleError;

/// An engine that reports every trigger through the log instead of producing sound.
pub struct Engine {
    samples: HashSet<String>,
    count: AtomicU64,
}

impl Engine {
    /// Creates a logging engine that knows the given samples.
    pub fn new(samples: &[String]) -> Engine {
        Engine {
            samples: samples.iter().cloned().collect(),
            count: AtomicU64::new(0),
        }
    }

    /// The number of successful triggers so far.
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

impl super::PlaybackEngine for Engine {
    fn trigger(&self, sample: &str) -> Result<(), UnknownSampleError> {
        if !self.samples.contains(sample) {
            return Err(UnknownSampleError::new(sample));
        }

        let count = self.count.fetch_add(1, Ordering::Relaxed) + 1;
        info!(sample, count, "Trigger");
        Ok(())
    }

    fn knows(&self, sample: &str) -> bool {
        self.samples.contains(sample)
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Log engine ({} samples)", self.samples.len())
    }
}
