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
use std::{collections::HashSet, fmt, sync::Arc};

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::debug;

use super::UnknownSampleError;

/// A trigger recorded by the mock engine.
#[derive(Clone, Debug)]
pub struct Trigger {
    pub sample: String,
    pub at: Instant,
}

/// A mock engine. Doesn't play anything, but remembers every trigger and when it happened.
#[derive(Clone)]
pub struct Engine {
    /// The known samples. None means every sample is accepted.
    samples: Option<Arc<HashSet<String>>>,
    triggers: Arc<Mutex<Vec<Trigger>>>,
}

impl Engine {
    /// Creates a mock engine that knows the given samples.
    pub fn new(samples: &[String]) -> Engine {
        Engine {
            samples: Some(Arc::new(samples.iter().cloned().collect())),
            triggers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Creates a mock engine that accepts any sample.
    pub fn permissive() -> Engine {
        Engine {
            samples: None,
            triggers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Gets a copy of every trigger recorded so far.
    pub fn triggers(&self) -> Vec<Trigger> {
        self.triggers.lock().clone()
    }

    /// Gets the names of the samples triggered so far, in order.
    pub fn samples_triggered(&self) -> Vec<String> {
        self.triggers
            .lock()
            .iter()
            .map(|trigger| trigger.sample.clone())
            .collect()
    }

    /// Forgets every recorded trigger.
    pub fn clear(&self) {
        self.triggers.lock().clear();
    }
}

impl super::PlaybackEngine for Engine {
    fn trigger(&self, sample: &str) -> Result<(), UnknownSampleError> {
        if !self.knows(sample) {
            return Err(UnknownSampleError::new(sample));
        }

        debug!(sample, "Mock trigger");
        self.triggers.lock().push(Trigger {
            sample: sample.to_string(),
            at: Instant::now(),
        });
        Ok(())
    }

    fn knows(&self, sample: &str) -> bool {
        self.samples
            .as_ref()
            .is_none_or(|samples| samples.contains(sample))
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.samples {
            Some(samples) => write!(f, "Mock engine ({} samples)", samples.len()),
            None => write!(f, "Mock engine (any sample)"),
        }
    }
}

#[cfg(test)]
mod test {
    use crate::engine::{PlaybackEngine, UnknownSampleError};

    use super::Engine;

    #[test]
    fn test_records_triggers() {
        let engine = Engine::new(&["kick".to_string()]);
        assert!(engine.trigger("kick").is_ok());
        assert_eq!(
            Err(UnknownSampleError::new("hat")),
            engine.trigger("hat")
        );
        assert!(engine.trigger("kick").is_ok());
        assert_eq!(vec!["kick", "kick"], engine.samples_triggered());

        // Clones share recordings.
        let other = engine.clone();
        other.clear();
        assert!(engine.triggers().is_empty());
    }

    #[test]
    fn test_permissive() {
        let engine = Engine::permissive();
        assert!(engine.knows("anything"));
        assert!(engine.trigger("anything").is_ok());
        assert_eq!("Mock engine (any sample)", engine.to_string());
    }
}
