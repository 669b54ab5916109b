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

//! Playback engines receive sample triggers from running voices. Producing audio is left to
//! the engine; the sequencer only decides when to call it.

use std::{fmt, sync::Arc};

use crate::config::EngineKind;

pub mod log;
pub mod mock;

/// Raised when a voice triggers a sample the engine doesn't recognize.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sample '{sample}'")]
pub struct UnknownSampleError {
    pub sample: String,
}

impl UnknownSampleError {
    pub fn new(sample: &str) -> UnknownSampleError {
        UnknownSampleError {
            sample: sample.to_string(),
        }
    }
}

/// An engine that plays samples. Engines are shared between every running voice, so they must
/// be safe to call concurrently, and `trigger` must return without waiting for playback.
pub trait PlaybackEngine: fmt::Display + Send + Sync {
    /// Starts playback of the given sample.
    fn trigger(&self, sample: &str) -> Result<(), UnknownSampleError>;

    /// Returns true if the engine can play the given sample.
    fn knows(&self, sample: &str) -> bool;
}

/// Gets an engine of the given kind that knows the given samples.
pub fn get_engine(kind: EngineKind, samples: &[String]) -> Arc<dyn PlaybackEngine> {
    match kind {
        EngineKind::Log => Arc::new(log::Engine::new(samples)),
        EngineKind::Mock => Arc::new(mock::Engine::new(samples)),
    }
}
