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

//! A validated program: the tempo, the engine to drive and the voices to run.

use std::{collections::BTreeSet, fmt, sync::Arc};

use crate::{
    config::EngineKind,
    engine::{self, PlaybackEngine},
    player::{SequencePlayer, Session},
    schedule::Schedule,
    sequence::Voice,
    tempo::Tempo,
};

/// A sample a voice uses that the program's engine won't know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingSample {
    pub voice: String,
    pub sample: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    tempo: Tempo,
    engine: EngineKind,
    samples: Option<Vec<String>>,
    voices: Vec<Voice>,
}

impl Program {
    /// Creates a new program. When `samples` is None, every sample used by a voice is treated as
    /// known to the engine.
    pub fn new(
        tempo: Tempo,
        engine: EngineKind,
        samples: Option<Vec<String>>,
        voices: Vec<Voice>,
    ) -> Program {
        Program {
            tempo,
            engine,
            samples,
            voices,
        }
    }

    pub fn tempo(&self) -> Tempo {
        self.tempo
    }

    pub fn engine(&self) -> EngineKind {
        self.engine
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    /// Gets the sample list written in the program, if there was one.
    pub fn declared_samples(&self) -> Option<&[String]> {
        self.samples.as_deref()
    }

    /// Every distinct sample used by the voices, sorted.
    pub fn used_samples(&self) -> Vec<String> {
        self.voices
            .iter()
            .flat_map(|voice| voice.steps().iter().filter_map(|step| step.sample()))
            .map(str::to_string)
            .collect::<BTreeSet<String>>()
            .into_iter()
            .collect()
    }

    /// The samples the engine will be told about.
    pub fn known_samples(&self) -> Vec<String> {
        match &self.samples {
            Some(samples) => samples.clone(),
            None => self.used_samples(),
        }
    }

    /// Samples used by voices but missing from the declared sample list. Each voice and sample
    /// pair is reported once, in voice order.
    pub fn missing_samples(&self) -> Vec<MissingSample> {
        let Some(declared) = &self.samples else {
            return Vec::new();
        };

        let mut missing = Vec::new();
        for voice in self.voices.iter() {
            let mut seen = BTreeSet::new();
            for sample in voice.steps().iter().filter_map(|step| step.sample()) {
                if !declared.iter().any(|known| known == sample) && seen.insert(sample) {
                    missing.push(MissingSample {
                        voice: voice.name().to_string(),
                        sample: sample.to_string(),
                    });
                }
            }
        }
        missing
    }

    /// Creates the engine this program asks for.
    pub fn create_engine(&self) -> Arc<dyn PlaybackEngine> {
        engine::get_engine(self.engine, &self.known_samples())
    }

    /// Gets the timeline of this program.
    pub fn schedule(&self) -> Schedule<'_> {
        Schedule::new(self.tempo, &self.voices)
    }

    /// Starts every voice against the given engine.
    pub fn play(&self, engine: Arc<dyn PlaybackEngine>) -> Session {
        SequencePlayer::new(engine, self.tempo).spawn(self.voices.clone())
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Program (tempo: {}, engine: {}, voices: {})",
            self.tempo,
            self.engine,
            self.voices.len()
        )
    }
}
