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
use std::{collections::HashSet, fmt, ops::RangeInclusive, path::Path};

use config::{Config, File, FileFormat};
use serde::{Deserialize, Serialize};

use super::error::ConfigError;
use super::step::StepEntry;
use crate::{
    sequence::Voice,
    tempo::{Tempo, DEFAULT_BPM},
};

/// The tempos a program's own BPM can be overridden with from the command line.
pub const BPM_OVERRIDE_RANGE: RangeInclusive<f64> = 60.0..=200.0;

/// The playback engine a program drives.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// Reports triggers through the log.
    #[default]
    Log,
    /// Records triggers in memory.
    Mock,
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineKind::Log => write!(f, "log"),
            EngineKind::Mock => write!(f, "mock"),
        }
    }
}

/// A YAML representation of a program.
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct Program {
    /// The tempo in beats per minute.
    #[serde(default = "default_bpm")]
    bpm: f64,

    /// The engine to trigger samples on.
    #[serde(default)]
    engine: EngineKind,

    /// The samples the engine knows. When omitted, every sample used by a voice is known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    samples: Option<Vec<String>>,

    /// The voices to play.
    voices: Vec<VoiceDefinition>,
}

fn default_bpm() -> f64 {
    DEFAULT_BPM
}

/// A YAML representation of a voice.
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct VoiceDefinition {
    /// The name of the voice.
    name: String,

    /// The steps of a single cycle.
    steps: Vec<StepEntry>,
}

impl VoiceDefinition {
    /// Creates a new voice definition.
    pub fn new(name: &str, steps: Vec<StepEntry>) -> VoiceDefinition {
        VoiceDefinition {
            name: name.to_string(),
            steps,
        }
    }

    /// Converts this definition into a voice, expanding repeats and patterns.
    pub fn to_voice(&self) -> Result<Voice, ConfigError> {
        let mut steps = Vec::new();
        for entry in self.steps.iter() {
            entry.expand(&self.name, &mut steps)?;
        }

        Voice::new(&self.name, steps).map_err(|source| ConfigError::Voice {
            voice: self.name.clone(),
            source,
        })
    }
}

impl Program {
    /// Creates a new program configuration.
    pub fn new(
        bpm: f64,
        engine: EngineKind,
        samples: Option<Vec<String>>,
        voices: Vec<VoiceDefinition>,
    ) -> Program {
        Program {
            bpm,
            engine,
            samples,
            voices,
        }
    }

    /// Deserializes a file from the path into a program configuration struct.
    pub fn deserialize(path: &Path) -> Result<Program, ConfigError> {
        Ok(Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize::<Program>()?)
    }

    /// Deserializes a YAML string into a program configuration struct.
    pub fn from_yaml(yaml: &str) -> Result<Program, ConfigError> {
        Ok(Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()?
            .try_deserialize::<Program>()?)
    }

    /// Serializes this program to YAML.
    pub fn to_yaml(&self) -> Result<String, serde_yml::Error> {
        serde_yml::to_string(self)
    }

    /// Replaces the program's tempo. The override must fall within [`BPM_OVERRIDE_RANGE`].
    pub fn with_bpm(mut self, bpm: f64) -> Result<Program, ConfigError> {
        if !BPM_OVERRIDE_RANGE.contains(&bpm) {
            return Err(ConfigError::BpmOverride(bpm));
        }
        self.bpm = bpm;
        Ok(self)
    }

    /// Gets the tempo in beats per minute.
    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    /// Gets the engine kind.
    pub fn engine(&self) -> EngineKind {
        self.engine
    }

    /// Converts this configuration into a validated program.
    pub fn to_program(&self) -> Result<crate::program::Program, ConfigError> {
        let tempo = Tempo::new(self.bpm)?;

        if self.voices.is_empty() {
            return Err(ConfigError::NoVoices);
        }

        let mut names = HashSet::new();
        let mut voices = Vec::with_capacity(self.voices.len());
        for (i, definition) in self.voices.iter().enumerate() {
            if definition.name.trim().is_empty() {
                return Err(ConfigError::UnnamedVoice(i + 1));
            }
            if !names.insert(definition.name.as_str()) {
                return Err(ConfigError::DuplicateVoice(definition.name.clone()));
            }
            voices.push(definition.to_voice()?);
        }

        Ok(crate::program::Program::new(
            tempo,
            self.engine,
            self.samples.clone(),
            voices,
        ))
    }
}

impl From<&crate::program::Program> for Program {
    /// Builds the expanded form of a program, where every voice is a flat list of hits and rests.
    fn from(program: &crate::program::Program) -> Self {
        Program {
            bpm: program.tempo().bpm(),
            engine: program.engine(),
            samples: program.declared_samples().map(|samples| samples.to_vec()),
            voices: program
                .voices()
                .iter()
                .map(|voice| {
                    VoiceDefinition::new(
                        voice.name(),
                        voice.steps().iter().map(StepEntry::from).collect(),
                    )
                })
                .collect(),
        }
    }
}
