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
use std::path::Path;

use tracing::info;

use crate::util::filename_display;

mod error;
mod program;
mod step;

pub use self::error::ConfigError;
pub use self::program::{EngineKind, Program, VoiceDefinition, BPM_OVERRIDE_RANGE};
pub use self::step::{HitEntry, PatternEntry, RepeatEntry, RestEntry, StepEntry};

/// Loads and validates a program from a YAML file.
pub fn load_program(path: &Path) -> Result<crate::program::Program, ConfigError> {
    load_program_with_bpm(path, None)
}

/// Loads and validates a program from a YAML file, playing it at the given tempo instead of
/// its own when one is provided.
pub fn load_program_with_bpm(
    path: &Path,
    bpm: Option<f64>,
) -> Result<crate::program::Program, ConfigError> {
    let mut definition = Program::deserialize(path)?;
    if let Some(bpm) = bpm {
        definition = definition.with_bpm(bpm)?;
    }
    let program = definition.to_program()?;
    info!(
        file = filename_display(path),
        tempo = %program.tempo(),
        engine = %program.engine(),
        voices = program.voices().len(),
        "Loaded program"
    );
    Ok(program)
}

/// Parses and validates a program from a YAML string.
pub fn parse_program(yaml: &str) -> Result<crate::program::Program, ConfigError> {
    Program::from_yaml(yaml)?.to_program()
}

/// Renders a program in its expanded form, with repeats and patterns flattened.
pub fn expanded_yaml(program: &crate::program::Program) -> Result<String, serde_yml::Error> {
    Program::from(program).to_yaml()
}
