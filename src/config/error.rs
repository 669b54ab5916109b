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

use crate::{sequence::SequenceError, tempo::TempoError};

/// Typed error for program load/parse failures so callers can distinguish
/// e.g. file-not-found from an invalid voice without string matching.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config load/parse error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid tempo: {0}")]
    Tempo(#[from] TempoError),

    #[error("Tempo override must be between 60 and 200 BPM, got {0}")]
    BpmOverride(f64),

    #[error("Invalid voice {voice}: {source}")]
    Voice {
        voice: String,
        #[source]
        source: SequenceError,
    },

    #[error("Voice {0} is defined more than once")]
    DuplicateVoice(String),

    #[error("Voice {0} (counting from 1) has no name")]
    UnnamedVoice(usize),

    #[error("Repeat count in voice {0} must be at least 1")]
    InvalidRepeat(String),

    #[error("Program defines no voices")]
    NoVoices,
}
