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
use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use clap::{crate_version, Parser, Subcommand};
use duration_string::DurationString;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use looptrack::config;
use looptrack::player::VoiceOutcome;

const DEFAULT_SCHEDULE_HORIZON: Duration = Duration::from_secs(10);

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "A looping beat sequencer."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Plays every voice of a program until interrupted.
    Play {
        /// The path to the program.
        program_path: String,
        /// Stop after this long, e.g. 30s or 2m.
        #[arg[short, long]]
        duration: Option<String>,
        /// Play at this tempo instead of the program's own (60 to 200 BPM).
        #[arg[short = 'm', long]]
        bpm: Option<f64>,
    },
    /// Verifies a program and prints its expanded form.
    Verify {
        /// The path to the program.
        program_path: String,
    },
    /// Prints the triggers a program would make.
    Schedule {
        /// The path to the program.
        program_path: String,
        /// How far ahead to print, e.g. 10s or 1m.
        #[arg[short, long]]
        until: Option<String>,
        /// Schedule at this tempo instead of the program's own (60 to 200 BPM).
        #[arg[short = 'm', long]]
        bpm: Option<f64>,
    },
}

fn parse_duration(duration: Option<String>) -> Result<Option<Duration>, Box<dyn Error>> {
    Ok(match duration {
        Some(duration) => Some(DurationString::from_string(duration)?.into()),
        None => None,
    })
}

/// Resolves on Ctrl-C. If the signal can't be listened for, this never resolves and playback
/// only ends by duration or failure.
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(err = %e, "Unable to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

fn report(outcomes: &[VoiceOutcome]) -> Result<(), Box<dyn Error>> {
    let failed: Vec<String> = outcomes
        .iter()
        .filter_map(|outcome| outcome.result.as_ref().err())
        .map(|err| err.to_string())
        .collect();

    if failed.is_empty() {
        return Ok(());
    }
    Err(failed.join("; ").into())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play {
            program_path,
            duration,
            bpm,
        } => {
            let duration = parse_duration(duration)?;
            let program = config::load_program_with_bpm(&PathBuf::from(&program_path), bpm)?;
            for missing in program.missing_samples() {
                warn!(
                    voice = missing.voice.as_str(),
                    sample = missing.sample.as_str(),
                    "Sample is not known to the engine, voice will stop when it is triggered"
                );
            }

            let session = program.play(program.create_engine());
            let stop = session.stop_handle();
            let waiting = session.wait();
            tokio::pin!(waiting);

            let outcomes = tokio::select! {
                outcomes = &mut waiting => outcomes,
                _ = interrupted() => {
                    info!("Interrupted, stopping voices");
                    stop.stop();
                    waiting.await
                }
                _ = async {
                    match duration {
                        Some(duration) => tokio::time::sleep(duration).await,
                        None => std::future::pending().await,
                    }
                } => {
                    info!("Duration elapsed, stopping voices");
                    stop.stop();
                    waiting.await
                }
            };

            report(&outcomes)?;
        }
        Commands::Verify { program_path } => {
            let program = config::load_program(&PathBuf::from(&program_path))?;
            let schedule = program.schedule();

            println!("{}", program);
            println!("Voices (count: {}):", program.voices().len());
            for voice in program.voices() {
                println!(
                    "- {} [{:.3}s per cycle]",
                    voice,
                    schedule.cycle_duration(voice).as_secs_f64()
                );
            }

            let missing = program.missing_samples();
            if !missing.is_empty() {
                println!("\nUnknown samples (count: {}):", missing.len());
                for missing in missing.iter() {
                    warn!(
                        voice = missing.voice.as_str(),
                        sample = missing.sample.as_str(),
                        "Sample is not known to the engine"
                    );
                    println!("- {} (voice {})", missing.sample, missing.voice);
                }
            }

            println!("\n{}", config::expanded_yaml(&program)?);
        }
        Commands::Schedule {
            program_path,
            until,
            bpm,
        } => {
            let horizon = parse_duration(until)?.unwrap_or(DEFAULT_SCHEDULE_HORIZON);
            let program = config::load_program_with_bpm(&PathBuf::from(&program_path), bpm)?;

            let triggers = program.schedule().until(horizon);
            if triggers.is_empty() {
                println!("No triggers before {:?}.", horizon);
                return Ok(());
            }

            println!("Triggers (count: {}):", triggers.len());
            for trigger in triggers {
                println!("{}", trigger);
            }
        }
    }

    Ok(())
}
