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
use std::sync::Arc;

use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{self, Instant},
};
use tracing::{debug, error, info, span, warn, Instrument, Level};

use crate::{
    engine::{PlaybackEngine, UnknownSampleError},
    sequence::Voice,
    tempo::Tempo,
};

/// Errors that end a running voice.
#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    #[error("voice {voice} stopped: {source}")]
    UnknownSample {
        voice: String,
        #[source]
        source: UnknownSampleError,
    },

    #[error("voice {voice} panicked")]
    Panicked { voice: String },
}

/// Plays voices against an engine at a fixed tempo.
#[derive(Clone)]
pub struct SequencePlayer {
    engine: Arc<dyn PlaybackEngine>,
    tempo: Tempo,
}

impl SequencePlayer {
    /// Creates a new player.
    pub fn new(engine: Arc<dyn PlaybackEngine>, tempo: Tempo) -> SequencePlayer {
        SequencePlayer { engine, tempo }
    }

    /// Gets the tempo voices are played at.
    pub fn tempo(&self) -> Tempo {
        self.tempo
    }

    /// Plays the voice forever. Only returns if a trigger fails.
    pub async fn run(&self, voice: &Voice) -> Result<(), PlayerError> {
        let (_stop_tx, stop_rx) = watch::channel(false);
        self.run_until_stopped(voice, stop_rx).await
    }

    /// Plays the voice until the stop channel flips to true or a trigger fails.
    ///
    /// Each trigger waits for an absolute deadline measured from the moment the voice started,
    /// so time spent triggering never accumulates into drift.
    pub async fn run_until_stopped(
        &self,
        voice: &Voice,
        mut stop: watch::Receiver<bool>,
    ) -> Result<(), PlayerError> {
        let start = Instant::now();
        info!(voice = voice.name(), tempo = %self.tempo, "Voice started");

        for hit in voice.hits() {
            let Some(deadline) = start.checked_add(self.tempo.duration_for(hit.beat)) else {
                warn!(
                    voice = voice.name(),
                    beat = hit.beat,
                    "Next trigger is too far away to schedule"
                );
                break;
            };
            tokio::select! {
                biased;
                _ = stopped(&mut stop) => {
                    info!(voice = voice.name(), "Voice stopped");
                    return Ok(());
                }
                _ = time::sleep_until(deadline) => {}
            }

            if let Err(source) = self.engine.trigger(hit.sample) {
                return Err(PlayerError::UnknownSample {
                    voice: voice.name().to_string(),
                    source,
                });
            }
            debug!(
                voice = voice.name(),
                sample = hit.sample,
                cycle = hit.cycle,
                beat = hit.beat,
                "Triggered"
            );
        }

        // Silent voices and voices whose next trigger can't be reached simply idle.
        stopped(&mut stop).await;
        info!(voice = voice.name(), "Voice stopped");
        Ok(())
    }

    /// Starts every voice as its own task and returns a session that controls them.
    pub fn spawn(&self, voices: Vec<Voice>) -> Session {
        let (stop_tx, stop_rx) = watch::channel(false);

        let handles = voices
            .into_iter()
            .map(|voice| {
                let name = voice.name().to_string();
                let player = self.clone();
                let stop_rx = stop_rx.clone();
                let span = span!(Level::INFO, "voice", name = voice.name());
                let join = tokio::spawn(
                    async move {
                        let result = player.run_until_stopped(&voice, stop_rx).await;
                        if let Err(e) = &result {
                            error!(err = %e, "Voice failed");
                        }
                        result
                    }
                    .instrument(span),
                );
                (name, join)
            })
            .collect();

        Session {
            handles,
            stop: StopHandle {
                stop: Arc::new(stop_tx),
            },
        }
    }
}

/// Resolves once the stop flag is set. If the sender is gone the voice can never be stopped,
/// so this never resolves.
async fn stopped(stop: &mut watch::Receiver<bool>) {
    loop {
        if *stop.borrow_and_update() {
            return;
        }
        if stop.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Stops the voices of a session. Can be held separately from the session itself.
#[derive(Clone)]
pub struct StopHandle {
    stop: Arc<watch::Sender<bool>>,
}

impl StopHandle {
    /// Asks every voice to stop at its next wait.
    pub fn stop(&self) {
        self.stop.send_replace(true);
    }

    /// Returns true if a stop has been requested.
    pub fn is_stopped(&self) -> bool {
        *self.stop.borrow()
    }
}

/// How a voice finished.
#[derive(Debug)]
pub struct VoiceOutcome {
    pub voice: String,
    pub result: Result<(), PlayerError>,
}

/// A group of running voices.
pub struct Session {
    handles: Vec<(String, JoinHandle<Result<(), PlayerError>>)>,
    stop: StopHandle,
}

impl Session {
    /// Gets the names of the voices started by this session.
    pub fn voices(&self) -> Vec<&str> {
        self.handles.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// The number of voices that haven't finished yet.
    pub fn running(&self) -> usize {
        self.handles
            .iter()
            .filter(|(_, join)| !join.is_finished())
            .count()
    }

    /// Gets a handle that can stop this session.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Asks every voice to stop at its next wait.
    pub fn stop(&self) {
        self.stop.stop();
    }

    /// Waits for every voice to finish without asking them to stop.
    pub async fn wait(self) -> Vec<VoiceOutcome> {
        let mut outcomes = Vec::with_capacity(self.handles.len());
        for (voice, join) in self.handles {
            let result = match join.await {
                Ok(result) => result,
                Err(e) => {
                    error!(voice = voice.as_str(), err = %e, "Voice task failed");
                    Err(PlayerError::Panicked {
                        voice: voice.clone(),
                    })
                }
            };
            outcomes.push(VoiceOutcome { voice, result });
        }
        outcomes
    }

    /// Stops every voice and waits for all of them to finish.
    pub async fn join(self) -> Vec<VoiceOutcome> {
        self.stop();
        self.wait().await
    }
}

#[cfg(test)]
mod test {
    use std::{sync::Arc, time::Duration};

    use tokio::time::{self, Instant};

    use crate::{
        engine::mock,
        sequence::{Step, Voice},
        tempo::Tempo,
    };

    use super::{PlayerError, SequencePlayer};

    const TOLERANCE: Duration = Duration::from_millis(2);

    fn beat_voice() -> Voice {
        Voice::new(
            "beat",
            vec![
                Step::new("kick", 1.0),
                Step::new("hat", 1.0),
                Step::new("hat", 1.0),
            ],
        )
        .expect("valid voice")
    }

    fn assert_near(expected: Duration, actual: Duration) {
        let diff = if expected > actual {
            expected - actual
        } else {
            actual - expected
        };
        assert!(
            diff <= TOLERANCE,
            "expected {:?}, got {:?}",
            expected,
            actual
        );
    }

    /// Offsets of every recorded trigger from the given start.
    fn offsets(engine: &mock::Engine, start: Instant) -> Vec<(String, Duration)> {
        engine
            .triggers()
            .into_iter()
            .map(|trigger| (trigger.sample, trigger.at - start))
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_triggers_at_beat_offsets() {
        let engine = mock::Engine::permissive();
        let player = SequencePlayer::new(Arc::new(engine.clone()), Tempo::default());

        let start = Instant::now();
        let session = player.spawn(vec![beat_voice()]);
        time::sleep(Duration::from_millis(5500)).await;
        let outcomes = session.join().await;

        assert_eq!(1, outcomes.len());
        assert!(outcomes[0].result.is_ok());

        let triggers = offsets(&engine, start);
        assert_eq!(
            vec!["kick", "hat", "hat", "kick", "hat", "hat"],
            triggers
                .iter()
                .map(|(sample, _)| sample.as_str())
                .collect::<Vec<&str>>()
        );
        for (i, (_, at)) in triggers.iter().enumerate() {
            assert_near(Duration::from_secs(i as u64), *at);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_tempo_halves_intervals() {
        let engine = mock::Engine::permissive();
        let tempo = Tempo::new(120.0).expect("valid tempo");
        let player = SequencePlayer::new(Arc::new(engine.clone()), tempo);

        let start = Instant::now();
        let session = player.spawn(vec![beat_voice()]);
        time::sleep(Duration::from_millis(2750)).await;
        session.join().await;

        let triggers = offsets(&engine, start);
        assert_eq!(6, triggers.len());
        for (i, (_, at)) in triggers.iter().enumerate() {
            assert_near(Duration::from_millis(500 * i as u64), *at);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_step_lands_on_cycle_boundaries() {
        let engine = mock::Engine::permissive();
        let tempo = Tempo::new(90.0).expect("valid tempo");
        let voice = Voice::new(
            "mel",
            vec![
                Step::new("kick", 0.33),
                Step::new("cowbell", 0.33),
                Step::new("cowbell", 0.34),
                Step::new("cowbell", 0.66),
                Step::rest(1.18),
            ],
        )
        .expect("valid voice");
        let cycle = tempo.duration_for(voice.cycle_beats());
        let player = SequencePlayer::new(Arc::new(engine.clone()), tempo);

        let start = Instant::now();
        let session = player.spawn(vec![voice]);
        time::sleep(cycle * 8 + Duration::from_millis(100)).await;
        session.join().await;

        let kicks: Vec<Duration> = offsets(&engine, start)
            .into_iter()
            .filter(|(sample, _)| sample == "kick")
            .map(|(_, at)| at)
            .collect();
        assert_eq!(9, kicks.len());
        for (n, at) in kicks.into_iter().enumerate() {
            assert_near(cycle * n as u32, at);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_sample_only_stops_its_voice() {
        let engine = mock::Engine::new(&["kick".to_string()]);
        let player = SequencePlayer::new(Arc::new(engine.clone()), Tempo::default());

        let good = Voice::new("good", vec![Step::new("kick", 1.0)]).expect("valid voice");
        let bad = Voice::new("bad", vec![Step::new("kick", 1.0), Step::new("snare", 1.0)])
            .expect("valid voice");

        let session = player.spawn(vec![good, bad]);
        time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(1, session.running());
        let outcomes = session.join().await;

        assert_eq!("good", outcomes[0].voice);
        assert!(outcomes[0].result.is_ok());
        assert_eq!("bad", outcomes[1].voice);
        match &outcomes[1].result {
            Err(PlayerError::UnknownSample { voice, source }) => {
                assert_eq!("bad", voice);
                assert_eq!("snare", source.sample);
            }
            other => panic!("unexpected outcome {:?}", other),
        }

        // The good voice kept going after the bad one failed at one second.
        assert_eq!(5, engine.samples_triggered().len());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_surfaces_unknown_sample() {
        let engine = mock::Engine::new(&[]);
        let player = SequencePlayer::new(Arc::new(engine), Tempo::default());

        let result = player.run(&beat_voice()).await;
        assert!(matches!(
            result,
            Err(PlayerError::UnknownSample { ref source, .. }) if source.sample == "kick"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_independent_runs_match() {
        let first = mock::Engine::permissive();
        let second = mock::Engine::permissive();
        let tempo = Tempo::new(75.0).expect("valid tempo");
        let voice = Voice::new(
            "mel",
            vec![
                Step::rest(3.0),
                Step::new("cowbell", 0.25),
                Step::new("cowbell", 0.75),
                Step::new("kick", 1.0),
            ],
        )
        .expect("valid voice");

        let first_start = Instant::now();
        let first_session =
            SequencePlayer::new(Arc::new(first.clone()), tempo).spawn(vec![voice.clone()]);
        time::sleep(Duration::from_millis(1250)).await;

        let second_start = Instant::now();
        let second_session =
            SequencePlayer::new(Arc::new(second.clone()), tempo).spawn(vec![voice]);
        time::sleep(Duration::from_secs(20)).await;

        first_session.join().await;
        second_session.join().await;

        let first = offsets(&first, first_start);
        let second = offsets(&second, second_start);
        assert!(second.len() >= 9);
        for ((first_sample, first_at), (second_sample, second_at)) in
            first.iter().zip(second.iter())
        {
            assert_eq!(first_sample, second_sample);
            assert_near(*first_at, *second_at);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_voice_idles_until_stopped() {
        let engine = mock::Engine::permissive();
        let player = SequencePlayer::new(Arc::new(engine.clone()), Tempo::default());
        let quiet = Voice::new("quiet", vec![Step::rest(2.0)]).expect("valid voice");

        let session = player.spawn(vec![quiet]);
        time::sleep(Duration::from_secs(10)).await;
        assert_eq!(1, session.running());

        let stop = session.stop_handle();
        assert!(!stop.is_stopped());
        let outcomes = session.join().await;
        assert!(stop.is_stopped());
        assert!(outcomes[0].result.is_ok());
        assert!(engine.triggers().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unreachable_trigger_idles_until_stopped() {
        let engine = mock::Engine::permissive();
        let player = SequencePlayer::new(Arc::new(engine.clone()), Tempo::default());
        let voice = Voice::new("far", vec![Step::new("kick", 1.0), Step::rest(1e20)])
            .expect("valid voice");

        let run = player.run(&voice);
        tokio::pin!(run);
        tokio::select! {
            result = &mut run => panic!("run finished early: {:?}", result),
            _ = time::sleep(Duration::from_secs(5)) => {}
        }
        assert_eq!(1, engine.triggers().len());
        engine.clear();

        let session = player.spawn(vec![voice.clone()]);
        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(1, session.running());
        let outcomes = session.join().await;

        assert!(outcomes[0].result.is_ok());
        assert_eq!(vec!["kick"], engine.samples_triggered());
    }
}
