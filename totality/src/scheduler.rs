/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! The polling loop.
//!
//! Every [`TICK`]:
//!
//! 1. claim each eligible, due camera action and submit it to its camera's
//!    worker;
//! 2. take each due voice action and hand it to the announcer;
//! 3. apply operator commands and, once per second, log the status line.
//!
//! The run is `Finished` once the clock has left the last event's window and
//! no camera or voice action is due or pending, or when a stop is requested
//! (`q` on stdin or Ctrl+C).  The dispatch engine is then drained.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::action::{ActionSet, CameraParams, VoiceParams};
use crate::clock::Clock;
use crate::config::ScheduleConfig;
use crate::dispatch::DispatchEngine;
use crate::input::{OperatorCommand, ENHANCEMENT_STEP};
use crate::status::status_line;
use crate::timeline::{EventSet, Instant, PhaseSet};
use crate::voice::{startup_announcement, Announcer};

/// Polling cadence.
pub const TICK: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    Finished,
}

#[derive(Debug, Clone, Copy)]
pub struct SchedulerOptions {
    /// Log the status line once per second.
    pub display: bool,
    /// Speak the startup announcement.
    pub greet: bool,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            display: true,
            greet: true,
        }
    }
}

/// What one tick did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub dispatched: usize,
    pub spoken: usize,
}

/// Totals for a whole run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    pub dispatched: usize,
    pub spoken: usize,
    /// Jobs the camera workers completed.
    pub processed: usize,
    pub stopped_early: bool,
}

pub struct Scheduler {
    clock: Arc<Clock>,
    events: EventSet,
    phases: PhaseSet,
    camera_actions: ActionSet<CameraParams>,
    voice_actions: ActionSet<VoiceParams>,
    engine: DispatchEngine,
    announcer: Arc<dyn Announcer>,
    options: SchedulerOptions,
    commands_tx: mpsc::UnboundedSender<OperatorCommand>,
    commands: mpsc::UnboundedReceiver<OperatorCommand>,
    state: RunState,
}

impl Scheduler {
    pub fn new(
        config: ScheduleConfig,
        clock: Arc<Clock>,
        engine: DispatchEngine,
        announcer: Arc<dyn Announcer>,
        options: SchedulerOptions,
    ) -> Self {
        let (commands_tx, commands) = mpsc::unbounded_channel();
        Self {
            clock,
            events: config.events,
            phases: config.phases,
            camera_actions: config.camera_actions,
            voice_actions: config.voice_actions,
            engine,
            announcer,
            options,
            commands_tx,
            commands,
            state: RunState::Running,
        }
    }

    /// Sender for operator commands (stdin listener, signal handler).
    pub fn commands(&self) -> mpsc::UnboundedSender<OperatorCommand> {
        self.commands_tx.clone()
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Dispatches everything due at `now`.
    pub fn tick(&mut self, now: Instant) -> TickReport {
        let mut report = TickReport::default();

        for action in self.camera_actions.eligible_due(now) {
            if !action.try_claim(now) {
                continue;
            }
            match self.engine.submit(action.clone()) {
                Ok(camera) => {
                    info!(camera = %camera, action = %action.name, "Dispatched {}", action.text);
                    report.dispatched += 1;
                }
                Err(e) => {
                    // The window stays marked as fired so the error is not
                    // repeated every tick.
                    warn!(action = %action.name, "Cannot dispatch: {}", e);
                    action.release();
                }
            }
        }

        for action in self.voice_actions.take_due(now) {
            self.announcer
                .announce(&action.text, action.params.voice.as_deref());
            report.spoken += 1;
        }

        report
    }

    /// `true` once the last event's window has passed and no action is due
    /// or pending.
    pub fn is_finished(&self, now: Instant) -> bool {
        self.events.is_after_last(now)
            && self.camera_actions.is_finished(now)
            && self.voice_actions.is_finished(now)
    }

    /// Applies queued operator commands.  Returns `true` if a stop was
    /// requested.
    fn apply_commands(&mut self) -> bool {
        let mut stop = false;
        while let Ok(cmd) = self.commands.try_recv() {
            let delta = match cmd {
                OperatorCommand::Stop => {
                    info!("Stop requested");
                    stop = true;
                    continue;
                }
                OperatorCommand::RaiseEnhancement => ENHANCEMENT_STEP,
                OperatorCommand::LowerEnhancement => -ENHANCEMENT_STEP,
            };
            for camera in self.engine.cameras() {
                let before = camera.enhancement().get();
                let after = camera.enhancement().adjust(delta);
                info!(camera = %camera.id(), "Enhancement factor {:.1} -> {:.1}", before, after);
            }
        }
        stop
    }

    fn greet(&self, now: Instant) {
        match startup_announcement(now, &self.phases, &self.events) {
            Some(text) => self.announcer.announce(&text, None),
            None => debug!("No upcoming event to announce"),
        }
    }

    /// Runs until finished or stopped, then drains the dispatch engine.
    pub async fn run(mut self) -> RunSummary {
        let mut summary = RunSummary::default();

        let signals = self.commands();
        let ctrl_c = tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Interrupt received");
                    let _ = signals.send(OperatorCommand::Stop);
                }
                Err(e) => warn!("Cannot listen for Ctrl+C: {}", e),
            }
        });

        if self.options.greet {
            self.greet(self.clock.now());
        }

        info!("Starting main loop");
        let mut last_status = None;
        loop {
            let now = self.clock.now();
            if self.is_finished(now) {
                info!("Eclipse over and no actions left");
                break;
            }
            if self.apply_commands() {
                summary.stopped_early = true;
                break;
            }

            let report = self.tick(now);
            summary.ticks += 1;
            summary.dispatched += report.dispatched;
            summary.spoken += report.spoken;

            if self.options.display && last_status != Some(now.timestamp()) {
                last_status = Some(now.timestamp());
                info!(
                    "{}",
                    status_line(
                        now,
                        &self.phases,
                        &self.events,
                        &self.camera_actions,
                        self.engine.cameras().map(|c| c.as_ref()),
                    )
                );
            }

            tokio::time::sleep(TICK).await;
        }

        self.state = RunState::Finished;
        ctrl_c.abort();
        summary.processed = self.engine.shutdown().await;
        info!(
            ticks = summary.ticks,
            dispatched = summary.dispatched,
            spoken = summary.spoken,
            processed = summary.processed,
            stopped_early = summary.stopped_early,
            "Run complete"
        );
        summary
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{Action, Timing};
    use crate::camera::fake::RecordingDevice;
    use crate::camera::Camera;
    use crate::config::CameraConfig;
    use crate::exposure::ExposureSpec;
    use crate::timeline::{Event, LocalZone, Phase};
    use crate::voice::fake::RecordingAnnouncer;
    use crate::clock::manual::ManualHost;
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};

    struct Rig {
        scheduler: Scheduler,
        device: Arc<RecordingDevice>,
        announcer: Arc<RecordingAnnouncer>,
        clock: Arc<Clock>,
    }

    fn camera_action(name: &str, timing: Timing) -> Action<CameraParams> {
        Action::new(
            name,
            name,
            timing,
            CameraParams {
                camera_id: None,
                exposure: ExposureSpec::Shutter("1/250"),
                priority: 0,
            },
        )
    }

    /// One camera, events and actions placed relative to the real clock.
    fn rig(
        events: impl FnOnce(Instant) -> Vec<Event>,
        camera_actions: impl FnOnce(Instant) -> Vec<Action<CameraParams>>,
        voice_actions: impl FnOnce(Instant) -> Vec<Action<VoiceParams>>,
    ) -> Rig {
        let clock = Arc::new(Clock::system(LocalZone::utc()));
        rig_on(clock, events, camera_actions, voice_actions)
    }

    fn rig_on(
        clock: Arc<Clock>,
        events: impl FnOnce(Instant) -> Vec<Event>,
        camera_actions: impl FnOnce(Instant) -> Vec<Action<CameraParams>>,
        voice_actions: impl FnOnce(Instant) -> Vec<Action<VoiceParams>>,
    ) -> Rig {
        let now = clock.now();
        let device = Arc::new(RecordingDevice::new());
        let cfg = CameraConfig {
            camera_id: "A".into(),
            serial_port: None,
            usb_port: None,
            f_ratio: 10.0,
            iso: 100.0,
            enhancement_factor: 1.0,
            shutter_timeout: 1.0,
        };
        let camera = Arc::new(Camera::new(&cfg, device.clone(), clock.clone()));
        let engine = DispatchEngine::start(vec![camera]).unwrap();
        let announcer = Arc::new(RecordingAnnouncer::default());

        let config = ScheduleConfig {
            zone: LocalZone::utc(),
            events: EventSet::new(events(now)),
            phases: PhaseSet::new(vec![Phase::new("All", None, None)]),
            camera_actions: ActionSet::new(camera_actions(now)),
            voice_actions: ActionSet::new(voice_actions(now)),
            equipment: vec![cfg],
        };
        let scheduler = Scheduler::new(
            config,
            clock.clone(),
            engine,
            announcer.clone(),
            SchedulerOptions {
                display: false,
                greet: false,
            },
        );
        Rig {
            scheduler,
            device,
            announcer,
            clock,
        }
    }

    fn ms(n: i64) -> ChronoDuration {
        ChronoDuration::milliseconds(n)
    }

    #[tokio::test]
    async fn double_tick_submits_once() {
        let mut rig = rig(
            |now| vec![Event::new("c2", "c2", now + ms(5_000))],
            |now| vec![camera_action("shot", Timing::at(now))],
            |_| vec![],
        );
        let now = rig.clock.now();
        assert_eq!(rig.scheduler.tick(now).dispatched, 1);
        assert_eq!(rig.scheduler.tick(now).dispatched, 0);
        assert_eq!(rig.scheduler.tick(now + ms(10)).dispatched, 0);

        let processed = rig.scheduler.engine.shutdown().await;
        assert_eq!(processed, 1);
        assert_eq!(rig.device.triggers(), 1);
    }

    #[tokio::test]
    async fn periodic_action_dispatches_once_per_sample() {
        let host = ManualHost::new(Utc.with_ymd_and_hms(2024, 4, 8, 18, 27, 0).unwrap());
        let clock = Arc::new(Clock::with_host(LocalZone::utc(), host.host()));
        let start = clock.now();
        // Samples at +1s, +3s, +5s and +7s; the end at +9s is exclusive.
        let mut rig = rig_on(
            clock,
            |now| vec![Event::new("c2", "c2", now + ms(12_000))],
            |now| {
                vec![camera_action(
                    "corona",
                    Timing::new(None, Some(now + ms(1_000)), Some(now + ms(9_000)), Some(2.0)).unwrap(),
                )]
            },
            |_| vec![],
        );

        let mut fired_at = Vec::new();
        for step in 0..=40 {
            let offset = step * 250;
            host.set(start.with_timezone(&Utc) + ms(offset));
            let now = rig.clock.now();
            let report = rig.scheduler.tick(now);
            assert!(report.dispatched <= 1, "{offset} ms");
            if report.dispatched == 1 {
                fired_at.push(offset);
            }
            // Let the worker finish and release the action before the next tick.
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        assert_eq!(fired_at, vec![1_000, 3_000, 5_000, 7_000]);
        assert_eq!(rig.scheduler.engine.shutdown().await, 4);
        assert_eq!(rig.device.triggers(), 4);
    }

    #[tokio::test]
    async fn completed_action_is_not_redispatched_in_same_window() {
        let mut rig = rig(
            |now| vec![Event::new("c2", "c2", now + ms(5_000))],
            |now| vec![camera_action("shot", Timing::at(now))],
            |_| vec![],
        );
        let now = rig.clock.now();
        assert_eq!(rig.scheduler.tick(now).dispatched, 1);
        // Let the worker finish and release the action.
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(rig.scheduler.camera_actions.iter().all(|a| a.is_eligible()));
        assert_eq!(rig.scheduler.tick(now + ms(500)).dispatched, 0);
        rig.scheduler.engine.shutdown().await;
    }

    #[tokio::test]
    async fn voice_actions_fire_once_and_are_dropped() {
        let mut rig = rig(
            |now| vec![Event::new("c2", "c2", now + ms(5_000))],
            |_| vec![],
            |now| {
                vec![Action::new(
                    "v",
                    "One minute",
                    Timing::at(now),
                    VoiceParams {
                        voice: Some("Samantha".into()),
                    },
                )]
            },
        );
        let now = rig.clock.now();
        assert_eq!(rig.scheduler.tick(now).spoken, 1);
        assert_eq!(rig.scheduler.tick(now).spoken, 0);
        assert!(rig.scheduler.voice_actions.is_empty());
        assert_eq!(rig.announcer.texts(), vec!["One minute".to_string()]);
        assert_eq!(
            rig.announcer.spoken.lock().unwrap()[0].1.as_deref(),
            Some("Samantha")
        );
    }

    #[tokio::test]
    async fn finished_only_after_last_event_and_actions() {
        let rig = rig(
            |now| vec![Event::new("c4", "c4", now + ms(1_000))],
            |now| {
                vec![camera_action(
                    "late",
                    Timing::new(None, Some(now), Some(now + ms(5_000)), Some(1.0)).unwrap(),
                )]
            },
            |_| vec![],
        );
        let now = rig.clock.now();
        assert_eq!(rig.scheduler.state(), RunState::Running);
        assert!(!rig.scheduler.is_finished(now));
        assert!(!rig.scheduler.is_finished(now + ms(3_000)));
        assert!(rig.scheduler.is_finished(now + ms(5_000)));
    }

    #[tokio::test]
    async fn run_completes_after_last_event() {
        let rig = rig(
            |now| vec![Event::new("c2", "c2", now + ms(200))],
            |now| vec![camera_action("shot", Timing::at(now + ms(200)))],
            |now| {
                vec![Action::new(
                    "v",
                    "Totality",
                    Timing::at(now + ms(200)),
                    VoiceParams::default(),
                )]
            },
        );
        let summary = tokio::time::timeout(Duration::from_secs(10), rig.scheduler.run())
            .await
            .unwrap();
        assert_eq!(summary.dispatched, 1);
        assert_eq!(summary.spoken, 1);
        assert_eq!(summary.processed, 1);
        assert!(!summary.stopped_early);
        assert_eq!(rig.device.triggers(), 1);
    }

    #[tokio::test]
    async fn stop_command_ends_run_early() {
        let rig = rig(
            |now| vec![Event::new("c2", "c2", now + ms(3_600_000))],
            |_| vec![],
            |_| vec![],
        );
        rig.scheduler.commands().send(OperatorCommand::Stop).unwrap();
        let summary = tokio::time::timeout(Duration::from_secs(5), rig.scheduler.run())
            .await
            .unwrap();
        assert!(summary.stopped_early);
        assert_eq!(summary.dispatched, 0);
    }

    #[tokio::test]
    async fn enhancement_commands_adjust_every_camera() {
        let mut rig = rig(
            |now| vec![Event::new("c2", "c2", now + ms(5_000))],
            |_| vec![],
            |_| vec![],
        );
        let tx = rig.scheduler.commands();
        tx.send(OperatorCommand::RaiseEnhancement).unwrap();
        tx.send(OperatorCommand::RaiseEnhancement).unwrap();
        tx.send(OperatorCommand::LowerEnhancement).unwrap();
        assert!(!rig.scheduler.apply_commands());

        let factors: Vec<f64> = rig
            .scheduler
            .engine
            .cameras()
            .map(|c| c.enhancement().get())
            .collect();
        assert_eq!(factors, vec![1.1]);
    }
}
