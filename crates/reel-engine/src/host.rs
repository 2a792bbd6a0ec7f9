//! The tick loop.

use std::time::{Duration, Instant};

use reel_arena::Arena;
use reel_core::{InputBuffers, Surface};
use reel_module::{ModuleHost, ModuleSource, ReloadOutcome};
use reel_replay::{ReplayError, Session, SessionState};
use smallvec::SmallVec;

use crate::config::HostConfig;
use crate::error::HostError;
use crate::input::{Control, InputTranslator, SessionCommand};
use crate::metrics::{HostMetrics, TickMetrics};
use crate::platform::{EventBatch, EventSource, Presenter};

fn micros(d: Duration) -> u64 {
    d.as_micros().min(u64::MAX as u128) as u64
}

/// The simulation host: arena, module, session and input, driven at a
/// fixed tick rate.
pub struct Host<S: ModuleSource, E: EventSource, P: Presenter> {
    config: HostConfig,
    budget: Duration,
    arena: Arena,
    surface: Surface,
    modules: ModuleHost<S>,
    session: Session,
    input: InputBuffers,
    translator: InputTranslator,
    events: E,
    presenter: P,
    batch: EventBatch,
    last_tick: Option<Instant>,
    quit: bool,
    metrics: HostMetrics,
}

impl<S: ModuleSource, E: EventSource, P: Presenter> Host<S, E, P> {
    /// Validate `config`, reserve the arena and load the initial module.
    pub fn new(config: HostConfig, source: S, events: E, presenter: P) -> Result<Self, HostError> {
        config.validate()?;
        let arena = Arena::reserve(&config.arena)?;
        let modules = ModuleHost::load(source, config.reload.clone())?;
        let surface = Surface::new(
            config.surface.width,
            config.surface.height,
            config.surface.bytes_per_pixel,
        );
        let session = Session::new(config.recording_dir.clone());
        let translator = InputTranslator::new(config.bindings.clone(), config.stick_threshold);
        Ok(Self {
            budget: config.tick_budget(),
            config,
            arena,
            surface,
            modules,
            session,
            input: InputBuffers::new(),
            translator,
            events,
            presenter,
            batch: EventBatch::new(),
            last_tick: None,
            quit: false,
            metrics: HostMetrics::default(),
        })
    }

    /// Tick until quit is requested.
    pub fn run(&mut self) -> HostMetrics {
        log::info!("host running at {} Hz", self.config.tick_rate_hz);
        while !self.quit {
            self.tick();
        }
        self.shutdown();
        self.metrics.clone()
    }

    /// Tick at most `ticks` times, stopping early on quit.
    pub fn run_for(&mut self, ticks: u64) -> HostMetrics {
        for _ in 0..ticks {
            if self.quit {
                break;
            }
            self.tick();
        }
        self.metrics.clone()
    }

    /// Close any active session. Called by [`run`](Self::run) on quit.
    pub fn shutdown(&mut self) {
        if let Err(e) = self.session.end_recording() {
            log::warn!("could not finish recording: {e}");
        }
        self.session.end_playback();
        log::info!(
            "host stopped after {} ticks ({} missed deadlines, {} reloads)",
            self.metrics.ticks,
            self.metrics.missed_deadlines,
            self.metrics.reloads
        );
    }

    /// Run one tick.
    pub fn tick(&mut self) -> TickMetrics {
        let start = Instant::now();
        let dt = match self.last_tick {
            Some(prev) => start.saturating_duration_since(prev),
            None => self.budget,
        };
        self.last_tick = Some(start);
        let mut tick = TickMetrics::default();

        match self.modules.reload_if_changed_at(start) {
            ReloadOutcome::Reloaded(_) => {
                tick.reloaded = true;
                self.metrics.reloads += 1;
            }
            ReloadOutcome::Failed(_) => self.metrics.failed_reloads += 1,
            ReloadOutcome::Unchanged | ReloadOutcome::Settling => {}
        }

        self.input.begin_tick();
        self.poll_events(&mut tick);
        self.input.current_mut().delta_seconds = dt.as_secs_f32();
        tick.played_back = self.route_frame();

        let frame = *self.input.current();
        tick.delta_seconds = frame.delta_seconds;
        tick.initialized = self
            .modules
            .ensure_initialized(&mut self.arena, &mut self.surface);

        let update_start = Instant::now();
        self.modules.update(
            &mut self.arena,
            &mut self.surface,
            &frame,
            frame.delta_seconds,
        );
        tick.update_us = micros(update_start.elapsed());

        self.input.swap();
        self.presenter.present(&self.surface);

        let work = start.elapsed();
        tick.work_us = micros(work);
        match self.budget.checked_sub(work) {
            Some(remaining) => {
                if !remaining.is_zero() {
                    std::thread::sleep(remaining);
                }
                tick.sleep_us = micros(remaining);
            }
            None => {
                tick.missed_deadline = true;
                log::warn!(
                    "missed deadline: tick {} took {:.2} ms of a {:.2} ms budget",
                    self.metrics.ticks,
                    work.as_secs_f64() * 1e3,
                    self.budget.as_secs_f64() * 1e3
                );
            }
        }

        self.metrics.record_tick(&tick);
        tick
    }

    fn poll_events(&mut self, tick: &mut TickMetrics) {
        self.batch.clear();
        self.events.poll(&mut self.batch);
        tick.events = self.batch.len() as u32;

        let mut commands: SmallVec<[SessionCommand; 2]> = SmallVec::new();
        for event in &self.batch {
            match self.translator.apply(event, &mut self.input) {
                Some(Control::Quit) => {
                    if !self.quit {
                        log::info!("quit requested");
                    }
                    self.quit = true;
                }
                Some(Control::Session(command)) => commands.push(command),
                Some(Control::ClearTransient) => {
                    self.arena.clear_transient();
                    log::info!("transient storage cleared");
                }
                None => {}
            }
        }
        for command in commands {
            if let Err(e) = self.session_command(command) {
                self.metrics.session_errors += 1;
                log::warn!("session command {command:?} failed: {e}");
            }
        }
    }

    fn session_command(&mut self, command: SessionCommand) -> Result<(), ReplayError> {
        match command {
            SessionCommand::Record(slot) => self.session.begin_recording(&self.arena, slot),
            SessionCommand::Play(slot) => self.session.begin_playback(&mut self.arena, slot),
            SessionCommand::Stop => self.stop_session(),
            SessionCommand::Toggle(slot) => match self.session.state() {
                SessionState::Idle => self.session.begin_recording(&self.arena, slot),
                SessionState::Recording(recorded) => {
                    self.session.end_recording()?;
                    self.session.begin_playback(&mut self.arena, recorded)
                }
                SessionState::Playing(_) => self.stop_session(),
            },
        }
    }

    fn stop_session(&mut self) -> Result<(), ReplayError> {
        match self.session.state() {
            SessionState::Idle => Ok(()),
            SessionState::Recording(_) => self.session.end_recording(),
            SessionState::Playing(_) => {
                self.session.end_playback();
                self.clear_input();
                Ok(())
            }
        }
    }

    /// Release every held button, keeping this tick's `delta_seconds`.
    fn clear_input(&mut self) {
        let dt = self.input.current().delta_seconds;
        self.input.clear();
        self.input.current_mut().delta_seconds = dt;
    }

    /// Record the live frame or replace it with a recorded one. Returns
    /// whether the frame came from a recording.
    fn route_frame(&mut self) -> bool {
        match self.session.state() {
            SessionState::Idle => false,
            SessionState::Recording(_) => {
                match self.session.record_frame(self.input.current()) {
                    Ok(()) => self.metrics.recorded_frames += 1,
                    Err(e) => {
                        self.metrics.session_errors += 1;
                        log::error!("recording aborted: {e}");
                    }
                }
                false
            }
            SessionState::Playing(_) => match self.session.play_frame(&mut self.arena) {
                Ok(Some(frame)) => {
                    self.input.replace_current(frame);
                    true
                }
                Ok(None) => false,
                Err(e) => {
                    self.metrics.session_errors += 1;
                    log::error!("playback aborted, resuming live input: {e}");
                    self.clear_input();
                    false
                }
            },
        }
    }

    /// Stop after the current tick.
    pub fn request_quit(&mut self) {
        self.quit = true;
    }

    /// Whether quit has been requested.
    pub fn quit_requested(&self) -> bool {
        self.quit
    }

    /// Configuration the host was built from.
    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// The arena.
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// The arena, mutably.
    pub fn arena_mut(&mut self) -> &mut Arena {
        &mut self.arena
    }

    /// The surface as of the last update.
    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// The module host.
    pub fn modules(&self) -> &ModuleHost<S> {
        &self.modules
    }

    /// The module host, mutably.
    pub fn modules_mut(&mut self) -> &mut ModuleHost<S> {
        &mut self.modules
    }

    /// The recording session.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The input buffers. After a tick, `previous()` is the frame the
    /// module just received.
    pub fn input(&self) -> &InputBuffers {
        &self.input
    }

    /// The event source.
    pub fn events_mut(&mut self) -> &mut E {
        &mut self.events
    }

    /// The presenter.
    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    /// Cumulative metrics.
    pub fn metrics(&self) -> &HostMetrics {
        &self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::PlatformEvent;
    use crate::platform::NullPresenter;
    use reel_arena::ArenaConfig;
    use reel_core::{InputFrame, ModuleGeneration};
    use reel_module::{ModuleError, SimulationModule};
    use std::collections::VecDeque;
    use std::time::SystemTime;

    /// Counts updates in state bytes 0..8.
    struct Counter;

    impl SimulationModule for Counter {
        fn init(&mut self, _: &mut Arena, _: &mut Surface) {}

        fn update(&mut self, arena: &mut Arena, _: &mut Surface, _: &InputFrame, _: f32) {
            let state = arena.module_state_mut();
            let n = u64::from_le_bytes(state[..8].try_into().unwrap()) + 1;
            state[..8].copy_from_slice(&n.to_le_bytes());
        }
    }

    struct Fixed;

    impl ModuleSource for Fixed {
        fn last_modified(&self) -> Result<SystemTime, ModuleError> {
            Ok(SystemTime::UNIX_EPOCH)
        }

        fn load(&mut self, _: ModuleGeneration) -> Result<Box<dyn SimulationModule>, ModuleError> {
            Ok(Box::new(Counter))
        }

        fn describe(&self) -> String {
            "fixed".into()
        }
    }

    #[derive(Default)]
    struct Queue(VecDeque<Vec<PlatformEvent>>);

    impl EventSource for Queue {
        fn poll(&mut self, batch: &mut EventBatch) {
            if let Some(events) = self.0.pop_front() {
                batch.extend(events);
            }
        }
    }

    fn config(dir: &std::path::Path) -> HostConfig {
        HostConfig {
            tick_rate_hz: 1000.0,
            arena: ArenaConfig::new(4096, 4096),
            recording_dir: dir.to_path_buf(),
            ..HostConfig::default()
        }
    }

    fn count(host: &Host<Fixed, Queue, NullPresenter>) -> u64 {
        u64::from_le_bytes(host.arena().module_state()[..8].try_into().unwrap())
    }

    #[test]
    fn invalid_config_is_rejected_before_reserving() {
        let dir = tempfile::tempdir().unwrap();
        for rate in [0.0, 1e-300] {
            let mut cfg = config(dir.path());
            cfg.tick_rate_hz = rate;
            let result = Host::new(cfg, Fixed, Queue::default(), NullPresenter::default());
            assert!(matches!(result, Err(HostError::Config(_))));
        }
    }

    #[test]
    fn each_tick_updates_once_and_presents() {
        let dir = tempfile::tempdir().unwrap();
        let mut host =
            Host::new(config(dir.path()), Fixed, Queue::default(), NullPresenter::default())
                .unwrap();
        let first = host.tick();
        assert!(first.initialized);
        let second = host.tick();
        assert!(!second.initialized);
        assert_eq!(count(&host), 2);
        assert_eq!(host.presenter().frames(), 2);
        assert_eq!(host.metrics().ticks, 2);
        assert!(host.arena().is_initialized());
    }

    #[test]
    fn first_tick_uses_budget_as_delta() {
        let dir = tempfile::tempdir().unwrap();
        let mut host =
            Host::new(config(dir.path()), Fixed, Queue::default(), NullPresenter::default())
                .unwrap();
        let tick = host.tick();
        assert!((tick.delta_seconds - 0.001).abs() < 1e-6);
        assert!((host.input().previous().delta_seconds - 0.001).abs() < 1e-6);
    }

    #[test]
    fn quit_finishes_current_tick_then_stops() {
        let dir = tempfile::tempdir().unwrap();
        let mut events = Queue::default();
        events.0.push_back(vec![]);
        events.0.push_back(vec![PlatformEvent::Quit]);
        let mut host =
            Host::new(config(dir.path()), Fixed, events, NullPresenter::default()).unwrap();
        let metrics = host.run();
        assert_eq!(metrics.ticks, 2);
        assert_eq!(count(&host), 2);
        assert!(host.quit_requested());
    }

    #[test]
    fn refused_session_command_is_counted() {
        let dir = tempfile::tempdir().unwrap();
        let mut events = Queue::default();
        events.0.push_back(vec![PlatformEvent::Session(SessionCommand::Play(
            reel_core::SlotId(3),
        ))]);
        let mut host =
            Host::new(config(dir.path()), Fixed, events, NullPresenter::default()).unwrap();
        host.tick();
        assert_eq!(host.metrics().session_errors, 1);
        assert_eq!(host.session().state(), SessionState::Idle);
        assert_eq!(count(&host), 1);
    }
}
