//! Reusable host fixtures.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use reel_arena::Arena;
use reel_core::{ButtonId, InputFrame, ModuleGeneration, Surface};
use reel_engine::{EventBatch, EventSource, PlatformEvent, Presenter};
use reel_module::{ModuleError, ModuleSource, SimulationModule};

/// Offset in module state of the magic written by `init`.
pub const STATE_MAGIC: usize = 0;
/// Offset in module state of the update counter (u64 LE).
pub const STATE_COUNTER: usize = 8;
/// Offset in module state of the input fold (u64 LE).
pub const STATE_FOLD: usize = 16;

const MAGIC: [u8; 4] = *b"FOLD";

fn read_u64(state: &[u8], at: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&state[at..at + 8]);
    u64::from_le_bytes(bytes)
}

fn write_u64(state: &mut [u8], at: usize, v: u64) {
    state[at..at + 8].copy_from_slice(&v.to_le_bytes());
}

/// Every call made to modules loaded from one [`FakeSource`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CallLog {
    pub inits: u32,
    /// Generation of the module that handled each update, in order.
    pub update_generations: Vec<u64>,
    /// `delta_seconds` passed to each update, in order.
    pub deltas: Vec<f32>,
}

/// Deterministic module: counts updates and folds every input frame into
/// a running hash, all inside the arena.
///
/// Keeps no state of its own besides the shared call log, so a reload
/// loses nothing.
pub struct FoldModule {
    pub generation: u64,
    pub log: Arc<Mutex<CallLog>>,
    /// Sleep inside every update, to force missed deadlines.
    pub update_delay: Duration,
}

impl FoldModule {
    /// Updates counted in `arena`.
    pub fn counter(arena: &Arena) -> u64 {
        read_u64(arena.module_state(), STATE_COUNTER)
    }

    /// Running input fold in `arena`.
    pub fn fold(arena: &Arena) -> u64 {
        read_u64(arena.module_state(), STATE_FOLD)
    }

    /// Whether `init` has written its magic into `arena`.
    pub fn initialized_by_module(arena: &Arena) -> bool {
        arena.module_state()[STATE_MAGIC..STATE_MAGIC + 4] == MAGIC
    }
}

impl SimulationModule for FoldModule {
    fn init(&mut self, arena: &mut Arena, surface: &mut Surface) {
        if let Ok(mut log) = self.log.lock() {
            log.inits += 1;
        }
        arena.module_state_mut()[STATE_MAGIC..STATE_MAGIC + 4].copy_from_slice(&MAGIC);
        surface.pixels_mut().fill(0);
    }

    fn update(
        &mut self,
        arena: &mut Arena,
        surface: &mut Surface,
        input: &InputFrame,
        delta_seconds: f32,
    ) {
        if let Ok(mut log) = self.log.lock() {
            log.update_generations.push(self.generation);
            log.deltas.push(delta_seconds);
        }
        if !self.update_delay.is_zero() {
            std::thread::sleep(self.update_delay);
        }

        let state = arena.module_state_mut();
        let count = read_u64(state, STATE_COUNTER) + 1;
        write_u64(state, STATE_COUNTER, count);

        let mut fold = read_u64(state, STATE_FOLD);
        for id in ButtonId::ALL {
            let b = input.button(id);
            fold = fold
                .wrapping_mul(31)
                .wrapping_add(b.half_transition_count as u64)
                .wrapping_add(b.ended_down() as u64);
        }
        fold = fold
            .wrapping_mul(31)
            .wrapping_add(input.mouse_x as u64)
            .wrapping_add((input.mouse_y as u64) << 16)
            .wrapping_add(input.left_stick_x.to_bits() as u64)
            .wrapping_add(delta_seconds.to_bits() as u64);
        write_u64(state, STATE_FOLD, fold);

        if let Some(px) = surface.pixels_mut().first_mut() {
            *px = fold as u8;
        }
    }
}

/// Module source backed by [`FoldModule`], with a settable timestamp and
/// scripted load failures.
#[derive(Clone)]
pub struct FakeSource {
    pub modified: SystemTime,
    /// Fail this many upcoming loads.
    pub fail_loads: u32,
    pub update_delay: Duration,
    pub log: Arc<Mutex<CallLog>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self {
            modified: SystemTime::UNIX_EPOCH,
            fail_loads: 0,
            update_delay: Duration::ZERO,
            log: Arc::default(),
        }
    }

    pub fn with_update_delay(mut self, delay: Duration) -> Self {
        self.update_delay = delay;
        self
    }

    /// Simulate a rebuild: move the timestamp forward by `secs`.
    pub fn touch(&mut self, secs: u64) {
        self.modified += Duration::from_secs(secs);
    }

    /// Snapshot of the call log.
    pub fn calls(&self) -> CallLog {
        self.log.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

impl Default for FakeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleSource for FakeSource {
    fn last_modified(&self) -> Result<SystemTime, ModuleError> {
        Ok(self.modified)
    }

    fn load(
        &mut self,
        generation: ModuleGeneration,
    ) -> Result<Box<dyn SimulationModule>, ModuleError> {
        if self.fail_loads > 0 {
            self.fail_loads -= 1;
            return Err(ModuleError::LoadFailed {
                path: "fake".into(),
                detail: "scripted failure".into(),
            });
        }
        Ok(Box::new(FoldModule {
            generation: generation.0,
            log: Arc::clone(&self.log),
            update_delay: self.update_delay,
        }))
    }

    fn describe(&self) -> String {
        "fake".into()
    }
}

/// Hands out one scripted batch per poll, then nothing.
#[derive(Debug, Default)]
pub struct ScriptedEvents {
    ticks: VecDeque<Vec<PlatformEvent>>,
}

impl ScriptedEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the events for the next unscripted tick.
    pub fn then(mut self, events: impl IntoIterator<Item = PlatformEvent>) -> Self {
        self.ticks.push_back(events.into_iter().collect());
        self
    }

    /// Queue `n` ticks with no events.
    pub fn idle(mut self, n: usize) -> Self {
        for _ in 0..n {
            self.ticks.push_back(Vec::new());
        }
        self
    }

    /// Append more events to the script at runtime.
    pub fn push(&mut self, events: impl IntoIterator<Item = PlatformEvent>) {
        self.ticks.push_back(events.into_iter().collect());
    }

    /// Ticks still scripted.
    pub fn remaining(&self) -> usize {
        self.ticks.len()
    }
}

impl EventSource for ScriptedEvents {
    fn poll(&mut self, batch: &mut EventBatch) {
        if let Some(events) = self.ticks.pop_front() {
            batch.extend(events);
        }
    }
}

/// Records the first pixel byte of every presented surface.
#[derive(Debug, Default)]
pub struct CapturePresenter {
    pub first_bytes: Vec<u8>,
}

impl Presenter for CapturePresenter {
    fn present(&mut self, surface: &Surface) {
        self.first_bytes
            .push(surface.pixels().first().copied().unwrap_or(0));
    }
}
