//! The [`SimulationModule`] trait.

use reel_arena::Arena;
use reel_core::{InputFrame, Surface};

/// Module code: the two entry points the host calls.
///
/// # Contract
///
/// - All persistent state lives in `arena`'s permanent zone. Anything an
///   implementation keeps in `self` is lost on reload.
/// - `update` MUST be deterministic: the same arena bytes and the same
///   input produce the same arena bytes. Playback depends on it.
/// - `init` runs at most once per arena, before the first `update`.
///
/// # Object safety
///
/// This trait is object-safe; the host stores the active module as
/// `Box<dyn SimulationModule>`.
///
/// # Examples
///
/// ```
/// use reel_arena::{Arena, ArenaConfig};
/// use reel_core::{InputFrame, Surface};
/// use reel_module::SimulationModule;
///
/// struct Counter;
///
/// impl SimulationModule for Counter {
///     fn init(&mut self, arena: &mut Arena, _surface: &mut Surface) {
///         arena.module_state_mut()[0] = 100;
///     }
///
///     fn update(&mut self, arena: &mut Arena, _: &mut Surface, _: &InputFrame, _: f32) {
///         arena.module_state_mut()[0] += 1;
///     }
/// }
///
/// let mut arena = Arena::reserve(&ArenaConfig::new(4096, 4096)).unwrap();
/// let mut surface = Surface::new(1, 1, 4);
/// let mut module = Counter;
/// module.init(&mut arena, &mut surface);
/// module.update(&mut arena, &mut surface, &InputFrame::default(), 1.0 / 60.0);
/// assert_eq!(arena.module_state()[0], 101);
/// ```
pub trait SimulationModule {
    /// First-run setup of module state.
    fn init(&mut self, arena: &mut Arena, surface: &mut Surface);

    /// Advance the simulation by one tick and draw into `surface`.
    fn update(
        &mut self,
        arena: &mut Arena,
        surface: &mut Surface,
        input: &InputFrame,
        delta_seconds: f32,
    );
}

impl<M: SimulationModule + ?Sized> SimulationModule for Box<M> {
    fn init(&mut self, arena: &mut Arena, surface: &mut Surface) {
        (**self).init(arena, surface);
    }

    fn update(
        &mut self,
        arena: &mut Arena,
        surface: &mut Surface,
        input: &InputFrame,
        delta_seconds: f32,
    ) {
        (**self).update(arena, surface, input, delta_seconds);
    }
}
