//! Seams to the platform layer: where events come from and where the
//! finished surface goes.

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use reel_core::Surface;
use smallvec::SmallVec;

use crate::input::PlatformEvent;

/// Events gathered during one tick. Most ticks see only a handful.
pub type EventBatch = SmallVec<[PlatformEvent; 16]>;

/// Produces platform events.
pub trait EventSource {
    /// Append every event that arrived since the last poll to `batch`,
    /// without blocking.
    fn poll(&mut self, batch: &mut EventBatch);
}

/// Consumes the finished surface once per tick.
pub trait Presenter {
    /// Show `surface`. Contents are opaque to the host.
    fn present(&mut self, surface: &Surface);
}

/// Events delivered over a channel from another thread.
///
/// When every sender is gone the source reports a single
/// [`PlatformEvent::Quit`].
#[derive(Debug)]
pub struct ChannelEventSource {
    rx: Receiver<PlatformEvent>,
    disconnected: bool,
}

impl ChannelEventSource {
    /// Wrap an existing receiver.
    pub fn new(rx: Receiver<PlatformEvent>) -> Self {
        Self {
            rx,
            disconnected: false,
        }
    }

    /// An unbounded channel and the source reading from it.
    pub fn channel() -> (Sender<PlatformEvent>, Self) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (tx, Self::new(rx))
    }
}

impl EventSource for ChannelEventSource {
    fn poll(&mut self, batch: &mut EventBatch) {
        loop {
            match self.rx.try_recv() {
                Ok(event) => batch.push(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.disconnected {
                        self.disconnected = true;
                        log::info!("event channel closed");
                        batch.push(PlatformEvent::Quit);
                    }
                    break;
                }
            }
        }
    }
}

/// Discards every frame, counting them.
#[derive(Debug, Default)]
pub struct NullPresenter {
    frames: u64,
}

impl NullPresenter {
    /// Frames presented so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Presenter for NullPresenter {
    fn present(&mut self, _surface: &Surface) {
        self.frames += 1;
    }
}
