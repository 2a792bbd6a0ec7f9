//! Per-tick and cumulative scheduler metrics.
//!
//! [`TickMetrics`] captures timing for a single tick; [`HostMetrics`]
//! accumulates counters over the host's lifetime.

/// Timing collected during a single tick.
///
/// All durations are in microseconds.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickMetrics {
    /// Work time: reload check through present, excluding the sleep.
    pub work_us: u64,
    /// Time spent inside the module's update.
    pub update_us: u64,
    /// Time slept to fill the tick budget.
    pub sleep_us: u64,
    /// Seconds handed to the module as `delta_seconds`.
    pub delta_seconds: f32,
    /// Platform events polled this tick.
    pub events: u32,
    /// Work time exceeded the tick budget.
    pub missed_deadline: bool,
    /// New module code became active this tick.
    pub reloaded: bool,
    /// `init` ran this tick.
    pub initialized: bool,
    /// The frame came from a recording.
    pub played_back: bool,
}

/// Counters accumulated over the host's lifetime.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HostMetrics {
    /// Ticks completed.
    pub ticks: u64,
    /// Ticks whose work exceeded the budget.
    pub missed_deadlines: u64,
    /// Successful module reloads.
    pub reloads: u64,
    /// Failed reload attempts.
    pub failed_reloads: u64,
    /// Frames appended to recordings.
    pub recorded_frames: u64,
    /// Frames taken from recordings.
    pub played_frames: u64,
    /// Session requests refused or sessions aborted by I/O errors.
    pub session_errors: u64,
    /// Longest work time seen, in microseconds.
    pub max_work_us: u64,
}

impl HostMetrics {
    /// Fold one tick into the totals.
    pub fn record_tick(&mut self, tick: &TickMetrics) {
        self.ticks += 1;
        self.missed_deadlines += tick.missed_deadline as u64;
        self.played_frames += tick.played_back as u64;
        self.max_work_us = self.max_work_us.max(tick.work_us);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_metrics_are_zero() {
        let m = HostMetrics::default();
        assert_eq!(m.ticks, 0);
        assert_eq!(m.missed_deadlines, 0);
        assert_eq!(m.max_work_us, 0);
        let t = TickMetrics::default();
        assert!(!t.missed_deadline);
        assert_eq!(t.events, 0);
    }

    #[test]
    fn record_tick_accumulates() {
        let mut m = HostMetrics::default();
        m.record_tick(&TickMetrics {
            work_us: 500,
            missed_deadline: true,
            ..TickMetrics::default()
        });
        m.record_tick(&TickMetrics {
            work_us: 200,
            played_back: true,
            ..TickMetrics::default()
        });
        assert_eq!(m.ticks, 2);
        assert_eq!(m.missed_deadlines, 1);
        assert_eq!(m.played_frames, 1);
        assert_eq!(m.max_work_us, 500);
    }
}
