// src/timing.rs
use std::time::Duration;

use instant::Instant;

/// Smallest `dt` handed to the update step, in seconds.
pub const MIN_FRAME_DT: f32 = 0.001;

/// Wall-clock delta between consecutive frames.
#[derive(Debug, Default)]
pub struct FrameClock {
    last: Option<Instant>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds since the previous tick, never below `MIN_FRAME_DT`.
    pub fn tick(&mut self, now: Instant) -> f32 {
        let dt = self
            .last
            .map(|prev| elapsed_between(prev, now).as_secs_f32())
            .unwrap_or(0.0);
        self.last = Some(now);
        dt.max(MIN_FRAME_DT)
    }

    /// Forgets the previous frame, e.g. after the field was regenerated.
    pub fn reset(&mut self) {
        self.last = None;
    }
}

fn elapsed_between(earlier: Instant, later: Instant) -> Duration {
    if later > earlier { later - earlier } else { Duration::ZERO }
}

/// Counts frames and reports a rate once per second.
#[derive(Debug)]
pub struct FpsCounter {
    window_start: Instant,
    frames: u32,
    current: u32,
}

impl FpsCounter {
    pub fn new(now: Instant) -> Self {
        Self { window_start: now, frames: 0, current: 0 }
    }

    /// Registers a frame. Returns the new rate when a full second has passed.
    pub fn frame(&mut self, now: Instant) -> Option<u32> {
        self.frames += 1;
        if elapsed_between(self.window_start, now) >= Duration::from_secs(1) {
            self.current = self.frames;
            self.frames = 0;
            self.window_start = now;
            return Some(self.current);
        }
        None
    }

    pub fn current(&self) -> u32 {
        self.current
    }
}
