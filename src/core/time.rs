//! Frame timing utilities

use std::time::{Duration, Instant};

/// Tracks per-frame delta time and total running time, excluding paused spans
pub struct GameTimer {
    base_time: Instant,
    paused: Duration,
    /// Set while the timer is stopped
    stop_time: Option<Instant>,
    prev_time: Instant,
    curr_time: Instant,
    delta: Duration,
    frame_count: u64,
}

impl GameTimer {
    /// Create a new running timer
    pub fn new() -> Self {
        Self::new_at(Instant::now())
    }

    fn new_at(now: Instant) -> Self {
        Self {
            base_time: now,
            paused: Duration::ZERO,
            stop_time: None,
            prev_time: now,
            curr_time: now,
            delta: Duration::ZERO,
            frame_count: 0,
        }
    }

    /// Restart timing from now; call before entering the frame loop
    pub fn reset(&mut self) {
        *self = Self::new_at(Instant::now());
    }

    /// Resume after `stop`
    pub fn start(&mut self) {
        self.start_at(Instant::now());
    }

    fn start_at(&mut self, now: Instant) {
        if let Some(stopped_at) = self.stop_time.take() {
            self.paused += now.saturating_duration_since(stopped_at);
            self.prev_time = now;
        }
    }

    /// Pause the timer
    pub fn stop(&mut self) {
        self.stop_at(Instant::now());
    }

    fn stop_at(&mut self, now: Instant) {
        if self.stop_time.is_none() {
            self.stop_time = Some(now);
        }
    }

    /// Call once per frame to update timing
    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    fn tick_at(&mut self, now: Instant) {
        if self.stop_time.is_some() {
            self.delta = Duration::ZERO;
            return;
        }

        self.curr_time = now;
        // Instants are monotonic, so the delta saturates instead of going negative
        self.delta = now.saturating_duration_since(self.prev_time);
        self.prev_time = now;
        self.frame_count += 1;
    }

    /// Get delta time in seconds
    pub fn delta_secs(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Get delta time as Duration
    pub fn delta(&self) -> Duration {
        self.delta
    }

    /// Total time since the last reset, not counting time spent stopped
    pub fn total_secs(&self) -> f32 {
        let end = self.stop_time.unwrap_or(self.curr_time);
        end.saturating_duration_since(self.base_time)
            .saturating_sub(self.paused)
            .as_secs_f32()
    }

    /// Whether the timer is currently stopped
    pub fn is_stopped(&self) -> bool {
        self.stop_time.is_some()
    }

    /// Get total frame count
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

impl Default for GameTimer {
    fn default() -> Self {
        Self::new()
    }
}
