//! Scene time used to animate materials (water waves, swaying bushes).
//!
//! Time stands still while assets are loading and starts once the loading screen
//! is done, so animations begin from zero when the map first becomes visible.

use web_time::Duration;

/// Accumulates scaled scene time.
#[derive(Debug, Clone)]
pub struct TimeTracker {
    enabled: bool,
    speed: f32,
    elapsed: f32,
}

impl TimeTracker {
    /// Creates a stopped tracker running at `speed` once enabled. Negative speeds
    /// are treated as zero.
    pub fn new(speed: f32) -> Self {
        Self {
            enabled: false,
            speed: speed.max(0.0),
            elapsed: 0.0,
        }
    }

    /// Starts accumulating time.
    pub fn enable(&mut self) {
        self.enabled = true;
    }

    /// Whether time is accumulating.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Scales how fast scene time passes relative to wall time.
    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed.max(0.0);
    }

    /// Advances by `dt` of wall time and returns the scene time.
    pub fn advance(&mut self, dt: Duration) -> f32 {
        if self.enabled {
            self.elapsed += self.speed * dt.as_secs_f32();
        }
        self.elapsed
    }

    /// Scene time in seconds.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }
}
