//! Simulated progress cadence.
//!
//! Progress ticks are only feedback: they climb by a fixed step on a fixed
//! interval and stop at a ceiling below 100. Completion is signalled
//! separately by the backend, which is the only path to 100.

use std::time::Duration;

use crate::models::job::JobKind;

/// Progress never climbs past this value until the job succeeds.
pub const DEFAULT_CEILING: u8 = 98;

/// Engine-wide tick settings with per-kind step sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSettings {
    pub tick_interval: Duration,
    pub ceiling: u8,
    pub image_step: u8,
    pub audio_step: u8,
}

impl Default for ProgressSettings {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(200),
            ceiling: DEFAULT_CEILING,
            image_step: 5,
            audio_step: 3,
        }
    }
}

impl ProgressSettings {
    pub fn schedule(&self, kind: JobKind) -> ProgressSchedule {
        let step = match kind {
            JobKind::Image => self.image_step,
            JobKind::Audio => self.audio_step,
        };
        ProgressSchedule {
            interval: self.tick_interval,
            step,
            ceiling: self.ceiling,
        }
    }
}

/// Tick schedule for a single job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSchedule {
    pub interval: Duration,
    pub step: u8,
    pub ceiling: u8,
}

impl ProgressSchedule {
    /// Progress after one more tick, or `None` once the ceiling is reached.
    pub fn next(&self, current: u8) -> Option<u8> {
        if current >= self.ceiling || self.step == 0 {
            return None;
        }
        Some(current.saturating_add(self.step).min(self.ceiling))
    }
}
