//! Snap-back: a rejected ghost easing back to where the block started.
//!
//! This is a plain value; renderers sample it each frame.

use std::time::{Duration, Instant};

use super::session::BlockGeometry;

/// Interpolated block placement. `column` is fractional while moving
/// between columns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapBackFrame {
    pub column: f32,
    pub top: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SnapBackAnimation {
    pub event_id: i64,
    pub from: BlockGeometry,
    pub to: BlockGeometry,
    pub started_at: Instant,
    pub duration: Duration,
}

impl SnapBackAnimation {
    pub fn new(
        event_id: i64,
        from: BlockGeometry,
        to: BlockGeometry,
        started_at: Instant,
        duration: Duration,
    ) -> Self {
        Self {
            event_id,
            from,
            to,
            started_at,
            duration,
        }
    }

    /// Linear progress in `0.0..=1.0`.
    pub fn progress(&self, now: Instant) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.started_at);
        (elapsed.as_secs_f32() / self.duration.as_secs_f32()).clamp(0.0, 1.0)
    }

    pub fn is_finished(&self, now: Instant) -> bool {
        self.progress(now) >= 1.0
    }

    pub fn frame_at(&self, now: Instant) -> SnapBackFrame {
        let t = ease_out_cubic(self.progress(now));
        let lerp = |a: f32, b: f32| a + (b - a) * t;
        SnapBackFrame {
            column: lerp(self.from.column as f32, self.to.column as f32),
            top: lerp(self.from.top, self.to.top),
            height: lerp(self.from.height, self.to.height),
        }
    }
}

fn ease_out_cubic(t: f32) -> f32 {
    1.0 - (1.0 - t).powi(3)
}
