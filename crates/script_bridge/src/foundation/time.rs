//! Frame timing pushed by the engine at the start of every frame

use std::sync::Arc;
use std::time::Duration;

use crate::config::TimeConfig;
use crate::error::{BridgeError, BridgeResult};
use crate::foundation::math::utils::nearly_equal;
use crate::native::TimeBackend;

/// Number of engine ticks in one second (ticks are 100 ns)
pub const TICKS_PER_SECOND: u64 = 10_000_000;

const NANOS_PER_TICK: u64 = 100;

/// Convert engine ticks to a duration, clamping negative values to zero
pub fn ticks_to_duration(ticks: i64) -> Duration {
    u64::try_from(ticks).map_or_else(
        |_| {
            log::warn!("Negative tick count {ticks} received from engine, clamped to zero");
            Duration::ZERO
        },
        |ticks| Duration::from_nanos(ticks.saturating_mul(NANOS_PER_TICK)),
    )
}

/// Convert system time in seconds into a duration
pub fn from_seconds(seconds: f32) -> BridgeResult<Duration> {
    Duration::try_from_secs_f32(seconds)
        .map_err(|e| BridgeError::out_of_range("seconds", format!("{seconds}: {e}")))
}

/// Managed view of the engine's frame timings
pub struct FrameTimer {
    frame_start: Duration,
    frame_start_ui: Duration,
    frame: Duration,
    real_frame: Duration,
    scale: f32,
    frame_rate: f32,
    frame_count: u64,
    zero_tolerance: f32,
    backend: Arc<dyn TimeBackend>,
}

impl FrameTimer {
    /// Create a timer that forwards scale changes to `backend`
    pub fn new(backend: Arc<dyn TimeBackend>, config: &TimeConfig) -> Self {
        Self {
            frame_start: Duration::ZERO,
            frame_start_ui: Duration::ZERO,
            frame: Duration::ZERO,
            real_frame: Duration::ZERO,
            scale: 1.0,
            frame_rate: 0.0,
            frame_count: 0,
            zero_tolerance: config.zero_tolerance,
            backend,
        }
    }

    /// Native thunk: refresh all timings at the start of a frame
    pub fn set_timings(
        &mut self,
        frame_start: i64,
        frame_start_ui: i64,
        frame: i64,
        real_frame: i64,
        scale: f32,
        frame_rate: f32,
    ) {
        self.frame_start = ticks_to_duration(frame_start);
        self.frame_start_ui = ticks_to_duration(frame_start_ui);
        self.frame = ticks_to_duration(frame);
        self.real_frame = ticks_to_duration(real_frame);
        self.scale = scale;
        self.frame_rate = frame_rate;
        self.frame_count += 1;
    }

    /// Processed time at which the frame started (paused, smoothed, scaled, clamped)
    pub const fn frame_start(&self) -> Duration {
        self.frame_start
    }

    /// Unprocessed time at which the frame started
    pub const fn frame_start_ui(&self) -> Duration {
        self.frame_start_ui
    }

    /// Processed duration of the previous frame
    pub const fn frame(&self) -> Duration {
        self.frame
    }

    /// Unprocessed duration of the previous frame
    pub const fn real_frame(&self) -> Duration {
        self.real_frame
    }

    /// Frames per second reported by the engine
    pub const fn frame_rate(&self) -> f32 {
        self.frame_rate
    }

    /// Number of frames seen so far
    pub const fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Current time dilation
    pub const fn scale(&self) -> f32 {
        self.scale
    }

    /// Change time dilation; values within tolerance of the current one are ignored
    pub fn set_scale(&mut self, scale: f32) {
        if nearly_equal(scale, self.scale, self.zero_tolerance) {
            return;
        }
        self.scale = scale;
        self.backend.set_time_scale(scale);
    }

    /// Remove time dilation
    pub fn clear_scaling(&mut self) {
        self.scale = 1.0;
        self.backend.clear_time_scaling();
    }

    /// Absolute time that changes independently from the frame start
    pub fn async_time(&self) -> Duration {
        self.backend.async_time()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::headless::HeadlessEngine;

    fn timer() -> (Arc<HeadlessEngine>, FrameTimer) {
        let engine = Arc::new(HeadlessEngine::new());
        let timer = FrameTimer::new(engine.clone(), &TimeConfig::default());
        (engine, timer)
    }

    #[test]
    fn test_set_timings_converts_ticks() {
        let (_, mut timer) = timer();
        timer.set_timings(20_000_000, 30_000_000, 166_666, 170_000, 1.0, 60.0);

        assert_eq!(timer.frame_start(), Duration::from_secs(2));
        assert_eq!(timer.frame_start_ui(), Duration::from_secs(3));
        assert_eq!(timer.frame(), Duration::from_nanos(16_666_600));
        assert_eq!(timer.real_frame(), Duration::from_millis(17));
        assert_eq!(timer.frame_rate(), 60.0);
        assert_eq!(timer.frame_count(), 1);
    }

    #[test]
    fn test_negative_ticks_clamp() {
        assert_eq!(ticks_to_duration(-5), Duration::ZERO);
    }

    #[test]
    fn test_scale_forwarded_only_on_change() {
        let (engine, mut timer) = timer();
        timer.set_scale(1.0);
        assert!(engine.time_scale_calls().is_empty());

        timer.set_scale(0.5);
        timer.set_scale(0.5);
        assert_eq!(engine.time_scale_calls(), vec![0.5]);
        assert_eq!(timer.scale(), 0.5);

        timer.clear_scaling();
        assert_eq!(timer.scale(), 1.0);
    }

    #[test]
    fn test_from_seconds() {
        assert_eq!(from_seconds(1.5).unwrap(), Duration::from_millis(1500));
        assert!(from_seconds(-1.0).is_err());
    }
}
