/// Default wrap period for shader-visible time.
pub const DEFAULT_TIME_ROLLOVER_SECS: f64 = 3600.0;

/// Frame timing snapshot produced by [`FrameClock::advance`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameTime {
    /// Frame counter after the advance.
    pub frame: u64,

    /// Step passed to this advance, in seconds.
    pub delta: f64,

    /// Accumulated time wrapped into `[0, rollover)`.
    pub time: f64,
}

/// Per-frame counter and wrapping time accumulator.
///
/// Shader time is kept small so that `f32` precision on the GPU stays usable
/// in long sessions; it wraps at the configured rollover period.
#[derive(Debug, Clone)]
pub struct FrameClock {
    frame: u64,
    delta: f64,
    time: f64,
    rollover: f64,
}

impl FrameClock {
    /// Creates a clock wrapping at `rollover` seconds.
    ///
    /// Non-positive or non-finite periods fall back to the default.
    pub fn new(rollover: f64) -> Self {
        let rollover = if rollover.is_finite() && rollover > 0.0 {
            rollover
        } else {
            log::warn!(
                "invalid time rollover period {rollover}; using {DEFAULT_TIME_ROLLOVER_SECS}s"
            );
            DEFAULT_TIME_ROLLOVER_SECS
        };

        Self {
            frame: 1,
            delta: 0.0,
            time: 0.0,
            rollover,
        }
    }

    /// Advances by `step` seconds and returns the new snapshot.
    pub fn advance(&mut self, step: f64) -> FrameTime {
        self.frame = self.frame.wrapping_add(1);
        self.delta = step;
        // `%` on floats is fmod: the result keeps the dividend's sign.
        self.time = (self.time + step) % self.rollover;

        self.snapshot()
    }

    #[inline]
    pub fn snapshot(&self) -> FrameTime {
        FrameTime {
            frame: self.frame,
            delta: self.delta,
            time: self.time,
        }
    }

    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    #[inline]
    pub fn time(&self) -> f64 {
        self.time
    }

    #[inline]
    pub fn rollover(&self) -> f64 {
        self.rollover
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(DEFAULT_TIME_ROLLOVER_SECS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_starts_at_one_and_increments() {
        let mut clock = FrameClock::default();
        assert_eq!(clock.frame(), 1);
        assert_eq!(clock.advance(0.016).frame, 2);
        assert_eq!(clock.advance(0.016).frame, 3);
    }

    #[test]
    fn time_wraps_at_rollover() {
        let mut clock = FrameClock::new(10.0);
        clock.advance(6.0);
        let t = clock.advance(6.5);
        assert!((t.time - 2.5).abs() < 1e-9);
        assert_eq!(t.delta, 6.5);
    }

    #[test]
    fn step_exactly_one_period_wraps_to_zero() {
        let mut clock = FrameClock::new(4.0);
        assert_eq!(clock.advance(4.0).time, 0.0);
    }

    #[test]
    fn invalid_rollover_falls_back_to_default() {
        assert_eq!(FrameClock::new(0.0).rollover(), DEFAULT_TIME_ROLLOVER_SECS);
        assert_eq!(FrameClock::new(f64::NAN).rollover(), DEFAULT_TIME_ROLLOVER_SECS);
    }
}
