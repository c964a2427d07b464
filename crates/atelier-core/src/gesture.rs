//! Swipe detection for the image carousel.
//!
//! `SwipeTracker` is fed raw touch points and reports a direction when a
//! touch ends fast and far enough along one dominant axis.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDirection {
    Left,
    Right,
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchPoint {
    pub x: f64,
    pub y: f64,
    /// Time since an arbitrary origin shared by all points of one gesture
    pub at: Duration,
}

impl TouchPoint {
    pub fn new(x: f64, y: f64, at: Duration) -> Self {
        Self { x, y, at }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwipeConfig {
    /// Travel along the dominant axis required to count as a swipe
    pub min_distance: f64,
    /// Longest touch that still counts as a swipe
    pub max_duration: Duration,
    /// Movement that marks the touch as an in-progress swipe
    pub threshold: f64,
    pub enabled: bool,
}

impl Default for SwipeConfig {
    fn default() -> Self {
        Self {
            min_distance: 50.0,
            max_duration: Duration::from_millis(500),
            threshold: 10.0,
            enabled: true,
        }
    }
}

impl SwipeConfig {
    /// Stricter settings for left/right carousel paging
    pub fn horizontal() -> Self {
        Self {
            min_distance: 75.0,
            max_duration: Duration::from_millis(400),
            threshold: 15.0,
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ActiveTouch {
    start: TouchPoint,
    current: TouchPoint,
}

#[derive(Debug, Clone)]
pub struct SwipeTracker {
    config: SwipeConfig,
    active: Option<ActiveTouch>,
    swiping: bool,
}

impl SwipeTracker {
    pub fn new(config: SwipeConfig) -> Self {
        Self {
            config,
            active: None,
            swiping: false,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.config.enabled = enabled;
        if !enabled {
            self.reset();
        }
    }

    pub fn is_swiping(&self) -> bool {
        self.swiping
    }

    pub fn touch_start(&mut self, point: TouchPoint) {
        if !self.config.enabled {
            return;
        }
        self.active = Some(ActiveTouch {
            start: point,
            current: point,
        });
        self.swiping = false;
    }

    /// Track movement; returns whether the touch is now a swipe in progress
    pub fn touch_move(&mut self, point: TouchPoint) -> bool {
        if !self.config.enabled {
            return false;
        }
        let Some(active) = self.active.as_mut() else {
            return false;
        };
        active.current = point;

        let dx = (point.x - active.start.x).abs();
        let dy = (point.y - active.start.y).abs();
        if dx > self.config.threshold || dy > self.config.threshold {
            self.swiping = true;
        }
        self.swiping
    }

    /// Finish the touch at `at` and classify it
    pub fn touch_end(&mut self, at: Duration) -> Option<SwipeDirection> {
        let active = self.active.take();
        self.swiping = false;
        if !self.config.enabled {
            return None;
        }
        let active = active?;

        if at.saturating_sub(active.start.at) > self.config.max_duration {
            return None;
        }

        // Positive deltas mean the finger moved left or up
        let dx = active.start.x - active.current.x;
        let dy = active.start.y - active.current.y;
        let (abs_dx, abs_dy) = (dx.abs(), dy.abs());

        if abs_dx > abs_dy && abs_dx > self.config.min_distance {
            Some(if dx > 0.0 { SwipeDirection::Left } else { SwipeDirection::Right })
        } else if abs_dy > abs_dx && abs_dy > self.config.min_distance {
            Some(if dy > 0.0 { SwipeDirection::Up } else { SwipeDirection::Down })
        } else {
            None
        }
    }

    pub fn reset(&mut self) {
        self.active = None;
        self.swiping = false;
    }
}

impl Default for SwipeTracker {
    fn default() -> Self {
        Self::new(SwipeConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn swipe(tracker: &mut SwipeTracker, from: (f64, f64), to: (f64, f64), duration_ms: u64) -> Option<SwipeDirection> {
        tracker.touch_start(TouchPoint::new(from.0, from.1, ms(0)));
        tracker.touch_move(TouchPoint::new(to.0, to.1, ms(duration_ms / 2)));
        tracker.touch_end(ms(duration_ms))
    }

    #[test]
    fn test_directions() {
        let mut tracker = SwipeTracker::default();
        assert_eq!(swipe(&mut tracker, (200.0, 100.0), (100.0, 110.0), 200), Some(SwipeDirection::Left));
        assert_eq!(swipe(&mut tracker, (100.0, 100.0), (200.0, 90.0), 200), Some(SwipeDirection::Right));
        assert_eq!(swipe(&mut tracker, (100.0, 300.0), (105.0, 200.0), 200), Some(SwipeDirection::Up));
        assert_eq!(swipe(&mut tracker, (100.0, 100.0), (95.0, 200.0), 200), Some(SwipeDirection::Down));
    }

    #[test]
    fn test_too_short_or_too_slow() {
        let mut tracker = SwipeTracker::default();
        assert_eq!(swipe(&mut tracker, (100.0, 100.0), (140.0, 100.0), 200), None);
        assert_eq!(swipe(&mut tracker, (200.0, 100.0), (0.0, 100.0), 800), None);
    }

    #[test]
    fn test_swiping_flag_follows_threshold() {
        let mut tracker = SwipeTracker::default();
        tracker.touch_start(TouchPoint::new(0.0, 0.0, ms(0)));
        assert!(!tracker.touch_move(TouchPoint::new(5.0, 5.0, ms(10))));
        assert!(tracker.touch_move(TouchPoint::new(20.0, 5.0, ms(20))));
        assert!(tracker.is_swiping());

        tracker.touch_end(ms(30));
        assert!(!tracker.is_swiping());
    }

    #[test]
    fn test_end_without_start() {
        let mut tracker = SwipeTracker::default();
        assert_eq!(tracker.touch_end(ms(10)), None);
    }

    #[test]
    fn test_disabled_tracker_ignores_input() {
        let mut tracker = SwipeTracker::default();
        tracker.set_enabled(false);
        assert_eq!(swipe(&mut tracker, (200.0, 100.0), (0.0, 100.0), 100), None);
        assert!(!tracker.is_swiping());
    }

    #[test]
    fn test_horizontal_preset_is_stricter() {
        let mut tracker = SwipeTracker::new(SwipeConfig::horizontal());
        assert_eq!(swipe(&mut tracker, (200.0, 100.0), (140.0, 100.0), 200), None);
        assert_eq!(swipe(&mut tracker, (200.0, 100.0), (100.0, 100.0), 300), Some(SwipeDirection::Left));
        assert_eq!(swipe(&mut tracker, (200.0, 100.0), (100.0, 100.0), 450), None);
    }
}
