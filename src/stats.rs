use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::config;

/// Rolling frame-timing window behind the FPS overlay.
///
/// [`begin_frame`](Self::begin_frame) and [`end_frame`](Self::end_frame)
/// bracket the work of one animation step; the elapsed time lands in a capped
/// sample window from which the derived numbers are computed.
#[derive(Debug, Clone)]
pub struct FrameStats {
    samples: VecDeque<f64>,
    capacity: usize,
    frame_count: u64,
    started: Option<Instant>,
    last_ms: f64,
}

impl Default for FrameStats {
    fn default() -> Self {
        Self::with_capacity(config::overlay::FRAME_SAMPLES)
    }
}

impl FrameStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stats keeping at most `capacity` samples.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            frame_count: 0,
            started: None,
            last_ms: 0.0,
        }
    }

    /// Marks the start of a frame.
    pub fn begin_frame(&mut self) {
        self.started = Some(Instant::now());
    }

    /// Marks the end of a frame and records the elapsed time. Without a
    /// matching [`begin_frame`](Self::begin_frame) this does nothing.
    pub fn end_frame(&mut self) {
        if let Some(started) = self.started.take() {
            self.record(started.elapsed());
        }
    }

    /// Records one frame duration, evicting the oldest sample once the
    /// window is full.
    pub fn record(&mut self, duration: Duration) {
        let ms = duration.as_secs_f64() * 1000.0;
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(ms);
        self.last_ms = ms;
        self.frame_count += 1;
    }

    /// Completed frames since construction.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn last_ms(&self) -> f64 {
        self.last_ms
    }

    /// Average frame time over the window, in milliseconds.
    pub fn avg_ms(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }

    pub fn min_ms(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn max_ms(&self) -> f64 {
        self.samples.iter().copied().fold(0.0, f64::max)
    }

    /// Frames per second implied by the window average.
    pub fn fps(&self) -> f64 {
        let avg = self.avg_ms();
        if avg > 0.0 {
            1000.0 / avg
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn records_and_averages_samples() {
        let mut stats = FrameStats::new();
        stats.record(Duration::from_millis(10));
        stats.record(Duration::from_millis(20));
        stats.record(Duration::from_millis(30));
        assert_eq!(stats.frame_count(), 3);
        assert_relative_eq!(stats.avg_ms(), 20.0);
        assert_relative_eq!(stats.min_ms(), 10.0);
        assert_relative_eq!(stats.max_ms(), 30.0);
        assert_relative_eq!(stats.last_ms(), 30.0);
        assert_relative_eq!(stats.fps(), 50.0);
    }

    #[test]
    fn window_keeps_only_recent_samples() {
        let mut stats = FrameStats::with_capacity(4);
        for _ in 0..6 {
            stats.record(Duration::from_millis(40));
        }
        for _ in 0..4 {
            stats.record(Duration::from_millis(10));
        }
        assert_eq!(stats.sample_count(), 4);
        assert_eq!(stats.frame_count(), 10);
        assert_relative_eq!(stats.avg_ms(), 10.0);
    }

    #[test]
    fn begin_and_end_bracket_a_frame() {
        let mut stats = FrameStats::new();
        stats.begin_frame();
        std::thread::sleep(Duration::from_millis(2));
        stats.end_frame();
        assert_eq!(stats.frame_count(), 1);
        assert!(stats.last_ms() >= 2.0);
    }

    #[test]
    fn end_without_begin_is_ignored() {
        let mut stats = FrameStats::new();
        stats.end_frame();
        assert_eq!(stats.frame_count(), 0);
    }

    #[test]
    fn empty_stats_report_zero() {
        let stats = FrameStats::new();
        assert_eq!(stats.fps(), 0.0);
        assert_eq!(stats.avg_ms(), 0.0);
        assert_eq!(stats.min_ms(), 0.0);
        assert_eq!(stats.max_ms(), 0.0);
    }
}
