// Performance metrics module
//
// Provides lightweight counters for monitoring a burst

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Burst metrics
///
/// Uses atomic operations so observers on other threads can read the counters
/// while the controller updates them. Logged on shutdown.
#[derive(Debug)]
pub struct Metrics {
    /// Poll timer ticks handled
    pub ticks: AtomicU64,

    /// Ticks that found a render still in flight
    pub idle_ticks: AtomicU64,

    /// Cameras handed to the renderer
    pub dispatches: AtomicUsize,

    /// Renders that finished and were removed from the queue
    pub renders_completed: AtomicUsize,

    /// Runs aborted by a consistency or host error
    pub fatal_errors: AtomicUsize,

    /// Dispatch-to-finish time summed over completed renders, in milliseconds
    pub total_render_time_ms: AtomicU64,

    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            ticks: AtomicU64::new(0),
            idle_ticks: AtomicU64::new(0),
            dispatches: AtomicUsize::new(0),
            renders_completed: AtomicUsize::new(0),
            fatal_errors: AtomicUsize::new(0),
            total_render_time_ms: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_tick(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_idle_tick(&self) {
        self.idle_ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dispatch(&self) {
        self.dispatches.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a finished render and how long it took
    pub fn record_render_completed(&self, duration: Duration) {
        self.renders_completed.fetch_add(1, Ordering::Relaxed);
        self.total_render_time_ms
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn record_fatal_error(&self) {
        self.fatal_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get total uptime
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Get average render time per camera in milliseconds
    pub fn avg_render_time_ms(&self) -> f64 {
        let total = self.total_render_time_ms.load(Ordering::Relaxed);
        let count = self.renders_completed.load(Ordering::Relaxed);
        if count > 0 {
            total as f64 / count as f64
        } else {
            0.0
        }
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        let uptime = self.uptime();
        tracing::info!("=== Burst Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", uptime.as_secs_f64());
        tracing::info!(
            "Cameras: {} dispatched, {} rendered, {} fatal errors",
            self.dispatches.load(Ordering::Relaxed),
            self.renders_completed.load(Ordering::Relaxed),
            self.fatal_errors.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Total render time: {:.2}s (avg: {:.2}ms per camera)",
            self.total_render_time_ms.load(Ordering::Relaxed) as f64 / 1000.0,
            self.avg_render_time_ms()
        );
        tracing::info!(
            "Ticks: {} ({} while rendering)",
            self.ticks.load(Ordering::Relaxed),
            self.idle_ticks.load(Ordering::Relaxed)
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new();
        assert_eq!(metrics.ticks.load(Ordering::Relaxed), 0);
        assert_eq!(metrics.dispatches.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_record_counters() {
        let metrics = Metrics::new();

        metrics.record_tick();
        metrics.record_tick();
        metrics.record_idle_tick();
        metrics.record_dispatch();
        metrics.record_fatal_error();

        assert_eq!(metrics.ticks.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.idle_ticks.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.dispatches.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.fatal_errors.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_record_render_time() {
        let metrics = Metrics::new();

        metrics.record_render_completed(Duration::from_millis(100));
        metrics.record_render_completed(Duration::from_millis(200));

        assert_eq!(metrics.renders_completed.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.total_render_time_ms.load(Ordering::Relaxed), 300);
        assert_eq!(metrics.avg_render_time_ms(), 150.0);
    }

    #[test]
    fn test_avg_render_time_no_renders() {
        let metrics = Metrics::new();
        assert_eq!(metrics.avg_render_time_ms(), 0.0);
    }

    #[test]
    fn test_uptime() {
        let metrics = Metrics::new();
        thread::sleep(Duration::from_millis(10));
        assert!(metrics.uptime().as_millis() >= 10);
    }
}
