mod telemetry;

pub use telemetry::{init_telemetry, LogLevel, PerformanceTracker, TelemetryConfig};

/// Convenience macro for performance tracking
#[macro_export]
macro_rules! track_performance {
    ($name:expr) => {
        let _tracker = $crate::monitoring::PerformanceTracker::new($name);
    };
}
