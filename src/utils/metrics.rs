//! Observability and Metrics
//!
//! Process-wide counters for codec activity: messages, header conventions
//! seen on the wire, guard rejections and fast-path usage.
//!
//! Uses atomic counters so protocol instances on different threads can record
//! into the same collector.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, info};

/// Metrics collector for codec operations
#[derive(Debug)]
pub struct CodecMetrics {
    /// Messages fully written (header through end)
    pub messages_written: AtomicU64,
    /// Messages fully read
    pub messages_read: AtomicU64,
    /// Headers that decoded as absent
    pub empty_messages: AtomicU64,
    /// Headers accepted in the unversioned legacy convention
    pub legacy_headers: AtomicU64,
    /// Strings or containers rejected by a length guard
    pub limit_rejections: AtomicU64,
    /// Headers rejected for a missing or unknown version
    pub version_rejections: AtomicU64,
    /// Values encoded by a bound fast-path codec
    pub fast_encodes: AtomicU64,
    /// Values decoded by a bound fast-path codec
    pub fast_decodes: AtomicU64,
    /// Fast-path decodes that fell back to the generic codec
    pub fast_fallbacks: AtomicU64,
    start_time: Instant,
}

impl CodecMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            messages_written: AtomicU64::new(0),
            messages_read: AtomicU64::new(0),
            empty_messages: AtomicU64::new(0),
            legacy_headers: AtomicU64::new(0),
            limit_rejections: AtomicU64::new(0),
            version_rejections: AtomicU64::new(0),
            fast_encodes: AtomicU64::new(0),
            fast_decodes: AtomicU64::new(0),
            fast_fallbacks: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn message_written(&self) {
        self.messages_written.fetch_add(1, Ordering::Relaxed);
    }

    pub fn message_read(&self) {
        self.messages_read.fetch_add(1, Ordering::Relaxed);
    }

    pub fn empty_message(&self) {
        self.empty_messages.fetch_add(1, Ordering::Relaxed);
    }

    pub fn legacy_header(&self) {
        self.legacy_headers.fetch_add(1, Ordering::Relaxed);
    }

    pub fn limit_rejection(&self) {
        self.limit_rejections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn version_rejection(&self) {
        self.version_rejections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn fast_encode(&self) {
        self.fast_encodes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn fast_decode(&self) {
        self.fast_decodes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn fast_fallback(&self) {
        self.fast_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages_written: self.messages_written.load(Ordering::Relaxed),
            messages_read: self.messages_read.load(Ordering::Relaxed),
            empty_messages: self.empty_messages.load(Ordering::Relaxed),
            legacy_headers: self.legacy_headers.load(Ordering::Relaxed),
            limit_rejections: self.limit_rejections.load(Ordering::Relaxed),
            version_rejections: self.version_rejections.load(Ordering::Relaxed),
            fast_encodes: self.fast_encodes.load(Ordering::Relaxed),
            fast_decodes: self.fast_decodes.load(Ordering::Relaxed),
            fast_fallbacks: self.fast_fallbacks.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    /// Log current metrics
    pub fn log_metrics(&self) {
        let snapshot = self.snapshot();
        info!(
            messages_written = snapshot.messages_written,
            messages_read = snapshot.messages_read,
            empty_messages = snapshot.empty_messages,
            legacy_headers = snapshot.legacy_headers,
            limit_rejections = snapshot.limit_rejections,
            version_rejections = snapshot.version_rejections,
            fast_encodes = snapshot.fast_encodes,
            fast_decodes = snapshot.fast_decodes,
            fast_fallbacks = snapshot.fast_fallbacks,
            uptime_seconds = snapshot.uptime_seconds,
            "Codec metrics snapshot"
        );
    }
}

impl Default for CodecMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub messages_written: u64,
    pub messages_read: u64,
    pub empty_messages: u64,
    pub legacy_headers: u64,
    pub limit_rejections: u64,
    pub version_rejections: u64,
    pub fast_encodes: u64,
    pub fast_decodes: u64,
    pub fast_fallbacks: u64,
    pub uptime_seconds: u64,
}

static METRICS: once_cell::sync::Lazy<CodecMetrics> = once_cell::sync::Lazy::new(CodecMetrics::new);

/// Get the global metrics instance
pub fn global_metrics() -> &'static CodecMetrics {
    &METRICS
}

/// Timer for measuring operation duration
pub struct Timer {
    start: Instant,
    operation: &'static str,
}

impl Timer {
    /// Start timing an operation
    pub fn start(operation: &'static str) -> Self {
        Self {
            start: Instant::now(),
            operation,
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        debug!(
            operation = self.operation,
            duration_us = duration.as_micros() as u64,
            "Operation completed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let metrics = CodecMetrics::new();
        metrics.message_written();
        metrics.message_written();
        metrics.limit_rejection();
        metrics.fast_fallback();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.messages_written, 2);
        assert_eq!(snapshot.limit_rejections, 1);
        assert_eq!(snapshot.fast_fallbacks, 1);
        assert_eq!(snapshot.messages_read, 0);
    }
}
