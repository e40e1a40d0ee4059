use std::sync::Mutex;

/// Batch counters shared by every row worker.
pub struct MetricsRecorder {
    inner: Mutex<MetricsSnapshot>,
}

/// Point-in-time copy of the batch counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub written: usize,
    pub no_data: usize,
    pub failed: usize,
}

impl MetricsSnapshot {
    pub fn processed(&self) -> usize {
        self.written + self.no_data + self.failed
    }
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MetricsSnapshot::default()),
        }
    }

    pub fn record_written(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.written += 1;
        }
    }

    pub fn record_no_data(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.no_data += 1;
        }
    }

    pub fn record_error(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.failed += 1;
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.inner
            .lock()
            .map(|metrics| *metrics)
            .unwrap_or_default()
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}
