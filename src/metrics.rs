//! Request counters and latency statistics for the risk pipeline.

use crate::pipeline::RequestState;
use crate::types::report::Verdict;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Metrics collector for pipeline requests
pub struct PipelineMetrics {
    /// Total requests processed
    requests: AtomicU64,
    /// Requests that produced a verdict
    reported: AtomicU64,
    /// Requests rejected by validation
    rejected: AtomicU64,
    /// Requests that failed on load or inference
    failed: AtomicU64,
    low_risk: AtomicU64,
    high_risk: AtomicU64,
    /// Processing times (in microseconds)
    processing_times: RwLock<Vec<u64>>,
    /// Start time for rate calculation
    start_time: Instant,
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub requests: u64,
    pub reported: u64,
    pub rejected: u64,
    pub failed: u64,
    pub low_risk: u64,
    pub high_risk: u64,
}

impl PipelineMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            requests: AtomicU64::new(0),
            reported: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            low_risk: AtomicU64::new(0),
            high_risk: AtomicU64::new(0),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            start_time: Instant::now(),
        }
    }

    /// Record a finished request; non-terminal states are not counted
    pub fn record_request(
        &self,
        processing_time: Duration,
        state: RequestState,
        verdict: Option<Verdict>,
    ) {
        let counter = match state {
            RequestState::Reported => &self.reported,
            RequestState::Rejected => &self.rejected,
            RequestState::Failed => &self.failed,
            RequestState::Collected
            | RequestState::Validated
            | RequestState::Encoded
            | RequestState::Predicted => {
                warn!(state = ?state, "Ignoring request that has not finished");
                return;
            }
        };
        self.requests.fetch_add(1, Ordering::Relaxed);
        counter.fetch_add(1, Ordering::Relaxed);

        match verdict {
            Some(Verdict::LowRisk) => {
                self.low_risk.fetch_add(1, Ordering::Relaxed);
            }
            Some(Verdict::HighRisk) => {
                self.high_risk.fetch_add(1, Ordering::Relaxed);
            }
            None => {}
        }

        if let Ok(mut times) = self.processing_times.write() {
            times.push(processing_time.as_micros() as u64);
            // Keep only last 10000 for memory efficiency
            if times.len() > 10000 {
                times.drain(0..5000);
            }
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            reported: self.reported.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            low_risk: self.low_risk.load(Ordering::Relaxed),
            high_risk: self.high_risk.load(Ordering::Relaxed),
        }
    }

    /// Get processing time statistics
    pub fn get_processing_stats(&self) -> ProcessingStats {
        let mut sorted: Vec<u64> = match self.processing_times.read() {
            Ok(times) => times.clone(),
            Err(_) => return ProcessingStats::default(),
        };
        if sorted.is_empty() {
            return ProcessingStats::default();
        }
        sorted.sort_unstable();

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();

        ProcessingStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: sorted[(count as f64 * 0.95) as usize],
            p99_us: sorted[(count as f64 * 0.99) as usize],
            max_us: sorted[count - 1],
        }
    }

    /// Get current throughput (requests per second)
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.requests.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let snapshot = self.snapshot();
        let high_risk_rate = if snapshot.reported > 0 {
            (snapshot.high_risk as f64 / snapshot.reported as f64) * 100.0
        } else {
            0.0
        };

        let processing = self.get_processing_stats();
        let throughput = self.get_throughput();

        info!("╔══════════════════════════════════════════════════════════════╗");
        info!("║          CARDIO RISK PIPELINE - METRICS SUMMARY              ║");
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Requests Processed:     {:>8}  │  Throughput: {:>6.1} req/s ║",
            snapshot.requests, throughput
        );
        info!(
            "║ Reported: {:>6}  Rejected: {:>6}  Failed: {:>6}            ║",
            snapshot.reported, snapshot.rejected, snapshot.failed
        );
        info!(
            "║ Low Risk: {:>6}  High Risk: {:>6}  ({:>5.1}% high)          ║",
            snapshot.low_risk, snapshot.high_risk, high_risk_rate
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Processing Time (μs): mean={:>5} p50={:>5} p95={:>5} p99={:>5} ║",
            processing.mean_us, processing.p50_us, processing.p95_us, processing.p99_us
        );
        info!("╚══════════════════════════════════════════════════════════════╝");
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Processing time statistics
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}
