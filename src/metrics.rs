//! Performance metrics and statistics tracking for the inference pipeline.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

use crate::types::letter_for;

/// Metrics collector shared by the one-shot and live paths
pub struct PipelineMetrics {
    /// One-shot requests answered with a prediction
    pub requests_processed: AtomicU64,
    /// One-shot requests answered with an error payload
    pub request_errors: AtomicU64,
    /// Live frames carrying a hand
    pub live_frames: AtomicU64,
    /// Live ticks without a hand
    pub missed_ticks: AtomicU64,
    /// Live inferences run
    pub live_inferences: AtomicU64,
    /// Live frames rejected (bad payload or shape)
    pub live_errors: AtomicU64,
    /// Processing times (in microseconds)
    processing_times: RwLock<Vec<u64>>,
    /// Predictions per class index
    class_counts: RwLock<BTreeMap<usize, u64>>,
    /// Confidence distribution buckets
    confidence_buckets: RwLock<[u64; 10]>,
    /// Start time for rate calculation
    start_time: Instant,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self {
            requests_processed: AtomicU64::new(0),
            request_errors: AtomicU64::new(0),
            live_frames: AtomicU64::new(0),
            missed_ticks: AtomicU64::new(0),
            live_inferences: AtomicU64::new(0),
            live_errors: AtomicU64::new(0),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            class_counts: RwLock::new(BTreeMap::new()),
            confidence_buckets: RwLock::new([0; 10]),
            start_time: Instant::now(),
        }
    }

    /// Record a successful one-shot prediction
    pub fn record_prediction(&self, processing_time: Duration, index: usize, confidence: f32) {
        self.requests_processed.fetch_add(1, Ordering::Relaxed);
        self.record_timing(processing_time);
        self.record_class(index, confidence);
    }

    /// Record a one-shot request answered with an error payload
    pub fn record_request_error(&self) {
        self.request_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a live tick; `hand` is false when no landmarks were sent
    pub fn record_live_tick(&self, hand: bool) {
        if hand {
            self.live_frames.fetch_add(1, Ordering::Relaxed);
        } else {
            self.missed_ticks.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a live inference with the per-frame class
    pub fn record_live_inference(&self, processing_time: Duration, index: usize, confidence: f32) {
        self.live_inferences.fetch_add(1, Ordering::Relaxed);
        self.record_timing(processing_time);
        self.record_class(index, confidence);
    }

    pub fn record_live_error(&self) {
        self.live_errors.fetch_add(1, Ordering::Relaxed);
    }

    fn record_timing(&self, processing_time: Duration) {
        if let Ok(mut times) = self.processing_times.write() {
            times.push(processing_time.as_micros() as u64);
            // Keep only last 10000 for memory efficiency
            if times.len() > 10000 {
                times.drain(0..5000);
            }
        }
    }

    fn record_class(&self, index: usize, confidence: f32) {
        if let Ok(mut counts) = self.class_counts.write() {
            *counts.entry(index).or_insert(0) += 1;
        }

        let bucket = (confidence.clamp(0.0, 1.0) * 10.0).min(9.0) as usize;
        if let Ok(mut buckets) = self.confidence_buckets.write() {
            buckets[bucket] += 1;
        }
    }

    /// Get processing time statistics
    pub fn get_processing_stats(&self) -> ProcessingStats {
        let times = match self.processing_times.read() {
            Ok(times) => times,
            Err(_) => return ProcessingStats::default(),
        };
        if times.is_empty() {
            return ProcessingStats::default();
        }

        let mut sorted: Vec<u64> = times.clone();
        sorted.sort_unstable();

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();

        ProcessingStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: sorted[(count as f64 * 0.95) as usize],
            p99_us: sorted[(count as f64 * 0.99) as usize],
            max_us: *sorted.last().unwrap_or(&0),
        }
    }

    /// Predictions per class index
    pub fn get_class_counts(&self) -> BTreeMap<usize, u64> {
        self.class_counts
            .read()
            .map(|c| c.clone())
            .unwrap_or_default()
    }

    pub fn get_confidence_distribution(&self) -> [u64; 10] {
        self.confidence_buckets.read().map(|b| *b).unwrap_or([0; 10])
    }

    /// Inferences (one-shot and live) per second since start
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        let total = self.requests_processed.load(Ordering::Relaxed)
            + self.live_inferences.load(Ordering::Relaxed);
        if elapsed > 0.0 {
            total as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let requests = self.requests_processed.load(Ordering::Relaxed);
        let request_errors = self.request_errors.load(Ordering::Relaxed);
        let live_frames = self.live_frames.load(Ordering::Relaxed);
        let missed = self.missed_ticks.load(Ordering::Relaxed);
        let inferences = self.live_inferences.load(Ordering::Relaxed);
        let live_errors = self.live_errors.load(Ordering::Relaxed);

        let processing = self.get_processing_stats();
        let throughput = self.get_throughput();

        info!("=== fingerspelling pipeline metrics ===");
        info!(
            "One-shot: {} predictions, {} errors | Throughput: {:.1} inferences/s",
            requests, request_errors, throughput
        );
        info!(
            "Live: {} frames, {} missed ticks, {} inferences, {} rejected",
            live_frames, missed, inferences, live_errors
        );
        info!(
            "Processing time (us): mean={} p50={} p95={} p99={} max={}",
            processing.mean_us,
            processing.p50_us,
            processing.p95_us,
            processing.p99_us,
            processing.max_us
        );

        let counts = self.get_class_counts();
        if !counts.is_empty() {
            let letters: Vec<String> = counts
                .iter()
                .map(|(index, count)| format!("{:?}={}", letter_for(*index), count))
                .collect();
            info!("Letters: {}", letters.join(" "));
        }

        let dist = self.get_confidence_distribution();
        let total: u64 = dist.iter().sum();
        if total > 0 {
            for (i, &count) in dist.iter().enumerate() {
                let pct = (count as f64 / total as f64) * 100.0;
                info!(
                    "  confidence {:.1}-{:.1}: {:>6} ({:>5.1}%) {}",
                    i as f64 / 10.0,
                    (i + 1) as f64 / 10.0,
                    count,
                    pct,
                    "#".repeat(((pct / 2.0) as usize).min(50))
                );
            }
        }
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

/// Periodic metrics summary printer
pub struct MetricsReporter {
    metrics: Arc<PipelineMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<PipelineMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}
