//! Performance metrics and statistics tracking for the detection pipeline.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::info;

/// Metrics collector for pipeline performance
pub struct PipelineMetrics {
    /// Total records classified
    pub records_processed: AtomicU64,
    /// Records classified as attacks
    pub attacks_flagged: AtomicU64,
    /// Processing times (in microseconds)
    processing_times: RwLock<Vec<u64>>,
    /// Confidence distribution buckets
    confidence_buckets: RwLock<[u64; 10]>,
    /// Start time for rate calculation
    start_time: Instant,
}

impl PipelineMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            records_processed: AtomicU64::new(0),
            attacks_flagged: AtomicU64::new(0),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            confidence_buckets: RwLock::new([0; 10]),
            start_time: Instant::now(),
        }
    }

    /// Record one classified record
    pub fn record_detection(
        &self,
        processing_time: Duration,
        is_attack: bool,
        confidence: Option<f64>,
    ) {
        self.records_processed.fetch_add(1, Ordering::Relaxed);
        if is_attack {
            self.attacks_flagged.fetch_add(1, Ordering::Relaxed);
        }

        // Record processing time
        if let Ok(mut times) = self.processing_times.write() {
            times.push(processing_time.as_micros() as u64);
            // Keep only last 10000 for memory efficiency
            if times.len() > 10000 {
                times.drain(0..5000);
            }
        }

        // Record confidence bucket; label-only classifiers report none
        if let Some(confidence) = confidence {
            let bucket = (confidence * 10.0).min(9.0) as usize;
            if let Ok(mut buckets) = self.confidence_buckets.write() {
                buckets[bucket] += 1;
            }
        }
    }

    /// Get processing time statistics
    pub fn get_processing_stats(&self) -> ProcessingStats {
        let times = self.processing_times.read().unwrap();
        if times.is_empty() {
            return ProcessingStats::default();
        }

        let mut sorted: Vec<u64> = times.clone();
        sorted.sort();

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

    /// Get current throughput (records per second)
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.records_processed.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Get confidence distribution
    pub fn get_confidence_distribution(&self) -> [u64; 10] {
        *self.confidence_buckets.read().unwrap()
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let record_count = self.records_processed.load(Ordering::Relaxed);
        let attack_count = self.attacks_flagged.load(Ordering::Relaxed);
        let attack_rate = if record_count > 0 {
            (attack_count as f64 / record_count as f64) * 100.0
        } else {
            0.0
        };

        let processing = self.get_processing_stats();
        let throughput = self.get_throughput();
        let confidence_dist = self.get_confidence_distribution();

        info!("╔══════════════════════════════════════════════════════════════╗");
        info!("║        INTRUSION DETECTION PIPELINE - METRICS SUMMARY        ║");
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Records Processed: {:>8}  │  Throughput: {:>6.1} rec/s     ║",
            record_count, throughput
        );
        info!(
            "║ Attacks Flagged:   {:>8}  │  Attack Rate: {:>6.1}%         ║",
            attack_count, attack_rate
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Processing Time (μs): mean={:>5} p50={:>5} p95={:>5} p99={:>5} ║",
            processing.mean_us, processing.p50_us, processing.p95_us, processing.p99_us
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Confidence Distribution:                                     ║");
        let total: u64 = confidence_dist.iter().sum();
        for (i, &count) in confidence_dist.iter().enumerate() {
            let pct = if total > 0 {
                (count as f64 / total as f64) * 100.0
            } else {
                0.0
            };
            let bar_len = (pct / 2.0) as usize;
            let bar: String = "█".repeat(bar_len.min(20));
            info!(
                "║   {:.1}-{:.1}: {:>6} ({:>5.1}%) {}",
                i as f64 / 10.0,
                (i + 1) as f64 / 10.0,
                count,
                pct,
                bar
            );
        }
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

/// Real-time metrics reporter that prints periodic summaries
pub struct MetricsReporter {
    metrics: std::sync::Arc<PipelineMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: std::sync::Arc<PipelineMetrics>, interval_secs: u64) -> Self {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_recording() {
        let metrics = PipelineMetrics::new();

        metrics.record_detection(Duration::from_micros(100), false, Some(0.85));
        metrics.record_detection(Duration::from_micros(200), true, Some(0.8));
        metrics.record_detection(Duration::from_micros(150), true, None);

        assert_eq!(metrics.records_processed.load(Ordering::Relaxed), 3);
        assert_eq!(metrics.attacks_flagged.load(Ordering::Relaxed), 2);

        // Only the two confident detections land in buckets
        let distribution = metrics.get_confidence_distribution();
        assert_eq!(distribution.iter().sum::<u64>(), 2);
        assert_eq!(distribution[8], 2);
    }

    #[test]
    fn test_full_confidence_lands_in_the_top_bucket() {
        let metrics = PipelineMetrics::new();
        metrics.record_detection(Duration::from_micros(50), true, Some(1.0));

        let distribution = metrics.get_confidence_distribution();
        assert_eq!(distribution[9], 1);
    }

    #[test]
    fn test_processing_stats_percentiles() {
        let metrics = PipelineMetrics::new();
        for us in 1..=100u64 {
            metrics.record_detection(Duration::from_micros(us), false, Some(0.5));
        }

        let stats = metrics.get_processing_stats();
        assert_eq!(stats.count, 100);
        assert_eq!(stats.p50_us, 51);
        assert_eq!(stats.p95_us, 96);
        assert_eq!(stats.max_us, 100);
        assert!(metrics.get_throughput() > 0.0);
    }
}
