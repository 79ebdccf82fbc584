//! Metrics collection for stress runs.
//!
//! [`MetricsCollector`] is attached to the orchestrator as its apply observer
//! and receives one sample per committed chunk. The runner closes every
//! iteration with [`MetricsCollector::finish_iteration`].

use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use seedwork_seeding::{ApplyObserver, ChunkTiming, RunSummary};
use serde::{Deserialize, Serialize};

/// Latency distribution of committed chunks, in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LatencyStats {
	/// Number of samples.
	pub count: usize,
	/// Fastest sample.
	pub min_ms: f64,
	/// Mean of all samples.
	pub avg_ms: f64,
	/// Slowest sample.
	pub max_ms: f64,
	/// 95th percentile, nearest rank.
	pub p95_ms: f64,
}

impl LatencyStats {
	/// Computes the distribution of `samples`. All zero when empty.
	pub fn from_durations(samples: &[Duration]) -> Self {
		if samples.is_empty() {
			return Self::default();
		}

		let mut sorted: Vec<f64> = samples.iter().map(|d| d.as_secs_f64() * 1000.0).collect();
		sorted.sort_by(|a, b| a.total_cmp(b));

		let count = sorted.len();
		let rank = ((count as f64) * 0.95).ceil() as usize;
		Self {
			count,
			min_ms: sorted[0],
			avg_ms: sorted.iter().sum::<f64>() / count as f64,
			max_ms: sorted[count - 1],
			p95_ms: sorted[rank.clamp(1, count) - 1],
		}
	}
}

/// Metrics of one seeding iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationMetrics {
	/// Zero-based iteration index.
	pub iteration: usize,
	/// Wall-clock time of the seeding run.
	pub elapsed_ms: f64,
	/// Desired records reconciled.
	pub records_processed: usize,
	/// Records inserted.
	pub inserted: usize,
	/// Records updated.
	pub updated: usize,
	/// Records already matching.
	pub unchanged: usize,
	/// Chunks committed.
	pub chunks_committed: usize,
	/// Reconciled records per second.
	pub records_per_second: f64,
	/// Chunk latency within this iteration.
	pub batch_latency: LatencyStats,
	/// Resident memory after the iteration, when sampled.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub memory_bytes: Option<u64>,
}

/// Aggregated stress run metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressTestMetrics {
	/// When collection started.
	pub started_at: DateTime<Utc>,
	/// When collection finished.
	pub completed_at: DateTime<Utc>,
	/// Wall-clock time of the whole stress run.
	pub total_elapsed_ms: f64,
	/// Per-iteration metrics, in order.
	pub iterations: Vec<IterationMetrics>,
	/// Chunk latency across every iteration.
	pub batch_latency: LatencyStats,
	/// Reconciled records per second across every iteration.
	pub records_per_second: f64,
	/// Highest sampled resident memory.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub peak_memory_bytes: Option<u64>,
}

impl StressTestMetrics {
	/// Desired records reconciled across every iteration.
	pub fn records_processed(&self) -> usize {
		self.iterations.iter().map(|i| i.records_processed).sum()
	}

	/// Chunks committed across every iteration.
	pub fn chunks_committed(&self) -> usize {
		self.iterations.iter().map(|i| i.chunks_committed).sum()
	}
}

#[derive(Debug, Default)]
struct CollectorState {
	pending: Vec<Duration>,
	all_chunks: Vec<Duration>,
	iterations: Vec<IterationMetrics>,
}

/// Collects chunk timings and iteration results.
#[derive(Debug)]
pub struct MetricsCollector {
	sample_memory: bool,
	started_at: DateTime<Utc>,
	state: Mutex<CollectorState>,
}

impl MetricsCollector {
	/// Creates a collector. Memory is sampled after each iteration when
	/// `sample_memory` is set.
	pub fn new(sample_memory: bool) -> Self {
		Self {
			sample_memory,
			started_at: Utc::now(),
			state: Mutex::new(CollectorState::default()),
		}
	}

	/// Records a committed chunk.
	pub fn record_chunk(&self, duration: Duration) {
		self.state.lock().pending.push(duration);
	}

	/// Closes an iteration, attributing every chunk recorded since the
	/// previous call to it.
	pub fn finish_iteration(
		&self,
		iteration: usize,
		elapsed: Duration,
		summary: &RunSummary,
	) -> IterationMetrics {
		let counts = summary.total_committed();
		let records_processed = counts.total();
		let memory_bytes = if self.sample_memory {
			current_process_memory()
		} else {
			None
		};

		let mut state = self.state.lock();
		let chunks = std::mem::take(&mut state.pending);
		let metrics = IterationMetrics {
			iteration,
			elapsed_ms: elapsed.as_secs_f64() * 1000.0,
			records_processed,
			inserted: counts.inserted,
			updated: counts.updated,
			unchanged: counts.unchanged,
			chunks_committed: summary.total_commits(),
			records_per_second: per_second(records_processed, elapsed),
			batch_latency: LatencyStats::from_durations(&chunks),
			memory_bytes,
		};
		state.all_chunks.extend(chunks);
		state.iterations.push(metrics.clone());

		tracing::debug!(
			iteration,
			records = records_processed,
			chunks = metrics.chunks_committed,
			rps = metrics.records_per_second,
			"iteration metrics recorded"
		);
		metrics
	}

	/// Iterations closed so far.
	pub fn iterations(&self) -> usize {
		self.state.lock().iterations.len()
	}

	/// Aggregates everything collected.
	pub fn finish(&self, total_elapsed: Duration) -> StressTestMetrics {
		let state = self.state.lock();
		let records: usize = state.iterations.iter().map(|i| i.records_processed).sum();
		let seeding_time: Duration = state
			.iterations
			.iter()
			.map(|i| Duration::from_secs_f64(i.elapsed_ms / 1000.0))
			.sum();
		let mut all_chunks = state.all_chunks.clone();
		all_chunks.extend(state.pending.iter().copied());

		StressTestMetrics {
			started_at: self.started_at,
			completed_at: Utc::now(),
			total_elapsed_ms: total_elapsed.as_secs_f64() * 1000.0,
			iterations: state.iterations.clone(),
			batch_latency: LatencyStats::from_durations(&all_chunks),
			records_per_second: per_second(records, seeding_time),
			peak_memory_bytes: state.iterations.iter().filter_map(|i| i.memory_bytes).max(),
		}
	}
}

impl ApplyObserver for MetricsCollector {
	fn on_chunk_committed(&self, _seeder: &str, timing: &ChunkTiming) {
		self.record_chunk(timing.duration);
	}
}

fn per_second(records: usize, elapsed: Duration) -> f64 {
	let secs = elapsed.as_secs_f64();
	if secs > 0.0 {
		records as f64 / secs
	} else {
		0.0
	}
}

/// Resident memory of the current process in bytes.
pub fn current_process_memory() -> Option<u64> {
	let pid = sysinfo::get_current_pid().ok()?;
	let system = sysinfo::System::new_all();
	system.process(pid).map(|process| process.memory())
}
