//! Rendering of stress test reports.

use std::fmt::Write as _;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::{ReportFormat, StressTestConfiguration};
use crate::error::StressResult;
use crate::runner::StressTestReport;

/// Writes a [`StressTestReport`] in the configured format.
#[derive(Debug, Clone)]
pub struct Reporter {
	format: ReportFormat,
	output_path: Option<PathBuf>,
}

impl Reporter {
	/// Creates a reporter.
	pub fn new(format: ReportFormat, output_path: Option<PathBuf>) -> Self {
		Self {
			format,
			output_path,
		}
	}

	/// Creates a reporter from a stress test configuration.
	pub fn from_configuration(configuration: &StressTestConfiguration) -> Self {
		Self::new(
			configuration.report_format,
			configuration.output_path.clone(),
		)
	}

	/// Report format.
	pub fn format(&self) -> ReportFormat {
		self.format
	}

	/// Renders the human-readable text report.
	pub fn render_text(&self, report: &StressTestReport) -> String {
		let config = &report.configuration;
		let metrics = &report.metrics;
		let mut out = String::new();

		// Writing to a String cannot fail.
		let _ = writeln!(out, "=== Seeding Stress Test ===");
		let _ = writeln!(
			out,
			"Dataset: {} ({} records), batch size {}, {} iteration(s), environment {}",
			config.dataset_size,
			config.record_count(),
			config.batch_size,
			config.iterations,
			config.environment
		);
		let _ = writeln!(
			out,
			"Clear between iterations: {}, mutate fraction: {:.2}",
			if config.clear_between_iterations {
				"yes"
			} else {
				"no"
			},
			config.mutate_fraction
		);
		if report.cancelled {
			let _ = writeln!(out, "Run cancelled before all iterations completed");
		}
		let _ = writeln!(out);

		for iteration in &metrics.iterations {
			let _ = writeln!(
				out,
				"Iteration {}: {:.2} ms, {} processed ({} inserted, {} updated, {} unchanged), {} chunks, {:.0} records/sec",
				iteration.iteration + 1,
				iteration.elapsed_ms,
				iteration.records_processed,
				iteration.inserted,
				iteration.updated,
				iteration.unchanged,
				iteration.chunks_committed,
				iteration.records_per_second
			);
			if let Some(bytes) = iteration.memory_bytes {
				let _ = writeln!(out, "  Memory: {}", format_bytes(bytes));
			}
		}

		let latency = &metrics.batch_latency;
		let _ = writeln!(out);
		let _ = writeln!(out, "Total: {:.2} ms", metrics.total_elapsed_ms);
		let _ = writeln!(out, "Throughput: {:.0} records/sec", metrics.records_per_second);
		let _ = writeln!(
			out,
			"Batch latency ({} chunks): min {:.3} ms, avg {:.3} ms, max {:.3} ms, p95 {:.3} ms",
			latency.count, latency.min_ms, latency.avg_ms, latency.max_ms, latency.p95_ms
		);
		if let Some(peak) = metrics.peak_memory_bytes {
			let _ = writeln!(out, "Peak memory: {}", format_bytes(peak));
		}
		out
	}

	/// Renders the report as pretty-printed JSON.
	pub fn render_json(&self, report: &StressTestReport) -> StressResult<String> {
		Ok(serde_json::to_string_pretty(report)?)
	}

	/// Emits the report. Console output goes to `console`.
	///
	/// # Errors
	///
	/// Fails when the report file cannot be written.
	pub fn emit(&self, report: &StressTestReport, console: &mut dyn Write) -> StressResult<()> {
		match self.format {
			ReportFormat::Console => {
				console.write_all(self.render_text(report).as_bytes())?;
			}
			ReportFormat::File => {
				self.write_file(&self.render_text(report))?;
			}
			ReportFormat::Both => {
				let text = self.render_text(report);
				console.write_all(text.as_bytes())?;
				self.write_file(&text)?;
			}
			ReportFormat::Json => {
				let json = self.render_json(report)?;
				if self.output_path.is_some() {
					self.write_file(&json)?;
				} else {
					writeln!(console, "{}", json)?;
				}
			}
		}
		console.flush()?;
		Ok(())
	}

	fn write_file(&self, content: &str) -> StressResult<()> {
		let Some(path) = self.output_path.as_deref() else {
			// Rejected earlier by configuration validation.
			tracing::warn!(format = %self.format, "no report output path configured");
			return Ok(());
		};
		create_parent(path)?;
		std::fs::write(path, content)?;
		tracing::info!(path = %path.display(), "stress report written");
		Ok(())
	}
}

fn create_parent(path: &Path) -> std::io::Result<()> {
	match path.parent() {
		Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
		_ => Ok(()),
	}
}

fn format_bytes(bytes: u64) -> String {
	const MIB: f64 = 1024.0 * 1024.0;
	format!("{:.1} MiB", bytes as f64 / MIB)
}
