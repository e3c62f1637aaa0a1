// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Prometheus metrics for run/step/record-level observability (spec §5
//! ambient stack): run counters by outcome, step duration histograms, and
//! record outcome counters, scraped over a small HTTP endpoint.

use pipeline_runtime_domain::error::PipelineError;
use prometheus::{Histogram, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::{debug, error, info};

#[derive(Clone)]
pub struct PipelineMetrics {
    registry: Arc<Registry>,
    runs_total: IntCounterVec,
    run_duration: Histogram,
    step_duration: HistogramVec,
    records_total: IntCounterVec,
}

impl PipelineMetrics {
    pub fn new() -> Result<Self, PipelineError> {
        let registry = Registry::new();

        let runs_total = IntCounterVec::new(
            Opts::new("runs_total", "Total pipeline runs by terminal status").namespace("pipeline_runtime"),
            &["status"],
        )
        .map_err(|e| PipelineError::InfrastructureFailure(format!("creating runs_total metric: {e}")))?;

        let run_duration = Histogram::with_opts(
            HistogramOpts::new("run_duration_seconds", "Wall-clock duration of a pipeline run")
                .namespace("pipeline_runtime")
                .buckets(vec![0.1, 0.5, 1.0, 5.0, 30.0, 60.0, 300.0, 1800.0]),
        )
        .map_err(|e| PipelineError::InfrastructureFailure(format!("creating run_duration metric: {e}")))?;

        let step_duration = HistogramVec::new(
            HistogramOpts::new("step_duration_seconds", "Duration of a single step execution").namespace("pipeline_runtime"),
            &["step_key", "step_type"],
        )
        .map_err(|e| PipelineError::InfrastructureFailure(format!("creating step_duration metric: {e}")))?;

        let records_total = IntCounterVec::new(
            Opts::new("records_total", "Records processed, labeled by outcome").namespace("pipeline_runtime"),
            &["outcome"],
        )
        .map_err(|e| PipelineError::InfrastructureFailure(format!("creating records_total metric: {e}")))?;

        registry
            .register(Box::new(runs_total.clone()))
            .map_err(|e| PipelineError::InfrastructureFailure(format!("registering runs_total: {e}")))?;
        registry
            .register(Box::new(run_duration.clone()))
            .map_err(|e| PipelineError::InfrastructureFailure(format!("registering run_duration: {e}")))?;
        registry
            .register(Box::new(step_duration.clone()))
            .map_err(|e| PipelineError::InfrastructureFailure(format!("registering step_duration: {e}")))?;
        registry
            .register(Box::new(records_total.clone()))
            .map_err(|e| PipelineError::InfrastructureFailure(format!("registering records_total: {e}")))?;

        Ok(Self {
            registry: Arc::new(registry),
            runs_total,
            run_duration,
            step_duration,
            records_total,
        })
    }

    pub fn record_run_completion(&self, status: &str, duration_secs: f64) {
        self.runs_total.with_label_values(&[status]).inc();
        self.run_duration.observe(duration_secs);
    }

    pub fn record_step_duration(&self, step_key: &str, step_type: &str, duration_secs: f64) {
        self.step_duration.with_label_values(&[step_key, step_type]).observe(duration_secs);
    }

    pub fn record_outcomes(&self, succeeded: u64, failed: u64, skipped: u64) {
        self.records_total.with_label_values(&["succeeded"]).inc_by(succeeded);
        self.records_total.with_label_values(&["failed"]).inc_by(failed);
        self.records_total.with_label_values(&["skipped"]).inc_by(skipped);
    }

    /// Renders the current metric snapshot in the Prometheus text exposition
    /// format.
    pub fn gather(&self) -> Result<String, PipelineError> {
        let encoder = prometheus::TextEncoder::new();
        encoder
            .encode_to_string(&self.registry.gather())
            .map_err(|e| PipelineError::InfrastructureFailure(format!("encoding metrics: {e}")))
    }
}

/// Serves `/metrics` and `/health` on `addr` until the process exits. A bare
/// `tokio::net::TcpListener` loop, matching the teacher's metrics endpoint —
/// no web framework dependency for two routes.
pub async fn serve(metrics: Arc<PipelineMetrics>, addr: &str) -> Result<(), PipelineError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| PipelineError::InfrastructureFailure(format!("binding metrics endpoint on {addr}: {e}")))?;

    info!("metrics endpoint listening on http://{}/metrics", addr);

    loop {
        match listener.accept().await {
            Ok((mut stream, _)) => {
                let metrics = metrics.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_request(&mut stream, &metrics).await {
                        error!("error handling metrics request: {}", e);
                    }
                });
            }
            Err(e) => error!("error accepting metrics connection: {}", e),
        }
    }
}

async fn handle_request(stream: &mut tokio::net::TcpStream, metrics: &PipelineMetrics) -> std::io::Result<()> {
    let mut buffer = [0u8; 1024];
    let n = stream.read(&mut buffer).await?;
    let request = String::from_utf8_lossy(&buffer[..n]);
    debug!("metrics request: {}", request.lines().next().unwrap_or(""));

    if request.starts_with("GET /metrics") {
        match metrics.gather() {
            Ok(body) => {
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: text/plain; version=0.0.4; charset=utf-8\r\nContent-Length: {}\r\n\r\n{}",
                    body.len(),
                    body
                );
                stream.write_all(response.as_bytes()).await?;
            }
            Err(e) => {
                let body = format!("error generating metrics: {e}");
                let response = format!(
                    "HTTP/1.1 500 Internal Server Error\r\nContent-Type: text/plain\r\nContent-Length: {}\r\n\r\n{}",
                    body.len(),
                    body
                );
                stream.write_all(response.as_bytes()).await?;
            }
        }
    } else if request.starts_with("GET /health") {
        stream.write_all(b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 2\r\n\r\nOK").await?;
    } else {
        stream.write_all(b"HTTP/1.1 404 Not Found\r\nContent-Type: text/plain\r\nContent-Length: 9\r\n\r\nNot Found").await?;
    }

    stream.flush().await
}
