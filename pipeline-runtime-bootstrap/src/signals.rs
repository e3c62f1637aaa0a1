// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Signal Handling
//!
//! Wires OS shutdown signals (`SIGTERM`, `SIGINT`, `SIGHUP` on Unix; Ctrl-C
//! on Windows) to a [`ShutdownCoordinator`], so every long-running `run`
//! invocation shuts down the same way whether triggered by an operator's
//! Ctrl-C or a process manager's `SIGTERM`.

use crate::shutdown::ShutdownCoordinator;

/// Spawns a background task that listens for shutdown signals and calls
/// [`ShutdownCoordinator::initiate_shutdown`] the first time one arrives.
///
/// Returns immediately; the listener keeps running for the lifetime of the
/// tokio runtime. A second signal while already shutting down is treated
/// as request to stop waiting, which callers observe by racing their own
/// work against `coordinator.wait_for_shutdown()`.
pub fn install(coordinator: ShutdownCoordinator) {
    tokio::spawn(async move {
        wait_for_any_signal().await;
        tracing::info!("shutdown signal received");
        coordinator.initiate_shutdown();
    });
}

#[cfg(unix)]
async fn wait_for_any_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
    let mut sigint = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");
    let mut sighup = signal(SignalKind::hangup()).expect("failed to install SIGHUP handler");

    tokio::select! {
        _ = sigterm.recv() => tracing::debug!("received SIGTERM"),
        _ = sigint.recv() => tracing::debug!("received SIGINT"),
        _ = sighup.recv() => tracing::debug!("received SIGHUP"),
    }
}

#[cfg(windows)]
async fn wait_for_any_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::debug!("received Ctrl-C");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn install_does_not_trip_coordinator_without_a_signal() {
        let coordinator = ShutdownCoordinator::new(Duration::from_millis(50));
        install(coordinator.clone());

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!coordinator.is_shutting_down());
    }
}
