// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Cooperative cancellation port. The domain names the capability, never the
//! mechanism: `pipeline-runtime-bootstrap` owns the actual
//! `Arc<AtomicBool>` + `tokio::sync::Notify` pair and hands callers a
//! [`CancellationSignal`] trait object.

/// Checked at the cancellation checkpoints named in spec §5: before each
/// extractor page fetch, before each loader record, and between steps.
pub trait CancellationSignal: Send + Sync {
    fn is_cancelled(&self) -> bool;
}

/// Never cancelled. Useful for tests and one-shot CLI invocations that run
/// to completion without a shutdown signal.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverCancelled;

impl CancellationSignal for NeverCancelled {
    fn is_cancelled(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_cancelled_is_never_cancelled() {
        assert!(!NeverCancelled.is_cancelled());
    }
}
