// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Bootstrap Module
//!
//! Sits **outside** the domain/application/infrastructure layers and
//! provides everything a process entry point needs that those layers
//! deliberately don't: CLI parsing, bootstrap-phase configuration, process
//! exit codes, platform abstraction (Unix/Windows), signal handling, and
//! graceful shutdown coordination.
//!
//! ## Module structure
//!
//! - `cli` - clap-derived argument parsing and validation
//! - `config` - bootstrap-phase `AppConfig`
//! - `exit_code` - the four-variant `ExitCode` spec §6 calls for
//! - `logger` - thin `tracing` wrapper used before full app wiring exists
//! - `platform` - OS abstraction (Unix/Windows)
//! - `shutdown` - `ShutdownCoordinator` / `CancellationToken`
//! - `signals` - SIGTERM/SIGINT/SIGHUP wiring into `ShutdownCoordinator`

pub mod cli;
pub mod config;
pub mod exit_code;
pub mod logger;
pub mod platform;
pub mod shutdown;
pub mod signals;

pub use cli::{parse_and_validate, ValidatedCli, ValidatedCommand};
pub use exit_code::{map_error_to_exit_code, result_to_exit_code, ExitCode};

/// Parses and validates `std::env::args`. The caller runs the application
/// with the returned `ValidatedCli` and maps its `Result` to a process exit
/// code with [`result_to_exit_code`].
///
/// Clap handles `--help`/`--version` and malformed argv by exiting the
/// process itself; this function only returns on a validation failure this
/// crate itself detects (missing path, out-of-range number).
pub fn bootstrap_cli() -> Result<ValidatedCli, cli::ParseError> {
    cli::parse_and_validate()
}
