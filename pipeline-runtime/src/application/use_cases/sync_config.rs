// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Sync Config Use Case
//!
//! Backs the `sync-config` CLI subcommand: loads a [`ConfigFile`] and
//! upserts its pipelines, secrets, and connections through
//! [`ConfigSyncService`].

use crate::application::config_sync::{ConfigFile, ConfigSyncService, SyncReport};
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub struct SyncConfigUseCase {
    config_sync: Arc<ConfigSyncService>,
}

impl SyncConfigUseCase {
    pub fn new(config_sync: Arc<ConfigSyncService>) -> Self {
        Self { config_sync }
    }

    pub async fn execute(&self, config_path: &Path, dry_run: bool) -> Result<SyncReport> {
        let contents = std::fs::read_to_string(config_path)
            .with_context(|| format!("failed to read config file '{}'", config_path.display()))?;
        let file = ConfigFile::parse(config_path, &contents)?;

        info!(path = %config_path.display(), dry_run, "syncing config file");
        let report = self.config_sync.sync(None, Some(file), dry_run).await?;

        println!(
            "{}synced {} pipeline(s), {} secret(s), {} connection(s)",
            if dry_run { "would have " } else { "" },
            report.pipelines_synced,
            report.secrets_synced,
            report.connections_synced
        );

        Ok(report)
    }
}
