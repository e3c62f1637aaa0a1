// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Config Sync (spec §4.6): merges code-first configuration — inline
//! options plus an optional `.yaml`/`.yml`/`.json` file — into the store
//! with idempotent upserts of secrets, connections, and pipelines. Secret
//! provider `env` resolves its value by reading the named environment
//! variable at resolve time, not at sync time, so a secret synced before
//! its variable is exported still resolves correctly later. Connection
//! settings carrying `${NAME}` substrings are substituted recursively from
//! the environment.

use async_trait::async_trait;
use pipeline_runtime_domain::entities::PipelineDefinition;
use pipeline_runtime_domain::error::PipelineError;
use pipeline_runtime_domain::repositories::PipelineDefinitionRepository;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecretProvider {
    Inline,
    Env,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretConfig {
    pub code: String,
    pub provider: SecretProvider,
    /// The literal value (`Inline`) or the environment variable name to
    /// read from (`Env`).
    pub value: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub code: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub settings: serde_json::Value,
}

/// The on-disk shape of the code-first config file named in spec §6.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub pipelines: Vec<PipelineDefinition>,
    #[serde(default)]
    pub secrets: Vec<SecretConfig>,
    #[serde(default)]
    pub connections: Vec<ConnectionConfig>,
}

impl ConfigFile {
    /// Parses a config file by its extension: `.yaml`/`.yml` via
    /// `serde_yaml`, anything else as JSON.
    pub fn parse(path: &std::path::Path, contents: &str) -> Result<Self, PipelineError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => {
                serde_yaml::from_str(contents).map_err(|e| PipelineError::InvalidConfiguration(format!("invalid config file '{}': {}", path.display(), e)))
            }
            _ => serde_json::from_str(contents).map_err(PipelineError::from),
        }
    }
}

/// Store of synced secrets, queried by `resolve` to get the current value
/// (re-reading the environment for `Env`-provider secrets on every call).
#[async_trait]
pub trait SecretRepository: Send + Sync {
    async fn upsert(&self, secret: SecretConfig) -> Result<(), PipelineError>;
    async fn resolve(&self, code: &str) -> Result<Option<String>, PipelineError>;
}

/// Store of synced connections, queried by `resolve_settings` to get the
/// settings object with `${NAME}` placeholders substituted.
#[async_trait]
pub trait ConnectionRepository: Send + Sync {
    async fn upsert(&self, connection: ConnectionConfig) -> Result<(), PipelineError>;
    async fn resolve_settings(&self, code: &str) -> Result<Option<serde_json::Value>, PipelineError>;
}

#[derive(Default)]
pub struct InMemorySecretRepository {
    secrets: tokio::sync::RwLock<HashMap<String, SecretConfig>>,
}

impl InMemorySecretRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SecretRepository for InMemorySecretRepository {
    async fn upsert(&self, secret: SecretConfig) -> Result<(), PipelineError> {
        self.secrets.write().await.insert(secret.code.clone(), secret);
        Ok(())
    }

    async fn resolve(&self, code: &str) -> Result<Option<String>, PipelineError> {
        let secrets = self.secrets.read().await;
        let Some(secret) = secrets.get(code) else {
            return Ok(None);
        };
        match secret.provider {
            SecretProvider::Inline => Ok(Some(secret.value.clone())),
            SecretProvider::Env => Ok(env::var(&secret.value).ok()),
        }
    }
}

#[derive(Default)]
pub struct InMemoryConnectionRepository {
    connections: tokio::sync::RwLock<HashMap<String, ConnectionConfig>>,
}

impl InMemoryConnectionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConnectionRepository for InMemoryConnectionRepository {
    async fn upsert(&self, connection: ConnectionConfig) -> Result<(), PipelineError> {
        self.connections.write().await.insert(connection.code.clone(), connection);
        Ok(())
    }

    async fn resolve_settings(&self, code: &str) -> Result<Option<serde_json::Value>, PipelineError> {
        let connections = self.connections.read().await;
        Ok(connections.get(code).map(|c| substitute_env(c.settings.clone())))
    }
}

/// Recursively replaces every `${NAME}` substring found in string values
/// with the value of the `NAME` environment variable, leaving it
/// untouched if the variable isn't set.
fn substitute_env(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::String(s) => serde_json::Value::String(substitute_env_str(&s)),
        serde_json::Value::Array(items) => serde_json::Value::Array(items.into_iter().map(substitute_env).collect()),
        serde_json::Value::Object(map) => {
            serde_json::Value::Object(map.into_iter().map(|(k, v)| (k, substitute_env(v))).collect())
        }
        other => other,
    }
}

fn substitute_env_str(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find("${") {
        output.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let name = &after[..end];
                match env::var(name) {
                    Ok(value) => output.push_str(&value),
                    Err(_) => output.push_str(&rest[start..start + 2 + end + 1]),
                }
                rest = &after[end + 1..];
            }
            None => {
                output.push_str(&rest[start..]);
                rest = "";
                break;
            }
        }
    }
    output.push_str(rest);
    output
}

/// Merges an optional inline `ConfigFile` with an optional file-loaded
/// one (inline wins on conflicting codes, per spec §4.6) and upserts the
/// result into the three repositories.
pub struct ConfigSyncService {
    pipelines: Arc<dyn PipelineDefinitionRepository>,
    secrets: Arc<dyn SecretRepository>,
    connections: Arc<dyn ConnectionRepository>,
}

#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub pipelines_synced: usize,
    pub secrets_synced: usize,
    pub connections_synced: usize,
}

impl ConfigSyncService {
    pub fn new(pipelines: Arc<dyn PipelineDefinitionRepository>, secrets: Arc<dyn SecretRepository>, connections: Arc<dyn ConnectionRepository>) -> Self {
        Self { pipelines, secrets, connections }
    }

    pub async fn sync(&self, inline: Option<ConfigFile>, from_file: Option<ConfigFile>, dry_run: bool) -> Result<SyncReport, PipelineError> {
        let merged = merge(inline, from_file);
        let mut report = SyncReport::default();

        if dry_run {
            report.pipelines_synced = merged.pipelines.len();
            report.secrets_synced = merged.secrets.len();
            report.connections_synced = merged.connections.len();
            return Ok(report);
        }

        for pipeline in merged.pipelines {
            self.pipelines.save(&pipeline).await?;
            report.pipelines_synced += 1;
        }
        for secret in merged.secrets {
            self.secrets.upsert(secret).await?;
            report.secrets_synced += 1;
        }
        for connection in merged.connections {
            self.connections.upsert(connection).await?;
            report.connections_synced += 1;
        }

        Ok(report)
    }
}

fn merge(inline: Option<ConfigFile>, from_file: Option<ConfigFile>) -> ConfigFile {
    let mut merged = from_file.unwrap_or_default();
    let Some(inline) = inline else { return merged };

    upsert_by(&mut merged.pipelines, inline.pipelines, |p| p.code.clone());
    upsert_by(&mut merged.secrets, inline.secrets, |s| s.code.clone());
    upsert_by(&mut merged.connections, inline.connections, |c| c.code.clone());
    merged
}

fn upsert_by<T>(base: &mut Vec<T>, overrides: Vec<T>, key: impl Fn(&T) -> String) {
    for item in overrides {
        let code = key(&item);
        if let Some(existing) = base.iter_mut().find(|b| key(b) == code) {
            *existing = item;
        } else {
            base.push(item);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline_runtime_domain::entities::pipeline_definition::{ContextOverride, ErrorHandlingPolicy, PipelineStatus, CheckpointingPolicy, ParallelExecutionPolicy, HookBindings};
    use pipeline_runtime_domain::value_objects::PipelineId;

    fn pipeline(code: &str) -> PipelineDefinition {
        PipelineDefinition {
            id: PipelineId::new(),
            code: code.to_string(),
            name: code.to_string(),
            enabled: true,
            status: PipelineStatus::Draft,
            version: 1,
            published_at: None,
            steps: Vec::new(),
            triggers: Vec::new(),
            context: ContextOverride::default(),
            error_handling: ErrorHandlingPolicy::default(),
            checkpointing: CheckpointingPolicy::default(),
            parallel_execution: ParallelExecutionPolicy::default(),
            hooks: HookBindings::default(),
        }
    }

    #[test]
    fn substitute_env_replaces_placeholder_recursively() {
        std::env::set_var("PIPELINE_RUNTIME_TEST_VAR", "resolved");
        let input = serde_json::json!({"host": "${PIPELINE_RUNTIME_TEST_VAR}", "nested": {"v": "${PIPELINE_RUNTIME_TEST_VAR}"}});
        let output = substitute_env(input);
        assert_eq!(output["host"], "resolved");
        assert_eq!(output["nested"]["v"], "resolved");
        std::env::remove_var("PIPELINE_RUNTIME_TEST_VAR");
    }

    #[test]
    fn substitute_env_leaves_unknown_variables_untouched() {
        let input = serde_json::json!({"host": "${PIPELINE_RUNTIME_DOES_NOT_EXIST}"});
        let output = substitute_env(input);
        assert_eq!(output["host"], "${PIPELINE_RUNTIME_DOES_NOT_EXIST}");
    }

    #[test]
    fn inline_config_wins_over_file_config_on_conflicting_codes() {
        let file = ConfigFile { pipelines: vec![pipeline("p1")], ..Default::default() };
        let mut inline_pipeline = pipeline("p1");
        inline_pipeline.name = "overridden".to_string();
        let inline = ConfigFile { pipelines: vec![inline_pipeline], ..Default::default() };

        let merged = merge(Some(inline), Some(file));
        assert_eq!(merged.pipelines.len(), 1);
        assert_eq!(merged.pipelines[0].name, "overridden");
    }

    #[tokio::test]
    async fn env_secret_resolves_by_reading_the_named_variable() {
        std::env::set_var("PIPELINE_RUNTIME_TEST_SECRET", "sekret");
        let repo = InMemorySecretRepository::new();
        repo.upsert(SecretConfig {
            code: "api-key".into(),
            provider: SecretProvider::Env,
            value: "PIPELINE_RUNTIME_TEST_SECRET".into(),
            metadata: serde_json::Value::Null,
        })
        .await
        .unwrap();

        let resolved = repo.resolve("api-key").await.unwrap();
        assert_eq!(resolved, Some("sekret".to_string()));
        std::env::remove_var("PIPELINE_RUNTIME_TEST_SECRET");
    }

    #[derive(Default)]
    struct InMemoryDefinitionRepository {
        definitions: std::sync::Mutex<HashMap<String, PipelineDefinition>>,
    }

    #[async_trait]
    impl PipelineDefinitionRepository for InMemoryDefinitionRepository {
        async fn save(&self, definition: &PipelineDefinition) -> Result<(), PipelineError> {
            self.definitions.lock().unwrap().insert(definition.code.clone(), definition.clone());
            Ok(())
        }
        async fn find_by_id(&self, id: &PipelineId) -> Result<Option<PipelineDefinition>, PipelineError> {
            Ok(self.definitions.lock().unwrap().values().find(|d| &d.id == id).cloned())
        }
        async fn find_by_code(&self, code: &str) -> Result<Option<PipelineDefinition>, PipelineError> {
            Ok(self.definitions.lock().unwrap().get(code).cloned())
        }
        async fn list(&self) -> Result<Vec<PipelineDefinition>, PipelineError> {
            Ok(self.definitions.lock().unwrap().values().cloned().collect())
        }
        async fn delete(&self, id: &PipelineId) -> Result<(), PipelineError> {
            self.definitions.lock().unwrap().retain(|_, d| &d.id != id);
            Ok(())
        }
    }

    #[tokio::test]
    async fn sync_upserts_every_section_and_reports_counts() {
        let pipelines: Arc<dyn PipelineDefinitionRepository> = Arc::new(InMemoryDefinitionRepository::default());
        let secrets: Arc<dyn SecretRepository> = Arc::new(InMemorySecretRepository::new());
        let connections: Arc<dyn ConnectionRepository> = Arc::new(InMemoryConnectionRepository::new());
        let service = ConfigSyncService::new(pipelines, secrets, connections);

        let file = ConfigFile { pipelines: vec![pipeline("p1")], ..Default::default() };
        let report = service.sync(None, Some(file), false).await.unwrap();
        assert_eq!(report.pipelines_synced, 1);
    }
}
