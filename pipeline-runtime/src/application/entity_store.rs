// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Reference [`EntityService`] implementation. The concrete domain entity
//! store is explicitly an external collaborator (spec §1: "the loaders
//! depend only on an abstract EntityService capability") — this is a
//! process-local stand-in for wiring a binary end to end, not the
//! production entity store, mirroring the in-memory `SecretRepository`/
//! `ConnectionRepository` reference implementations in `config_sync`.

use async_trait::async_trait;
use pipeline_runtime_domain::error::PipelineError;
use pipeline_runtime_domain::services::entity_service::{EntityRecord, EntityService};
use serde_json::Value;
use std::collections::HashMap;
use ulid::Ulid;

#[derive(Default)]
pub struct InMemoryEntityService {
    entities: tokio::sync::RwLock<HashMap<String, HashMap<String, Value>>>,
}

impl InMemoryEntityService {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EntityService for InMemoryEntityService {
    async fn find_one(&self, entity_type: &str, field: &str, value: &Value) -> Result<Option<EntityRecord>, PipelineError> {
        let entities = self.entities.read().await;
        let Some(table) = entities.get(entity_type) else {
            return Ok(None);
        };
        Ok(table
            .iter()
            .find(|(_, data)| data.get(field) == Some(value))
            .map(|(id, data)| EntityRecord { id: id.clone(), data: data.clone() }))
    }

    async fn find_all(&self, entity_type: &str, field: &str, value: &Value) -> Result<Vec<EntityRecord>, PipelineError> {
        let entities = self.entities.read().await;
        let Some(table) = entities.get(entity_type) else {
            return Ok(Vec::new());
        };
        Ok(table
            .iter()
            .filter(|(_, data)| data.get(field) == Some(value))
            .map(|(id, data)| EntityRecord { id: id.clone(), data: data.clone() })
            .collect())
    }

    async fn create(&self, entity_type: &str, record: &Value) -> Result<String, PipelineError> {
        let id = Ulid::new().to_string();
        self.entities.write().await.entry(entity_type.to_string()).or_default().insert(id.clone(), record.clone());
        Ok(id)
    }

    async fn update(&self, entity_type: &str, id: &str, record: &Value) -> Result<(), PipelineError> {
        let mut entities = self.entities.write().await;
        let table = entities
            .get_mut(entity_type)
            .ok_or_else(|| PipelineError::NotFound(format!("entity type '{entity_type}' has no entities")))?;
        let slot = table
            .get_mut(id)
            .ok_or_else(|| PipelineError::NotFound(format!("{entity_type} '{id}' not found")))?;
        *slot = record.clone();
        Ok(())
    }

    async fn delete(&self, entity_type: &str, id: &str) -> Result<(), PipelineError> {
        let mut entities = self.entities.write().await;
        if let Some(table) = entities.get_mut(entity_type) {
            table.remove(id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_then_find_one_round_trips_by_field() {
        let store = InMemoryEntityService::new();
        let id = store.create("Product", &serde_json::json!({"sku": "X-1", "name": "Hat"})).await.unwrap();

        let found = store.find_one("Product", "sku", &serde_json::json!("X-1")).await.unwrap().unwrap();
        assert_eq!(found.id, id);
        assert_eq!(found.data["name"], "Hat");
    }

    #[tokio::test]
    async fn update_replaces_stored_data() {
        let store = InMemoryEntityService::new();
        let id = store.create("Product", &serde_json::json!({"sku": "X-1"})).await.unwrap();
        store.update("Product", &id, &serde_json::json!({"sku": "X-1", "name": "Updated"})).await.unwrap();

        let found = store.find_one("Product", "sku", &serde_json::json!("X-1")).await.unwrap().unwrap();
        assert_eq!(found.data["name"], "Updated");
    }

    #[tokio::test]
    async fn find_one_is_none_for_unknown_entity_type() {
        let store = InMemoryEntityService::new();
        assert!(store.find_one("Missing", "sku", &serde_json::json!("X-1")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_removes_the_entity() {
        let store = InMemoryEntityService::new();
        let id = store.create("Product", &serde_json::json!({"sku": "X-1"})).await.unwrap();
        store.delete("Product", &id).await.unwrap();
        assert!(store.find_one("Product", "sku", &serde_json::json!("X-1")).await.unwrap().is_none());
    }
}
