// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Process-wide `entityType -> loader` registry (spec §4.3), populated at
//! startup from the reference loaders and any plugin-supplied ones.

use pipeline_runtime_domain::error::PipelineError;
use pipeline_runtime_domain::services::entity_loader::{EntityLoader, LoaderCategory, Operation};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct LoaderRegistry {
    loaders: HashMap<String, Arc<dyn EntityLoader>>,
}

impl LoaderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, loader: Arc<dyn EntityLoader>) {
        self.loaders.insert(loader.metadata().entity_type.clone(), loader);
    }

    pub fn has(&self, entity_type: &str) -> bool {
        self.loaders.contains_key(entity_type)
    }

    pub fn get(&self, entity_type: &str) -> Result<Arc<dyn EntityLoader>, PipelineError> {
        self.loaders
            .get(entity_type)
            .cloned()
            .ok_or_else(|| PipelineError::InvalidConfiguration(format!("no loader registered for entity type '{}'", entity_type)))
    }

    pub fn get_all(&self) -> Vec<Arc<dyn EntityLoader>> {
        self.loaders.values().cloned().collect()
    }

    pub fn supports_operation(&self, entity_type: &str, operation: Operation) -> bool {
        self.loaders
            .get(entity_type)
            .map(|loader| loader.metadata().supported_operations.contains(&operation))
            .unwrap_or(false)
    }

    pub fn field_schema(&self, entity_type: &str) -> Result<serde_json::Value, PipelineError> {
        self.get(entity_type).map(|loader| loader.field_schema())
    }

    /// Groups every registered loader by its dashboard-facing category.
    pub fn loaders_by_category(&self) -> HashMap<&'static str, Vec<String>> {
        let mut grouped: HashMap<&'static str, Vec<String>> = HashMap::new();
        for loader in self.loaders.values() {
            grouped
                .entry(category_label(loader.metadata().category))
                .or_default()
                .push(loader.metadata().entity_type.clone());
        }
        grouped
    }
}

fn category_label(category: LoaderCategory) -> &'static str {
    match category {
        LoaderCategory::Products => "Products",
        LoaderCategory::Customers => "Customers",
        LoaderCategory::Catalog => "Catalog",
        LoaderCategory::Commerce => "Commerce",
        LoaderCategory::Inventory => "Inventory",
        LoaderCategory::Media => "Media",
        LoaderCategory::Configuration => "Configuration",
        LoaderCategory::Other => "Other",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pipeline_runtime_domain::entities::RecordEnvelope;
    use pipeline_runtime_domain::services::entity_loader::{
        FoundEntity, LoaderContext, LoaderMetadata, ValidationOutcome,
    };

    struct StubLoader(LoaderMetadata);

    #[async_trait]
    impl EntityLoader for StubLoader {
        fn metadata(&self) -> &LoaderMetadata {
            &self.0
        }
        fn field_schema(&self) -> serde_json::Value {
            serde_json::json!({})
        }
        async fn validate(&self, _ctx: &LoaderContext, _record: &RecordEnvelope, _operation: Operation) -> Result<ValidationOutcome, PipelineError> {
            Ok(ValidationOutcome::ok())
        }
        async fn find_existing(&self, _ctx: &LoaderContext, _record: &RecordEnvelope) -> Result<Option<FoundEntity>, PipelineError> {
            Ok(None)
        }
        async fn create_entity(&self, _ctx: &LoaderContext, _record: &RecordEnvelope) -> Result<Option<String>, PipelineError> {
            Ok(None)
        }
        async fn update_entity(&self, _ctx: &LoaderContext, _id: &str, _record: &RecordEnvelope) -> Result<(), PipelineError> {
            Ok(())
        }
        async fn delete_entity(&self, _ctx: &LoaderContext, _id: &str) -> Result<(), PipelineError> {
            Ok(())
        }
    }

    fn loader(entity_type: &str, category: LoaderCategory, ops: Vec<Operation>) -> Arc<dyn EntityLoader> {
        Arc::new(StubLoader(LoaderMetadata {
            entity_type: entity_type.into(),
            name: format!("{} Loader", entity_type),
            category,
            supported_operations: ops,
            lookup_fields: vec![],
            required_fields: vec![],
        }))
    }

    #[test]
    fn groups_loaders_by_category() {
        let mut registry = LoaderRegistry::new();
        registry.register(loader("Product", LoaderCategory::Products, vec![Operation::Upsert]));
        registry.register(loader("TaxRate", LoaderCategory::Configuration, vec![Operation::Upsert]));

        let grouped = registry.loaders_by_category();
        assert_eq!(grouped.get("Products").unwrap(), &vec!["Product".to_string()]);
        assert_eq!(grouped.get("Configuration").unwrap(), &vec!["TaxRate".to_string()]);
    }

    #[test]
    fn supports_operation_is_false_for_unknown_entity_type() {
        let registry = LoaderRegistry::new();
        assert!(!registry.supports_operation("Missing", Operation::Create));
    }

    #[test]
    fn get_fails_for_unregistered_entity_type() {
        let registry = LoaderRegistry::new();
        assert!(registry.get("Missing").is_err());
    }
}
