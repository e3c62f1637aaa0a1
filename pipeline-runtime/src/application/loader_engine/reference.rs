// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Reference `EntityLoader` implementations for the four commerce entity
//! types spec.md's examples name: products, media assets, tax rates, and
//! promotions. All four share the same lookup/create/update/delete shape via
//! [`NaturalKeyLoader`] — the point of the inheritance-collapse redesign —
//! but three of them layer entity-specific validation on top (spec §8
//! scenarios 2-4), so they compose `NaturalKeyLoader` rather than going
//! through the bare `natural_key_loader!` macro.

use async_trait::async_trait;
use pipeline_runtime_domain::entities::RecordEnvelope;
use pipeline_runtime_domain::error::PipelineError;
use pipeline_runtime_domain::services::entity_loader::{
    EntityLoader, FoundEntity, LoaderCategory, LoaderContext, LoaderMetadata, Operation, ValidationOutcome,
};
use pipeline_runtime_domain::services::entity_service::EntityService;
use chrono::TimeZone;
use serde_json::Value;
use std::sync::Arc;

/// Parses an RFC3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC),
/// since `startsAt`/`endsAt` in practice arrive in either shape.
fn parse_instant(s: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&chrono::Utc));
    }
    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| chrono::Utc.from_utc_datetime(&dt))
}

fn missing_required_fields(record: &RecordEnvelope, required: &[String]) -> Vec<String> {
    required
        .iter()
        .filter(|field| record.field(field).map(|v| v.is_null()).unwrap_or(true))
        .cloned()
        .collect()
}

/// Shared lookup/create/update plumbing parameterized by entity type and
/// field names; the per-type structs below only supply metadata.
struct NaturalKeyLoader {
    entity_service: Arc<dyn EntityService>,
    metadata: LoaderMetadata,
    lookup_field: &'static str,
}

impl NaturalKeyLoader {
    async fn validate_impl(&self, record: &RecordEnvelope, _operation: Operation) -> Result<ValidationOutcome, PipelineError> {
        let missing = missing_required_fields(record, &self.metadata.required_fields);
        if missing.is_empty() {
            Ok(ValidationOutcome::ok())
        } else {
            let mut outcome = ValidationOutcome::ok();
            for field in missing {
                outcome = outcome.with_error(Some(&field), "REQUIRED_FIELD_MISSING", format!("'{}' is required", field));
            }
            Ok(outcome)
        }
    }

    async fn find_existing_impl(&self, record: &RecordEnvelope) -> Result<Option<FoundEntity>, PipelineError> {
        let Some(key_value) = record.field(self.lookup_field) else {
            return Ok(None);
        };
        let found = self.entity_service.find_one(&self.metadata.entity_type, self.lookup_field, key_value).await?;
        Ok(found.map(|r| FoundEntity { id: r.id, entity: r.data }))
    }

    async fn create_entity_impl(&self, record: &RecordEnvelope) -> Result<Option<String>, PipelineError> {
        Ok(Some(self.entity_service.create(&self.metadata.entity_type, &record.data).await?))
    }

    async fn update_entity_impl(&self, id: &str, record: &RecordEnvelope) -> Result<(), PipelineError> {
        self.entity_service.update(&self.metadata.entity_type, id, &record.data).await
    }

    async fn delete_entity_impl(&self, id: &str) -> Result<(), PipelineError> {
        self.entity_service.delete(&self.metadata.entity_type, id).await
    }
}

macro_rules! natural_key_loader {
    ($name:ident, $entity_type:expr, $category:expr, $lookup_field:expr, $required:expr) => {
        pub struct $name {
            inner: NaturalKeyLoader,
        }

        impl $name {
            pub fn new(entity_service: Arc<dyn EntityService>) -> Self {
                Self {
                    inner: NaturalKeyLoader {
                        entity_service,
                        metadata: LoaderMetadata {
                            entity_type: $entity_type.to_string(),
                            name: concat!($entity_type, " Loader").to_string(),
                            category: $category,
                            supported_operations: vec![Operation::Create, Operation::Update, Operation::Upsert],
                            lookup_fields: vec![$lookup_field.to_string()],
                            required_fields: $required.iter().map(|s: &&str| s.to_string()).collect(),
                        },
                        lookup_field: $lookup_field,
                    },
                }
            }
        }

        #[async_trait]
        impl EntityLoader for $name {
            fn metadata(&self) -> &LoaderMetadata {
                &self.inner.metadata
            }

            fn field_schema(&self) -> Value {
                serde_json::json!({
                    "type": "object",
                    "required": self.inner.metadata.required_fields,
                })
            }

            async fn validate(&self, _ctx: &LoaderContext, record: &RecordEnvelope, operation: Operation) -> Result<ValidationOutcome, PipelineError> {
                self.inner.validate_impl(record, operation).await
            }

            async fn find_existing(&self, _ctx: &LoaderContext, record: &RecordEnvelope) -> Result<Option<FoundEntity>, PipelineError> {
                self.inner.find_existing_impl(record).await
            }

            async fn create_entity(&self, ctx: &LoaderContext, record: &RecordEnvelope) -> Result<Option<String>, PipelineError> {
                if ctx.dry_run {
                    return Ok(None);
                }
                self.inner.create_entity_impl(record).await
            }

            async fn update_entity(&self, ctx: &LoaderContext, id: &str, record: &RecordEnvelope) -> Result<(), PipelineError> {
                if ctx.dry_run {
                    return Ok(());
                }
                self.inner.update_entity_impl(id, record).await
            }

            async fn delete_entity(&self, ctx: &LoaderContext, id: &str) -> Result<(), PipelineError> {
                if ctx.dry_run {
                    return Ok(());
                }
                self.inner.delete_entity_impl(id).await
            }
        }
    };
}

natural_key_loader!(ProductLoader, "Product", LoaderCategory::Products, "sku", ["sku", "name"]);

/// Media asset loader (spec §8 scenario 2): `sourceUrl` must parse as a URL.
pub struct AssetLoader {
    inner: NaturalKeyLoader,
}

impl AssetLoader {
    pub fn new(entity_service: Arc<dyn EntityService>) -> Self {
        Self {
            inner: NaturalKeyLoader {
                entity_service,
                metadata: LoaderMetadata {
                    entity_type: "Asset".to_string(),
                    name: "Asset Loader".to_string(),
                    category: LoaderCategory::Media,
                    supported_operations: vec![Operation::Create, Operation::Update, Operation::Upsert],
                    lookup_fields: vec!["sourceUrl".to_string()],
                    required_fields: vec!["sourceUrl".to_string()],
                },
                lookup_field: "sourceUrl",
            },
        }
    }
}

#[async_trait]
impl EntityLoader for AssetLoader {
    fn metadata(&self) -> &LoaderMetadata {
        &self.inner.metadata
    }

    fn field_schema(&self) -> Value {
        serde_json::json!({"type": "object", "required": self.inner.metadata.required_fields})
    }

    async fn validate(&self, _ctx: &LoaderContext, record: &RecordEnvelope, operation: Operation) -> Result<ValidationOutcome, PipelineError> {
        let mut outcome = self.inner.validate_impl(record, operation).await?;
        if let Some(source_url) = record.field("sourceUrl").and_then(Value::as_str) {
            if url::Url::parse(source_url).is_err() {
                outcome = outcome.with_error(Some("sourceUrl"), "INVALID_FORMAT", "Invalid URL format");
            }
        }
        Ok(outcome)
    }

    async fn find_existing(&self, _ctx: &LoaderContext, record: &RecordEnvelope) -> Result<Option<FoundEntity>, PipelineError> {
        self.inner.find_existing_impl(record).await
    }

    async fn create_entity(&self, ctx: &LoaderContext, record: &RecordEnvelope) -> Result<Option<String>, PipelineError> {
        if ctx.dry_run {
            return Ok(None);
        }
        self.inner.create_entity_impl(record).await
    }

    async fn update_entity(&self, ctx: &LoaderContext, id: &str, record: &RecordEnvelope) -> Result<(), PipelineError> {
        if ctx.dry_run {
            return Ok(());
        }
        self.inner.update_entity_impl(id, record).await
    }

    async fn delete_entity(&self, ctx: &LoaderContext, id: &str) -> Result<(), PipelineError> {
        if ctx.dry_run {
            return Ok(());
        }
        self.inner.delete_entity_impl(id).await
    }
}

/// Tax rate loader (spec §8 scenario 3): `zoneCode`, when present, must
/// resolve against the `Zone` entity type.
pub struct TaxRateLoader {
    inner: NaturalKeyLoader,
}

impl TaxRateLoader {
    pub fn new(entity_service: Arc<dyn EntityService>) -> Self {
        Self {
            inner: NaturalKeyLoader {
                entity_service,
                metadata: LoaderMetadata {
                    entity_type: "TaxRate".to_string(),
                    name: "TaxRate Loader".to_string(),
                    category: LoaderCategory::Configuration,
                    supported_operations: vec![Operation::Create, Operation::Update, Operation::Upsert],
                    lookup_fields: vec!["code".to_string()],
                    required_fields: vec!["value".to_string()],
                },
                lookup_field: "code",
            },
        }
    }
}

#[async_trait]
impl EntityLoader for TaxRateLoader {
    fn metadata(&self) -> &LoaderMetadata {
        &self.inner.metadata
    }

    fn field_schema(&self) -> Value {
        serde_json::json!({"type": "object", "required": self.inner.metadata.required_fields})
    }

    async fn validate(&self, _ctx: &LoaderContext, record: &RecordEnvelope, operation: Operation) -> Result<ValidationOutcome, PipelineError> {
        let mut outcome = self.inner.validate_impl(record, operation).await?;
        if let Some(zone_code) = record.field("zoneCode").and_then(Value::as_str) {
            let zone_value = Value::String(zone_code.to_string());
            let found = self.inner.entity_service.find_one("Zone", "code", &zone_value).await?;
            if found.is_none() {
                outcome = outcome.with_error(Some("zoneCode"), "ZONE_NOT_FOUND", format!("Zone '{}' not found", zone_code));
            }
        }
        Ok(outcome)
    }

    async fn find_existing(&self, _ctx: &LoaderContext, record: &RecordEnvelope) -> Result<Option<FoundEntity>, PipelineError> {
        self.inner.find_existing_impl(record).await
    }

    async fn create_entity(&self, ctx: &LoaderContext, record: &RecordEnvelope) -> Result<Option<String>, PipelineError> {
        if ctx.dry_run {
            return Ok(None);
        }
        self.inner.create_entity_impl(record).await
    }

    async fn update_entity(&self, ctx: &LoaderContext, id: &str, record: &RecordEnvelope) -> Result<(), PipelineError> {
        if ctx.dry_run {
            return Ok(());
        }
        self.inner.update_entity_impl(id, record).await
    }

    async fn delete_entity(&self, ctx: &LoaderContext, id: &str) -> Result<(), PipelineError> {
        if ctx.dry_run {
            return Ok(());
        }
        self.inner.delete_entity_impl(id).await
    }
}

/// Promotion loader (spec §8 scenario 4): `endsAt` must be after `startsAt`
/// when both are present.
pub struct PromotionLoader {
    inner: NaturalKeyLoader,
}

impl PromotionLoader {
    pub fn new(entity_service: Arc<dyn EntityService>) -> Self {
        Self {
            inner: NaturalKeyLoader {
                entity_service,
                metadata: LoaderMetadata {
                    entity_type: "Promotion".to_string(),
                    name: "Promotion Loader".to_string(),
                    category: LoaderCategory::Commerce,
                    supported_operations: vec![Operation::Create, Operation::Update, Operation::Upsert],
                    lookup_fields: vec!["code".to_string()],
                    required_fields: vec!["code".to_string(), "name".to_string()],
                },
                lookup_field: "code",
            },
        }
    }
}

#[async_trait]
impl EntityLoader for PromotionLoader {
    fn metadata(&self) -> &LoaderMetadata {
        &self.inner.metadata
    }

    fn field_schema(&self) -> Value {
        serde_json::json!({"type": "object", "required": self.inner.metadata.required_fields})
    }

    async fn validate(&self, _ctx: &LoaderContext, record: &RecordEnvelope, operation: Operation) -> Result<ValidationOutcome, PipelineError> {
        let mut outcome = self.inner.validate_impl(record, operation).await?;
        let starts_at = record.field("startsAt").and_then(Value::as_str).and_then(parse_instant);
        let ends_at = record.field("endsAt").and_then(Value::as_str).and_then(parse_instant);
        if let (Some(starts_at), Some(ends_at)) = (starts_at, ends_at) {
            if ends_at <= starts_at {
                outcome = outcome.with_error(Some("endsAt"), "INVALID_DATE_RANGE", "'endsAt' must be after 'startsAt'");
            }
        }
        Ok(outcome)
    }

    async fn find_existing(&self, _ctx: &LoaderContext, record: &RecordEnvelope) -> Result<Option<FoundEntity>, PipelineError> {
        self.inner.find_existing_impl(record).await
    }

    async fn create_entity(&self, ctx: &LoaderContext, record: &RecordEnvelope) -> Result<Option<String>, PipelineError> {
        if ctx.dry_run {
            return Ok(None);
        }
        self.inner.create_entity_impl(record).await
    }

    async fn update_entity(&self, ctx: &LoaderContext, id: &str, record: &RecordEnvelope) -> Result<(), PipelineError> {
        if ctx.dry_run {
            return Ok(());
        }
        self.inner.update_entity_impl(id, record).await
    }

    async fn delete_entity(&self, ctx: &LoaderContext, id: &str) -> Result<(), PipelineError> {
        if ctx.dry_run {
            return Ok(());
        }
        self.inner.delete_entity_impl(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct InMemoryEntityService {
        records: std::sync::Mutex<Vec<(String, Value)>>,
    }

    impl InMemoryEntityService {
        fn new() -> Self {
            Self { records: std::sync::Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl EntityService for InMemoryEntityService {
        async fn find_one(&self, _entity_type: &str, field: &str, value: &Value) -> Result<Option<pipeline_runtime_domain::services::entity_service::EntityRecord>, PipelineError> {
            let records = self.records.lock().unwrap();
            Ok(records
                .iter()
                .find(|(_, data)| data.get(field) == Some(value))
                .map(|(id, data)| pipeline_runtime_domain::services::entity_service::EntityRecord {
                    id: id.clone(),
                    data: data.clone(),
                }))
        }
        async fn find_all(&self, _entity_type: &str, _field: &str, _value: &Value) -> Result<Vec<pipeline_runtime_domain::services::entity_service::EntityRecord>, PipelineError> {
            Ok(vec![])
        }
        async fn create(&self, _entity_type: &str, record: &Value) -> Result<String, PipelineError> {
            let mut records = self.records.lock().unwrap();
            let id = format!("id-{}", records.len() + 1);
            records.push((id.clone(), record.clone()));
            Ok(id)
        }
        async fn update(&self, _entity_type: &str, _id: &str, _record: &Value) -> Result<(), PipelineError> {
            Ok(())
        }
        async fn delete(&self, _entity_type: &str, _id: &str) -> Result<(), PipelineError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn product_loader_rejects_missing_required_field() {
        let loader = ProductLoader::new(Arc::new(InMemoryEntityService::new()));
        let record = RecordEnvelope::new(serde_json::json!({"sku": "X-1"}));
        let outcome = loader.validate(&LoaderContext::default(), &record, Operation::Create).await.unwrap();
        assert!(!outcome.is_valid());
    }

    #[tokio::test]
    async fn product_loader_finds_existing_by_sku() {
        let service = Arc::new(InMemoryEntityService::new());
        let loader = ProductLoader::new(service.clone());
        service.create("Product", &serde_json::json!({"sku": "X-1", "name": "Widget"})).await.unwrap();

        let record = RecordEnvelope::new(serde_json::json!({"sku": "X-1", "name": "Widget"}));
        let found = loader.find_existing(&LoaderContext::default(), &record).await.unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn dry_run_skips_the_actual_create_call() {
        let loader = ProductLoader::new(Arc::new(InMemoryEntityService::new()));
        let ctx = LoaderContext { dry_run: true, ..Default::default() };
        let record = RecordEnvelope::new(serde_json::json!({"sku": "X-1", "name": "Widget"}));
        let id = loader.create_entity(&ctx, &record).await.unwrap();
        assert!(id.is_none());
    }

    #[tokio::test]
    async fn asset_loader_rejects_malformed_url() {
        let loader = AssetLoader::new(Arc::new(InMemoryEntityService::new()));
        let record = RecordEnvelope::new(serde_json::json!({"sourceUrl": "not-a-url"}));
        let outcome = loader.validate(&LoaderContext::default(), &record, Operation::Create).await.unwrap();
        assert!(!outcome.is_valid());
        assert_eq!(outcome.errors[0].code, "INVALID_FORMAT");
    }

    #[tokio::test]
    async fn asset_loader_accepts_well_formed_url() {
        let loader = AssetLoader::new(Arc::new(InMemoryEntityService::new()));
        let record = RecordEnvelope::new(serde_json::json!({"sourceUrl": "https://cdn.example.com/hat.png"}));
        let outcome = loader.validate(&LoaderContext::default(), &record, Operation::Create).await.unwrap();
        assert!(outcome.is_valid());
    }

    #[tokio::test]
    async fn tax_rate_loader_rejects_unknown_zone() {
        let loader = TaxRateLoader::new(Arc::new(InMemoryEntityService::new()));
        let record = RecordEnvelope::new(serde_json::json!({"name": "Std", "value": 20, "taxCategoryCode": "standard", "zoneCode": "ZZ"}));
        let outcome = loader.validate(&LoaderContext::default(), &record, Operation::Create).await.unwrap();
        assert!(!outcome.is_valid());
        assert_eq!(outcome.errors[0].code, "ZONE_NOT_FOUND");
    }

    #[tokio::test]
    async fn tax_rate_loader_accepts_known_zone() {
        let service = Arc::new(InMemoryEntityService::new());
        service.create("Zone", &serde_json::json!({"code": "EU"})).await.unwrap();
        let loader = TaxRateLoader::new(service);
        let record = RecordEnvelope::new(serde_json::json!({"code": "std-eu", "value": 20, "zoneCode": "EU"}));
        let outcome = loader.validate(&LoaderContext::default(), &record, Operation::Create).await.unwrap();
        assert!(outcome.is_valid());
    }

    #[tokio::test]
    async fn promotion_loader_rejects_end_before_start() {
        let loader = PromotionLoader::new(Arc::new(InMemoryEntityService::new()));
        let record = RecordEnvelope::new(serde_json::json!({"name": "X", "code": "X", "startsAt": "2025-01-10", "endsAt": "2025-01-01"}));
        let outcome = loader.validate(&LoaderContext::default(), &record, Operation::Create).await.unwrap();
        assert!(!outcome.is_valid());
        assert_eq!(outcome.errors[0].code, "INVALID_DATE_RANGE");
    }

    #[tokio::test]
    async fn promotion_loader_accepts_end_after_start() {
        let loader = PromotionLoader::new(Arc::new(InMemoryEntityService::new()));
        let record = RecordEnvelope::new(serde_json::json!({"name": "X", "code": "X", "startsAt": "2025-01-01", "endsAt": "2025-01-10"}));
        let outcome = loader.validate(&LoaderContext::default(), &record, Operation::Create).await.unwrap();
        assert!(outcome.is_valid());
    }
}
