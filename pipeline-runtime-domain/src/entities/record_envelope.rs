// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The envelope that flows edge-to-edge between steps: `{ data, meta }`.
//! `data` is an untyped JSON value (the domain's "any-typed payload" design
//! note) so transforms never need to know an entity's concrete shape.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeMeta {
    pub source_id: Option<String>,
    pub source_timestamp: Option<chrono::DateTime<chrono::Utc>>,
    pub sequence: Option<u64>,
    #[serde(default)]
    pub extra: std::collections::HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordEnvelope {
    pub data: serde_json::Value,
    #[serde(default)]
    pub meta: EnvelopeMeta,
}

impl RecordEnvelope {
    pub fn new(data: serde_json::Value) -> Self {
        Self {
            data,
            meta: EnvelopeMeta::default(),
        }
    }

    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.meta.sequence = Some(sequence);
        self
    }

    /// Reads a top-level field out of `data`, the common case for
    /// transforms and loader field access.
    pub fn field(&self, name: &str) -> Option<&serde_json::Value> {
        self.data.get(name)
    }

    /// Sets (or overwrites) a top-level field on `data`. `data` is coerced
    /// to an object if it was not one already, matching the permissive
    /// dynamic-value semantics the transform engine relies on.
    pub fn set_field(&mut self, name: &str, value: serde_json::Value) {
        if !self.data.is_object() {
            self.data = serde_json::Value::Object(serde_json::Map::new());
        }
        if let serde_json::Value::Object(map) = &mut self.data {
            map.insert(name.to_string(), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_access_on_object_data() {
        let envelope = RecordEnvelope::new(serde_json::json!({"sku": "X-1"}));
        assert_eq!(envelope.field("sku").unwrap(), "X-1");
        assert!(envelope.field("missing").is_none());
    }

    #[test]
    fn set_field_upserts_into_object() {
        let mut envelope = RecordEnvelope::new(serde_json::json!({"sku": "X-1"}));
        envelope.set_field("slug", serde_json::json!("x-1"));
        assert_eq!(envelope.field("slug").unwrap(), "x-1");
        assert_eq!(envelope.field("sku").unwrap(), "X-1");
    }
}
