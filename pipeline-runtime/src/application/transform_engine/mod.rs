// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Transform Engine
//!
//! A process-wide [`TransformRegistry`] holds every [`Transform`] by its
//! `transform_type` name. Built-ins are grouped into families matching the
//! spec's transform catalog, each registering itself in
//! [`TransformRegistry::with_builtins`].

pub mod boolean_ops;
pub mod coercion_ops;
pub mod date_ops;
pub mod lookup_ops;
pub mod numeric_ops;
pub mod record_ops;
pub mod string_ops;

use pipeline_runtime_domain::error::PipelineError;
use pipeline_runtime_domain::services::transform::Transform;
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of transforms keyed by the name pipeline definitions reference
/// in a step's transform chain (e.g. `"trim"`, `"toCents"`, `"lookup"`).
#[derive(Clone, Default)]
pub struct TransformRegistry {
    transforms: HashMap<&'static str, Arc<dyn Transform>>,
}

impl TransformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, transform: Arc<dyn Transform>) {
        self.transforms.insert(transform.transform_type(), transform);
    }

    pub fn get(&self, transform_type: &str) -> Result<Arc<dyn Transform>, PipelineError> {
        self.transforms
            .get(transform_type)
            .cloned()
            .ok_or_else(|| PipelineError::InvalidConfiguration(format!("unknown transform '{}'", transform_type)))
    }

    pub fn contains(&self, transform_type: &str) -> bool {
        self.transforms.contains_key(transform_type)
    }

    /// Builds a registry pre-populated with every built-in transform
    /// family the spec's catalog names.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        string_ops::register(&mut registry);
        numeric_ops::register(&mut registry);
        date_ops::register(&mut registry);
        boolean_ops::register(&mut registry);
        coercion_ops::register(&mut registry);
        record_ops::register(&mut registry);
        lookup_ops::register(&mut registry);
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_builtins_registers_every_family() {
        let registry = TransformRegistry::with_builtins();
        assert!(registry.contains("TRIM"));
        assert!(registry.contains("TO_CENTS"));
        assert!(registry.contains("LOOKUP"));
        assert!(registry.contains("UPPERCASE"));
        assert!(registry.contains("PARSE_BOOLEAN"));
    }

    #[test]
    fn unknown_transform_is_an_error() {
        let registry = TransformRegistry::with_builtins();
        assert!(registry.get("does-not-exist").is_err());
    }
}
