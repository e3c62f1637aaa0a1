// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Generic Domain Event Wrapper
//!
//! [`DomainEvent<T>`] wraps any event payload with the metadata every
//! published event needs: an id, an RFC3339 timestamp, a schema version,
//! and optional correlation/causation ids for tracing a run's event chain.

use crate::services::datetime_serde;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent<T> {
    pub event_id: Uuid,
    pub payload: T,
    #[serde(with = "datetime_serde")]
    pub occurred_at: chrono::DateTime<chrono::Utc>,
    pub version: u64,
    pub correlation_id: Option<Uuid>,
    pub causation_id: Option<Uuid>,
    pub metadata: std::collections::HashMap<String, String>,
}

impl<T> DomainEvent<T> {
    pub fn new(payload: T) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            payload,
            occurred_at: chrono::Utc::now(),
            version: 1,
            correlation_id: None,
            causation_id: None,
            metadata: std::collections::HashMap::new(),
        }
    }

    pub fn with_correlation_id(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }

    pub fn with_causation_id(mut self, causation_id: Uuid) -> Self {
        self.causation_id = Some(causation_id);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Implemented by event payload types to carry a name and category used
/// for routing and logging.
pub trait EventPayload: Send + Sync + Clone {
    fn event_name(&self) -> &'static str;
    fn event_category(&self) -> EventCategory;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventCategory {
    Pipeline,
    Step,
    Record,
    Custom(String),
}

impl std::fmt::Display for EventCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventCategory::Pipeline => write!(f, "Pipeline"),
            EventCategory::Step => write!(f, "Step"),
            EventCategory::Record => write!(f, "Record"),
            EventCategory::Custom(name) => write!(f, "Custom({})", name),
        }
    }
}
