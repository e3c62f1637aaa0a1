// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Generic ULID-Backed Identifier
//!
//! [`GenericId<C>`] is the shared implementation behind every entity
//! identifier in the domain (`PipelineId`, `RunId`, `CheckpointId`, ...). The
//! marker type parameter `C` makes identifiers for different entities
//! distinct at compile time while sharing validation and ordering logic.

use crate::error::PipelineError;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::marker::PhantomData;
use ulid::Ulid;

/// Per-entity validation hook. Implementors just need a category name and
/// any entity-specific ULID validation.
pub trait IdCategory {
    fn category_name() -> &'static str;

    fn validate_id(ulid: &Ulid) -> Result<(), PipelineError> {
        if ulid.0 == 0 {
            return Err(PipelineError::InvalidConfiguration(format!(
                "{} ID cannot be nil ULID",
                Self::category_name()
            )));
        }
        Ok(())
    }
}

/// A type-safe, time-ordered identifier wrapping a [`Ulid`].
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct GenericId<C> {
    ulid: Ulid,
    #[serde(skip)]
    _marker: PhantomData<C>,
}

impl<C: IdCategory> GenericId<C> {
    pub fn new() -> Self {
        Self {
            ulid: Ulid::new(),
            _marker: PhantomData,
        }
    }

    pub fn from_ulid(ulid: Ulid) -> Result<Self, PipelineError> {
        C::validate_id(&ulid)?;
        Ok(Self {
            ulid,
            _marker: PhantomData,
        })
    }

    pub fn from_string(s: &str) -> Result<Self, PipelineError> {
        let ulid = Ulid::from_string(s).map_err(|e| {
            PipelineError::InvalidConfiguration(format!(
                "invalid {} ID '{}': {}",
                C::category_name(),
                s,
                e
            ))
        })?;
        Self::from_ulid(ulid)
    }

    pub fn from_timestamp_ms(timestamp_ms: u64) -> Result<Self, PipelineError> {
        let ulid = Ulid::from_parts(timestamp_ms, rand::random());
        Self::from_ulid(ulid)
    }

    pub fn as_ulid(&self) -> Ulid {
        self.ulid
    }

    pub fn timestamp_ms(&self) -> u64 {
        self.ulid.timestamp_ms()
    }

    pub fn datetime(&self) -> chrono::DateTime<chrono::Utc> {
        chrono::DateTime::from_timestamp_millis(self.timestamp_ms() as i64).unwrap_or_default()
    }

    pub fn to_lowercase(&self) -> String {
        self.ulid.to_string().to_lowercase()
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        C::validate_id(&self.ulid)
    }

    pub fn is_nil(&self) -> bool {
        self.ulid.0 == 0
    }

    #[cfg(test)]
    pub fn nil() -> Self {
        Self {
            ulid: Ulid(0),
            _marker: PhantomData,
        }
    }
}

impl<C: IdCategory> Default for GenericId<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Display for GenericId<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ulid)
    }
}

impl<C> AsRef<Ulid> for GenericId<C> {
    fn as_ref(&self) -> &Ulid {
        &self.ulid
    }
}

/// Batch helpers shared by every `*_id_utils` module.
pub mod generic_id_utils {
    use super::*;

    pub fn generate_batch<C: IdCategory>(count: usize) -> Vec<GenericId<C>> {
        (0..count).map(|_| GenericId::new()).collect()
    }

    pub fn generate_batch_at_time<C: IdCategory>(count: usize, timestamp_ms: u64) -> Vec<GenericId<C>> {
        (0..count)
            .filter_map(|_| GenericId::from_timestamp_ms(timestamp_ms).ok())
            .collect()
    }

    pub fn validate_batch<C: IdCategory>(ids: &[GenericId<C>]) -> Result<(), PipelineError> {
        for id in ids {
            id.validate()?;
        }
        Ok(())
    }
}
