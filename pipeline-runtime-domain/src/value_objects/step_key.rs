// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Validated, human-chosen identifier for a step within a pipeline
//! definition. Unlike the ULID-backed entity IDs, a `StepKey` is author
//! controlled — it shows up in checkpoints, replay targets, and logs, so it
//! is validated and kept short rather than generated.

use crate::error::PipelineError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

static STEP_KEY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_-]{1,128}$").expect("valid regex"));

#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StepKey(String);

impl StepKey {
    /// Validates and wraps a step key.
    ///
    /// # Errors
    /// Returns [`PipelineError::ValidationFailed`] if the key is empty,
    /// longer than 128 characters, or contains anything outside
    /// `[a-zA-Z0-9_-]`.
    pub fn new(value: impl Into<String>) -> Result<Self, PipelineError> {
        let value = value.into();
        if !STEP_KEY_PATTERN.is_match(&value) {
            return Err(PipelineError::ValidationFailed(format!(
                "step key '{}' must match {}",
                value,
                STEP_KEY_PATTERN.as_str()
            )));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for StepKey {
    type Error = PipelineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<StepKey> for String {
    fn from(key: StepKey) -> Self {
        key.0
    }
}

impl Display for StepKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for StepKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_alphanumeric_dash_underscore() {
        assert!(StepKey::new("load_products-v2").is_ok());
    }

    #[test]
    fn rejects_empty() {
        assert!(StepKey::new("").is_err());
    }

    #[test]
    fn rejects_whitespace() {
        assert!(StepKey::new("load products").is_err());
    }

    #[test]
    fn rejects_overlong() {
        let long = "a".repeat(129);
        assert!(StepKey::new(long).is_err());
    }
}
