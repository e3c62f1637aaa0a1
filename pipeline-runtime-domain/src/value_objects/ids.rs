// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Remaining ULID-backed identifiers. `PipelineId` and `RunId` get their own
//! modules because they are the two identifiers referenced across crate
//! boundaries most often; the rest share this file to avoid restating the
//! same newtype boilerplate five more times.

use super::generic_id::{GenericId, IdCategory};
use crate::error::PipelineError;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use ulid::Ulid;

macro_rules! generic_id_newtype {
    ($name:ident, $marker:ident, $category:expr) => {
        #[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
        pub struct $name(GenericId<$marker>);

        #[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
        struct $marker;

        impl IdCategory for $marker {
            fn category_name() -> &'static str {
                $category
            }
        }

        impl $name {
            pub fn new() -> Self {
                Self(GenericId::new())
            }

            pub fn from_ulid(ulid: Ulid) -> Result<Self, PipelineError> {
                Ok(Self(GenericId::from_ulid(ulid)?))
            }

            pub fn from_string(s: &str) -> Result<Self, PipelineError> {
                Ok(Self(GenericId::from_string(s)?))
            }

            pub fn as_ulid(&self) -> Ulid {
                self.0.as_ulid()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = PipelineError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_string(s)
            }
        }
    };
}

generic_id_newtype!(CheckpointId, CheckpointMarker, "checkpoint");
generic_id_newtype!(RecordId, RecordMarker, "record");
generic_id_newtype!(RetryAuditId, RetryAuditMarker, "retry_audit");
generic_id_newtype!(RollbackTransactionId, RollbackTransactionMarker, "rollback_transaction");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkpoint_id_round_trips() {
        let id = CheckpointId::new();
        assert_eq!(id, CheckpointId::from_string(&id.to_string()).unwrap());
    }

    #[test]
    fn distinct_categories_reject_nil() {
        assert!(RollbackTransactionId::from_ulid(Ulid(0)).is_err());
    }
}
