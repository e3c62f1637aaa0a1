// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Concrete [`pipeline_runtime_domain::services::data_extractor::DataExtractor`]
//! adapters (spec §4.4): `http` for paginated REST sources, `file` for local
//! NDJSON/JSON-array batch sources.

pub mod file;
pub mod http;

pub use file::FileExtractor;
pub use http::HttpExtractor;
