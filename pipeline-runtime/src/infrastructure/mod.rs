// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Infrastructure Layer
//!
//! Concrete adapters behind the domain's ports: SQLite-backed repositories,
//! HTTP/file extractors, and a Prometheus metrics endpoint. Nothing in
//! `application` or `pipeline-runtime-domain` depends on this module
//! directly — they depend on the traits it implements.

pub mod event_log;
pub mod extractors;
pub mod metrics;
pub mod repositories;
