// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Narrow capability token threaded through extractors, transforms, and
//! loaders in place of a concrete auth/channel implementation (spec §1:
//! "authentication and user/channel resolution ... abstracted behind a
//! RequestContext token").

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct RequestContext {
    pub channel: Option<String>,
    pub content_language: Option<String>,
    pub auth_token: Option<String>,
}

impl RequestContext {
    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    pub fn with_content_language(mut self, language: impl Into<String>) -> Self {
        self.content_language = Some(language.into());
        self
    }
}
