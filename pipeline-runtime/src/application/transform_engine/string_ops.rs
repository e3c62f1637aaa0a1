// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! String transforms: `TRIM, LOWERCASE, UPPERCASE, SLUGIFY, TRUNCATE, PAD,
//! REPLACE, REGEX_REPLACE, REGEX_EXTRACT, SPLIT, JOIN, CONCAT, TEMPLATE,
//! STRIP_HTML, ESCAPE_HTML, TITLE_CASE, SENTENCE_CASE`.

use super::TransformRegistry;
use async_trait::async_trait;
use pipeline_runtime_domain::entities::RecordEnvelope;
use pipeline_runtime_domain::error::PipelineError;
use pipeline_runtime_domain::services::transform::{Transform, TransformContext};
use regex::Regex;
use serde_json::Value;
use std::sync::Arc;

fn as_str(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn param_str(params: &Value, key: &str) -> Option<String> {
    params.get(key).and_then(|v| v.as_str()).map(|s| s.to_string())
}

macro_rules! pure_transform {
    ($name:ident, $type_name:expr, |$value:ident, $params:ident| $body:expr) => {
        pub struct $name;

        #[async_trait]
        impl Transform for $name {
            fn transform_type(&self) -> &'static str {
                $type_name
            }

            async fn execute(
                &self,
                _ctx: &TransformContext,
                $value: Value,
                _record: Option<&RecordEnvelope>,
                $params: &Value,
            ) -> Result<Value, PipelineError> {
                Ok($body)
            }
        }
    };
}

pure_transform!(Trim, "TRIM", |value, _params| Value::String(
    as_str(&value).trim().to_string()
));

pure_transform!(Lowercase, "LOWERCASE", |value, _params| Value::String(
    as_str(&value).to_lowercase()
));

pure_transform!(Uppercase, "UPPERCASE", |value, _params| Value::String(
    as_str(&value).to_uppercase()
));

pure_transform!(Slugify, "SLUGIFY", |value, _params| {
    let lowered = as_str(&value).to_lowercase();
    let mut slug = String::with_capacity(lowered.len());
    let mut last_was_dash = false;
    for ch in lowered.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch);
            last_was_dash = false;
        } else if !last_was_dash && !slug.is_empty() {
            slug.push('-');
            last_was_dash = true;
        }
    }
    if slug.ends_with('-') {
        slug.pop();
    }
    Value::String(slug)
});

pure_transform!(Truncate, "TRUNCATE", |value, params| {
    let s = as_str(&value);
    let length = params.get("length").and_then(|v| v.as_u64()).unwrap_or(s.chars().count() as u64) as usize;
    let suffix = param_str(params, "suffix").unwrap_or_default();
    if s.chars().count() <= length {
        Value::String(s)
    } else {
        let truncated: String = s.chars().take(length).collect();
        Value::String(format!("{}{}", truncated, suffix))
    }
});

pure_transform!(Pad, "PAD", |value, params| {
    let s = as_str(&value);
    let length = params.get("length").and_then(|v| v.as_u64()).unwrap_or(0) as usize;
    let fill = param_str(params, "char").unwrap_or_else(|| " ".to_string());
    let fill_char = fill.chars().next().unwrap_or(' ');
    let side = param_str(params, "side").unwrap_or_else(|| "start".to_string());
    let current = s.chars().count();
    if current >= length {
        Value::String(s)
    } else {
        let padding: String = std::iter::repeat(fill_char).take(length - current).collect();
        if side == "end" {
            Value::String(format!("{}{}", s, padding))
        } else {
            Value::String(format!("{}{}", padding, s))
        }
    }
});

pure_transform!(Replace, "REPLACE", |value, params| {
    let s = as_str(&value);
    let search = param_str(params, "search").unwrap_or_default();
    let replacement = param_str(params, "replacement").unwrap_or_default();
    let global = params.get("global").and_then(|v| v.as_bool()).unwrap_or(true);
    if search.is_empty() {
        Value::String(s)
    } else if global {
        Value::String(s.replace(&search, &replacement))
    } else {
        Value::String(s.replacen(&search, &replacement, 1))
    }
});

pub struct RegexReplace;

#[async_trait]
impl Transform for RegexReplace {
    fn transform_type(&self) -> &'static str {
        "REGEX_REPLACE"
    }

    async fn execute(
        &self,
        _ctx: &TransformContext,
        value: Value,
        _record: Option<&RecordEnvelope>,
        params: &Value,
    ) -> Result<Value, PipelineError> {
        let s = as_str(&value);
        let pattern = param_str(params, "pattern").ok_or_else(|| {
            PipelineError::InvalidConfiguration("REGEX_REPLACE requires 'pattern'".to_string())
        })?;
        let replacement = param_str(params, "replacement").unwrap_or_default();
        let re = Regex::new(&pattern)
            .map_err(|e| PipelineError::InvalidConfiguration(format!("invalid regex '{}': {}", pattern, e)))?;
        Ok(Value::String(re.replace_all(&s, replacement.as_str()).into_owned()))
    }
}

pub struct RegexExtract;

#[async_trait]
impl Transform for RegexExtract {
    fn transform_type(&self) -> &'static str {
        "REGEX_EXTRACT"
    }

    async fn execute(
        &self,
        _ctx: &TransformContext,
        value: Value,
        _record: Option<&RecordEnvelope>,
        params: &Value,
    ) -> Result<Value, PipelineError> {
        let s = as_str(&value);
        let pattern = param_str(params, "pattern").ok_or_else(|| {
            PipelineError::InvalidConfiguration("REGEX_EXTRACT requires 'pattern'".to_string())
        })?;
        let group = params.get("group").and_then(|v| v.as_u64()).unwrap_or(0) as usize;
        let re = Regex::new(&pattern)
            .map_err(|e| PipelineError::InvalidConfiguration(format!("invalid regex '{}': {}", pattern, e)))?;
        Ok(match re.captures(&s).and_then(|caps| caps.get(group)) {
            Some(m) => Value::String(m.as_str().to_string()),
            None => Value::Null,
        })
    }
}

pure_transform!(Split, "SPLIT", |value, params| {
    let s = as_str(&value);
    let delimiter = param_str(params, "delimiter").unwrap_or_else(|| ",".to_string());
    let parts: Vec<Value> = s.split(delimiter.as_str()).map(|p| Value::String(p.to_string())).collect();
    Value::Array(parts)
});

pure_transform!(Join, "JOIN", |value, params| {
    let delimiter = param_str(params, "delimiter").unwrap_or_else(|| ",".to_string());
    match value {
        Value::Array(items) => Value::String(items.iter().map(as_str).collect::<Vec<_>>().join(&delimiter)),
        other => other,
    }
});

pure_transform!(Concat, "CONCAT", |value, params| {
    let prefix = param_str(params, "prefix").unwrap_or_default();
    let suffix = param_str(params, "suffix").unwrap_or_default();
    Value::String(format!("{}{}{}", prefix, as_str(&value), suffix))
});

pure_transform!(Template, "TEMPLATE", |value, params| {
    let template = param_str(params, "template").unwrap_or_else(|| "{value}".to_string());
    Value::String(template.replace("{value}", &as_str(&value)))
});

pure_transform!(StripHtml, "STRIP_HTML", |value, _params| {
    let s = as_str(&value);
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for ch in s.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    Value::String(out)
});

pure_transform!(EscapeHtml, "ESCAPE_HTML", |value, _params| {
    let s = as_str(&value);
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    Value::String(out)
});

pure_transform!(TitleCase, "TITLE_CASE", |value, _params| {
    let s = as_str(&value);
    let titled: String = s
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str().to_lowercase().as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    Value::String(titled)
});

pure_transform!(SentenceCase, "SENTENCE_CASE", |value, _params| {
    let s = as_str(&value).to_lowercase();
    let mut chars = s.chars();
    let sentenced = match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    };
    Value::String(sentenced)
});

pub fn register(registry: &mut TransformRegistry) {
    registry.register(Arc::new(Trim));
    registry.register(Arc::new(Lowercase));
    registry.register(Arc::new(Uppercase));
    registry.register(Arc::new(Slugify));
    registry.register(Arc::new(Truncate));
    registry.register(Arc::new(Pad));
    registry.register(Arc::new(Replace));
    registry.register(Arc::new(RegexReplace));
    registry.register(Arc::new(RegexExtract));
    registry.register(Arc::new(Split));
    registry.register(Arc::new(Join));
    registry.register(Arc::new(Concat));
    registry.register(Arc::new(Template));
    registry.register(Arc::new(StripHtml));
    registry.register(Arc::new(EscapeHtml));
    registry.register(Arc::new(TitleCase));
    registry.register(Arc::new(SentenceCase));
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline_runtime_domain::services::entity_service::EntityService;

    struct NullEntityService;

    #[async_trait]
    impl EntityService for NullEntityService {
        async fn find_one(
            &self,
            _entity_type: &str,
            _field: &str,
            _value: &Value,
        ) -> Result<Option<pipeline_runtime_domain::services::entity_service::EntityRecord>, PipelineError> {
            Ok(None)
        }
        async fn find_all(
            &self,
            _entity_type: &str,
            _field: &str,
            _value: &Value,
        ) -> Result<Vec<pipeline_runtime_domain::services::entity_service::EntityRecord>, PipelineError> {
            Ok(vec![])
        }
        async fn create(&self, _entity_type: &str, _record: &Value) -> Result<String, PipelineError> {
            Ok(String::new())
        }
        async fn update(&self, _entity_type: &str, _id: &str, _record: &Value) -> Result<(), PipelineError> {
            Ok(())
        }
        async fn delete(&self, _entity_type: &str, _id: &str) -> Result<(), PipelineError> {
            Ok(())
        }
    }

    fn ctx() -> TransformContext {
        TransformContext {
            entity_service: Arc::new(NullEntityService),
            channel: None,
            content_language: None,
        }
    }

    #[tokio::test]
    async fn trim_removes_surrounding_whitespace() {
        let out = Trim
            .execute(&ctx(), Value::String("  hi  ".into()), None, &Value::Null)
            .await
            .unwrap();
        assert_eq!(out, Value::String("hi".into()));
    }

    #[tokio::test]
    async fn slugify_strips_punctuation() {
        let out = Slugify
            .execute(&ctx(), Value::String("Hello, World!".into()), None, &Value::Null)
            .await
            .unwrap();
        assert_eq!(out, Value::String("hello-world".into()));
    }

    #[tokio::test]
    async fn truncate_appends_suffix_only_when_shortened() {
        let params = serde_json::json!({"length": 5, "suffix": "..."});
        let out = Truncate
            .execute(&ctx(), Value::String("abcdefgh".into()), None, &params)
            .await
            .unwrap();
        assert_eq!(out, Value::String("abcde...".into()));
    }

    #[tokio::test]
    async fn regex_extract_returns_null_on_miss() {
        let params = serde_json::json!({"pattern": "^\\d+$"});
        let out = RegexExtract
            .execute(&ctx(), Value::String("not-digits".into()), None, &params)
            .await
            .unwrap();
        assert_eq!(out, Value::Null);
    }

    #[tokio::test]
    async fn title_case_capitalizes_each_word() {
        let out = TitleCase
            .execute(&ctx(), Value::String("the quick BROWN fox".into()), None, &Value::Null)
            .await
            .unwrap();
        assert_eq!(out, Value::String("The Quick Brown Fox".into()));
    }

    #[tokio::test]
    async fn replace_substitutes_every_occurrence_by_default() {
        let params = serde_json::json!({"search": "O", "replacement": "0", "global": true});
        let out = Replace
            .execute(&ctx(), Value::String("FOO".into()), None, &params)
            .await
            .unwrap();
        assert_eq!(out, Value::String("F00".into()));
    }

    #[tokio::test]
    async fn trim_uppercase_replace_chain_matches_spec_scenario() {
        let trimmed = Trim.execute(&ctx(), Value::String(" Foo ".into()), None, &Value::Null).await.unwrap();
        let uppercased = Uppercase.execute(&ctx(), trimmed, None, &Value::Null).await.unwrap();
        let params = serde_json::json!({"search": "O", "replacement": "0", "global": true});
        let replaced = Replace.execute(&ctx(), uppercased, None, &params).await.unwrap();
        assert_eq!(replaced, Value::String("F00".into()));
    }
}
