//! Decoded page request.
//!
//! Carries only what the controllers read: the method, the query and body
//! pairs, and the referring page used for redirects.

use crate::model::OptionMap;
use crate::query::parse_query;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Get,
    Post,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Request {
    pub method: Method,
    pub query: Vec<(String, String)>,
    pub body: Vec<(String, String)>,
    pub referer: Option<String>,
}

impl Request {
    /// `GET` request from an urlencoded query string; a leading `?` is
    /// accepted.
    pub fn from_query_string(query: &str) -> Self {
        Self {
            query: parse_query(query),
            ..Self::default()
        }
    }

    /// Turns the request into a `POST` carrying the urlencoded `body`.
    pub fn with_body(mut self, body: &str) -> Self {
        self.method = Method::Post;
        self.body = parse_query(body);
        self
    }

    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self
    }

    pub fn is_post(&self) -> bool {
        self.method == Method::Post
    }

    /// Last value submitted for `key` in the query string.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        last_value(&self.query, key)
    }

    /// Last value submitted for `key` in the body.
    pub fn body_value(&self, key: &str) -> Option<&str> {
        last_value(&self.body, key)
    }
}

fn last_value<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .rev()
        .find(|(existing, _)| existing == key)
        .map(|(_, value)| value.as_str())
}

/// Collects the `option_name[property]` fields of a submission.
///
/// `option_name[property][]` fields become arrays. Returns `None` when no
/// field belongs to `option_name`, which means the option was not
/// submitted at all.
pub fn parse_option_fields(pairs: &[(String, String)], option_name: &str) -> Option<OptionMap> {
    let prefix = format!("{option_name}[");
    let mut fields = OptionMap::new();
    let mut matched = false;

    for (key, value) in pairs {
        let Some(rest) = key.strip_prefix(&prefix) else {
            continue;
        };
        if let Some(property) = rest.strip_suffix("][]") {
            matched = true;
            let slot = fields
                .entry(property.to_string())
                .or_insert_with(|| Value::Array(Vec::new()));
            match slot {
                Value::Array(items) => items.push(Value::String(value.clone())),
                other => *other = Value::Array(vec![Value::String(value.clone())]),
            }
        } else if let Some(property) = rest.strip_suffix(']') {
            if property.contains(['[', ']']) {
                continue;
            }
            matched = true;
            fields.insert(property.to_string(), Value::String(value.clone()));
        }
    }

    matched.then_some(fields)
}
