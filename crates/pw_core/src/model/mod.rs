//! Option models: named bundles of property values merged against defaults.
//!
//! # Responsibility
//! - Describe an option through `OptionSchema` (fields, defaults, rules).
//! - Load, validate and save single (`OptionModel`) and multi-instance
//!   (`MultiModel`) options through an `OptionRepository`.
//!
//! # Invariants
//! - After merging, the keys of an option equal the keys of its defaults.
//! - Only the first validation error per property is kept.

use crate::repo::option_repo::RepoError;
use crate::validator::Validator;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod multi_model;
pub mod option_model;
pub mod schema;

/// Property name to value, in declaration order.
pub type OptionMap = Map<String, Value>;

/// Property name to first validation message.
pub type ErrorMap = BTreeMap<String, String>;

/// Errors raised while loading or persisting models.
#[derive(Debug)]
pub enum ModelError {
    /// The schema returned an empty option name.
    MissingName,
    /// A multi-model instance id that is not stored.
    UnknownInstance(u64),
    /// Instance `0` is the new-instance template and cannot be deleted.
    ProtectedInstance,
    /// `auto_id` has no successor, so no new instance can be created.
    InstanceIdsExhausted(String),
    Repo(RepoError),
}

impl Display for ModelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingName => write!(f, "option schema must declare a non-empty name"),
            Self::UnknownInstance(id) => write!(f, "option instance not found: {id}"),
            Self::ProtectedInstance => write!(f, "the new-instance template cannot be deleted"),
            Self::InstanceIdsExhausted(name) => {
                write!(f, "option `{name}` has no free instance ids left")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ModelError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ModelError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Display metadata and default for one property.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSpec {
    pub property: String,
    pub label: String,
    /// Help text; HTML allowed.
    pub desc: String,
    /// Value/label pairs for select, radio and checkbox-list fields.
    pub options: Vec<(String, String)>,
    /// `Value::Null` means "no default" and stores an empty string.
    pub default: Value,
}

impl FieldSpec {
    pub fn new(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            ..Self::default()
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = desc.into();
        self
    }

    pub fn options<V: Into<String>, L: Into<String>>(
        mut self,
        options: impl IntoIterator<Item = (V, L)>,
    ) -> Self {
        self.options = options
            .into_iter()
            .map(|(value, label)| (value.into(), label.into()))
            .collect();
        self
    }

    pub fn default_value(mut self, default: impl Into<Value>) -> Self {
        self.default = default.into();
        self
    }
}

/// One validation rule applied to a comma-separated list of properties.
#[derive(Debug, Clone)]
pub struct ValidationRule {
    /// Comma-separated property names; spaces are ignored.
    pub attributes: String,
    pub validator: Validator,
    /// Replaces the validator's own message when set.
    pub message: Option<String>,
}

impl ValidationRule {
    pub fn new(attributes: impl Into<String>, validator: Validator) -> Self {
        Self {
            attributes: attributes.into(),
            validator,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Property names this rule covers.
    pub fn properties(&self) -> Vec<String> {
        self.attributes
            .replace(' ', "")
            .split(',')
            .filter(|property| !property.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Runs the rule against one value, returning the final message.
    pub fn check(&self, property: &str, value: &Value) -> Option<String> {
        let error = (self.validator)(value)?;
        let message = self.message.clone().unwrap_or(error);
        Some(message.replace("{attribute}", property))
    }
}

/// Declares one persisted option.
///
/// Only `name` and `title` are required; everything else has a default
/// derived from `fields`.
pub trait OptionSchema {
    /// Storage key and form field prefix.
    fn name(&self) -> &str;

    /// Page heading.
    fn title(&self) -> &str;

    /// Heading for one multi-model instance; empty falls back to `title`.
    fn singular_title(&self) -> &str {
        ""
    }

    fn autoload(&self) -> bool {
        true
    }

    fn fields(&self) -> Vec<FieldSpec> {
        Vec::new()
    }

    fn field(&self, property: &str) -> Option<FieldSpec> {
        self.fields()
            .into_iter()
            .find(|field| field.property == property)
    }

    fn defaults(&self) -> OptionMap {
        self.fields()
            .into_iter()
            .map(|field| {
                let default = match field.default {
                    Value::Null => Value::String(String::new()),
                    other => other,
                };
                (field.property, default)
            })
            .collect()
    }

    fn rules(&self) -> Vec<ValidationRule> {
        Vec::new()
    }

    /// Override for custom merging.
    fn merge_with_defaults(&self, option: &OptionMap) -> OptionMap {
        merge_with_defaults(option, &self.defaults())
    }
}

/// Read access the form renderer needs from a model.
pub trait FieldSource {
    /// Form field prefix, i.e. the option name.
    fn option_name(&self) -> &str;
    fn title(&self) -> &str;
    fn field(&self, property: &str) -> Option<FieldSpec>;
    fn error(&self, property: &str) -> Option<&str>;
    /// Submitted input when present, otherwise the stored value.
    fn field_value(&self, property: &str) -> Option<&Value>;
}

/// Takes every default key, preferring the value from `option`.
///
/// Keys of `option` missing from `defaults` are dropped.
pub fn merge_with_defaults(option: &OptionMap, defaults: &OptionMap) -> OptionMap {
    defaults
        .iter()
        .map(|(key, default)| {
            let value = option.get(key).unwrap_or(default).clone();
            (key.clone(), value)
        })
        .collect()
}

/// Applies every rule of `schema` to `option`, recording first errors.
pub(crate) fn validate_option<S: OptionSchema + ?Sized>(
    schema: &S,
    option: &OptionMap,
    errors: &mut ErrorMap,
) -> bool {
    let mut valid = true;
    for rule in schema.rules() {
        for property in rule.properties() {
            let value = option.get(&property).unwrap_or(&Value::Null);
            if let Some(message) = rule.check(&property, value) {
                add_error(errors, &property, message);
                valid = false;
            }
        }
    }
    valid
}

/// First error any rule reports for `property`.
pub(crate) fn first_error<S: OptionSchema + ?Sized>(
    schema: &S,
    property: &str,
    value: &Value,
) -> Option<String> {
    schema
        .rules()
        .iter()
        .filter(|rule| rule.properties().iter().any(|p| p == property))
        .find_map(|rule| rule.check(property, value))
}

pub(crate) fn add_error(errors: &mut ErrorMap, property: &str, message: impl Into<String>) {
    errors
        .entry(property.to_string())
        .or_insert_with(|| message.into());
}
