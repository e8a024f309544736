//! Data-driven option schema.
//!
//! Lets an option be declared in JSON instead of a hand-written
//! `OptionSchema` implementation:
//!
//! ```json
//! {
//!   "name": "site_contact",
//!   "title": "Contact Settings",
//!   "fields": [
//!     { "property": "email", "label": "E-mail", "default": "" }
//!   ],
//!   "rules": [
//!     { "attributes": "email", "validator": "required" },
//!     { "attributes": "email", "validator": "email" }
//!   ]
//! }
//! ```

use super::{FieldSpec, OptionSchema, ValidationRule};
use crate::validator::{self, Validator};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Built-in validators addressable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidatorKind {
    Required,
    Email,
}

impl ValidatorKind {
    pub fn validator(self) -> Validator {
        match self {
            Self::Required => validator::required,
            Self::Email => validator::email,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceDefinition {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub property: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub options: Vec<ChoiceDefinition>,
    #[serde(default)]
    pub default: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDefinition {
    pub attributes: String,
    pub validator: ValidatorKind,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDefinition {
    pub name: String,
    pub title: String,
    #[serde(default)]
    pub singular_title: String,
    #[serde(default = "default_autoload")]
    pub autoload: bool,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
    #[serde(default)]
    pub rules: Vec<RuleDefinition>,
}

fn default_autoload() -> bool {
    true
}

impl SchemaDefinition {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

impl OptionSchema for SchemaDefinition {
    fn name(&self) -> &str {
        &self.name
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn singular_title(&self) -> &str {
        &self.singular_title
    }

    fn autoload(&self) -> bool {
        self.autoload
    }

    fn fields(&self) -> Vec<FieldSpec> {
        self.fields
            .iter()
            .map(|field| FieldSpec {
                property: field.property.clone(),
                label: field.label.clone(),
                desc: field.desc.clone(),
                options: field
                    .options
                    .iter()
                    .map(|choice| (choice.value.clone(), choice.label.clone()))
                    .collect(),
                default: field.default.clone(),
            })
            .collect()
    }

    fn rules(&self) -> Vec<ValidationRule> {
        self.rules
            .iter()
            .map(|rule| ValidationRule {
                attributes: rule.attributes.clone(),
                validator: rule.validator.validator(),
                message: rule.message.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{SchemaDefinition, ValidatorKind};
    use crate::model::OptionSchema;
    use serde_json::json;

    #[test]
    fn definition_parses_with_defaults() {
        let schema = SchemaDefinition::from_json(
            r#"{
                "name": "demo",
                "title": "Demo",
                "fields": [
                    {"property": "color", "options": [{"value": "r", "label": "Red"}], "default": "r"},
                    {"property": "note"}
                ],
                "rules": [{"attributes": "note", "validator": "required"}]
            }"#,
        )
        .unwrap();

        assert!(schema.autoload);
        assert_eq!(schema.rules[0].validator, ValidatorKind::Required);
        let defaults = schema.defaults();
        assert_eq!(defaults.get("color"), Some(&json!("r")));
        assert_eq!(defaults.get("note"), Some(&json!("")));
        assert_eq!(
            schema.field("color").unwrap().options,
            vec![("r".to_string(), "Red".to_string())]
        );
    }

    #[test]
    fn unknown_validator_is_rejected() {
        let err = SchemaDefinition::from_json(
            r#"{"name": "x", "title": "X", "rules": [{"attributes": "a", "validator": "nope"}]}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("unknown variant"));
    }
}
