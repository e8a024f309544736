//! Single-option model.
//!
//! # Responsibility
//! - Load one named option, creating it from defaults when absent.
//! - Validate submitted values and persist them only when valid.
//!
//! # Invariants
//! - A failed `save` never writes to the repository.
//! - A successful `save` clears every recorded error.

use super::{
    add_error, first_error, validate_option, ErrorMap, FieldSource, FieldSpec, ModelError,
    OptionMap, OptionSchema,
};
use crate::repo::option_repo::OptionRepository;
use log::{info, warn};
use serde_json::Value;

/// Option bundle bound to its schema.
#[derive(Debug, Clone)]
pub struct OptionModel<S: OptionSchema> {
    schema: S,
    option: OptionMap,
    errors: ErrorMap,
    /// Values submitted with the current request; the form prefers these
    /// over stored values so rejected input is shown back to the user.
    pub input: OptionMap,
}

impl<S: OptionSchema> OptionModel<S> {
    /// Loads the stored option merged with defaults, storing the defaults
    /// first when the option does not exist.
    pub fn load(schema: S, repo: &impl OptionRepository) -> Result<Self, ModelError> {
        let name = schema.name().trim();
        if name.is_empty() {
            return Err(ModelError::MissingName);
        }

        let option = match repo.get_option(name)? {
            Some(Value::Object(stored)) if !stored.is_empty() => schema.merge_with_defaults(&stored),
            Some(other) => {
                if !other.is_object() {
                    warn!("event=option_load module=model status=ignored name={name} reason=not_an_object");
                }
                schema.defaults()
            }
            None => {
                let defaults = schema.defaults();
                repo.add_option(name, &Value::Object(defaults.clone()), schema.autoload())?;
                info!("event=option_create module=model status=ok name={name}");
                defaults
            }
        };

        Ok(Self {
            schema,
            option,
            errors: ErrorMap::new(),
            input: OptionMap::new(),
        })
    }

    pub fn schema(&self) -> &S {
        &self.schema
    }

    pub fn name(&self) -> &str {
        self.schema.name()
    }

    pub fn title(&self) -> &str {
        self.schema.title()
    }

    pub fn fields(&self) -> Vec<FieldSpec> {
        self.schema.fields()
    }

    /// Current (stored, merged) option value.
    pub fn option(&self) -> &OptionMap {
        &self.option
    }

    pub fn get(&self, property: &str) -> Option<&Value> {
        self.option.get(property)
    }

    /// Updates an existing property in memory. Unknown properties are
    /// ignored and `false` is returned.
    pub fn set(&mut self, property: &str, value: impl Into<Value>) -> bool {
        match self.option.get_mut(property) {
            Some(slot) => {
                *slot = value.into();
                true
            }
            None => false,
        }
    }

    pub fn errors(&self) -> &ErrorMap {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Records an error unless the property already has one.
    pub fn add_error(&mut self, property: &str, message: impl Into<String>) {
        add_error(&mut self.errors, property, message);
    }

    /// Runs every rule against `option`; errors accumulate on the model.
    pub fn validate(&mut self, option: &OptionMap) -> bool {
        validate_option(&self.schema, option, &mut self.errors)
    }

    /// First error for a single property, leaving the model untouched.
    pub fn validate_property(&self, property: &str, value: &Value) -> Option<String> {
        first_error(&self.schema, property, value)
    }

    /// Validates and persists `option`; returns whether it was saved.
    pub fn save(
        &mut self,
        repo: &impl OptionRepository,
        option: &OptionMap,
    ) -> Result<bool, ModelError> {
        if !self.validate(option) {
            info!(
                "event=option_save module=model status=invalid name={} errors={}",
                self.name(),
                self.errors.len()
            );
            return Ok(false);
        }

        let merged = self.schema.merge_with_defaults(option);
        repo.update_option(self.schema.name(), &Value::Object(merged.clone()))?;
        self.errors.clear();
        self.option = merged;
        info!("event=option_save module=model status=ok name={}", self.name());
        Ok(true)
    }
}

impl<S: OptionSchema> FieldSource for OptionModel<S> {
    fn option_name(&self) -> &str {
        self.schema.name()
    }

    fn title(&self) -> &str {
        self.schema.title()
    }

    fn field(&self, property: &str) -> Option<FieldSpec> {
        self.schema.field(property)
    }

    fn error(&self, property: &str) -> Option<&str> {
        self.errors.get(property).map(String::as_str)
    }

    fn field_value(&self, property: &str) -> Option<&Value> {
        self.input
            .get(property)
            .or_else(|| self.option.get(property))
    }
}
