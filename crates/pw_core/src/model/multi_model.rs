//! Multi-instance option model.
//!
//! The stored option holds many instances of the same property bundle:
//!
//! ```json
//! {
//!   "0": { "slug": "", "title": "" },
//!   "1": { "slug": "home", "title": "Home" },
//!   "auto_id": 2
//! }
//! ```
//!
//! # Invariants
//! - Instance `0` is the new-instance template and always exists.
//! - `auto_id` is greater than every stored instance id.
//! - Every instance is merged with the schema defaults on load and save.

use super::{
    add_error, first_error, validate_option, ErrorMap, FieldSource, FieldSpec, ModelError,
    OptionMap, OptionSchema,
};
use crate::repo::option_repo::OptionRepository;
use crate::validator::value_to_string;
use log::{info, warn};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Id of the new-instance template.
pub const NEW_INSTANCE: u64 = 0;

const AUTO_ID_KEY: &str = "auto_id";
const LABEL_PROPERTY: &str = "slug";

/// Decoded multi-instance option.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiOption {
    pub instances: BTreeMap<u64, OptionMap>,
    pub auto_id: u64,
}

impl MultiOption {
    /// Fresh option holding only the template instance.
    pub fn new(defaults: OptionMap) -> Self {
        Self {
            instances: BTreeMap::from([(NEW_INSTANCE, defaults)]),
            auto_id: 1,
        }
    }

    /// Decodes the stored shape, merging every instance with defaults.
    ///
    /// Keys that are neither instance ids nor `auto_id` are dropped.
    pub fn from_value<S: OptionSchema + ?Sized>(value: &Value, schema: &S) -> Self {
        let mut option = Self::new(schema.defaults());
        let Some(stored) = value.as_object() else {
            warn!(
                "event=multi_option_decode module=model status=ignored name={} reason=not_an_object",
                schema.name()
            );
            return option;
        };

        let mut auto_id = None;
        for (key, entry) in stored {
            if key == AUTO_ID_KEY {
                auto_id = entry.as_u64();
                continue;
            }
            match (key.parse::<u64>(), entry.as_object()) {
                // The largest id would leave no successor for `auto_id`.
                (Ok(u64::MAX), Some(_)) => warn!(
                    "event=multi_option_decode module=model status=skipped name={} key={key} reason=id_out_of_range",
                    schema.name()
                ),
                (Ok(id), Some(instance)) => {
                    option
                        .instances
                        .insert(id, schema.merge_with_defaults(instance));
                }
                _ => warn!(
                    "event=multi_option_decode module=model status=skipped name={} key={key}",
                    schema.name()
                ),
            }
        }

        let next_free = option
            .instances
            .keys()
            .next_back()
            .map_or(1, |max| max.saturating_add(1));
        option.auto_id = auto_id.unwrap_or(next_free).max(next_free);
        option
    }

    /// Encodes into the stored shape.
    pub fn to_value(&self) -> Value {
        let mut stored = Map::new();
        for (id, instance) in &self.instances {
            stored.insert(id.to_string(), Value::Object(instance.clone()));
        }
        stored.insert(AUTO_ID_KEY.to_string(), Value::from(self.auto_id));
        Value::Object(stored)
    }

    /// Stored instance ids, excluding the template.
    pub fn instance_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.instances
            .keys()
            .copied()
            .filter(|id| *id != NEW_INSTANCE)
    }
}

/// Multi-instance option bound to its schema and a current instance.
#[derive(Debug, Clone)]
pub struct MultiModel<S: OptionSchema> {
    schema: S,
    option: MultiOption,
    instance: u64,
    errors: ErrorMap,
    /// Values submitted with the current request.
    pub input: OptionMap,
}

impl<S: OptionSchema> MultiModel<S> {
    /// Loads the stored option, creating the template-only option when
    /// absent. The current instance starts at the template.
    pub fn load(schema: S, repo: &impl OptionRepository) -> Result<Self, ModelError> {
        let name = schema.name().trim();
        if name.is_empty() {
            return Err(ModelError::MissingName);
        }

        let option = match repo.get_option(name)? {
            Some(stored) => MultiOption::from_value(&stored, &schema),
            None => {
                let option = MultiOption::new(schema.defaults());
                repo.add_option(name, &option.to_value(), schema.autoload())?;
                info!("event=option_create module=model status=ok name={name} kind=multi");
                option
            }
        };

        Ok(Self {
            schema,
            option,
            instance: NEW_INSTANCE,
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

    /// Singular heading, falling back to the title.
    pub fn singular_title(&self) -> &str {
        match self.schema.singular_title() {
            "" => self.schema.title(),
            singular => singular,
        }
    }

    pub fn fields(&self) -> Vec<FieldSpec> {
        self.schema.fields()
    }

    pub fn option(&self) -> &MultiOption {
        &self.option
    }

    pub fn instance(&self) -> u64 {
        self.instance
    }

    /// Selects the instance forms read from. Unknown ids are rejected.
    pub fn set_instance(&mut self, instance: u64) -> Result<(), ModelError> {
        if !self.option.instances.contains_key(&instance) {
            return Err(ModelError::UnknownInstance(instance));
        }
        self.instance = instance;
        Ok(())
    }

    /// Whether the current instance is the new-instance template.
    pub fn is_new(&self) -> bool {
        self.instance == NEW_INSTANCE
    }

    pub fn instance_option(&self, instance: u64) -> Option<&OptionMap> {
        self.option.instances.get(&instance)
    }

    pub fn current_option(&self) -> Option<&OptionMap> {
        self.instance_option(self.instance)
    }

    /// Tab label for an instance: its `slug`, or `#id` when blank.
    pub fn instance_label(&self, instance: u64) -> String {
        self.instance_option(instance)
            .and_then(|option| option.get(LABEL_PROPERTY))
            .map(value_to_string)
            .filter(|label| !label.is_empty())
            .unwrap_or_else(|| format!("#{instance}"))
    }

    pub fn errors(&self) -> &ErrorMap {
        &self.errors
    }

    pub fn add_error(&mut self, property: &str, message: impl Into<String>) {
        add_error(&mut self.errors, property, message);
    }

    pub fn validate(&mut self, option: &OptionMap) -> bool {
        validate_option(&self.schema, option, &mut self.errors)
    }

    pub fn validate_property(&self, property: &str, value: &Value) -> Option<String> {
        first_error(&self.schema, property, value)
    }

    /// Validates and stores `input` as `instance`.
    ///
    /// Saving the template allocates a new id from `auto_id`. Returns the id
    /// written, or `None` when validation failed.
    pub fn save(
        &mut self,
        repo: &impl OptionRepository,
        input: &OptionMap,
        instance: u64,
    ) -> Result<Option<u64>, ModelError> {
        if instance != NEW_INSTANCE && !self.option.instances.contains_key(&instance) {
            return Err(ModelError::UnknownInstance(instance));
        }
        if !self.validate(input) {
            info!(
                "event=option_save module=model status=invalid name={} instance={instance}",
                self.name()
            );
            return Ok(None);
        }

        let mut option = self.option.clone();
        let id = if instance == NEW_INSTANCE {
            let id = option.auto_id;
            option.auto_id = id
                .checked_add(1)
                .ok_or_else(|| ModelError::InstanceIdsExhausted(self.name().to_string()))?;
            id
        } else {
            instance
        };
        option
            .instances
            .insert(id, self.schema.merge_with_defaults(input));

        repo.update_option(self.schema.name(), &option.to_value())?;
        self.option = option;
        self.errors.clear();
        info!(
            "event=option_save module=model status=ok name={} instance={id}",
            self.name()
        );
        Ok(Some(id))
    }

    /// Removes a stored instance. The template cannot be deleted.
    pub fn delete_instance(
        &mut self,
        repo: &impl OptionRepository,
        instance: u64,
    ) -> Result<(), ModelError> {
        if instance == NEW_INSTANCE {
            return Err(ModelError::ProtectedInstance);
        }
        if !self.option.instances.contains_key(&instance) {
            return Err(ModelError::UnknownInstance(instance));
        }

        let mut option = self.option.clone();
        option.instances.remove(&instance);
        repo.update_option(self.schema.name(), &option.to_value())?;
        self.option = option;
        if self.instance == instance {
            self.instance = NEW_INSTANCE;
        }
        info!(
            "event=option_instance_delete module=model status=ok name={} instance={instance}",
            self.name()
        );
        Ok(())
    }
}

impl<S: OptionSchema> FieldSource for MultiModel<S> {
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
            .or_else(|| self.current_option()?.get(property))
    }
}
