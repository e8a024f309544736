//! Building blocks for settings pages: option models persisted through a
//! repository, form rendering bound to those models, request controllers,
//! an alert queue, HTML helpers and a Zen Coding style markup expander.

pub mod alerts;
pub mod controller;
pub mod db;
pub mod form;
pub mod html;
pub mod logging;
pub mod model;
pub mod query;
pub mod repo;
pub mod validator;
pub mod zen;

pub use alerts::{Alert, AlertQueue};
pub use controller::{
    ControllerError, ControllerResult, FieldsView, ModelController, MultiModelController,
    Request, RequestOutcome, View,
};
pub use db::{open_db, open_db_in_memory, StoreError, StoreLocation, StoreResult};
pub use form::{Form, FormTemplates, MultiModelForm};
pub use html::Attributes;
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::multi_model::{MultiModel, MultiOption, NEW_INSTANCE};
pub use model::option_model::OptionModel;
pub use model::schema::SchemaDefinition;
pub use model::{FieldSource, FieldSpec, ModelError, OptionMap, OptionSchema, ValidationRule};
pub use repo::option_repo::{
    MemoryOptionRepository, OptionRepository, RepoError, RepoResult, SqliteOptionRepository,
    StoredOption,
};
pub use zen::{expand, expand_text, ZenArg};

/// Returns the framework version.
pub fn framework_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::framework_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!framework_version().is_empty());
    }
}
