//! Settings page controllers.
//!
//! # Responsibility
//! - Map a submitted [`Request`] onto a model: save, delete, validate.
//! - Queue the notices shown above the settings page.
//! - Render the page through a [`View`].
//!
//! # Invariants
//! - Nothing is written unless the submission names the controller's option.
//! - Alerts are drained by `render_settings_page`.

use crate::alerts::AlertQueue;
use crate::model::option_model::OptionModel;
use crate::model::{ModelError, OptionSchema};
use crate::repo::option_repo::OptionRepository;
use log::{debug, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod multi_controller;
pub mod request;
pub mod view;

pub use multi_controller::MultiModelController;
pub use request::{parse_option_fields, Method, Request};
pub use view::{FieldsView, View};

/// Admin page settings pages hang off unless configured otherwise.
pub const DEFAULT_ADMIN_PAGE: &str = "options-general.php";

/// What a processed request did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    /// Nothing was submitted.
    Idle,
    Saved,
    /// Submitted values failed validation; errors are on the model.
    Invalid,
    /// The caller should redirect to this URL and stop rendering.
    Redirect(String),
}

#[derive(Debug)]
pub enum ControllerError {
    /// The requested instance does not exist.
    PageNotFound(u64),
    Model(ModelError),
}

impl Display for ControllerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PageNotFound(instance) => {
                write!(f, "Oops, this page doesn't exist. (instance {instance})")
            }
            Self::Model(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ControllerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Model(err) => Some(err),
            Self::PageNotFound(_) => None,
        }
    }
}

impl From<ModelError> for ControllerError {
    fn from(value: ModelError) -> Self {
        Self::Model(value)
    }
}

pub type ControllerResult<T> = Result<T, ControllerError>;

pub(crate) const SAVED_MESSAGE: &str = "<p><strong>Settings Saved</strong></p>";
pub(crate) const INVALID_MESSAGE: &str =
    "<p><strong>Settings not saved. Please correct the highlighted fields.</strong></p>";

/// Controller for a single-option settings page.
#[derive(Debug)]
pub struct ModelController<S: OptionSchema, R: OptionRepository> {
    model: OptionModel<S>,
    repo: R,
    alerts: AlertQueue,
    admin_page: String,
}

impl<S: OptionSchema, R: OptionRepository> ModelController<S, R> {
    /// Loads the model for `schema` from `repo`.
    pub fn new(schema: S, repo: R) -> ControllerResult<Self> {
        let model = OptionModel::load(schema, &repo)?;
        Ok(Self {
            model,
            repo,
            alerts: AlertQueue::new(),
            admin_page: DEFAULT_ADMIN_PAGE.to_string(),
        })
    }

    pub fn with_admin_page(mut self, admin_page: impl Into<String>) -> Self {
        self.admin_page = admin_page.into();
        self
    }

    pub fn model(&self) -> &OptionModel<S> {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut OptionModel<S> {
        &mut self.model
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn alerts(&self) -> &AlertQueue {
        &self.alerts
    }

    pub fn alerts_mut(&mut self) -> &mut AlertQueue {
        &mut self.alerts
    }

    /// `admin_page?page=option_name`.
    pub fn page_url(&self) -> String {
        settings_page_url(&self.admin_page, self.model.name())
    }

    /// Saves the option when the request posts fields for it.
    pub fn process_request(&mut self, request: &Request) -> ControllerResult<RequestOutcome> {
        if !request.is_post() {
            return Ok(RequestOutcome::Idle);
        }
        let Some(input) = parse_option_fields(&request.body, self.model.name()) else {
            debug!(
                "event=request_process module=controller status=skipped name={} reason=not_submitted",
                self.model.name()
            );
            return Ok(RequestOutcome::Idle);
        };

        self.model.input = input.clone();
        if self.model.save(&self.repo, &input)? {
            self.alerts.updated(SAVED_MESSAGE);
            info!(
                "event=request_process module=controller status=saved name={}",
                self.model.name()
            );
            Ok(RequestOutcome::Saved)
        } else {
            self.alerts.error(INVALID_MESSAGE);
            Ok(RequestOutcome::Invalid)
        }
    }

    /// First error for the fields submitted with a single-field
    /// validation request, or `None` when they are valid.
    pub fn validate_field(&self, request: &Request) -> Option<String> {
        validate_submitted(request, self.model.name(), |property, value| {
            self.model.validate_property(property, value)
        })
    }

    /// Pending alerts followed by the view's markup.
    pub fn render_settings_page(&mut self, view: &impl View<OptionModel<S>>) -> String {
        let mut output = self.alerts.render();
        output.push_str(&view.render(&self.model, &self.page_url()));
        output
    }
}

pub(crate) fn settings_page_url(admin_page: &str, option_name: &str) -> String {
    crate::query::add_query_arg(admin_page, "page", option_name)
}

/// Runs `check` over the option fields found in the query, then the body.
pub(crate) fn validate_submitted(
    request: &Request,
    option_name: &str,
    check: impl Fn(&str, &serde_json::Value) -> Option<String>,
) -> Option<String> {
    let fields = parse_option_fields(&request.query, option_name)
        .or_else(|| parse_option_fields(&request.body, option_name))?;
    fields
        .iter()
        .find_map(|(property, value)| check(property, value))
}

#[cfg(test)]
mod tests {
    use super::{ControllerError, RequestOutcome, DEFAULT_ADMIN_PAGE};
    use crate::model::ModelError;

    #[test]
    fn page_not_found_message_names_instance() {
        let err = ControllerError::PageNotFound(7);
        assert!(err.to_string().contains("instance 7"));
        assert!(std::error::Error::source(&err).is_none());
    }

    #[test]
    fn model_errors_convert() {
        let err: ControllerError = ModelError::MissingName.into();
        assert!(matches!(err, ControllerError::Model(ModelError::MissingName)));
        assert_ne!(RequestOutcome::Saved, RequestOutcome::Invalid);
        assert_eq!(DEFAULT_ADMIN_PAGE, "options-general.php");
    }
}
