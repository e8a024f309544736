//! Controller for multi-instance settings pages.
//!
//! The `_instance` query argument picks the instance shown. A `GET` with
//! `delete_instance` removes it; a `POST` with `_instance` in the body saves
//! the submitted fields into that instance (`0` creates a new one).

use super::{
    parse_option_fields, settings_page_url, validate_submitted, ControllerError,
    ControllerResult, Request, RequestOutcome, View, DEFAULT_ADMIN_PAGE, INVALID_MESSAGE,
    SAVED_MESSAGE,
};
use crate::alerts::AlertQueue;
use crate::form::multi_form::INSTANCE_KEY;
use crate::model::multi_model::{MultiModel, NEW_INSTANCE};
use crate::model::OptionSchema;
use crate::query::{add_query_arg, remove_query_args};
use crate::repo::option_repo::OptionRepository;
use log::{info, warn};

/// Query argument that turns a request into a delete.
pub const DELETE_KEY: &str = "delete_instance";

#[derive(Debug)]
pub struct MultiModelController<S: OptionSchema, R: OptionRepository> {
    model: MultiModel<S>,
    repo: R,
    alerts: AlertQueue,
    admin_page: String,
}

impl<S: OptionSchema, R: OptionRepository> MultiModelController<S, R> {
    pub fn new(schema: S, repo: R) -> ControllerResult<Self> {
        let model = MultiModel::load(schema, &repo)?;
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

    pub fn model(&self) -> &MultiModel<S> {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut MultiModel<S> {
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

    pub fn page_url(&self) -> String {
        settings_page_url(&self.admin_page, self.model.name())
    }

    /// Selects the requested instance, then handles a delete or a save.
    ///
    /// Redirects go to the referer, falling back to the page itself.
    pub fn process_request(&mut self, request: &Request) -> ControllerResult<RequestOutcome> {
        let instance = parse_instance(request.query_value(INSTANCE_KEY));
        if self.model.set_instance(instance).is_err() {
            warn!(
                "event=request_process module=controller status=not_found name={} instance={instance}",
                self.model.name()
            );
            return Err(ControllerError::PageNotFound(instance));
        }
        let referer = request.referer.clone().unwrap_or_else(|| self.page_url());

        if request.query_value(DELETE_KEY).is_some() && request.query_value(INSTANCE_KEY).is_some() {
            self.model.delete_instance(&self.repo, instance)?;
            self.alerts.updated(format!(
                "<p><strong>{} Instance Deleted</strong></p>",
                self.model.singular_title()
            ));
            return Ok(RequestOutcome::Redirect(remove_query_args(
                &referer,
                &[INSTANCE_KEY, DELETE_KEY],
            )));
        }

        if !request.is_post() {
            return Ok(RequestOutcome::Idle);
        }
        let (Some(input), Some(target)) = (
            parse_option_fields(&request.body, self.model.name()),
            request.body_value(INSTANCE_KEY),
        ) else {
            return Ok(RequestOutcome::Idle);
        };
        let target = parse_instance(Some(target));

        self.model.input = input.clone();
        let Some(saved) = self.model.save(&self.repo, &input, target)? else {
            self.alerts.error(INVALID_MESSAGE);
            return Ok(RequestOutcome::Invalid);
        };
        // The saved instance may not be the one on screen.
        self.model.input.clear();
        self.alerts.updated(SAVED_MESSAGE);
        info!(
            "event=request_process module=controller status=saved name={} instance={saved}",
            self.model.name()
        );

        if target == NEW_INSTANCE {
            return Ok(RequestOutcome::Redirect(add_query_arg(
                &referer,
                INSTANCE_KEY,
                &saved.to_string(),
            )));
        }
        Ok(RequestOutcome::Saved)
    }

    pub fn validate_field(&self, request: &Request) -> Option<String> {
        validate_submitted(request, self.model.name(), |property, value| {
            self.model.validate_property(property, value)
        })
    }

    pub fn render_settings_page(&mut self, view: &impl View<MultiModel<S>>) -> String {
        let mut output = self.alerts.render();
        output.push_str(&view.render(&self.model, &self.page_url()));
        output
    }
}

/// Non-numeric ids select the new-instance template.
fn parse_instance(value: Option<&str>) -> u64 {
    value
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(NEW_INSTANCE)
}
