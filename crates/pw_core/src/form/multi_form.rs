//! Form for multi-instance options.
//!
//! Adds a hidden `_instance` input and one tab per stored instance to the
//! plain [`Form`]; field values come from the model's current instance.

use super::{Form, FormTemplates};
use crate::html::{self, Attributes};
use crate::model::multi_model::MultiModel;
use crate::model::OptionSchema;
use crate::query::{add_query_arg, remove_query_args};
use crate::zen::{self, ZenArg};
use std::ops::Deref;

/// Query and form key carrying the selected instance id.
pub const INSTANCE_KEY: &str = "_instance";

const FORM_ID: &str = "pw-mm-form";

#[derive(Debug, Clone)]
pub struct MultiModelForm<'m, S: OptionSchema> {
    form: Form<'m, MultiModel<S>>,
    page_url: String,
}

impl<'m, S: OptionSchema> MultiModelForm<'m, S> {
    /// `page_url` is the settings page address tabs link back to, e.g.
    /// `options-general.php?page=menus`.
    pub fn new(model: &'m MultiModel<S>, page_url: impl Into<String>) -> Self {
        Self::with_templates(model, page_url, FormTemplates::default())
    }

    pub fn with_templates(
        model: &'m MultiModel<S>,
        page_url: impl Into<String>,
        templates: FormTemplates,
    ) -> Self {
        Self {
            form: Form::with_templates(model, templates),
            page_url: page_url.into(),
        }
    }

    pub fn instance(&self) -> u64 {
        self.form.model().instance()
    }

    /// Title, opening `<form id="pw-mm-form">`, the hidden instance input
    /// and the instance tabs.
    pub fn begin_form(&self, atts: &Attributes) -> String {
        let mut atts = atts.clone();
        atts.set("id", FORM_ID);

        let mut output = self.form.begin_form(&atts);
        output.push_str(&html::hidden(INSTANCE_KEY, &self.instance().to_string()));
        output.push_str(&self.render_tabs());
        output
    }

    pub fn end_form(&self) -> String {
        self.form.end_form()
    }

    /// `ul.tabs` with one link per stored instance and a trailing `+` tab
    /// for the new-instance template.
    pub fn render_tabs(&self) -> String {
        let model = self.form.model();
        let current = model.instance();

        let mut tabs: Vec<String> = model
            .option()
            .instance_ids()
            .map(|id| {
                let href = add_query_arg(&self.page_url, INSTANCE_KEY, &id.to_string());
                let label = html_escape::encode_text(&model.instance_label(id)).into_owned();
                html::link(&href, &label, &tab_attributes(id == current))
            })
            .collect();
        let href = remove_query_args(&self.page_url, &[INSTANCE_KEY]);
        tabs.push(html::link(&href, "+", &tab_attributes(model.is_new())));

        let selector = format!("ul.tabs>li*{}", tabs.len());
        zen::expand(&selector, &[ZenArg::list(tabs)]).unwrap_or_default()
    }
}

impl<'m, S: OptionSchema> Deref for MultiModelForm<'m, S> {
    type Target = Form<'m, MultiModel<S>>;

    fn deref(&self) -> &Self::Target {
        &self.form
    }
}

fn tab_attributes(selected: bool) -> Attributes {
    if selected {
        Attributes::new().with("class", "selected")
    } else {
        Attributes::new()
    }
}
