//! Settings page views.

use crate::form::{Form, FormTemplates, MultiModelForm};
use crate::html::Attributes;
use crate::model::multi_model::MultiModel;
use crate::model::option_model::OptionModel;
use crate::model::{FieldSource, FieldSpec, OptionSchema};
use serde_json::Value;

/// Renders the body of a settings page for a model of type `M`.
///
/// `page_url` is the address of the page itself; views use it for links
/// that come back to the page.
pub trait View<M> {
    fn render(&self, model: &M, page_url: &str) -> String;
}

/// Renders every schema field in declaration order inside one section.
///
/// Fields with choices render as a select, boolean defaults as a checkbox
/// and array defaults as a checkbox list; everything else is a text field.
#[derive(Debug, Clone, Default)]
pub struct FieldsView {
    pub templates: FormTemplates,
}

impl FieldsView {
    pub fn new(templates: FormTemplates) -> Self {
        Self { templates }
    }

    fn render_fields<M: FieldSource>(&self, form: &Form<'_, M>, fields: &[FieldSpec]) -> String {
        let mut output = form.begin_section("", "");
        for field in fields {
            let none = Attributes::new();
            let markup = match (&field.default, field.options.is_empty()) {
                (Value::Array(_), false) => form.checkbox_list(&field.property, &none, ""),
                (_, false) => form.select(&field.property, &none, ""),
                (Value::Bool(_), true) => form.checkbox(&field.property, &none, Some("0"), ""),
                _ => form.textfield(&field.property, &none, ""),
            };
            output.push_str(&markup);
        }
        output.push_str(&form.end_section());
        output
    }
}

impl<S: OptionSchema> View<OptionModel<S>> for FieldsView {
    fn render(&self, model: &OptionModel<S>, _page_url: &str) -> String {
        let form = Form::with_templates(model, self.templates.clone());
        let mut output = form.begin_form(&Attributes::new());
        output.push_str(&self.render_fields(&form, &model.fields()));
        output.push_str(&form.end_form());
        output
    }
}

impl<S: OptionSchema> View<MultiModel<S>> for FieldsView {
    fn render(&self, model: &MultiModel<S>, page_url: &str) -> String {
        let form = MultiModelForm::with_templates(model, page_url, self.templates.clone());
        let mut output = form.begin_form(&Attributes::new());
        output.push_str(&self.render_fields(&*form, &model.fields()));
        output.push_str(&form.end_form());
        output
    }
}
