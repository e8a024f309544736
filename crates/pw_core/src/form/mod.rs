//! Settings form rendering.
//!
//! # Responsibility
//! - Render labelled form fields for the properties of a model.
//! - Show the first validation error next to each failing field.
//!
//! # Invariants
//! - Field names are `option_name[property]`; ids derive from the name.
//! - Submitted input wins over the stored value so rejected input is
//!   shown back to the user.
//! - Every method returns markup; nothing is written to an output stream.

use crate::html::{self, Attributes};
use crate::model::FieldSource;
use crate::validator::{value_to_string, value_to_strings};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

pub mod multi_form;

pub use multi_form::MultiModelForm;

static EMPTY_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[^>/]+></[^>]+>").expect("valid empty tag regex"));

/// Markup templates used by [`Form`].
///
/// Placeholders: `{label}`, `{field}`, `{desc}`, `{extra}`, `{error}` and
/// `{error_class}` in `field`; `{content}` in the description, extra and
/// error wrappers; `{error_message_class}` in `error`; `{section_title}` and
/// `{section_description}` in `begin_section`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormTemplates {
    pub field: String,
    pub description: String,
    pub extra: String,
    pub error: String,
    pub error_class: String,
    pub error_message_class: String,
    pub begin_section: String,
    pub end_section: String,
    pub submit: String,
    /// Placed between the items of checkbox and radio lists.
    pub list_separator: String,
    /// Removes elements left without content after substitution.
    pub strip_empty_tags: bool,
}

impl Default for FormTemplates {
    fn default() -> Self {
        Self {
            field: concat!(
                r#"<div class="label">{label}</div>"#,
                r#"<div class="field {error_class}">{field}{desc}{extra}{error}</div>"#
            )
            .to_string(),
            description: r#"<span class="description">{content}</span>"#.to_string(),
            extra: r#"<div class="extra">{content}</div>"#.to_string(),
            error: r#"<div class="{error_message_class}">{content}</div>"#.to_string(),
            error_class: "pw-error".to_string(),
            error_message_class: "pw-error-message".to_string(),
            begin_section: "<h3><strong>{section_title}</strong></h3>".to_string(),
            end_section: String::new(),
            submit: r#"<p class="submit"><input class="button-primary" type="submit" value="Save" /></p>"#
                .to_string(),
            list_separator: "<br />".to_string(),
            strip_empty_tags: false,
        }
    }
}

impl FormTemplates {
    /// List layout: every field is an `<li>` inside a `<ul>` per section.
    pub fn settings_list() -> Self {
        Self {
            field: concat!(
                "<li>",
                r#"<div class="label">{label}</div>"#,
                r#"<div class="field {error_class}">{field}{desc}{extra}{error}</div>"#,
                "</li>"
            )
            .to_string(),
            begin_section: concat!(
                "<h3>{section_title}</h3>",
                "<p>{section_description}</p>",
                r#"<ul class="pw-fields">"#
            )
            .to_string(),
            end_section: "</ul>".to_string(),
            strip_empty_tags: true,
            ..Self::default()
        }
    }
}

/// Everything needed to render one property.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldData {
    pub error: Option<String>,
    pub label: String,
    pub desc: String,
    pub value: Value,
    pub name: String,
    pub id: String,
    pub options: Vec<(String, String)>,
}

/// Renders fields for any model exposing [`FieldSource`].
#[derive(Debug, Clone)]
pub struct Form<'m, M: FieldSource> {
    model: &'m M,
    templates: FormTemplates,
}

impl<'m, M: FieldSource> Form<'m, M> {
    pub fn new(model: &'m M) -> Self {
        Self::with_templates(model, FormTemplates::default())
    }

    pub fn with_templates(model: &'m M, templates: FormTemplates) -> Self {
        Self { model, templates }
    }

    pub fn model(&self) -> &'m M {
        self.model
    }

    pub fn templates(&self) -> &FormTemplates {
        &self.templates
    }

    /// Page title followed by the opening `<form>` tag.
    ///
    /// `atts` override the defaults `id` (option name), `class="pw-form"`
    /// and `method="post"`.
    pub fn begin_form(&self, atts: &Attributes) -> String {
        let mut form_atts = Attributes::new()
            .with("id", self.model.option_name())
            .with("class", "pw-form")
            .with("method", "post");
        form_atts.merge(atts);

        let mut output = self.render_title();
        output.push_str(html::tag("form", Some(""), &form_atts).trim_end_matches("</form>"));
        output
    }

    /// Submit button and closing `</form>` tag.
    pub fn end_form(&self) -> String {
        format!("{}</form>", self.templates.submit)
    }

    pub fn begin_section(&self, title: &str, desc: &str) -> String {
        let output = self
            .templates
            .begin_section
            .replace("{section_title}", title)
            .replace("{section_description}", desc);
        self.finish(output)
    }

    pub fn end_section(&self) -> String {
        self.templates.end_section.clone()
    }

    pub fn render_title(&self) -> String {
        format!("<h2>{}</h2>", self.model.title())
    }

    /// Fills the field template. Empty `desc`, `extra` and `error` leave
    /// their slots empty instead of rendering an empty wrapper.
    pub fn render_field(
        &self,
        label: &str,
        field: &str,
        desc: &str,
        extra: &str,
        error: Option<&str>,
    ) -> String {
        let templates = &self.templates;
        let wrap = |template: &str, content: &str| {
            if content.is_empty() {
                String::new()
            } else {
                template.replace("{content}", content)
            }
        };

        let error = error.unwrap_or_default();
        let error_markup = wrap(&templates.error, error)
            .replace("{error_message_class}", &templates.error_message_class);
        let error_class = if error.is_empty() {
            ""
        } else {
            templates.error_class.as_str()
        };

        let output = templates
            .field
            .replace("{label}", label)
            .replace("{field}", field)
            .replace("{desc}", &wrap(&templates.description, desc))
            .replace("{extra}", &wrap(&templates.extra, extra))
            .replace("{error}", &error_markup)
            .replace("{error_class}", error_class);
        self.finish(output)
    }

    /// Collects label, value, name and error for `property`.
    pub fn field_data(&self, property: &str) -> FieldData {
        let spec = self.model.field(property).unwrap_or_default();
        let name = format!("{}[{property}]", self.model.option_name());
        FieldData {
            error: self.model.error(property).map(str::to_string),
            label: spec.label,
            desc: spec.desc,
            value: self.model.field_value(property).cloned().unwrap_or(Value::Null),
            id: html::id_from_name(&name),
            name,
            options: spec.options,
        }
    }

    /// Checkbox whose label is the field description; the description slot
    /// stays empty. Checked when the value equals `atts["value"]` (`"1"`
    /// unless given).
    pub fn checkbox(
        &self,
        property: &str,
        atts: &Attributes,
        unchecked_value: Option<&str>,
        extra: &str,
    ) -> String {
        let data = self.field_data(property);
        let mut atts = atts.clone();
        atts.set_default("value", "1");
        let selected = atts.get("value") == Some(value_to_string(&data.value).as_str());

        let mut field = html::checkbox(&data.name, selected, &atts, unchecked_value);
        field.push_str(&html::label(&data.desc, Some(&data.id), &Attributes::new()));
        self.render_field(&data.label, &field, "", extra, data.error.as_deref())
    }

    pub fn checkbox_list(&self, property: &str, atts: &Attributes, extra: &str) -> String {
        let data = self.field_data(property);
        let field = html::checkbox_list(
            &data.name,
            &data.options,
            &value_to_strings(&data.value),
            &self.templates.list_separator,
            atts,
            html::CHOICE_TEMPLATE,
            &Attributes::new(),
        );
        self.render_field(&data.label, &field, &data.desc, extra, data.error.as_deref())
    }

    pub fn radio_button_list(&self, property: &str, atts: &Attributes, extra: &str) -> String {
        let data = self.field_data(property);
        let field = html::radio_button_list(
            &data.name,
            &data.options,
            &value_to_string(&data.value),
            &self.templates.list_separator,
            atts,
            html::CHOICE_TEMPLATE,
            &Attributes::new(),
        );
        self.render_field(&data.label, &field, &data.desc, extra, data.error.as_deref())
    }

    pub fn select(&self, property: &str, atts: &Attributes, extra: &str) -> String {
        let data = self.field_data(property);
        let field = html::select(&data.name, &data.options, &value_to_string(&data.value), atts);
        self.render_labelled(&data, &field, extra)
    }

    pub fn textarea(&self, property: &str, atts: &Attributes, extra: &str) -> String {
        let data = self.field_data(property);
        let field = html::textarea(&data.name, &value_to_string(&data.value), atts);
        self.render_labelled(&data, &field, extra)
    }

    pub fn textfield(&self, property: &str, atts: &Attributes, extra: &str) -> String {
        let data = self.field_data(property);
        let field = html::textfield(&data.name, &value_to_string(&data.value), atts);
        self.render_labelled(&data, &field, extra)
    }

    /// Password input; the stored value is never echoed.
    pub fn password(&self, property: &str, atts: &Attributes, extra: &str) -> String {
        let data = self.field_data(property);
        let field = html::password(&data.name, atts);
        self.render_labelled(&data, &field, extra)
    }

    fn render_labelled(&self, data: &FieldData, field: &str, extra: &str) -> String {
        let label = html::label(&data.label, Some(&data.id), &Attributes::new());
        self.render_field(&label, field, &data.desc, extra, data.error.as_deref())
    }

    fn finish(&self, output: String) -> String {
        if self.templates.strip_empty_tags {
            EMPTY_TAG_RE.replace_all(&output, "").into_owned()
        } else {
            output
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Form, FormTemplates};
    use crate::html::Attributes;
    use crate::model::{FieldSource, FieldSpec};
    use serde_json::{json, Value};

    struct Stub {
        value: Value,
        error: Option<String>,
    }

    impl FieldSource for Stub {
        fn option_name(&self) -> &str {
            "demo"
        }

        fn title(&self) -> &str {
            "Demo"
        }

        fn field(&self, property: &str) -> Option<FieldSpec> {
            Some(FieldSpec::new(property).label("Name").desc("Your name"))
        }

        fn error(&self, _property: &str) -> Option<&str> {
            self.error.as_deref()
        }

        fn field_value(&self, _property: &str) -> Option<&Value> {
            Some(&self.value)
        }
    }

    #[test]
    fn render_field_skips_empty_wrappers() {
        let stub = Stub {
            value: json!(""),
            error: None,
        };
        let form = Form::new(&stub);
        assert_eq!(
            form.render_field("L", "F", "", "", None),
            r#"<div class="label">L</div><div class="field ">F</div>"#
        );
    }

    #[test]
    fn render_field_marks_errors() {
        let stub = Stub {
            value: json!(""),
            error: None,
        };
        let form = Form::new(&stub);
        let output = form.render_field("L", "F", "D", "", Some("Bad"));
        assert!(output.contains(r#"<div class="field pw-error">"#));
        assert!(output.contains(r#"<span class="description">D</span>"#));
        assert!(output.contains(r#"<div class="pw-error-message">Bad</div>"#));
    }

    #[test]
    fn settings_list_strips_empty_elements() {
        let stub = Stub {
            value: json!(""),
            error: None,
        };
        let form = Form::with_templates(&stub, FormTemplates::settings_list());
        assert_eq!(
            form.begin_section("General", ""),
            r#"<h3>General</h3><ul class="pw-fields">"#
        );
        assert_eq!(
            form.render_field("", "F", "", "", None),
            r#"<li><div class="field ">F</div></li>"#
        );
    }

    #[test]
    fn textfield_uses_prefixed_name_and_value() {
        let stub = Stub {
            value: json!("Ann"),
            error: Some("Too short".to_string()),
        };
        let output = Form::new(&stub).textfield("name", &Attributes::new(), "");
        assert!(output.contains(r#"<label for="demo_name">Name</label>"#));
        assert!(output.contains(r#"name="demo[name]""#));
        assert!(output.contains(r#"value="Ann""#));
        assert!(output.contains("Too short"));
    }

    #[test]
    fn begin_form_applies_defaults_and_overrides() {
        let stub = Stub {
            value: json!(""),
            error: None,
        };
        let output = Form::new(&stub).begin_form(&Attributes::new().with("method", "get"));
        assert_eq!(
            output,
            r#"<h2>Demo</h2><form id="demo" class="pw-form" method="get">"#
        );
    }
}
