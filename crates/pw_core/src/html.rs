//! HTML helpers for programmatically creating markup.
//!
//! # Responsibility
//! - Build escaped tags from a name, optional inner markup and attributes.
//! - Provide form-field shortcuts (checkbox, select, radio lists, ...).
//!
//! # Invariants
//! - Attribute values are always escaped; inner markup is never escaped.
//! - Attribute order is insertion order; re-setting a key keeps its slot.
//! - `None` inner markup renders a self-closing tag.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// Schemes kept by [`sanitize_url`]; anything else empties the value.
const ALLOWED_URL_SCHEMES: &[&str] = &[
    "http", "https", "ftp", "ftps", "mailto", "news", "irc", "gopher", "nntp", "feed", "telnet",
    "mms", "rtsp", "svn", "tel", "fax", "xmpp",
];
/// Default per-item layout for checkbox and radio lists.
pub const CHOICE_TEMPLATE: &str = "{input}{label}";
/// Attributes whose values are treated as URLs.
const URL_ATTRIBUTES: &[&str] = &["cite", "codebase", "href", "src"];

static URL_DISALLOWED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^a-zA-Z0-9\-~+_.?#=!&;,/:%@$|*'()\[\]\x{80}-\x{10FFFF}]")
        .expect("valid url charset regex")
});

/// Ordered set of HTML attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes(Vec<(String, String)>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`Attributes::set`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Sets `key`, replacing an existing value in place.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(existing, _)| *existing == key) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key, value)),
        }
        self
    }

    /// Sets `key` only when it is not present yet.
    pub fn set_default(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let key = key.into();
        if !self.contains(&key) {
            self.0.push((key, value.into()));
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Overlays `other` on top of `self`; keys from `other` win.
    pub fn merge(&mut self, other: &Attributes) -> &mut Self {
        for (key, value) in other.iter() {
            self.set(key, value);
        }
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut String> {
        self.0.iter_mut().map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut atts = Attributes::new();
        for (key, value) in iter {
            atts.set(key, value);
        }
        atts
    }
}

/// Renders one element.
///
/// `text: None` produces `<name />`, `Some("")` produces `<name></name>`.
pub fn tag(name: &str, text: Option<&str>, atts: &Attributes) -> String {
    let name = escape_tag_name(name);
    let mut output = format!("<{name}");

    for (property, value) in atts.iter() {
        let property = normalize_attribute_name(property);
        let value = if URL_ATTRIBUTES.contains(&property.as_str()) {
            sanitize_url(value)
        } else {
            value.to_string()
        };
        let value = html_escape::encode_quoted_attribute(&value);
        output.push_str(&format!(" {property}=\"{value}\""));
    }

    match text {
        Some(text) => output.push_str(&format!(">{text}</{name}>")),
        None => output.push_str(" />"),
    }
    output
}

/// Converts a field name such as `Post[author][name]` into `Post_author_name`.
pub fn id_from_name(name: &str) -> String {
    name.replace("[]", "")
        .replace("][", "_")
        .replace('[', "_")
        .replace(']', "")
}

/// Renders a checkbox, optionally preceded by a hidden input carrying the
/// value submitted when the box is left unchecked.
pub fn checkbox(
    name: &str,
    selected: bool,
    atts: &Attributes,
    unchecked_value: Option<&str>,
) -> String {
    let mut atts = atts.clone();
    atts.set("name", name);
    atts.set("id", id_from_name(name));
    atts.set("type", "checkbox");
    atts.set_default("value", "1");
    if selected {
        atts.set("checked", "checked");
    }

    let mut output = match unchecked_value.filter(|value| !value.is_empty()) {
        Some(value) => tag("input", None, &hidden_attributes(name, value)),
        None => String::new(),
    };
    output.push_str(&tag("input", None, &atts));
    output
}

/// Renders one checkbox per item; `name` always ends up with a `[]` suffix.
///
/// `template` places each item's `{input}` and `{label}`.
pub fn checkbox_list(
    name: &str,
    items: &[(String, String)],
    selected: &[String],
    separator: &str,
    atts: &Attributes,
    template: &str,
    label_atts: &Attributes,
) -> String {
    let name = if name.ends_with("[]") {
        name.to_string()
    } else {
        format!("{name}[]")
    };

    let mut base = atts.clone();
    base.set("name", name.as_str());
    base.set("type", "checkbox");

    choice_list(&name, items, &base, template, label_atts, |value| {
        selected.iter().any(|candidate| candidate == value)
    })
    .join(separator)
}

/// Renders one radio button per item; at most one matches `selected`.
pub fn radio_button_list(
    name: &str,
    items: &[(String, String)],
    selected: &str,
    separator: &str,
    atts: &Attributes,
    template: &str,
    label_atts: &Attributes,
) -> String {
    let mut base = atts.clone();
    base.set("name", name);
    base.set("type", "radio");

    choice_list(name, items, &base, template, label_atts, |value| {
        value == selected
    })
    .join(separator)
}

fn choice_list(
    name: &str,
    items: &[(String, String)],
    base: &Attributes,
    template: &str,
    label_atts: &Attributes,
    is_checked: impl Fn(&str) -> bool,
) -> Vec<String> {
    let id_prefix = id_from_name(name);
    items
        .iter()
        .enumerate()
        .map(|(index, (value, label))| {
            let id = format!("{id_prefix}_{index}");
            let mut item_atts = base.clone();
            item_atts.set("id", id.as_str());
            item_atts.set("value", value.as_str());
            if is_checked(value) {
                item_atts.set("checked", "checked");
            }
            let mut item_label_atts = label_atts.clone();
            item_label_atts.set("for", id);

            template
                .replace("{input}", &tag("input", None, &item_atts))
                .replace("{label}", &tag("label", Some(label.as_str()), &item_label_atts))
        })
        .collect()
}

pub fn label(text: &str, for_id: Option<&str>, atts: &Attributes) -> String {
    let mut atts = atts.clone();
    if let Some(for_id) = for_id.filter(|value| !value.is_empty()) {
        atts.set("for", for_id);
    }
    tag("label", Some(text), &atts)
}

pub fn link(href: &str, text: &str, atts: &Attributes) -> String {
    let mut atts = atts.clone();
    atts.set("href", href);
    tag("a", Some(text), &atts)
}

pub fn password(name: &str, atts: &Attributes) -> String {
    let mut atts = atts.clone();
    atts.set("type", "password");
    atts.set("name", name);
    atts.set("id", id_from_name(name));
    tag("input", None, &atts)
}

/// Renders a `<select>`; the option whose value equals `selected` is marked.
pub fn select(name: &str, items: &[(String, String)], selected: &str, atts: &Attributes) -> String {
    let mut atts = atts.clone();
    atts.set("name", name);
    atts.set("id", id_from_name(name));

    let options: String = items
        .iter()
        .map(|(value, text)| {
            let mut option_atts = Attributes::new().with("value", value.as_str());
            if value == selected {
                option_atts.set("selected", "selected");
            }
            tag("option", Some(text.as_str()), &option_atts)
        })
        .collect();

    tag("select", Some(options.as_str()), &atts)
}

pub fn textfield(name: &str, value: &str, atts: &Attributes) -> String {
    let mut atts = atts.clone();
    atts.set("type", "text");
    atts.set("name", name);
    atts.set("value", value);
    atts.set("id", id_from_name(name));
    tag("input", None, &atts)
}

/// Renders a `<textarea>`; unlike other helpers the content is escaped.
pub fn textarea(name: &str, value: &str, atts: &Attributes) -> String {
    let mut atts = atts.clone();
    atts.set("name", name);
    atts.set("id", id_from_name(name));
    let content = html_escape::encode_text(value);
    tag("textarea", Some(content.as_ref()), &atts)
}

pub fn hidden(name: &str, value: &str) -> String {
    tag("input", None, &hidden_attributes(name, value))
}

fn hidden_attributes(name: &str, value: &str) -> Attributes {
    Attributes::new()
        .with("type", "hidden")
        .with("value", value)
        .with("name", name)
}

fn escape_tag_name(name: &str) -> String {
    name.to_ascii_lowercase()
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | ':' | '-'))
        .collect()
}

fn normalize_attribute_name(name: &str) -> String {
    name.to_ascii_lowercase()
        .chars()
        .filter(|ch| ch.is_ascii_lowercase())
        .collect()
}

/// Strips characters that never belong in a URL and empties values using a
/// scheme outside [`ALLOWED_URL_SCHEMES`]. Relative URLs pass through.
pub fn sanitize_url(value: &str) -> String {
    let cleaned = URL_DISALLOWED_RE.replace_all(value.trim(), "").into_owned();
    if cleaned.is_empty() || !has_scheme(&cleaned) {
        return cleaned;
    }

    match Url::parse(&cleaned) {
        Ok(parsed) if ALLOWED_URL_SCHEMES.contains(&parsed.scheme()) => cleaned,
        _ => String::new(),
    }
}

fn has_scheme(value: &str) -> bool {
    let Some(colon) = value.find(':') else {
        return false;
    };
    !value[..colon].contains(['/', '?', '#'])
}

#[cfg(test)]
mod tests {
    use super::{
        checkbox, checkbox_list, id_from_name, sanitize_url, select, tag, Attributes,
        CHOICE_TEMPLATE,
    };

    #[test]
    fn tag_renders_self_closing_and_empty_forms() {
        assert_eq!(tag("br", None, &Attributes::new()), "<br />");
        assert_eq!(tag("p", Some(""), &Attributes::new()), "<p></p>");
    }

    #[test]
    fn tag_escapes_values_and_normalizes_names() {
        let atts = Attributes::new()
            .with("Data-Title", "a \"quoted\" <b>")
            .with("class", "x");
        let html = tag("DIV", Some("inner"), &atts);
        assert_eq!(
            html,
            "<div datatitle=\"a &quot;quoted&quot; &lt;b&gt;\" class=\"x\">inner</div>"
        );
    }

    #[test]
    fn set_keeps_original_position() {
        let mut atts = Attributes::new().with("a", "1").with("b", "2");
        atts.set("a", "3");
        let pairs: Vec<_> = atts.iter().collect();
        assert_eq!(pairs, vec![("a", "3"), ("b", "2")]);
    }

    #[test]
    fn id_from_name_flattens_brackets() {
        assert_eq!(id_from_name("Post[author][name]"), "Post_author_name");
        assert_eq!(id_from_name("opts[tags][]"), "opts_tags");
    }

    #[test]
    fn sanitize_url_rejects_script_scheme() {
        assert_eq!(sanitize_url("javascript:alert(1)"), "");
        assert_eq!(sanitize_url(" https://example.com/a b "), "https://example.com/ab");
        assert_eq!(
            sanitize_url("options-general.php?page=demo"),
            "options-general.php?page=demo"
        );
    }

    #[test]
    fn checkbox_list_suffixes_name_and_checks_selected() {
        let items = vec![
            ("a".to_string(), "A".to_string()),
            ("b".to_string(), "B".to_string()),
        ];
        let html = checkbox_list(
            "o[t]",
            &items,
            &["b".to_string()],
            "<br />",
            &Attributes::new(),
            CHOICE_TEMPLATE,
            &Attributes::new(),
        );
        assert_eq!(
            html,
            concat!(
                r#"<input name="o[t][]" type="checkbox" id="o_t_0" value="a" /><label for="o_t_0">A</label>"#,
                "<br />",
                r#"<input name="o[t][]" type="checkbox" id="o_t_1" value="b" checked="checked" /><label for="o_t_1">B</label>"#
            )
        );
    }

    #[test]
    fn checkbox_emits_hidden_unchecked_value() {
        let html = checkbox("o[on]", false, &Attributes::new(), Some("0"));
        assert_eq!(
            html,
            concat!(
                r#"<input type="hidden" value="0" name="o[on]" />"#,
                r#"<input name="o[on]" id="o_on" type="checkbox" value="1" />"#
            )
        );
    }

    #[test]
    fn select_marks_matching_option() {
        let items = vec![
            ("r".to_string(), "Red".to_string()),
            ("g".to_string(), "Green".to_string()),
        ];
        assert_eq!(
            select("o[c]", &items, "g", &Attributes::new()),
            concat!(
                r#"<select name="o[c]" id="o_c">"#,
                r#"<option value="r">Red</option>"#,
                r#"<option value="g" selected="selected">Green</option>"#,
                "</select>"
            )
        );
    }
}
