//! Zen-Coding style markup expansion.
//!
//! # Responsibility
//! - Expand CSS-like selectors (`ul.tabs>li*3`) into nested markup.
//! - Bind positional arguments to element content and attributes.
//!
//! # Grammar
//! A selector is a chain of elements separated by `>`; each element is
//! `tag#id.class.class[key=value ...]*count{%N}`, every part optional.
//! - a missing tag means `div`;
//! - `*count` repeats the element, flattening `ZenArg::List` arguments to the
//!   current iteration and numbering `$` runs in attribute values;
//! - `{%N}` merges the N-th argument (1-based) into the attributes when it is
//!   `ZenArg::Attrs`.
//!
//! The innermost element receives the last argument as content when it is
//! non-empty text; otherwise it is rendered self-closing.
//!
//! # Invariants
//! - An empty element selector expands to nothing (`None`).
//! - Expansion is pure: no state survives between calls.

use crate::html::{self, Attributes};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

static ELEMENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"([^\[\{%#*\.]+)?(#[^\[\{%*\.]+)?(\.[^\[\{%*]+)?(\[[^\[\{%*]+\])?(\*[0-9]+)?(\{%[0-9]+\})?",
    )
    .expect("valid zen element regex")
});
static ATTRIBUTE_PAIR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([\w-]+)=([\w-]+)").expect("valid zen attribute regex"));
static DOLLAR_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$+").expect("valid zen numbering regex"));

const DEFAULT_TAG: &str = "div";

/// Positional argument for [`expand`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZenArg {
    /// Element content.
    Text(String),
    /// Attributes merged through a `{%N}` reference.
    Attrs(Attributes),
    /// One value per iteration of a repeated element; the last value is
    /// reused when the list is shorter than the repetition count.
    List(Vec<ZenArg>),
}

impl ZenArg {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn list<T: Into<ZenArg>>(values: impl IntoIterator<Item = T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

impl From<&str> for ZenArg {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ZenArg {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Attributes> for ZenArg {
    fn from(value: Attributes) -> Self {
        Self::Attrs(value)
    }
}

/// Parsed form of one element in the selector chain.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ElementSelector {
    name: String,
    atts: Attributes,
    iterations: Option<usize>,
    arg_index: Option<usize>,
}

/// Expands `selector` into markup, or `None` when the selector names no
/// element.
pub fn expand(selector: &str, args: &[ZenArg]) -> Option<String> {
    let expanded = expand_chain(Some(selector), args);
    if expanded.is_none() {
        debug!("event=zen_expand module=zen status=no_match selector={selector}");
    }
    expanded
}

/// Expands `selector` with a single text argument; no match yields `""`.
pub fn expand_text(selector: &str, text: &str) -> String {
    expand(selector, &[ZenArg::text(text)]).unwrap_or_default()
}

fn expand_chain(selector: Option<&str>, args: &[ZenArg]) -> Option<String> {
    let Some(selector) = selector else {
        return leaf_content(args);
    };

    let (root, children) = match selector.split_once('>') {
        Some((root, children)) => (root, Some(children)),
        None => (selector, None),
    };
    let element = parse_element(root)?;

    let Some(iterations) = element.iterations else {
        let mut atts = element.atts.clone();
        if let Some(ZenArg::Attrs(extra)) = referenced_arg(args, element.arg_index) {
            atts.merge(extra);
        }
        let inner = expand_chain(children, args);
        return Some(html::tag(&element.name, inner.as_deref(), &atts));
    };

    let mut output = String::new();
    for index in 0..iterations {
        let iteration_args = flatten_args(args, index);

        let mut atts = element.atts.clone();
        if let Some(ZenArg::Attrs(extra)) = referenced_arg(&iteration_args, element.arg_index) {
            atts.merge(extra);
        }
        for value in atts.values_mut() {
            *value = number_value(value, index);
        }

        let inner = expand_chain(children, &iteration_args);
        output.push_str(&html::tag(&element.name, inner.as_deref(), &atts));
    }
    Some(output)
}

fn parse_element(root: &str) -> Option<ElementSelector> {
    if root.is_empty() {
        return None;
    }
    let caps = ELEMENT_RE.captures(root)?;

    let name = caps
        .get(1)
        .map(|m| m.as_str())
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_TAG)
        .to_string();

    let mut atts = Attributes::new();
    if let Some(id) = caps.get(2) {
        atts.set("id", &id.as_str()[1..]);
    }
    if let Some(classes) = caps.get(3) {
        atts.set("class", classes.as_str()[1..].replace('.', " "));
    }
    if let Some(block) = caps.get(4) {
        for pair in ATTRIBUTE_PAIR_RE.captures_iter(block.as_str()) {
            atts.set(&pair[1], &pair[2]);
        }
    }

    let iterations = caps
        .get(5)
        .and_then(|count| count.as_str()[1..].parse::<usize>().ok());
    let arg_index = caps.get(6).and_then(|reference| {
        let digits = reference.as_str().trim_start_matches("{%").trim_end_matches('}');
        digits.parse::<usize>().ok()
    });

    Some(ElementSelector {
        name,
        atts,
        iterations,
        arg_index,
    })
}

fn leaf_content(args: &[ZenArg]) -> Option<String> {
    match args.last() {
        Some(ZenArg::Text(text)) if !text.is_empty() => Some(text.clone()),
        _ => None,
    }
}

/// `{%0}` refers to the selector itself and never binds an argument.
fn referenced_arg(args: &[ZenArg], arg_index: Option<usize>) -> Option<&ZenArg> {
    match arg_index {
        Some(index) if index > 0 => args.get(index - 1),
        _ => None,
    }
}

/// Replaces every list argument with its value for iteration `index`.
fn flatten_args(args: &[ZenArg], index: usize) -> Vec<ZenArg> {
    args.iter()
        .map(|arg| match arg {
            ZenArg::List(items) => items
                .get(index)
                .or_else(|| items.last())
                .cloned()
                .unwrap_or_else(|| ZenArg::Text(String::new())),
            other => other.clone(),
        })
        .collect()
}

/// Replaces the first `$` run (and every identical run) with the 1-based
/// iteration number, zero-padded to the run length.
fn number_value(value: &str, index: usize) -> String {
    match DOLLAR_RUN_RE.find(value) {
        Some(run) => {
            let width = run.as_str().len();
            let formatted = format!("{:0>width$}", index + 1);
            value.replace(run.as_str(), &formatted)
        }
        None => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{number_value, parse_element, Attributes};

    #[test]
    fn parse_element_reads_every_part() {
        let element = parse_element("a#main.nav.top[target=_blank rel=nofollow]*3{%2}").unwrap();
        assert_eq!(element.name, "a");
        assert_eq!(
            element.atts,
            Attributes::new()
                .with("id", "main")
                .with("class", "nav top")
                .with("target", "_blank")
                .with("rel", "nofollow")
        );
        assert_eq!(element.iterations, Some(3));
        assert_eq!(element.arg_index, Some(2));
    }

    #[test]
    fn parse_element_defaults_to_div() {
        let element = parse_element(".box").unwrap();
        assert_eq!(element.name, "div");
        assert_eq!(element.atts.get("class"), Some("box"));
        assert!(parse_element("").is_none());
    }

    #[test]
    fn number_value_pads_to_run_length() {
        assert_eq!(number_value("item-$", 0), "item-1");
        assert_eq!(number_value("item-$$$", 11), "item-012");
        assert_eq!(number_value("a$$-b$$-c$", 1), "a02-b02-c$");
        assert_eq!(number_value("plain", 4), "plain");
    }
}
