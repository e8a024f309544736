//! Query-string helpers for relative admin URLs.
//!
//! Works on relative references such as `options-general.php?page=demo`,
//! which `url::Url` cannot parse on its own; only the query component is
//! rewritten and the path and fragment are kept verbatim.

use url::form_urlencoded;

/// Decodes `a=1&b=two` into ordered key/value pairs.
pub fn parse_query(query: &str) -> Vec<(String, String)> {
    form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
        .into_owned()
        .collect()
}

/// Returns `url` with `key` set to `value`, replacing earlier values.
pub fn add_query_arg(url: &str, key: &str, value: &str) -> String {
    rewrite_query(url, |pairs| {
        match pairs.iter_mut().find(|(existing, _)| existing == key) {
            Some(pair) => pair.1 = value.to_string(),
            None => pairs.push((key.to_string(), value.to_string())),
        }
        pairs.retain({
            let mut seen = false;
            move |(existing, _)| {
                if existing != key {
                    return true;
                }
                let keep = !seen;
                seen = true;
                keep
            }
        });
    })
}

/// Returns `url` without any of `keys`.
pub fn remove_query_args(url: &str, keys: &[&str]) -> String {
    rewrite_query(url, |pairs| {
        pairs.retain(|(existing, _)| !keys.contains(&existing.as_str()));
    })
}

fn rewrite_query(url: &str, edit: impl FnOnce(&mut Vec<(String, String)>)) -> String {
    let (without_fragment, fragment) = match url.split_once('#') {
        Some((head, fragment)) => (head, Some(fragment)),
        None => (url, None),
    };
    let (path, query) = without_fragment
        .split_once('?')
        .unwrap_or((without_fragment, ""));

    let mut pairs = parse_query(query);
    edit(&mut pairs);

    let mut rewritten = path.to_string();
    if !pairs.is_empty() {
        let encoded = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs.iter())
            .finish();
        rewritten.push('?');
        rewritten.push_str(&encoded);
    }
    if let Some(fragment) = fragment {
        rewritten.push('#');
        rewritten.push_str(fragment);
    }
    rewritten
}

#[cfg(test)]
mod tests {
    use super::{add_query_arg, parse_query, remove_query_args};

    #[test]
    fn add_query_arg_appends_or_replaces() {
        assert_eq!(
            add_query_arg("options-general.php?page=demo", "_instance", "3"),
            "options-general.php?page=demo&_instance=3"
        );
        assert_eq!(
            add_query_arg("admin.php?_instance=1&page=x#top", "_instance", "2"),
            "admin.php?_instance=2&page=x#top"
        );
        assert_eq!(add_query_arg("admin.php", "a", "b c"), "admin.php?a=b+c");
    }

    #[test]
    fn remove_query_args_drops_every_match() {
        assert_eq!(
            remove_query_args(
                "admin.php?page=x&_instance=4&delete_instance=1",
                &["_instance", "delete_instance"]
            ),
            "admin.php?page=x"
        );
        assert_eq!(remove_query_args("admin.php?_instance=4", &["_instance"]), "admin.php");
    }

    #[test]
    fn parse_query_decodes_pairs() {
        assert_eq!(
            parse_query("?a=1&b=two%20words"),
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "two words".to_string())
            ]
        );
    }
}
