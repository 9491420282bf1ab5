//! Input sanitization.
//!
//! Two independent passes run over JSON bodies and query strings before any
//! route handler sees them:
//! - operator stripping: keys that start with `$` or contain `.` are removed
//!   so request data cannot smuggle query operators into database filters;
//! - markup escaping: `<` and `>` in string values become `&lt;` / `&gt;`.

use std::borrow::Cow;

use serde_json::Value;
use url::form_urlencoded;

/// True for keys that would be read as a query operator or a nested path.
pub fn is_operator_key(key: &str) -> bool {
    key.starts_with('$') || key.contains('.')
}

/// Remove operator keys from every object in `value`, recursively.
///
/// Returns the number of keys removed.
pub fn strip_operator_keys(value: &mut Value) -> usize {
    match value {
        Value::Object(map) => {
            let before = map.len();
            map.retain(|key, _| !is_operator_key(key));
            let removed = before - map.len();
            removed + map.values_mut().map(strip_operator_keys).sum::<usize>()
        }
        Value::Array(items) => items.iter_mut().map(strip_operator_keys).sum(),
        _ => 0,
    }
}

/// Escape angle brackets so the text cannot open an HTML element.
pub fn escape_markup(input: &str) -> Cow<'_, str> {
    if !input.contains(['<', '>']) {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len() + 8);
    for c in input.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Escape markup in every string value of `value`, recursively.
///
/// Object keys are left alone. Returns the number of strings changed.
pub fn escape_json_strings(value: &mut Value) -> usize {
    match value {
        Value::String(s) => match escape_markup(s) {
            Cow::Owned(escaped) => {
                *s = escaped;
                1
            }
            Cow::Borrowed(_) => 0,
        },
        Value::Object(map) => map.values_mut().map(escape_json_strings).sum(),
        Value::Array(items) => items.iter_mut().map(escape_json_strings).sum(),
        _ => 0,
    }
}

/// Drop query parameters whose key, or any bracketed segment of it
/// (`price[$gt]`), is an operator key.
///
/// Returns `None` when nothing was removed.
pub fn strip_query_operators(query: &str) -> Option<String> {
    rewrite_query(query, |key, _| {
        let is_operator = key
            .split(['[', ']'])
            .filter(|segment| !segment.is_empty())
            .any(is_operator_key);
        if is_operator {
            QueryEdit::Drop
        } else {
            QueryEdit::Keep
        }
    })
}

/// Escape markup in query parameter values.
///
/// Returns `None` when nothing was escaped.
pub fn escape_query(query: &str) -> Option<String> {
    rewrite_query(query, |_, value| match escape_markup(value) {
        Cow::Owned(escaped) => QueryEdit::Replace(escaped),
        Cow::Borrowed(_) => QueryEdit::Keep,
    })
}

enum QueryEdit {
    Keep,
    Drop,
    Replace(String),
}

fn rewrite_query<F>(query: &str, mut edit: F) -> Option<String>
where
    F: FnMut(&str, &str) -> QueryEdit,
{
    let mut changed = false;
    let mut serializer = form_urlencoded::Serializer::new(String::new());

    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        match edit(&*key, &*value) {
            QueryEdit::Keep => {
                serializer.append_pair(&key, &value);
            }
            QueryEdit::Drop => changed = true,
            QueryEdit::Replace(new_value) => {
                changed = true;
                serializer.append_pair(&key, &new_value);
            }
        }
    }

    changed.then(|| serializer.finish())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_operator_keys() {
        assert!(is_operator_key("$where"));
        assert!(is_operator_key("profile.role"));
        assert!(!is_operator_key("email"));
        assert!(!is_operator_key("price$"));
    }

    #[test]
    fn test_strip_operator_keys_nested() {
        let mut body = json!({
            "email": "dev@example.com",
            "password": { "$ne": null },
            "filters": [{ "salary.min": 1, "$or": [], "location": "Berlin" }],
        });

        assert_eq!(strip_operator_keys(&mut body), 3);
        assert_eq!(
            body,
            json!({
                "email": "dev@example.com",
                "password": {},
                "filters": [{ "location": "Berlin" }],
            })
        );
    }

    #[test]
    fn test_escape_markup() {
        assert_eq!(
            escape_markup("<script>alert(1)</script>"),
            "&lt;script&gt;alert(1)&lt;/script&gt;"
        );
        assert!(matches!(escape_markup("plain text"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_escape_json_strings_leaves_other_types() {
        let mut body = json!({
            "title": "<img src=x onerror=alert(1)>",
            "salary": 5000,
            "remote": true,
            "tags": ["rust", "<b>backend</b>"],
        });

        assert_eq!(escape_json_strings(&mut body), 2);
        assert_eq!(body["title"], "&lt;img src=x onerror=alert(1)&gt;");
        assert_eq!(body["salary"], 5000);
        assert_eq!(body["tags"][1], "&lt;b&gt;backend&lt;/b&gt;");
        assert!(!body.to_string().contains('<'));
    }

    #[test]
    fn test_strip_query_operators() {
        let stripped = strip_query_operators("status=open&salary%5B%24gt%5D=10&a.b=1").unwrap();
        assert_eq!(stripped, "status=open");
        assert_eq!(strip_query_operators("page=2&limit=10"), None);
    }

    #[test]
    fn test_escape_query() {
        let escaped = escape_query("search=%3Cscript%3E&page=1").unwrap();
        let pairs: Vec<(String, String)> = form_urlencoded::parse(escaped.as_bytes())
            .into_owned()
            .collect();
        assert_eq!(pairs[0], ("search".to_string(), "&lt;script&gt;".to_string()));
        assert_eq!(pairs[1], ("page".to_string(), "1".to_string()));
        assert_eq!(escape_query("search=rust"), None);
    }
}
