use serde_json::Value;
use std::borrow::Cow;

const PRETTY_INDENT: &str = "    ";

/// Append the `key=value` pairs for one field.
///
/// Scalars produce one pair. Nested values are flattened to dotted keys when
/// `compact`, otherwise they produce a single pair holding indented JSON on the
/// following lines.
pub fn push_pairs(
    key: &str,
    value: &Value,
    compact: bool,
    out: &mut Vec<(String, String)>,
) -> Result<(), std::fmt::Error> {
    match value {
        Value::Object(map) if !map.is_empty() => {
            if compact {
                for (k, v) in map {
                    push_pairs(&format!("{}.{}", key, k), v, compact, out)?;
                }
            } else {
                out.push((key.to_string(), pretty(value)?));
            }
        }
        Value::Array(items) if !items.is_empty() => {
            if compact {
                for (i, v) in items.iter().enumerate() {
                    push_pairs(&format!("{}.{}", key, i), v, compact, out)?;
                }
            } else {
                out.push((key.to_string(), pretty(value)?));
            }
        }
        other => out.push((key.to_string(), scalar(other))),
    }
    Ok(())
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) if needs_quotes(s) => Value::String(s.clone()).to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn needs_quotes(s: &str) -> bool {
    s.is_empty()
        || s
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || c == '=' || c == '"')
}

/// Replace control characters other than tab with their escaped form, so
/// text decoded from JSON cannot break or restyle the output line.
pub fn escape_controls(text: &str) -> Cow<'_, str> {
    if !text.chars().any(is_escaped) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        if is_escaped(c) {
            out.extend(c.escape_default());
        } else {
            out.push(c);
        }
    }
    Cow::Owned(out)
}

fn is_escaped(c: char) -> bool {
    c.is_control() && c != '\t'
}

fn pretty(value: &Value) -> Result<String, std::fmt::Error> {
    let json = serde_json::to_string_pretty(value).map_err(|_| std::fmt::Error)?;
    let mut out = String::new();
    for line in json.lines() {
        out.push('\n');
        out.push_str(PRETTY_INDENT);
        out.push_str(line);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pairs(key: &str, value: Value, compact: bool) -> Vec<(String, String)> {
        let mut out = Vec::new();
        push_pairs(key, &value, compact, &mut out).unwrap();
        out
    }

    #[test]
    fn test_scalars() {
        assert_eq!(pairs("n", json!(1.5), true), vec![("n".into(), "1.5".into())]);
        assert_eq!(pairs("s", json!("a=b"), true), vec![("s".into(), "\"a=b\"".into())]);
    }

    #[test]
    fn test_control_characters_stay_on_one_line() {
        assert_eq!(pairs("s", json!("a\nb"), true), vec![("s".into(), r#""a\nb""#.into())]);
        assert_eq!(
            pairs("s", json!("\u{1b}[31mred"), true),
            vec![("s".into(), r#""\u001b[31mred""#.into())]
        );
        assert_eq!(escape_controls("one\r\ntwo\tok"), "one\\r\\ntwo\tok");
        assert!(matches!(escape_controls("plain"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_empty_containers_stay_inline() {
        assert_eq!(pairs("o", json!({}), false), vec![("o".into(), "{}".into())]);
        assert_eq!(pairs("a", json!([]), true), vec![("a".into(), "[]".into())]);
    }

    #[test]
    fn test_deep_flatten() {
        let out = pairs("a", json!({"b": {"c": [true]}}), true);
        assert_eq!(out, vec![("a.b.c.0".into(), "true".into())]);
    }
}
