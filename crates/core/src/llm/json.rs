use crate::llm::LlmError;
use serde_json::Value;

/// Recovers a JSON value from free-form model output.
///
/// The whole text is parsed first. Failing that, every `{` / `[` is tried in
/// order as the start of a balanced object or array, and finally the span from
/// the first opener to the last matching closer is tried. Best-effort only.
pub fn extract(raw: &str) -> Result<Value, LlmError> {
    extract_where(raw, |_| true)
}

/// Like [`extract`], but skips recovered values `accept` rejects. Grounded
/// answers often carry `[1]` style citation markers ahead of the payload.
pub fn extract_where(raw: &str, accept: impl Fn(&Value) -> bool) -> Result<Value, LlmError> {
    let parse = |text: &str| serde_json::from_str::<Value>(text).ok().filter(|v| accept(v));

    let trimmed = raw.trim();
    if let Some(value) = parse(trimmed) {
        return Ok(value);
    }

    for (start, opener) in trimmed.char_indices().filter(|(_, c)| is_opener(*c)) {
        let Some(end) = balanced_end(trimmed, start, opener) else {
            continue;
        };
        if let Some(value) = parse(&trimmed[start..=end]) {
            return Ok(value);
        }
    }

    if let Some(value) = greedy_span(trimmed).and_then(parse) {
        return Ok(value);
    }

    Err(LlmError::malformed(
        "no JSON object or array could be recovered",
        raw,
    ))
}

fn is_opener(c: char) -> bool {
    c == '{' || c == '['
}

fn closer_for(opener: char) -> char {
    if opener == '{' {
        '}'
    } else {
        ']'
    }
}

/// Byte index of the closer matching the opener at `start`, skipping string
/// literals. `None` if the structure never closes.
fn balanced_end(text: &str, start: usize, opener: char) -> Option<usize> {
    let closer = closer_for(opener);
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            c if c == opener => depth += 1,
            c if c == closer => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(start + offset);
                }
            }
            _ => {}
        }
    }
    None
}

/// First opener through the last occurrence of its closer.
fn greedy_span(text: &str) -> Option<&str> {
    let start = text.find(is_opener)?;
    let opener = text[start..].chars().next()?;
    let end = text.rfind(closer_for(opener))?;
    if end <= start {
        return None;
    }
    Some(&text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn valid_json_matches_direct_parse() {
        for s in [r#"{"a":1,"b":[1,2]}"#, "[1, 2, 3]", "  {\"x\": null}\n", "42", "\"text\""] {
            let direct: Value = serde_json::from_str(s.trim()).unwrap();
            assert_eq!(extract(s).unwrap(), direct);
        }
    }

    #[test]
    fn recovers_object_wrapped_in_prose() {
        let s = "Here is the analysis you asked for: {\"signal\":\"BUY\",\"price\":\"$1\"} Hope it helps.";
        assert_eq!(extract(s).unwrap(), json!({"signal": "BUY", "price": "$1"}));
    }

    #[test]
    fn recovers_fenced_array() {
        let s = "```json\n[{\"symbol\":\"NVDA\"},{\"symbol\":\"ENI.MI\"}]\n```";
        assert_eq!(
            extract(s).unwrap(),
            json!([{"symbol": "NVDA"}, {"symbol": "ENI.MI"}])
        );
    }

    #[test]
    fn braces_inside_strings_do_not_confuse_matching() {
        let s = "note: {\"reasoning\":\"range {low} to [high\",\"n\":2} trailing } noise";
        assert_eq!(
            extract(s).unwrap(),
            json!({"reasoning": "range {low} to [high", "n": 2})
        );
    }

    #[test]
    fn skips_balanced_non_json_prefix_groups() {
        let s = "see {draft} then {\"ok\":true}";
        assert_eq!(extract(s).unwrap(), json!({"ok": true}));
    }

    #[test]
    fn citation_markers_do_not_shadow_the_object() {
        let s = "Per Reuters [1] and Bloomberg [2]: {\"signal\":\"BUY\",\"refs\":[1,2]}";
        assert_eq!(extract(s).unwrap(), json!([1]));
        assert_eq!(
            extract_where(s, Value::is_object).unwrap(),
            json!({"signal": "BUY", "refs": [1, 2]})
        );
    }

    #[test]
    fn rejected_shapes_are_malformed() {
        let err = extract_where("[1] [2]", Value::is_object).unwrap_err();
        assert!(matches!(err, LlmError::MalformedResponse { .. }));
        assert_eq!(
            extract_where("Top picks [1]: [{\"symbol\":\"NVDA\"}]", |v| v
                .as_array()
                .is_some_and(|a| a.iter().any(Value::is_object)))
            .unwrap(),
            json!([{"symbol": "NVDA"}])
        );
    }

    #[test]
    fn text_without_openers_is_malformed() {
        let err = extract("I could not find that ticker.").unwrap_err();
        assert!(matches!(err, LlmError::MalformedResponse { .. }));
    }

    #[test]
    fn unclosed_structure_is_malformed() {
        let err = extract("{\"signal\": \"BUY\", \"price\": ").unwrap_err();
        assert!(matches!(err, LlmError::MalformedResponse { .. }));
    }
}
