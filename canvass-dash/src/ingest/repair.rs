//! Best-effort repair of malformed address payloads
//!
//! Upstream files are hand-exported and occasionally arrive as a bare
//! sequence of objects (`{..},{..}`), with a trailing comma, or with junk
//! around the JSON. One repair pass is attempted per source.

use serde_json::Value;

fn parses(text: &str) -> bool {
    serde_json::from_str::<Value>(text).is_ok()
}

/// Attempt to turn `body` into parseable JSON.
///
/// Steps, stopping at the first that parses:
/// 1. the body as-is (valid input is returned unchanged)
/// 2. trimmed of whitespace and trailing commas, wrapped in `[...]` unless
///    it already starts with `[`
/// 3. the slice from the first `{` to the last `}`, wrapped in `[...]`
///
/// Returns `None` when no step yields valid JSON.
pub fn repair_json(body: &str) -> Option<String> {
    if parses(body) {
        return Some(body.to_string());
    }

    let trimmed = body
        .trim_start_matches('\u{feff}')
        .trim()
        .trim_end_matches(|c: char| c == ',' || c.is_whitespace());
    if trimmed.is_empty() {
        return None;
    }

    let wrapped = if trimmed.starts_with('[') {
        trimmed.to_string()
    } else {
        format!("[{}]", trimmed)
    };
    if parses(&wrapped) {
        return Some(wrapped);
    }

    let first = trimmed.find('{')?;
    let last = trimmed.rfind('}')?;
    if first >= last {
        return None;
    }
    let sliced = format!("[{}]", &trimmed[first..=last]);
    parses(&sliced).then_some(sliced)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_json_unchanged() {
        let body = "  [{\"PARCEL_NUMBER\": \"A\"}]\n";
        assert_eq!(repair_json(body).as_deref(), Some(body));

        let object = "{\"features\": []}";
        assert_eq!(repair_json(object).as_deref(), Some(object));
    }

    #[test]
    fn test_repair_is_idempotent() {
        let once = repair_json("{\"a\": 1}, {\"a\": 2},").unwrap();
        let twice = repair_json(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_bare_object_sequence_is_wrapped() {
        let repaired = repair_json("{\"a\": 1}, {\"a\": 2},\n").unwrap();
        assert_eq!(repaired, "[{\"a\": 1}, {\"a\": 2}]");
    }

    #[test]
    fn test_surrounding_junk_is_sliced_off() {
        let repaired = repair_json("callback({\"a\": 1}, {\"a\": 2});").unwrap();
        assert_eq!(repaired, "[{\"a\": 1}, {\"a\": 2}]");
    }

    #[test]
    fn test_unrepairable_input() {
        assert_eq!(repair_json(""), None);
        assert_eq!(repair_json("   \n"), None);
        assert_eq!(repair_json("<html>404 Not Found</html>"), None);
        assert_eq!(repair_json("{\"a\": }"), None);
        assert_eq!(repair_json("} nothing {"), None);
    }
}
