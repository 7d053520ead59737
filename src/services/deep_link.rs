//! Locates the marketplace URL the customer uses to complete operator
//! selection. Absence is a normal state while operators are still
//! responding, not a failure.

use serde_json::Value;

const MARKETPLACE_HOST: &str = "avinode.com";

/// Documented locations first, then a payload-wide scan for a URL on the
/// marketplace's selection surface.
pub fn extract(trip: &Value) -> Option<String> {
    for pointer in [
        "/actions/searchInAvinode",
        "/actions/viewInAvinode",
        "/data/actions/searchInAvinode",
        "/data/actions/viewInAvinode",
    ] {
        if let Some(link) = trip.pointer(pointer).and_then(link_value) {
            return Some(link);
        }
    }
    scan(trip)
}

// Actions appear both as a bare string and as {"href": "..."}.
fn link_value(raw: &Value) -> Option<String> {
    raw.as_str()
        .or_else(|| raw.get("href").and_then(Value::as_str))
        .filter(|s| is_selection_url(s))
        .map(str::to_string)
}

fn is_selection_url(candidate: &str) -> bool {
    candidate.starts_with("http") && candidate.contains(MARKETPLACE_HOST)
}

fn scan(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if is_selection_url(s) => Some(s.clone()),
        Value::Object(map) => map.values().find_map(scan),
        Value::Array(items) => items.iter().find_map(scan),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const LINK: &str = "https://sandbox.avinode.com/marketplace/mvc/trips/selection/12345";

    #[test]
    fn reads_the_href_object_form() {
        let trip = json!({"actions": {"searchInAvinode": {"href": LINK}}});
        assert_eq!(extract(&trip).as_deref(), Some(LINK));
    }

    #[test]
    fn reads_the_bare_string_form() {
        let trip = json!({"actions": {"viewInAvinode": LINK}});
        assert_eq!(extract(&trip).as_deref(), Some(LINK));
    }

    #[test]
    fn falls_back_to_a_payload_scan() {
        let trip = json!({"rfqs": [{"links": [{"url": LINK}]}]});
        assert_eq!(extract(&trip).as_deref(), Some(LINK));
    }

    #[test]
    fn ignores_non_marketplace_urls() {
        let trip = json!({"actions": {"searchInAvinode": "https://example.com/elsewhere"}});
        assert_eq!(extract(&trip), None);
    }

    #[test]
    fn absent_link_is_none_not_an_error() {
        assert_eq!(extract(&json!({"id": "atrip-1", "rfqs": []})), None);
    }
}
