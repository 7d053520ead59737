//! Marketplace identifier forms.
//!
//! The upstream API is inconsistent about which form it expects: some
//! endpoints want the prefixed form (`atrip-65262230`), others the bare
//! numeric token, and payloads carry both interchangeably. Callers fetch
//! with one form and fall back to the other on 404.

pub const TRIP_PREFIX: &str = "atrip-";
pub const RFQ_PREFIX: &str = "arfq-";
pub const QUOTE_PREFIX: &str = "aquote-";

const KNOWN_PREFIXES: &[&str] = &[TRIP_PREFIX, RFQ_PREFIX, QUOTE_PREFIX];

/// Strips any known marketplace prefix, returning the bare token.
pub fn strip_known_prefix(id: &str) -> &str {
    for prefix in KNOWN_PREFIXES {
        if let Some(bare) = id.strip_prefix(prefix) {
            return bare;
        }
    }
    id
}

/// Returns `id` carrying the given prefix, adding it if absent.
pub fn with_prefix(id: &str, prefix: &str) -> String {
    if id.starts_with(prefix) {
        id.to_string()
    } else {
        format!("{}{}", prefix, strip_known_prefix(id))
    }
}

/// The other form of `id` for the given prefix: prefixed becomes bare,
/// bare becomes prefixed. `None` when both forms collapse to the same
/// string (nothing left to retry with).
pub fn alternate_form(id: &str, prefix: &str) -> Option<String> {
    let alternate = if id.starts_with(prefix) {
        strip_known_prefix(id).to_string()
    } else {
        with_prefix(id, prefix)
    };
    if alternate == id {
        None
    } else {
        Some(alternate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_each_known_prefix() {
        assert_eq!(strip_known_prefix("atrip-65262230"), "65262230");
        assert_eq!(strip_known_prefix("arfq-123"), "123");
        assert_eq!(strip_known_prefix("aquote-390825418"), "390825418");
        assert_eq!(strip_known_prefix("390825418"), "390825418");
    }

    #[test]
    fn with_prefix_is_idempotent() {
        assert_eq!(with_prefix("390825418", QUOTE_PREFIX), "aquote-390825418");
        assert_eq!(with_prefix("aquote-390825418", QUOTE_PREFIX), "aquote-390825418");
    }

    #[test]
    fn with_prefix_swaps_a_foreign_prefix() {
        assert_eq!(with_prefix("arfq-55", QUOTE_PREFIX), "aquote-55");
    }

    #[test]
    fn alternate_form_round_trips() {
        assert_eq!(
            alternate_form("atrip-65262230", TRIP_PREFIX).as_deref(),
            Some("65262230")
        );
        assert_eq!(
            alternate_form("65262230", TRIP_PREFIX).as_deref(),
            Some("atrip-65262230")
        );
    }
}
