//! Normalization of the upstream's polymorphic pricing fields.
//!
//! Several historical field names carry the same semantic price; old and
//! new payload shapes coexist depending on how long ago the operator's
//! integration was built. The known names live in one lookup table,
//! consulted in order, so a schema change upstream is a one-line edit
//! here instead of scattered conditionals.

use serde_json::Value;

/// Known names for the price on a lift or quote record, newest first.
const PRICE_FIELDS: &[&str] = &["sellerPrice", "totalPrice", "quotedPrice", "price"];

const DEFAULT_CURRENCY: &str = "USD";

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedPrice {
    pub amount: f64,
    pub currency: String,
    /// Which legacy field supplied the amount; logged for observability.
    pub source_field: &'static str,
}

/// Maps whatever pricing shape `record` carries to the canonical
/// amount+currency pair. Works on lift records (inline pricing) and on
/// fetched quote payloads alike, since both drifted through the same
/// field names.
pub fn normalize_price(record: &Value) -> Option<NormalizedPrice> {
    for field in PRICE_FIELDS {
        let Some(raw) = record.get(*field) else {
            continue;
        };
        if let Some((amount, currency)) = parse_price(raw, record) {
            return Some(NormalizedPrice {
                amount,
                currency,
                source_field: field,
            });
        }
    }
    None
}

/// A price field is either `{amount|price|total, currency}` or a bare
/// number with the currency as a sibling of the record.
fn parse_price(raw: &Value, record: &Value) -> Option<(f64, String)> {
    if let Some(amount) = as_amount(raw) {
        return valid(amount, currency_of(record));
    }
    if raw.is_object() {
        let amount = raw
            .get("amount")
            .or_else(|| raw.get("price"))
            .or_else(|| raw.get("total"))
            .and_then(as_amount)?;
        let currency = raw
            .get("currency")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| currency_of(record));
        return valid(amount, currency);
    }
    None
}

fn valid(amount: f64, currency: String) -> Option<(f64, String)> {
    (amount > 0.0).then_some((amount, currency))
}

// Amounts arrive as numbers or as numeric strings.
fn as_amount(raw: &Value) -> Option<f64> {
    raw.as_f64()
        .or_else(|| raw.as_str().and_then(|s| s.trim().parse().ok()))
}

fn currency_of(record: &Value) -> String {
    record
        .get("currency")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_CURRENCY)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_every_legacy_field_name() {
        for field in ["sellerPrice", "totalPrice", "quotedPrice", "price"] {
            let lift = json!({ field: {"amount": 12500.0, "currency": "EUR"} });
            let price = normalize_price(&lift).unwrap();
            assert_eq!(price.amount, 12500.0);
            assert_eq!(price.currency, "EUR");
            assert_eq!(price.source_field, field);
        }
    }

    #[test]
    fn newest_field_name_wins() {
        let lift = json!({
            "sellerPrice": {"amount": 10000.0, "currency": "USD"},
            "price": 9000.0
        });
        assert_eq!(normalize_price(&lift).unwrap().amount, 10000.0);
    }

    #[test]
    fn bare_number_uses_sibling_currency() {
        let lift = json!({"price": 8000.0, "currency": "GBP"});
        let price = normalize_price(&lift).unwrap();
        assert_eq!(price.amount, 8000.0);
        assert_eq!(price.currency, "GBP");
    }

    #[test]
    fn numeric_strings_parse() {
        let lift = json!({"totalPrice": {"amount": "15000", "currency": "USD"}});
        assert_eq!(normalize_price(&lift).unwrap().amount, 15000.0);
    }

    #[test]
    fn missing_currency_defaults_to_usd() {
        let lift = json!({"price": 5000.0});
        assert_eq!(normalize_price(&lift).unwrap().currency, "USD");
    }

    #[test]
    fn zero_and_garbage_are_not_prices() {
        assert_eq!(normalize_price(&json!({"price": 0.0})), None);
        assert_eq!(normalize_price(&json!({"price": "call us"})), None);
        assert_eq!(normalize_price(&json!({"aircraftType": "Citation"})), None);
    }
}
