//! Deterministic placeholder data for unreachable sources.

use crate::models::{FormatHint, Payload, Query};
use serde_json::{json, Map, Value};

/// Zeroed career counters for the requested format(s).
///
/// Same input, same output: no clocks, no randomness.
pub fn fallback_stats(format: FormatHint) -> Value {
    let detailed = format != FormatHint::All;
    let mut stats = Map::new();

    for concrete in format.formats() {
        let mut counters = json!({
            "matches": "0",
            "innings": "0",
            "runs": "0",
            "highest": "0",
            "average": "0.00",
            "strike_rate": "0.00",
            "centuries": "0",
        });
        if detailed {
            counters["fifties"] = json!("0");
        }
        stats.insert(concrete.to_string(), counters);
    }

    Value::Object(stats)
}

/// Full fallback payload for a provider.
pub fn fallback_payload(provider_id: &str, base_url: &str, profile_path: &str, query: &Query) -> Payload {
    let slug = query.slug();
    let mut payload = Payload::new();

    payload.insert("name".to_string(), json!(query.subject));
    payload.insert(
        "url".to_string(),
        json!(format!("{}/{}/{}", base_url.trim_end_matches('/'), profile_path, slug)),
    );
    payload.insert("id".to_string(), json!(slug));
    payload.insert("source".to_string(), json!(format!("{}_fallback", provider_id)));
    payload.insert("format".to_string(), json!(query.format.to_string()));
    payload.insert("fallback".to_string(), json!(true));
    payload.insert(
        "player_info".to_string(),
        json!({
            "name": query.subject,
            "role": "Unknown",
            "team": "Unknown",
        }),
    );
    payload.insert("stats".to_string(), fallback_stats(query.format));

    payload
}
