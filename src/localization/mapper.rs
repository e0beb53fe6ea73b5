// Localized label enrichment for analysis results
// Author: kelexine (https://github.com/kelexine)

use super::tables::{error_message, MESSAGE_COMPLETED, MESSAGE_EMPTY_RESPONSE, SEASON_KO, SHAPE_KO, TONE_KO};
use crate::models::ResultMap;
use serde_json::{json, Value};

/// Primary language subtag the labels are written in.
pub const TARGET_LANGUAGE: &str = "ko";

pub const STATUS_OK: &str = "ok";
pub const EMPTY_RESPONSE_CODE: &str = "EMPTY_RESPONSE";

/// Add Korean labels to an upstream result.
///
/// A missing payload becomes the `EMPTY_RESPONSE` error map whatever the
/// locale. A locale whose primary subtag is not Korean leaves the payload
/// untouched; a missing or blank locale is localized.
pub fn localize(payload: Option<ResultMap>, locale: Option<&str>) -> ResultMap {
    let Some(mut map) = payload else {
        return empty_response();
    };

    if !wants_localization(locale) {
        return map;
    }

    let shape = map
        .get("face_shape")
        .or_else(|| map.get("shape"))
        .and_then(Value::as_str)
        .map(|s| translate(&SHAPE_KO, s));
    if let Some(label) = shape {
        map.insert("face_shape_ko".to_string(), Value::String(label));
    }

    for (field, table, derived) in [
        ("season", &SEASON_KO, "season_ko"),
        ("tone", &TONE_KO, "tone_ko"),
    ] {
        let label = map.get(field).and_then(Value::as_str).map(|s| translate(table, s));
        if let Some(label) = label {
            map.insert(derived.to_string(), Value::String(label));
        }
    }

    if map.get("status").and_then(Value::as_str) == Some(STATUS_OK) {
        map.entry("message_ko")
            .or_insert_with(|| Value::String(MESSAGE_COMPLETED.to_string()));
    } else if let Some(code) = map.get("code").and_then(Value::as_str) {
        let message = error_message(code);
        map.insert("message_ko".to_string(), Value::String(message.to_string()));
    }

    map
}

/// Synthetic result used when the upstream returned nothing.
pub fn empty_response() -> ResultMap {
    let value = json!({
        "status": "error",
        "code": EMPTY_RESPONSE_CODE,
        "message_ko": MESSAGE_EMPTY_RESPONSE,
    });
    match value {
        Value::Object(map) => map,
        _ => ResultMap::new(),
    }
}

/// Whether `locale` (a tag or an `Accept-Language` list) asks for Korean.
pub fn wants_localization(locale: Option<&str>) -> bool {
    match locale.map(str::trim).filter(|l| !l.is_empty()) {
        None => true,
        Some(locale) => primary_subtag(locale).eq_ignore_ascii_case(TARGET_LANGUAGE),
    }
}

/// `ko-KR,en;q=0.8` -> `ko`, `ko_KR` -> `ko`.
fn primary_subtag(locale: &str) -> &str {
    let first_range = locale.split(',').next().unwrap_or_default();
    first_range
        .split([';', '-', '_'])
        .next()
        .unwrap_or_default()
        .trim()
}

fn translate(table: &phf::Map<&'static str, &'static str>, value: &str) -> String {
    let key = value.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    table
        .get(key.as_str())
        .map(|label| label.to_string())
        .unwrap_or_else(|| value.to_string())
}
