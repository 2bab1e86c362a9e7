//! Key-casing translation between the remote store's `snake_case` columns and
//! the application's `camelCase` fields.
//!
//! Both directions are structural recursions over [`Value`]: objects have
//! their keys rewritten and their values translated, arrays are translated
//! element-wise, everything else passes through.
//!
//! The outbound direction has one extra rule: [`Value::Date`] is lowered to a
//! `YYYY-MM-DD` string. The inbound direction never produces dates, so
//! `to_internal(to_external(x))` turns a date into its string form. That loss
//! is expected; callers that need a date back parse the field themselves.

use crate::value::{DATE_FORMAT, Map, Value};

/// Translate a remote (external) value into the application's shape.
pub fn to_internal(value: &Value) -> Value {
  match value {
    Value::Object(map) => Value::Object(rewrite_keys(map, snake_to_camel, to_internal)),
    Value::Array(items) => Value::Array(items.iter().map(to_internal).collect()),
    other => other.clone(),
  }
}

/// Translate an application (internal) value into the remote store's shape.
pub fn to_external(value: &Value) -> Value {
  match value {
    Value::Date(date) => Value::String(date.format(DATE_FORMAT).to_string()),
    Value::Object(map) => Value::Object(rewrite_keys(map, camel_to_snake, to_external)),
    Value::Array(items) => Value::Array(items.iter().map(to_external).collect()),
    other => other.clone(),
  }
}

fn rewrite_keys(
  map: &Map,
  key_fn: fn(&str) -> String,
  value_fn: fn(&Value) -> Value,
) -> Map {
  map.iter().map(|(k, v)| (key_fn(k), value_fn(v))).collect()
}

/// `next_hearing_date` → `nextHearingDate`. Only an underscore followed by a
/// lowercase ASCII letter is folded; any other underscore is kept.
pub fn snake_to_camel(key: &str) -> String {
  let mut out = String::with_capacity(key.len());
  let mut chars = key.chars().peekable();
  while let Some(c) = chars.next() {
    match (c, chars.peek()) {
      ('_', Some(next)) if next.is_ascii_lowercase() => {
        out.push(next.to_ascii_uppercase());
        chars.next();
      }
      _ => out.push(c),
    }
  }
  out
}

/// `nextHearingDate` → `next_hearing_date`.
pub fn camel_to_snake(key: &str) -> String {
  let mut out = String::with_capacity(key.len() + 4);
  for c in key.chars() {
    if c.is_ascii_uppercase() {
      out.push('_');
      out.push(c.to_ascii_lowercase());
    } else {
      out.push(c);
    }
  }
  out
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;
  use serde_json::json;

  use super::*;

  fn v(j: serde_json::Value) -> Value { Value::from(j) }

  #[test]
  fn key_rewrites() {
    assert_eq!(snake_to_camel("case_number"), "caseNumber");
    assert_eq!(snake_to_camel("next_hearing_date"), "nextHearingDate");
    assert_eq!(snake_to_camel("id"), "id");
    assert_eq!(snake_to_camel("slot_2"), "slot_2");
    assert_eq!(camel_to_snake("caseNumber"), "case_number");
    assert_eq!(camel_to_snake("createdAt"), "created_at");
    assert_eq!(camel_to_snake("id"), "id");
  }

  #[test]
  fn nested_objects_and_arrays_are_translated() {
    let external = v(json!({
      "case_id": "x",
      "hearings": [{ "next_date": "2024-01-01", "court_name": "High" }],
      "meta": { "created_by": null, "is_open": true, "fee_total": 12.5 }
    }));
    let internal = to_internal(&external);
    assert_eq!(
      internal,
      v(json!({
        "caseId": "x",
        "hearings": [{ "nextDate": "2024-01-01", "courtName": "High" }],
        "meta": { "createdBy": null, "isOpen": true, "feeTotal": 12.5 }
      }))
    );
    assert_eq!(to_external(&internal), external);
  }

  #[test]
  fn round_trip_without_dates() {
    let samples = [
      json!({}),
      json!([]),
      json!("plain"),
      json!(42),
      json!({ "clientName": "A", "opposingCounsel": { "barNumber": "B-1" } }),
      json!([{ "userId": "u", "checkIn": "09:00" }, { "userId": "w" }]),
    ];
    for sample in samples {
      let x = v(sample);
      assert_eq!(to_internal(&to_external(&x)), x);
    }
  }

  #[test]
  fn external_round_trip_of_canonical_columns() {
    let y = v(json!({ "case_type_id": "t", "items": [{ "location_id": "l" }] }));
    assert_eq!(to_external(&to_internal(&y)), y);
  }

  #[test]
  fn dates_are_lowered_on_the_way_out() {
    let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
    let mut map = Map::new();
    map.insert("nextDate".into(), Value::Date(date));
    let lowered = to_external(&Value::Object(map));
    assert_eq!(lowered, v(json!({ "next_date": "2024-03-05" })));

    // The inbound direction does not recover the date.
    let back = to_internal(&lowered);
    assert_eq!(back.get("nextDate"), Some(&Value::String("2024-03-05".into())));
  }
}
