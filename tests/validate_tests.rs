use serde_json::{json, Map, Value};

use unified_ai::contracts::{AiContract, CoachReport};
use unified_ai::validate::{check_fields, field_status, is_blank, FieldStatus};
use unified_ai::{analyse_ai_response, validate, FieldRule, ResponseSchema};

fn object(value: Value) -> Map<String, Value>
{   match value
    {   Value::Object(map) => map
      , other => panic!("not an object: {}", other)
    }
}

fn run(parsed: Value, required: &[&str]) -> unified_ai::ValidationVerdict<Value>
{   validate(
      "raw"
    , &object(parsed)
    , &ResponseSchema::required(required.iter().copied())
    , json!({"fallback": true})
    , "prompt"
    )
}

#[test]
fn test_empty_string_is_missing_but_zero_is_not()
{   let verdict = run(json!({"name": ""}), &["name"]);
    assert!(!verdict.ok);
    assert_eq!(verdict.missing_fields, vec!["name"]);

    let verdict = run(json!({"count": 0}), &["count"]);
    assert!(verdict.ok);
    assert!(verdict.missing_fields.is_empty());
}

#[test]
fn test_empty_array_is_missing_non_empty_is_present()
{   assert_eq!(run(json!({"items": []}), &["items"]).missing_fields, vec!["items"]);
    assert!(run(json!({"items": [1]}), &["items"]).ok);
}

#[test]
fn test_false_whitespace_and_empty_object_are_present()
{   let verdict = run(
      json!({"flag": false, "note": " ", "kpis": {}})
    , &["flag", "note", "kpis"]
    );
    assert!(verdict.ok, "{:?}", verdict.error_message);
}

#[test]
fn test_null_is_missing()
{   assert!(!run(json!({"email": null}), &["email"]).ok);
}

#[test]
fn test_absent_and_empty_are_told_apart()
{   let verdict = run(json!({"a": "", "c": "x"}), &["a", "b", "c"]);
    assert_eq!(verdict.missing_fields, vec!["a", "b"]);
    assert_eq!(verdict.empty_fields, vec!["a"]);
}

#[test]
fn test_failed_verdict_carries_fallback_and_message()
{   let verdict = run(json!({"a": 1}), &["b", "c"]);
    assert!(!verdict.ok);
    assert_eq!(verdict.data, json!({"fallback": true}));
    assert_eq!(
      verdict.error_message.as_deref()
    , Some("Missing required fields: b, c")
    );
}

#[test]
fn test_passing_verdict_carries_parsed_data()
{   let verdict = run(json!({"a": 1, "extra": [2]}), &["a"]);
    assert!(verdict.ok);
    assert_eq!(verdict.data, json!({"a": 1, "extra": [2]}));
    assert_eq!(verdict.error_message, None);
}

#[test]
fn test_no_required_fields_accepts_empty_object()
{   assert!(run(json!({}), &[]).ok);
}

#[test]
fn test_schema_keeps_order_and_drops_duplicates()
{   let schema = ResponseSchema::required(["b", "a", "b"]);
    assert_eq!(schema.field_names(), vec!["b", "a"]);
}

#[test]
fn test_custom_predicate()
{   fn blank_or_zero(v: &Value) -> bool
    {   is_blank(v) || v.as_f64() == Some(0.0)
    }
    let schema = ResponseSchema::new()
      .field(FieldRule::with_predicate("score", blank_or_zero));
    let parsed = object(json!({"score": 0}));
    assert_eq!(field_status(&parsed, &schema.fields()[0]), FieldStatus::Empty);
    assert_eq!(check_fields(&parsed, &schema).missing, vec!["score"]);
}

#[test]
fn test_wrong_shape_fails_with_fallback()
{   let verdict = validate(
      "raw"
    , &object(json!({
        "kpis": {"calls": 10},
        "keyInsights": "should be a list",
        "strengths": ["a"],
        "weaknesses": ["b"],
        "recommendedActions": ["c"]
      }))
    , &CoachReport::schema()
    , CoachReport::fallback()
    , "prompt"
    );
    assert!(!verdict.ok);
    assert_eq!(verdict.data, CoachReport::default());
    assert!(verdict.missing_fields.is_empty());
    assert!(verdict.error_message.unwrap().starts_with("Response did not match"));
}

#[test]
fn test_into_result_reports_missing_fields()
{   let err = run(json!({}), &["x"]).into_result().unwrap_err();
    assert_eq!(
      err
    , unified_ai::Error::Validation { missing: vec!["x".to_string()] }
    );
    assert_eq!(err.to_string(), "Missing required fields: x");
}

#[test]
fn test_analyse_builds_debug_payload()
{   let parsed = object(json!({"subject": "Hi", "body": ""}));
    let analysis = analyse_ai_response(
      "  {\"subject\": \"Hi\", \"body\": \"\"}  "
    , &parsed
    , &ResponseSchema::required(["subject", "body"])
    , json!({})
    , "Draft an email"
    );
    assert!(!analysis.ok);
    assert_eq!(analysis.data, json!({}));
    assert_eq!(analysis.debug.prompt, "Draft an email");
    assert_eq!(analysis.debug.cleaned_text, "{\"subject\": \"Hi\", \"body\": \"\"}");
    assert_eq!(analysis.debug.missing_fields, vec!["body"]);
    assert_eq!(analysis.debug.empty_fields, vec!["body"]);
    assert_eq!(analysis.debug.parsed_json, Some(Value::Object(parsed)));
    assert_eq!(
      analysis.debug.error.as_deref()
    , Some("Missing required fields: body")
    );
}
