use proptest::prelude::*;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use unified_ai::{extract, extract_object, CandidateSource, ExtractionError};

fn empty() -> Value
{   json!({})
}

#[test]
fn test_plain_object_parses_from_full_text()
{   let result = extract(r#"{"name": "Oakfield Primary"}"#, empty());
    assert!(result.is_ok());
    assert_eq!(result.data, json!({"name": "Oakfield Primary"}));
    assert_eq!(result.source, Some(CandidateSource::FullText));
}

#[test]
fn test_fenced_block_with_json_tag()
{   let raw = "Here is the report:\n```json\n{\"a\": 1}\n```\nThanks!";
    let result = extract(raw, empty());
    assert_eq!(result.data, json!({"a": 1}));
    assert_eq!(result.source, Some(CandidateSource::Fenced));
    assert_eq!(result.cleaned_text, "{\"a\": 1}");
}

#[test]
fn test_fenced_block_without_tag()
{   let raw = "```\n{\"a\": [1, 2]}\n```";
    let result = extract(raw, empty());
    assert_eq!(result.data, json!({"a": [1, 2]}));
    assert_eq!(result.source, Some(CandidateSource::Fenced));
}

#[test]
fn test_fence_wins_over_stray_braces_outside()
{   // The prose braces alone would parse to {"b": 2}
    let raw = "Ignore {\"b\": 2} this.\n```json\n{\"a\": 1}\n```";
    let result = extract(raw, empty());
    assert_eq!(result.data, json!({"a": 1}));
}

#[test]
fn test_fence_inside_string_value_keeps_whole_object()
{   let raw = r#"{"body":"Use ```{}``` here","subject":"x"}"#;
    let result = extract(raw, empty());
    assert!(result.is_ok());
    assert_eq!(result.source, Some(CandidateSource::FullText));
    assert_eq!(result.data, json!({"body": "Use ```{}``` here", "subject": "x"}));
}

#[test]
fn test_fenced_email_body_survives_extraction()
{   let raw = "{\"subject\": \"Setup\", \"body\": \"Run:\\n```json\\n{\\\"a\\\": 1}\\n```\"}";
    let result = extract(raw, empty());
    assert_eq!(result.source, Some(CandidateSource::FullText));
    assert_eq!(result.data["subject"], json!("Setup"));
    assert_eq!(result.data["body"], json!("Run:\n```json\n{\"a\": 1}\n```"));
}

#[test]
fn test_brace_span_recovers_object_in_prose()
{   let raw = "Sure! {\"subject\": \"Hi\", \"body\": \"Hello\"} Let me know.";
    let result = extract(raw, empty());
    assert_eq!(result.data, json!({"subject": "Hi", "body": "Hello"}));
    assert_eq!(result.source, Some(CandidateSource::BraceSpan));
}

#[test]
fn test_unparseable_fence_falls_through_to_brace_span()
{   let raw = "```json\nnot valid\n```\nActual: {\"ok\": true}";
    let extracted = extract_object(raw).unwrap();
    assert_eq!(extracted.source, CandidateSource::BraceSpan);
    assert_eq!(extracted.object.get("ok"), Some(&json!(true)));
}

#[test]
fn test_unterminated_fence_is_not_a_candidate()
{   let raw = "```json\n{\"a\": 1}";
    let extracted = extract_object(raw).unwrap();
    assert_eq!(extracted.source, CandidateSource::BraceSpan);
}

#[test]
fn test_garbage_returns_fallback()
{   let fallback = json!({"items": []});
    let result = extract("not json at all", fallback.clone());
    assert_eq!(result.data, fallback);
    assert_eq!(result.extraction_error, Some(ExtractionError::Unparseable));
    assert_eq!(
      result.extraction_error.unwrap().to_string()
    , "failed to parse JSON"
    );
}

#[test]
fn test_empty_and_whitespace_are_empty_response()
{   for raw in ["", "   \n\t  "]
    {   let result = extract(raw, empty());
        assert_eq!(result.extraction_error, Some(ExtractionError::EmptyResponse));
        assert_eq!(result.data, empty());
    }
}

#[test]
fn test_top_level_array_and_scalars_are_rejected()
{   for raw in ["[1, 2, 3]", "42", "\"text\"", "null", "true"]
    {   let result = extract(raw, empty());
        assert_eq!(
          result.extraction_error
        , Some(ExtractionError::Unparseable)
        , "accepted {}", raw
        );
    }
}

#[test]
fn test_fenced_array_falls_back_to_object_elsewhere()
{   // The fence holds an array; the brace span still finds an object
    let raw = "```json\n[{\"a\": 1}]\n```";
    let extracted = extract_object(raw).unwrap();
    assert_eq!(extracted.source, CandidateSource::BraceSpan);
    assert_eq!(extracted.object.get("a"), Some(&json!(1)));
}

#[derive(Debug, Default, PartialEq, Deserialize)]
struct Draft
{   subject: String
  , body: String
}

#[test]
fn test_typed_extraction()
{   let result = extract::<Draft>(
      "```json\n{\"subject\": \"Cover\", \"body\": \"Tomorrow 8am\"}\n```"
    , Draft::default()
    );
    assert!(result.is_ok());
    assert_eq!(result.data.subject, "Cover");
}

#[test]
fn test_shape_mismatch_keeps_parsed_object_for_debugging()
{   let result = extract::<Draft>(r#"{"subject": 5}"#, Draft::default());
    assert_eq!(result.data, Draft::default());
    assert_eq!(result.extraction_error, Some(ExtractionError::ShapeMismatch));
    assert_eq!(
      result.parsed.and_then(|p| p.get("subject").cloned())
    , Some(json!(5))
    );
}

fn leaf() -> impl Strategy<Value = Value>
{   prop_oneof![
      Just(Value::Null)
    , any::<bool>().prop_map(Value::Bool)
    , any::<i32>().prop_map(|n| json!(n))
    , "[a-zA-Z0-9 ]{0,12}".prop_map(Value::String)
    , "[a-z`{}\\[\\]\"\\\\\n ]{0,16}".prop_map(Value::String)
    , "\\PC{0,12}".prop_map(Value::String)
    ]
}

fn object() -> impl Strategy<Value = Map<String, Value>>
{   let value = leaf().prop_recursive(3, 24, 4, |inner| {
      prop_oneof![
        prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array)
      , prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
          .prop_map(|m| Value::Object(m.into_iter().collect()))
      ]
    });
    prop::collection::btree_map("[a-zA-Z]{1,8}", value, 0..6)
      .prop_map(|m| m.into_iter().collect())
}

proptest! {
    #[test]
    fn prop_serialized_object_round_trips(obj in object())
    {   let raw = serde_json::to_string(&Value::Object(obj.clone())).unwrap();
        let result = extract(&raw, json!({"fallback": true}));
        prop_assert!(result.is_ok());
        prop_assert_eq!(result.data, Value::Object(obj));
    }
}
