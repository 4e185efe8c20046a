//! Notification envelope decoding
//!
//! Queue messages carry S3 event notifications in one of two shapes:
//!
//! - **Direct**: the bucket publishes straight to the queue, the body is the
//!   notification itself (`{"Records": [...]}`).
//! - **Relayed**: the bucket publishes to an SNS topic that fans out to the
//!   queue, the body is the SNS wrapper and the notification is a JSON string
//!   in its `Message` field.
//!
//! Anything else (S3 `s3:TestEvent` messages, unrelated publishers) decodes to
//! [`Envelope::Unrecognized`] and yields no objects.

mod records;

pub use records::{KeyDecodeError, S3Bucket, S3Entity, S3EventRecord, S3Object, decode_key};

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("Message body is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("Relayed Message field is not valid JSON: {0}")]
    InvalidRelayedJson(#[source] serde_json::Error),

    #[error("Records field is not an array")]
    RecordsNotArray,

    #[error("Malformed record at index {index}: {reason}")]
    MalformedRecord { index: usize, reason: String },

    #[error("Object key '{key}' is not decodable: {reason}")]
    KeyDecode { key: String, reason: String },
}

pub type Result<T> = std::result::Result<T, EnvelopeError>;

/// One object referenced by a notification, key already decoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    pub bucket: String,
    pub key: String,
}

/// Top-level shape of a queue message body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope {
    /// Records of a bucket notification, keys still encoded
    Direct(Vec<S3EventRecord>),
    /// JSON-encoded bucket notification nested in a relay wrapper
    Relayed(String),
    Unrecognized,
}

impl Envelope {
    /// Classify a raw message body.
    ///
    /// A body that is not JSON, or a `Records` list with a record lacking its
    /// bucket name or object key, is an error. Every other JSON value maps to
    /// exactly one variant.
    pub fn decode(body: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(body).map_err(EnvelopeError::InvalidJson)?;
        Self::from_value(value)
    }

    /// `Records` and `Message` count only when present and truthy; `false`,
    /// `0`, `""` and `null` are treated as absent.
    fn from_value(mut value: Value) -> Result<Self> {
        let Some(object) = value.as_object_mut() else {
            return Ok(Envelope::Unrecognized);
        };

        if let Some(records) = object.remove("Records").filter(is_truthy) {
            return parse_records(records).map(Envelope::Direct);
        }

        match object.remove("Message") {
            Some(Value::String(inner)) if !inner.is_empty() => Ok(Envelope::Relayed(inner)),
            _ => Ok(Envelope::Unrecognized),
        }
    }

    /// Flatten the envelope into the objects it references, in record order.
    pub fn objects(&self) -> Result<Vec<ObjectRef>> {
        match self {
            Envelope::Direct(records) => records.iter().map(object_ref).collect(),
            Envelope::Relayed(inner) => {
                let value: Value =
                    serde_json::from_str(inner).map_err(EnvelopeError::InvalidRelayedJson)?;
                match Self::from_value(value)? {
                    Envelope::Direct(records) => records.iter().map(object_ref).collect(),
                    // Relays are not nested twice
                    Envelope::Relayed(_) | Envelope::Unrecognized => Ok(Vec::new()),
                }
            }
            Envelope::Unrecognized => Ok(Vec::new()),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Envelope::Direct(_) => "direct",
            Envelope::Relayed(_) => "relayed",
            Envelope::Unrecognized => "unrecognized",
        }
    }
}

/// Decode a message body and return every object it references.
pub fn extract_objects(body: &str) -> Result<Vec<ObjectRef>> {
    Envelope::decode(body)?.objects()
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Bool(true) | Value::Array(_) | Value::Object(_) => true,
    }
}

fn parse_records(records: Value) -> Result<Vec<S3EventRecord>> {
    let Value::Array(records) = records else {
        return Err(EnvelopeError::RecordsNotArray);
    };

    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            S3EventRecord::deserialize(record).map_err(|e| EnvelopeError::MalformedRecord {
                index,
                reason: e.to_string(),
            })
        })
        .collect()
}

fn object_ref(record: &S3EventRecord) -> Result<ObjectRef> {
    let key = decode_key(&record.s3.object.key).map_err(|e| EnvelopeError::KeyDecode {
        key: record.s3.object.key.clone(),
        reason: e.to_string(),
    })?;

    Ok(ObjectRef {
        bucket: record.s3.bucket.name.clone(),
        key,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(bucket: &str, key: &str) -> Value {
        json!({
            "eventName": "ObjectCreated:Put",
            "s3": {"bucket": {"name": bucket}, "object": {"key": key, "size": 1}}
        })
    }

    fn object(bucket: &str, key: &str) -> ObjectRef {
        ObjectRef {
            bucket: bucket.to_string(),
            key: key.to_string(),
        }
    }

    #[test]
    fn test_direct_envelope_preserves_order() {
        let body = json!({
            "Records": [record("b1", "one.txt"), record("b2", "dir/two+2.txt"), record("b1", "three%21")]
        })
        .to_string();

        let envelope = Envelope::decode(&body).unwrap();
        assert_eq!(envelope.kind(), "direct");
        assert_eq!(
            envelope.objects().unwrap(),
            vec![
                object("b1", "one.txt"),
                object("b2", "dir/two 2.txt"),
                object("b1", "three!"),
            ]
        );
    }

    #[test]
    fn test_relayed_matches_inner_direct() {
        let inner = json!({"Records": [record("b2", "x.bin"), record("b2", "y z+1.bin")]}).to_string();
        let relayed = json!({
            "Type": "Notification",
            "MessageId": "c5e0bd0c-0000-0000-0000-000000000000",
            "TopicArn": "arn:aws:sns:eu-west-2:000000000000:uploads",
            "Message": inner,
        })
        .to_string();

        let envelope = Envelope::decode(&relayed).unwrap();
        assert_eq!(envelope.kind(), "relayed");
        assert_eq!(envelope.objects().unwrap(), extract_objects(&inner).unwrap());
    }

    #[test]
    fn test_direct_and_relayed_sample_bodies() {
        let direct = r#"{"Records":[{"s3":{"bucket":{"name":"b1"},"object":{"key":"a/b+c.txt"}}}]}"#;
        assert_eq!(extract_objects(direct).unwrap(), vec![object("b1", "a/b c.txt")]);

        let relayed = r#"{"Message":"{\"Records\":[{\"s3\":{\"bucket\":{\"name\":\"b2\"},\"object\":{\"key\":\"x.bin\"}}}]}"}"#;
        assert_eq!(extract_objects(relayed).unwrap(), vec![object("b2", "x.bin")]);
    }

    #[test]
    fn test_unrecognized_shapes_yield_nothing() {
        let bodies = [
            r#"{"Service":"Amazon S3","Event":"s3:TestEvent","Bucket":"b1"}"#,
            r#"{"Records":null}"#,
            r#"{"Records":false}"#,
            r#"{"Records":0}"#,
            r#"{"Records":""}"#,
            r#"{"Message":""}"#,
            r#"{"Records":false,"Message":""}"#,
            r#"{"Message":42}"#,
            r#"[1,2,3]"#,
            r#""just a string""#,
            r#"{}"#,
        ];

        for body in bodies {
            let envelope = Envelope::decode(body).unwrap();
            assert_eq!(envelope, Envelope::Unrecognized, "body: {body}");
            assert!(envelope.objects().unwrap().is_empty());
        }
    }

    #[test]
    fn test_falsy_records_fall_through_to_message() {
        let inner = json!({"Records": [record("b2", "x.bin")]}).to_string();
        let body = json!({"Records": false, "Message": inner}).to_string();

        let envelope = Envelope::decode(&body).unwrap();
        assert_eq!(envelope.kind(), "relayed");
        assert_eq!(envelope.objects().unwrap(), vec![object("b2", "x.bin")]);
    }

    #[test]
    fn test_direct_holds_typed_records() {
        let body = json!({"Records": [record("b1", "a+b.txt")]}).to_string();

        let Envelope::Direct(records) = Envelope::decode(&body).unwrap() else {
            panic!("expected a direct envelope");
        };
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].s3.bucket.name, "b1");
        // Decoding happens when objects are resolved
        assert_eq!(records[0].s3.object.key, "a+b.txt");
    }

    #[test]
    fn test_relayed_without_records_is_empty() {
        let body = json!({"Message": "{\"hello\":\"world\"}"}).to_string();
        assert!(extract_objects(&body).unwrap().is_empty());
    }

    #[test]
    fn test_empty_records_array() {
        assert!(extract_objects(r#"{"Records":[]}"#).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_json_is_error() {
        assert!(matches!(
            Envelope::decode("not json"),
            Err(EnvelopeError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_relayed_invalid_inner_json_is_error() {
        let body = json!({"Message": "plain text notification"}).to_string();
        let envelope = Envelope::decode(&body).unwrap();
        assert!(matches!(
            envelope.objects(),
            Err(EnvelopeError::InvalidRelayedJson(_))
        ));
    }

    #[test]
    fn test_record_missing_key_fails_whole_envelope() {
        let body = json!({
            "Records": [
                record("b1", "ok.txt"),
                {"s3": {"bucket": {"name": "b1"}, "object": {}}}
            ]
        })
        .to_string();

        match Envelope::decode(&body) {
            Err(EnvelopeError::MalformedRecord { index, .. }) => assert_eq!(index, 1),
            other => panic!("expected malformed record, got {other:?}"),
        }
    }

    #[test]
    fn test_records_not_array() {
        assert!(matches!(
            extract_objects(r#"{"Records":"nope"}"#),
            Err(EnvelopeError::RecordsNotArray)
        ));
    }

    #[test]
    fn test_undecodable_key() {
        for key in ["bad%FF", "bad%ZZ", "trailing%"] {
            let body = json!({"Records": [record("b1", key)]}).to_string();
            assert!(
                matches!(extract_objects(&body), Err(EnvelopeError::KeyDecode { .. })),
                "key: {key}"
            );
        }
    }
}
