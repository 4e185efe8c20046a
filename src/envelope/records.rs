//! Wire shapes of S3 event notification records
//!
//! Only the fields the mirror needs are modelled. Everything else in the
//! notification (`eventName`, `eventTime`, `userIdentity`, ...) is ignored.

use serde::Deserialize;
use std::string::FromUtf8Error;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct S3EventRecord {
    pub s3: S3Entity,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct S3Entity {
    pub bucket: S3Bucket,
    pub object: S3Object,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct S3Bucket {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct S3Object {
    pub key: String,
}

#[derive(Debug, Error)]
pub enum KeyDecodeError {
    #[error("malformed percent escape at byte {0}")]
    MalformedEscape(usize),

    #[error(transparent)]
    InvalidUtf8(#[from] FromUtf8Error),
}

/// Decode an object key as it appears in an S3 notification.
///
/// S3 form-encodes keys in event payloads: spaces arrive as `+` and everything
/// else outside the unreserved set as `%XX`. The `+` substitution runs first and
/// unconditionally, so a key that really contains `+` comes back with a space.
/// A key without `%` sequences passes through percent-decoding unchanged.
///
/// A `%` not followed by two hex digits cannot come from S3 (it sends a literal
/// `%` as `%25`) and is rejected rather than passed through.
pub fn decode_key(raw: &str) -> Result<String, KeyDecodeError> {
    let spaced = raw.replace('+', " ");

    if let Some(position) = malformed_escape(spaced.as_bytes()) {
        return Err(KeyDecodeError::MalformedEscape(position));
    }

    Ok(urlencoding::decode(&spaced)?.into_owned())
}

fn malformed_escape(bytes: &[u8]) -> Option<usize> {
    bytes
        .iter()
        .enumerate()
        .filter(|(_, byte)| **byte == b'%')
        .map(|(position, _)| position)
        .find(|&position| {
            !matches!(
                bytes.get(position + 1..position + 3),
                Some([hi, lo]) if hi.is_ascii_hexdigit() && lo.is_ascii_hexdigit()
            )
        })
}
