//! Query-string lookup for the task page URL.
//!
//! The default [`QueryDecoding::WholeString`] mode decodes the entire query
//! string before splitting it, which is how task pages have always read their
//! parameters. A value that itself contains an encoded `&` or `=` therefore
//! splits at that character. [`QueryDecoding::PerSegment`] splits on the raw
//! delimiters first and decodes each key and value on its own; it changes what
//! such values read as and is only used when a deployment opts in.

use std::borrow::Cow;

use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::log_warn;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum QueryDecoding {
    #[default]
    WholeString,
    PerSegment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    /// Key present with no `=value` part.
    Flag,
    Value(String),
}

impl QueryValue {
    pub fn into_value(self) -> Option<String> {
        match self {
            QueryValue::Flag => None,
            QueryValue::Value(value) => Some(value),
        }
    }
}

/// Returns the first parameter named `name` in `search` (with or without the
/// leading `?`), or `None` when it is absent.
pub fn get_url_parameter(search: &str, name: &str, decoding: QueryDecoding) -> Option<QueryValue> {
    let raw = search.strip_prefix('?').unwrap_or(search);

    match decoding {
        QueryDecoding::WholeString => {
            let decoded = decode_component(raw);
            decoded.split('&').find_map(|segment| {
                let mut parts = segment.split('=');
                if parts.next() != Some(name) {
                    return None;
                }
                Some(match parts.next() {
                    Some(value) => QueryValue::Value(value.to_string()),
                    None => QueryValue::Flag,
                })
            })
        }
        QueryDecoding::PerSegment => raw.split('&').find_map(|segment| {
            let (key, value) = match segment.split_once('=') {
                Some((key, value)) => (key, Some(value)),
                None => (segment, None),
            };
            if decode_component(key) != name {
                return None;
            }
            Some(match value {
                Some(value) => QueryValue::Value(decode_component(value).into_owned()),
                None => QueryValue::Flag,
            })
        }),
    }
}

/// `decodeURIComponent` semantics: `%XX` escapes only, `+` stays literal.
pub(crate) fn decode_component(input: &str) -> Cow<'_, str> {
    let decoded = percent_decode_str(input);
    match decoded.decode_utf8() {
        Ok(text) => text,
        Err(_) => {
            log_warn!("query component is not valid UTF-8 once decoded; replacing invalid bytes");
            Cow::Owned(percent_decode_str(input).decode_utf8_lossy().into_owned())
        }
    }
}
