use serde::de::DeserializeOwned;

use crate::client::OracleError;

/// What came back from the oracle: either the provider already parsed the
/// schema-constrained JSON, or we hold text that should contain JSON
/// somewhere inside it.
#[derive(Debug, Clone, PartialEq)]
pub enum OracleReply {
    Parsed(serde_json::Value),
    RawText(String),
}

impl OracleReply {
    /// Decode into the expected reply shape.
    ///
    /// Raw text gets exactly one salvage attempt: parse the outermost
    /// `{…}` slice (which also skips markdown fences and prose), falling
    /// back to the whole trimmed string.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, OracleError> {
        match self {
            OracleReply::Parsed(v) => {
                let raw = snippet(&v.to_string());
                serde_json::from_value(v).map_err(|e| OracleError::Decode {
                    detail: e.to_string(),
                    raw,
                })
            }
            OracleReply::RawText(s) => {
                let t = s.trim();
                serde_json::from_str(json_slice(t)).map_err(|e| OracleError::Decode {
                    detail: e.to_string(),
                    raw: snippet(t),
                })
            }
        }
    }
}

/// The outermost brace-delimited slice of `s`, or `s` itself when there is
/// no such slice.
fn json_slice(s: &str) -> &str {
    match (s.find('{'), s.rfind('}')) {
        (Some(first), Some(last)) if last > first => &s[first..=last],
        _ => s,
    }
}

fn snippet(s: &str) -> String {
    const MAX: usize = 400;
    if s.chars().count() <= MAX {
        s.to_string()
    } else {
        let head: String = s.chars().take(MAX).collect();
        format!("{head}…")
    }
}
