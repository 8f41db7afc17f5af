//! Paths through a bank hierarchy and the keys derived from them.

use crate::hierarchy::BankId;

/// True iff `target` is a prefix of `record_path`.
///
/// A target longer than the record path never matches; an empty target
/// matches every path.
pub fn path_matches(record_path: &[String], target: &[String]) -> bool {
    target.len() <= record_path.len() && record_path.iter().zip(target).all(|(r, t)| r == t)
}

/// Storage key of a path: `bankId/segment/segment`.
pub fn path_key(bank_id: &BankId, path: &[String]) -> String {
    let mut key = bank_id.to_string();
    for segment in path {
        key.push('/');
        key.push_str(segment);
    }
    key
}

/// Split a `/`-separated path argument into segments, dropping empty ones.
pub fn parse_path(raw: &str) -> Vec<String> {
    raw.split('/')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
