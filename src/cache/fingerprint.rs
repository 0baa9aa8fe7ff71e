//! Request fingerprints used as cache keys

use std::collections::BTreeMap;

/// Query parameters of a logical request, kept sorted by name
pub type Params = BTreeMap<String, String>;

/// Builds a `Params` map from string-like pairs
pub fn params<K, V, I>(pairs: I) -> Params
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Maps an endpoint and its parameters to a stable 32-character hex key
///
/// The request is canonicalized as the JSON array `[endpoint, {params}]`.
/// Parameters serialize in name order and string escaping keeps every part
/// delimited, so two requests share a key only if they are equal.
pub fn fingerprint(endpoint: &str, params: &Params) -> String {
    let canonical = serde_json::to_vec(&(endpoint, params)).unwrap_or_else(|_| {
        // String-keyed maps of strings always serialize
        endpoint.as_bytes().to_vec()
    });
    format!("{:x}", md5::compute(&canonical))
}
