//! Query string decoding.

use std::collections::HashMap;

/// Decode `?a=1&b=2` into a flat map.
///
/// Each piece is split once on `=`; a piece without `=` maps to an empty
/// value and later duplicates overwrite earlier ones. Values are not
/// percent-decoded.
pub fn extract_query_params(query: Option<&str>) -> HashMap<String, String> {
    let Some(query) = query else {
        return HashMap::new();
    };

    query
        .strip_prefix('?')
        .unwrap_or(query)
        .split('&')
        .filter(|piece| !piece.is_empty())
        .map(|piece| {
            let (key, value) = piece.split_once('=').unwrap_or((piece, ""));
            (key.to_string(), value.to_string())
        })
        .collect()
}
