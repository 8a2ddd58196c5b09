//! URL query merging.

use std::collections::{BTreeMap, HashSet};

use url::Url;

/// Append `params` to `url`, skipping names the URL already carries.
pub fn merge_queries(url: &Url, params: &BTreeMap<String, String>) -> Url {
    if params.is_empty() {
        return url.clone();
    }

    let existing: HashSet<String> = url.query_pairs().map(|(k, _)| k.into_owned()).collect();
    let mut merged = url.clone();
    {
        let mut pairs = merged.query_pairs_mut();
        for (name, value) in params {
            if !existing.contains(name) {
                pairs.append_pair(name, value);
            }
        }
    }
    // `query_pairs_mut` leaves a bare `?` when nothing was appended.
    if merged.query() == Some("") {
        merged.set_query(None);
    }
    merged
}
