//! The canonicalizer (`spec.md` §4.1).
//!
//! Builds the six-line canonical request string and the signed-headers list
//! reused by the `Authorization` header. Percent-encoding is hand-rolled
//! (byte-match loop over the RFC 3986 unreserved set) rather than pulled
//! from a crate — prior art for that already lives in the teacher crate
//! this one is drawn from.

use crate::error::SigningError;

/// `(lower(name), folded_value)` — one entry per *distinct* header name,
/// with same-name values comma-joined per `spec.md` §9 Open Question 1.
pub struct CanonicalHeader {
    pub name: String,
    pub folded_value: String,
}

/// Output of [`canonicalize`]: the full canonical request string plus the
/// signed-headers list it embeds (needed again for the `Authorization`
/// header).
pub struct CanonicalRequest {
    pub canonical_request: String,
    pub signed_headers: String,
}

/// Build the canonical request string and signed-headers list.
///
/// `payload_hash_hex` is the already-computed SHA-256 hex digest of the
/// body (§4.2 happens before this function is called).
pub fn canonicalize(
    method: &str,
    target: &str,
    headers: &[(String, String)],
    payload_hash_hex: &str,
) -> Result<CanonicalRequest, SigningError> {
    if method.is_empty() {
        return Err(SigningError::InvalidArgument(
            "request method is empty".into(),
        ));
    }

    let (path, query) = split_target(target);
    let canonical_path = canonicalize_path(path);
    let canonical_query = canonicalize_query(query);
    let canonical_headers = canonicalize_headers(headers)?;

    let canonical_headers_block: String = canonical_headers
        .iter()
        .map(|h| format!("{}:{}\n", h.name, h.folded_value))
        .collect();

    let signed_headers = canonical_headers
        .iter()
        .map(|h| h.name.as_str())
        .collect::<Vec<_>>()
        .join(";");

    let canonical_request = format!(
        "{}\n{}\n{}\n{}\n{}\n{}",
        method,
        canonical_path,
        canonical_query,
        canonical_headers_block,
        signed_headers,
        payload_hash_hex,
    );

    tracing::debug!(
        canonical_path = %canonical_path,
        signed_headers = %signed_headers,
        "built canonical request"
    );

    Ok(CanonicalRequest {
        canonical_request,
        signed_headers,
    })
}

/// Split a request target into `(path, query)`. `spec.md` §9 Open Question 2
/// notes a cleaner contract would take these pre-split, but §6 fixes the
/// `Request::target()` shape as the combined form, so this stays internal.
fn split_target(target: &str) -> (&str, Option<&str>) {
    match target.find('?') {
        Some(idx) => (&target[..idx], Some(&target[idx + 1..])),
        None => (target, None),
    }
}

/// Drop empty segments and `.`; for `..`, pop the last retained segment if
/// any (`spec.md` §4.1 steps 1-2). Pure segment-list normalization, with no
/// percent-encoding — this is the part of path canonicalization that's
/// idempotent (`spec.md` §8 property 4); re-running percent-encoding on an
/// already-encoded path is deliberately *not* idempotent (S6).
fn normalize_path_segments(path: &str) -> Vec<&str> {
    let mut segments: Vec<&str> = Vec::new();
    for raw in path.split('/') {
        match raw {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            seg => segments.push(seg),
        }
    }
    segments
}

/// Normalize and percent-encode a request path (`spec.md` §4.1 steps 1-4).
fn canonicalize_path(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }

    let segments = normalize_path_segments(path);
    if segments.is_empty() {
        return "/".to_string();
    }

    let mut out = String::new();
    for seg in segments {
        out.push('/');
        out.push_str(&percent_encode_path_segment(seg));
    }
    out
}

/// Percent-encode one path segment. Input is treated as literal bytes, not
/// pre-encoded text: a literal `%` is re-encoded to `%25` like anything
/// else, so an already-`%XX`-encoded input segment comes out double-encoded
/// (`spec.md` §4.1 step 3, S6).
fn percent_encode_path_segment(seg: &str) -> String {
    let mut out = String::with_capacity(seg.len());
    for byte in seg.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

/// Percent-encode a query-string key or value per the same unreserved-set
/// rules as the path, with space encoding to `%20` rather than `+`.
fn percent_encode_query_component(s: &str) -> String {
    percent_encode_path_segment(s)
}

/// Build the canonical query string: sorted, percent-encoded `key=value`
/// pairs joined by `&` (`spec.md` §4.1).
fn canonicalize_query(query: Option<&str>) -> String {
    let qs = match query {
        None | Some("") => return String::new(),
        Some(q) => q,
    };

    let mut pairs: Vec<(String, String)> = qs
        .split('&')
        .filter(|part| !part.is_empty())
        .map(|part| match part.find('=') {
            Some(idx) => (
                percent_encode_query_component(&part[..idx]),
                percent_encode_query_component(&part[idx + 1..]),
            ),
            None => (percent_encode_query_component(part), String::new()),
        })
        .collect();

    pairs.sort_unstable_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

/// Fold a header value: trim leading/trailing horizontal whitespace and
/// collapse internal whitespace runs to a single space.
fn fold_header_value(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// SigV4-valid header value bytes: printable ASCII plus tab (`spec.md` §4.1
/// `EncodingError`).
fn is_sigv4_valid_byte(b: u8) -> bool {
    b == 0x09 || (0x20..=0x7e).contains(&b)
}

/// Group headers by lowercase name (comma-joining repeated names per
/// `spec.md` §9 Open Question 1), sort by name, and fold values.
fn canonicalize_headers(
    headers: &[(String, String)],
) -> Result<Vec<CanonicalHeader>, SigningError> {
    use std::collections::BTreeMap;

    let mut by_name: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in headers {
        if !value.bytes().all(is_sigv4_valid_byte) {
            return Err(SigningError::EncodingError(format!(
                "header {name} contains bytes outside the SigV4-valid range"
            )));
        }
        by_name
            .entry(name.to_lowercase())
            .or_default()
            .push(fold_header_value(value));
    }

    Ok(by_name
        .into_iter()
        .map(|(name, values)| CanonicalHeader {
            name,
            folded_value: values.join(","),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_normalizes_dots_and_double_slashes() {
        assert_eq!(
            canonicalize_path("/foo/./bar/../baz//qux"),
            "/foo/baz/qux"
        );
    }

    #[test]
    fn path_reencodes_literal_percent_sequences() {
        assert_eq!(canonicalize_path("/%E4%B8%AD"), "/%25E4%25B8%25AD");
    }

    #[test]
    fn path_empty_becomes_root() {
        assert_eq!(canonicalize_path(""), "/");
    }

    #[test]
    fn path_dot_dot_above_root_does_not_underflow() {
        assert_eq!(canonicalize_path("/../../a"), "/a");
    }

    #[test]
    fn path_is_idempotent_for_already_normal_paths() {
        let p = "/foo/bar/baz";
        assert_eq!(canonicalize_path(p), p);
    }

    #[test]
    fn query_sorts_by_key_then_value() {
        assert_eq!(canonicalize_query(Some("z=3&a=1&m=2")), "a=1&m=2&z=3");
    }

    #[test]
    fn query_missing_value_becomes_key_equals_nothing() {
        assert_eq!(canonicalize_query(Some("uploads")), "uploads=");
    }

    #[test]
    fn query_encodes_space_as_percent_20_not_plus() {
        assert_eq!(
            canonicalize_query(Some("key=hello world")),
            "key=hello%20world"
        );
    }

    #[test]
    fn query_absent_is_empty_string() {
        assert_eq!(canonicalize_query(None), "");
        assert_eq!(canonicalize_query(Some("")), "");
    }

    #[test]
    fn repeated_header_names_comma_join() {
        let headers = vec![
            ("X-Amz-Meta".to_string(), "a".to_string()),
            ("x-amz-meta".to_string(), "b".to_string()),
        ];
        let canonical = canonicalize_headers(&headers).unwrap();
        assert_eq!(canonical.len(), 1);
        assert_eq!(canonical[0].name, "x-amz-meta");
        assert_eq!(canonical[0].folded_value, "a,b");
    }

    #[test]
    fn header_values_are_folded() {
        let headers = vec![("Host".to_string(), "  example.com   amazonaws.com ".to_string())];
        let canonical = canonicalize_headers(&headers).unwrap();
        assert_eq!(canonical[0].folded_value, "example.com amazonaws.com");
    }

    #[test]
    fn binary_header_value_is_rejected() {
        let headers = vec![("X-Bad".to_string(), "\u{0}".to_string())];
        assert!(matches!(
            canonicalize_headers(&headers),
            Err(SigningError::EncodingError(_))
        ));
    }

    #[test]
    fn empty_method_is_rejected() {
        let err = canonicalize("", "/", &[], "hash").unwrap_err();
        assert!(matches!(err, SigningError::InvalidArgument(_)));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn unreserved_segment() -> impl Strategy<Value = String> {
            "[A-Za-z0-9_.~-]{1,8}".prop_filter("not a dot segment", |s| s != "." && s != "..")
        }

        proptest! {
            /// `spec.md` §8 property 4: paths built only from unreserved-set
            /// segments contain no `.`/`..`/empty runs, so normalization is
            /// the identity on the segment list.
            #[test]
            fn normalization_is_identity_for_already_normal_paths(
                segments in proptest::collection::vec(unreserved_segment(), 1..6)
            ) {
                let path = format!("/{}", segments.join("/"));
                prop_assert_eq!(normalize_path_segments(&path), segments);
            }

            /// `spec.md` §8 property 4: re-normalizing an already-normalized
            /// segment list changes nothing.
            #[test]
            fn normalization_is_idempotent(
                segments in proptest::collection::vec(
                    prop_oneof![unreserved_segment(), Just(".".to_string()), Just("..".to_string()), Just("".to_string())],
                    0..8
                )
            ) {
                let path = format!("/{}", segments.join("/"));
                let once = normalize_path_segments(&path);
                let rejoined = format!("/{}", once.join("/"));
                let twice = normalize_path_segments(&rejoined);
                prop_assert_eq!(once, twice);
            }

            /// `spec.md` §8 property 3: reordering headers with distinct
            /// lowercase names leaves the canonical headers block unchanged.
            #[test]
            fn header_order_is_commutative_for_distinct_names(
                mut pairs in proptest::collection::vec(
                    (unreserved_segment(), unreserved_segment()), 1..6
                )
            ) {
                // Dedup by lowercase name so every name is distinct.
                let mut seen = std::collections::HashSet::new();
                pairs.retain(|(k, _)| seen.insert(k.to_lowercase()));

                let headers: Vec<(String, String)> = pairs.clone();
                let mut shuffled = headers.clone();
                shuffled.reverse();

                let a = canonicalize_headers(&headers).unwrap();
                let b = canonicalize_headers(&shuffled).unwrap();
                let a_repr: Vec<(String, String)> = a.into_iter().map(|h| (h.name, h.folded_value)).collect();
                let b_repr: Vec<(String, String)> = b.into_iter().map(|h| (h.name, h.folded_value)).collect();
                prop_assert_eq!(a_repr, b_repr);
            }

            /// `spec.md` §8 property 2 (determinism), restricted to the
            /// canonicalizer: identical inputs produce byte-identical output.
            #[test]
            fn canonicalize_is_deterministic(
                method in "[A-Z]{3,6}",
                segments in proptest::collection::vec(unreserved_segment(), 0..4),
            ) {
                let target = format!("/{}", segments.join("/"));
                let headers = vec![("host".to_string(), "example.com".to_string())];
                let a = canonicalize(&method, &target, &headers, "hash").unwrap();
                let b = canonicalize(&method, &target, &headers, "hash").unwrap();
                prop_assert_eq!(a.canonical_request, b.canonical_request);
            }
        }
    }
}
