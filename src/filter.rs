//! Subscription filters and the lenient query boundary.

use serde::Serialize;
use serde_json::Value;

/// A Nostr subscription filter. Absent fields impose no constraint and are
/// omitted from the wire form.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Filter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kinds: Option<Vec<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub until: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl Filter {
    /// Build a `Filter` from a loosely-typed JSON query object.
    ///
    /// Callers hand over heterogeneous input; any field that cannot be
    /// coerced to its expected type is dropped rather than reported, so the
    /// query degrades to "no constraint" instead of failing.
    pub fn from_value(val: &Value) -> Self {
        let kinds = val
            .get("kinds")
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_u64().map(|u| u as u32))
                    .collect::<Vec<_>>()
            })
            .filter(|v| !v.is_empty());
        let authors = val
            .get("authors")
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(|s| s.to_string()))
                    .collect::<Vec<_>>()
            })
            .filter(|v| !v.is_empty());
        let since = val.get("since").and_then(|v| v.as_u64());
        let until = val.get("until").and_then(|v| v.as_u64());
        let limit = val
            .get("limit")
            .and_then(|v| v.as_u64())
            .map(|v| v as usize);
        Filter {
            kinds,
            authors,
            since,
            until,
            limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_value_reads_all_fields() {
        let val = serde_json::json!({
            "kinds": [1, 30023],
            "authors": ["a1", "a2"],
            "since": 1,
            "until": 2,
            "limit": 3
        });
        let f = Filter::from_value(&val);
        assert_eq!(f.kinds.unwrap(), vec![1, 30023]);
        assert_eq!(f.authors.unwrap(), vec!["a1".to_string(), "a2".to_string()]);
        assert_eq!(f.since, Some(1));
        assert_eq!(f.until, Some(2));
        assert_eq!(f.limit, Some(3));
    }

    #[test]
    fn from_value_defaults_to_unconstrained() {
        let f = Filter::from_value(&serde_json::json!({}));
        assert_eq!(f, Filter::default());
    }

    #[test]
    fn uncoercible_fields_are_dropped() {
        let val = serde_json::json!({
            "kinds": "one",
            "authors": [1, 2],
            "since": "yesterday",
            "until": -5,
            "limit": "many"
        });
        let f = Filter::from_value(&val);
        assert_eq!(f, Filter::default());
    }

    #[test]
    fn mixed_element_types_keep_the_coercible_ones() {
        let val = serde_json::json!({
            "kinds": [1, "x", 2],
            "authors": ["a1", 7]
        });
        let f = Filter::from_value(&val);
        assert_eq!(f.kinds.unwrap(), vec![1, 2]);
        assert_eq!(f.authors.unwrap(), vec!["a1".to_string()]);
    }

    #[test]
    fn absent_fields_are_omitted_from_the_wire_form() {
        let wire = serde_json::to_value(Filter::default()).unwrap();
        assert_eq!(wire, serde_json::json!({}));
        let wire = serde_json::to_value(Filter {
            kinds: Some(vec![1]),
            limit: Some(10),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(wire, serde_json::json!({"kinds": [1], "limit": 10}));
    }
}
