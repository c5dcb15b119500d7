use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

/// Named request parameters.
///
/// Ordered by key so that serialization (cache keys, pass-through query
/// strings) is stable regardless of insertion order.
pub type Params = BTreeMap<String, Value>;

/// Build [`Params`] from key/value pairs.
///
/// ```
/// use tradepress_providers::models::params;
///
/// let p = params([("symbol", "AAPL"), ("limit", "5")]);
/// assert_eq!(p["symbol"], "AAPL");
/// ```
pub fn params<K, V, I>(pairs: I) -> Params
where
    K: Into<String>,
    V: Into<Value>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Insert `value` under `key` only when it is present.
pub(crate) fn insert_opt<V: Into<Value>>(params: &mut Params, key: &str, value: Option<V>) {
    if let Some(value) = value {
        params.insert(key.to_string(), value.into());
    }
}

/// Flatten a serializable struct into top-level parameters.
///
/// Non-object values produce an empty map.
pub(crate) fn object_params<T: Serialize>(value: &T) -> Result<Params, serde_json::Error> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map.into_iter().filter(|(_, v)| !v.is_null()).collect()),
        _ => Ok(Params::new()),
    }
}

/// Render a parameter value for a URL path segment or query string.
///
/// Arrays are joined with commas, `null` is skipped, nested objects are
/// rendered as compact JSON.
pub(crate) fn query_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(query_value).collect();
            Some(parts.join(","))
        }
        Value::Object(_) => Some(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_value_joins_arrays() {
        assert_eq!(
            query_value(&json!(["AAPL", "MSFT"])),
            Some("AAPL,MSFT".to_string())
        );
        assert_eq!(query_value(&json!(10)), Some("10".to_string()));
        assert_eq!(query_value(&json!(true)), Some("true".to_string()));
        assert_eq!(query_value(&Value::Null), None);
    }

    #[test]
    fn test_object_params_drops_nulls() {
        #[derive(Serialize)]
        struct Order {
            symbol: &'static str,
            price: Option<f64>,
        }

        let p = object_params(&Order {
            symbol: "BTC",
            price: None,
        })
        .unwrap();
        assert_eq!(p.len(), 1);
        assert_eq!(p["symbol"], "BTC");
    }

    #[test]
    fn test_insert_opt_skips_none() {
        let mut p = Params::new();
        insert_opt(&mut p, "from", None::<String>);
        insert_opt(&mut p, "to", Some("2024-01-31"));
        assert!(!p.contains_key("from"));
        assert_eq!(p["to"], "2024-01-31");
    }
}
