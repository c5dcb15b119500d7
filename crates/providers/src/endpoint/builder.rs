//! URL and request construction from an [`EndpointRegistry`].

use log::debug;
use serde_json::{Map, Value};
use urlencoding::encode;
use uuid::Uuid;

use super::definition::{
    AuthPlacement, EndpointDefinition, EndpointRegistry, HttpMethod, ParamPolicy,
};
use crate::config::ProviderConfig;
use crate::models::{query_value, Params};

const REDACTED: &str = "[REDACTED]";

/// A fully resolved request, ready for the transport.
#[derive(Clone, Debug)]
pub struct PreparedRequest {
    pub method: HttpMethod,
    pub url: String,
    /// URL with the credential masked, for logs.
    pub display_url: String,
    pub headers: Vec<(String, String)>,
    /// JSON body for POST/PUT/PATCH/DELETE, subscription payload for WS.
    pub body: Option<Value>,
}

/// Path and parameters left after substitution, before auth is applied.
struct Resolved {
    definition: &'static EndpointDefinition,
    path: String,
    query: Vec<(String, String)>,
    body: Option<Value>,
}

impl EndpointRegistry {
    /// Build the URL for `name`, or `None` if the endpoint is unknown or a
    /// required parameter is missing.
    ///
    /// # Example
    ///
    /// ```
    /// use tradepress_providers::config::ProviderConfig;
    /// use tradepress_providers::models::params;
    /// use tradepress_providers::provider::ibkr;
    ///
    /// let config = ProviderConfig::new("http://localhost:5000");
    /// let url = ibkr::ENDPOINTS.build_url(
    ///     "market_data_history",
    ///     &params([("conid", "265598"), ("period", "1m"), ("bar", "1d")]),
    ///     &config,
    /// );
    /// assert_eq!(
    ///     url.as_deref(),
    ///     Some("http://localhost:5000/portal/iserver/marketdata/history?conid=265598&period=1m&bar=1d")
    /// );
    /// ```
    pub fn build_url(
        &self,
        name: &str,
        params: &Params,
        config: &ProviderConfig,
    ) -> Option<String> {
        let resolved = self.resolve(name, params)?;
        Some(self.render_url(&resolved, config, false))
    }

    /// Build method, URL, headers and body for `name`.
    pub fn build_request(
        &self,
        name: &str,
        params: &Params,
        config: &ProviderConfig,
    ) -> Option<PreparedRequest> {
        let resolved = self.resolve(name, params)?;
        let url = self.render_url(&resolved, config, false);
        let display_url = self.render_url(&resolved, config, true);

        let mut headers: Vec<(String, String)> = self
            .static_headers
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        match self.auth {
            AuthPlacement::Bearer => {
                if let Some(token) = config.credential.primary() {
                    headers.push((
                        "Authorization".to_string(),
                        format!("Bearer {}", token.expose()),
                    ));
                }
            }
            AuthPlacement::Headers { key, secret } => {
                if let Some(value) = config.credential.primary() {
                    headers.push((key.to_string(), value.expose().to_string()));
                }
                if let Some(value) = config.credential.secondary() {
                    headers.push((secret.to_string(), value.expose().to_string()));
                }
            }
            AuthPlacement::QueryParam(_) | AuthPlacement::None => {}
        }

        if let Some(header) = self.request_id_header {
            headers.push((header.to_string(), Uuid::new_v4().to_string()));
        }

        Some(PreparedRequest {
            method: resolved.definition.method,
            url,
            display_url,
            headers,
            body: resolved.body,
        })
    }

    fn resolve(&self, name: &str, params: &Params) -> Option<Resolved> {
        let Some(definition) = self.get_endpoint(name) else {
            debug!("{}: unknown endpoint '{}'", self.provider, name);
            return None;
        };

        let mut working = params.clone();
        for (generic, native) in self.param_aliases {
            if !working.contains_key(*native) {
                if let Some(value) = working.remove(*generic) {
                    working.insert(native.to_string(), value);
                }
            }
        }

        if let Some(missing) = definition
            .required
            .iter()
            .find(|r| working.get(**r).map_or(true, Value::is_null))
        {
            debug!(
                "{}: endpoint '{}' missing required parameter '{}'",
                self.provider, name, missing
            );
            return None;
        }

        let mut path = definition.path.to_string();
        for placeholder in definition.placeholders() {
            let value = working.remove(placeholder).as_ref().and_then(query_value)?;
            if value.trim().is_empty() {
                debug!(
                    "{}: endpoint '{}' got an empty '{}' path segment",
                    self.provider, name, placeholder
                );
                return None;
            }
            path = path.replace(
                &format!("{{{}}}", placeholder),
                &encode_path_segment(&value),
            );
        }

        let leftover = self.filter_leftover(definition, working);

        let (query, body) = match definition.method {
            HttpMethod::Get => (ordered_query(definition, leftover), None),
            _ => {
                let body = (!leftover.is_empty())
                    .then(|| Value::Object(leftover.into_iter().collect::<Map<String, Value>>()));
                (Vec::new(), body)
            }
        };

        Some(Resolved {
            definition,
            path,
            query,
            body,
        })
    }

    fn filter_leftover(&self, definition: &EndpointDefinition, working: Params) -> Params {
        match self.param_policy {
            ParamPolicy::PassThrough => working,
            ParamPolicy::Declared => working
                .into_iter()
                .filter(|(k, _)| {
                    let keep = definition.accepts(k);
                    if !keep {
                        debug!(
                            "{}: dropping undeclared parameter '{}' for '{}'",
                            self.provider, k, definition.name
                        );
                    }
                    keep
                })
                .collect(),
        }
    }

    fn render_url(&self, resolved: &Resolved, config: &ProviderConfig, redact: bool) -> String {
        let base = config.effective_base_url();
        let base = if resolved.definition.method == HttpMethod::Ws {
            websocket_base(&base)
        } else {
            base
        };

        let mut pairs: Vec<(&str, &str)> = resolved
            .query
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();

        if let AuthPlacement::QueryParam(key_name) = self.auth {
            if let Some(key) = config.credential.primary() {
                pairs.push((key_name, if redact { REDACTED } else { key.expose() }));
            }
        }

        let mut url = format!("{}{}", base, resolved.path);
        if !pairs.is_empty() {
            let query: Vec<String> = pairs
                .iter()
                .map(|(k, v)| format!("{}={}", encode(k), encode(v)))
                .collect();
            url.push('?');
            url.push_str(&query.join("&"));
        }
        url
    }
}

/// Query pairs in a stable order: required, then optional in declared order,
/// then anything else by key.
fn ordered_query(definition: &EndpointDefinition, mut leftover: Params) -> Vec<(String, String)> {
    let mut query = Vec::with_capacity(leftover.len());

    for name in definition.required.iter().chain(definition.optional) {
        if let Some(value) = leftover.remove(*name) {
            if let Some(rendered) = query_value(&value) {
                query.push((name.to_string(), rendered));
            }
        }
    }

    for (name, value) in leftover {
        if let Some(rendered) = query_value(&value) {
            query.push((name, rendered));
        }
    }

    query
}

fn websocket_base(base: &str) -> String {
    if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        base.to_string()
    }
}

/// Percent-encode a path segment, keeping commas for multi-symbol paths.
fn encode_path_segment(value: &str) -> String {
    value
        .split(',')
        .map(|part| encode(part).into_owned())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Credential, Secret};
    use crate::models::params;
    use serde_json::json;

    static ENDPOINTS: &[EndpointDefinition] = &[
        EndpointDefinition {
            name: "quote",
            path: "/quote/{symbol}",
            method: HttpMethod::Get,
            required: &["symbol"],
            optional: &["limit", "exchange"],
            description: "",
            example_response: None,
        },
        EndpointDefinition {
            name: "order",
            path: "/accounts/{account}/orders",
            method: HttpMethod::Post,
            required: &["account", "side"],
            optional: &["price"],
            description: "",
            example_response: None,
        },
        EndpointDefinition {
            name: "stream",
            path: "/ws",
            method: HttpMethod::Ws,
            required: &[],
            optional: &["codes"],
            description: "",
            example_response: None,
        },
    ];

    fn registry(auth: AuthPlacement, param_policy: ParamPolicy) -> EndpointRegistry {
        EndpointRegistry {
            provider: "test",
            endpoints: ENDPOINTS,
            auth,
            param_policy,
            param_aliases: &[("ticker", "symbol")],
            static_headers: &[("Accept", "application/json")],
            request_id_header: None,
        }
    }

    fn keyed_config() -> ProviderConfig {
        ProviderConfig::new("https://api.example.test/v1/")
            .with_credential(Credential::ApiKey(Secret::new("k3y")))
    }

    #[test]
    fn test_declared_policy_drops_unlisted() {
        let reg = registry(AuthPlacement::QueryParam("apikey"), ParamPolicy::Declared);
        let url = reg
            .build_url(
                "quote",
                &params([
                    ("symbol", "AAPL"),
                    ("exchange", "NASDAQ"),
                    ("junk", "1"),
                    ("limit", "5"),
                ]),
                &keyed_config(),
            )
            .unwrap();
        assert_eq!(
            url,
            "https://api.example.test/v1/quote/AAPL?limit=5&exchange=NASDAQ&apikey=k3y"
        );
    }

    #[test]
    fn test_pass_through_policy_keeps_unlisted() {
        let reg = registry(AuthPlacement::QueryParam("apikey"), ParamPolicy::PassThrough);
        let url = reg
            .build_url(
                "quote",
                &params([("symbol", "AAPL"), ("junk", "1")]),
                &keyed_config(),
            )
            .unwrap();
        assert_eq!(url, "https://api.example.test/v1/quote/AAPL?junk=1&apikey=k3y");
    }

    #[test]
    fn test_missing_required_returns_none() {
        let reg = registry(AuthPlacement::None, ParamPolicy::Declared);
        assert!(reg.build_url("quote", &Params::new(), &keyed_config()).is_none());
        assert!(reg
            .build_url("quote", &params([("symbol", Value::Null)]), &keyed_config())
            .is_none());
        assert!(reg.build_url("nope", &Params::new(), &keyed_config()).is_none());
    }

    #[test]
    fn test_empty_path_value_returns_none() {
        let reg = registry(AuthPlacement::QueryParam("apikey"), ParamPolicy::Declared);
        assert!(reg
            .build_url("quote", &params([("symbol", "")]), &keyed_config())
            .is_none());
        assert!(reg
            .build_url("quote", &params([("symbol", "  ")]), &keyed_config())
            .is_none());
        assert!(reg
            .build_request("order", &params([("account", ""), ("side", "buy")]), &keyed_config())
            .is_none());
    }

    #[test]
    fn test_alias_maps_generic_name() {
        let reg = registry(AuthPlacement::None, ParamPolicy::Declared);
        let url = reg
            .build_url("quote", &params([("ticker", "MSFT")]), &keyed_config())
            .unwrap();
        assert_eq!(url, "https://api.example.test/v1/quote/MSFT");
    }

    #[test]
    fn test_path_segment_encoding_keeps_commas() {
        let reg = registry(AuthPlacement::None, ParamPolicy::Declared);
        let url = reg
            .build_url("quote", &params([("symbol", "BRK B,AAPL")]), &keyed_config())
            .unwrap();
        assert_eq!(url, "https://api.example.test/v1/quote/BRK%20B,AAPL");
    }

    #[test]
    fn test_post_moves_leftovers_into_body() {
        let reg = registry(AuthPlacement::QueryParam("token"), ParamPolicy::Declared);
        let request = reg
            .build_request(
                "order",
                &params([
                    ("account", json!("U1")),
                    ("side", json!("BUY")),
                    ("price", json!(101.5)),
                ]),
                &keyed_config(),
            )
            .unwrap();

        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(
            request.url,
            "https://api.example.test/v1/accounts/U1/orders?token=k3y"
        );
        assert_eq!(
            request.display_url,
            "https://api.example.test/v1/accounts/U1/orders?token=%5BREDACTED%5D"
        );
        assert_eq!(request.body, Some(json!({"side": "BUY", "price": 101.5})));
    }

    #[test]
    fn test_websocket_rewrites_scheme_without_body_params() {
        let reg = registry(AuthPlacement::QueryParam("token"), ParamPolicy::Declared);
        let request = reg
            .build_request("stream", &params([("codes", json!(["AAPL.US"]))]), &keyed_config())
            .unwrap();

        assert_eq!(request.url, "wss://api.example.test/v1/ws?token=k3y");
        assert_eq!(request.body, Some(json!({"codes": ["AAPL.US"]})));
    }

    #[test]
    fn test_bearer_and_header_auth() {
        let reg = registry(AuthPlacement::Bearer, ParamPolicy::Declared);
        let config = ProviderConfig::new("https://api.example.test")
            .with_credential(Credential::BearerToken(Secret::new("tok")));
        let request = reg
            .build_request("quote", &params([("symbol", "X")]), &config)
            .unwrap();
        assert!(request
            .headers
            .contains(&("Authorization".to_string(), "Bearer tok".to_string())));
        assert!(request
            .headers
            .contains(&("Accept".to_string(), "application/json".to_string())));
        assert!(!request.url.contains("tok"));

        let reg = registry(
            AuthPlacement::Headers {
                key: "x-api-key",
                secret: "x-user-key",
            },
            ParamPolicy::Declared,
        );
        let config = ProviderConfig::new("https://api.example.test").with_credential(
            Credential::KeyPair {
                key: Secret::new("a"),
                secret: Secret::new("b"),
            },
        );
        let request = reg
            .build_request("quote", &params([("symbol", "X")]), &config)
            .unwrap();
        assert!(request
            .headers
            .contains(&("x-api-key".to_string(), "a".to_string())));
        assert!(request
            .headers
            .contains(&("x-user-key".to_string(), "b".to_string())));
    }

    #[test]
    fn test_request_id_header_is_fresh() {
        let mut reg = registry(AuthPlacement::None, ParamPolicy::Declared);
        reg.request_id_header = Some("x-request-id");
        let p = params([("symbol", "X")]);
        let config = keyed_config();

        let first = reg.build_request("quote", &p, &config).unwrap();
        let second = reg.build_request("quote", &p, &config).unwrap();
        let id = |r: &PreparedRequest| {
            r.headers
                .iter()
                .find(|(k, _)| k == "x-request-id")
                .map(|(_, v)| v.clone())
        };

        assert_eq!(first.url, second.url);
        assert!(id(&first).is_some());
        assert_ne!(id(&first), id(&second));
    }
}
