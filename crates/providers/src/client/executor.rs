//! The generic request executor shared by every provider.

use std::sync::Arc;

use log::{debug, info, warn};
use reqwest::StatusCode;
use serde_json::Value;

use super::capabilities::ProviderCapabilities;
use super::descriptor::ProviderDescriptor;
use super::error_shape::extract_provider_error;
use crate::config::{ProviderConfig, SettingsStore};
use crate::endpoint::HttpMethod;
use crate::errors::{ApiError, RequestResult};
use crate::models::Params;
use crate::transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};

/// Data-driven client for one provider.
///
/// Every provider facade funnels its calls through [`execute`](Self::execute):
///
/// 0. Serve the demo fixture when in demo mode or the credential is absent
/// 1. Merge provider defaults under the caller's parameters
/// 2. Resolve the request through the endpoint registry
/// 3. Send it once through the transport (no retries)
/// 4. Map transport failures, non-2xx status, bad JSON and provider error
///    payloads to [`ApiError`]
pub struct ProviderClient {
    descriptor: &'static ProviderDescriptor,
    config: ProviderConfig,
    transport: Arc<dyn HttpTransport>,
}

impl ProviderClient {
    pub fn new(
        descriptor: &'static ProviderDescriptor,
        config: ProviderConfig,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            descriptor,
            config,
            transport,
        }
    }

    /// Client configured from the host settings store, using `reqwest`.
    pub fn from_settings(
        descriptor: &'static ProviderDescriptor,
        store: &dyn SettingsStore,
    ) -> Self {
        Self::new(
            descriptor,
            ProviderConfig::from_settings(descriptor, store),
            Arc::new(ReqwestTransport::new()),
        )
    }

    pub fn id(&self) -> &'static str {
        self.descriptor.id
    }

    pub fn descriptor(&self) -> &'static ProviderDescriptor {
        self.descriptor
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn capabilities(&self) -> &ProviderCapabilities {
        &self.descriptor.capabilities
    }

    /// Whether calls are answered from fixtures instead of the network.
    pub fn uses_demo_data(&self) -> bool {
        self.config.demo_mode
            || (self.descriptor.requires_credential && self.config.credential.is_none())
    }

    /// URL for `endpoint` with defaults merged, for callers that open it
    /// themselves (websocket streams).
    pub fn endpoint_url(&self, endpoint: &str, params: Params) -> Option<String> {
        let params = self.merge_defaults(params);
        self.descriptor
            .registry
            .build_url(endpoint, &params, &self.config)
    }

    /// Execute one named operation.
    pub async fn execute(&self, endpoint: &str, params: Params) -> RequestResult {
        if self.uses_demo_data() {
            return self.demo_response(endpoint);
        }

        let params = self.merge_defaults(params);
        let Some(prepared) = self
            .descriptor
            .registry
            .build_request(endpoint, &params, &self.config)
        else {
            warn!("{}: could not resolve endpoint '{}'", self.id(), endpoint);
            return Err(ApiError::InvalidEndpoint {
                provider: self.id().to_string(),
                endpoint: endpoint.to_string(),
            });
        };

        if prepared.method == HttpMethod::Ws {
            return Err(ApiError::unsupported(
                self.id(),
                &format!("{} over HTTP", endpoint),
            ));
        }

        debug!("{} {} {}", self.id(), prepared.method, prepared.display_url);

        let response = self
            .transport
            .send(HttpRequest {
                method: prepared.method,
                url: prepared.url,
                headers: prepared.headers,
                body: prepared.body,
                timeout: self.config.timeout,
            })
            .await
            .map_err(|e| {
                warn!("{}: transport error on '{}': {}", self.id(), endpoint, e);
                ApiError::Transport {
                    provider: self.id().to_string(),
                    message: e.message,
                }
            })?;

        self.interpret(endpoint, response)
    }

    fn merge_defaults(&self, mut params: Params) -> Params {
        for (key, value) in self.descriptor.default_params {
            params
                .entry(key.to_string())
                .or_insert_with(|| Value::String(value.to_string()));
        }
        for (key, value) in &self.config.defaults {
            params.entry(key.clone()).or_insert_with(|| value.clone());
        }
        params
    }

    fn interpret(&self, endpoint: &str, response: HttpResponse) -> RequestResult {
        let provider = self.id().to_string();
        let decoded = serde_json::from_str::<Value>(&response.body);

        if !(200..300).contains(&response.status) {
            let detail = decoded
                .ok()
                .and_then(|body| {
                    extract_provider_error(self.descriptor.error_shapes, &body).or_else(|| {
                        body.get("message")
                            .and_then(Value::as_str)
                            .map(str::to_string)
                    })
                })
                .unwrap_or_else(|| {
                    StatusCode::from_u16(response.status)
                        .ok()
                        .and_then(|s| s.canonical_reason())
                        .unwrap_or("request failed")
                        .to_string()
                });
            warn!(
                "{}: '{}' returned HTTP {}: {}",
                provider, endpoint, response.status, detail
            );
            return Err(ApiError::HttpStatus {
                provider,
                status: response.status,
                message: detail,
            });
        }

        if response.body.trim().is_empty() {
            return Ok(Value::Null);
        }

        let body = decoded.map_err(|e| {
            warn!("{}: '{}' returned malformed JSON: {}", provider, endpoint, e);
            ApiError::Decode {
                provider: provider.clone(),
                message: e.to_string(),
            }
        })?;

        if let Some(message) = extract_provider_error(self.descriptor.error_shapes, &body) {
            warn!("{}: '{}' reported an error: {}", provider, endpoint, message);
            return Err(ApiError::Provider { provider, message });
        }

        Ok(body)
    }

    fn demo_response(&self, endpoint: &str) -> RequestResult {
        let provider = self.id().to_string();
        let Some(definition) = self.descriptor.registry.get_endpoint(endpoint) else {
            return Err(ApiError::InvalidEndpoint {
                provider,
                endpoint: endpoint.to_string(),
            });
        };

        match definition.example_response {
            Some(fixture) => {
                info!("{}: serving demo data for '{}'", provider, endpoint);
                serde_json::from_str(fixture).map_err(|e| ApiError::Decode {
                    provider,
                    message: format!("demo fixture for '{}': {}", endpoint, e),
                })
            }
            None if self.config.credential.is_none() && self.descriptor.requires_credential => {
                Err(ApiError::MissingCredentials { provider })
            }
            None => Err(ApiError::Unsupported {
                provider,
                operation: format!("{} in demo mode", endpoint),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Credential, Secret};
    use crate::errors::FailureKind;
    use crate::models::params;
    use crate::provider::{fmp, ibkr, marketstack};
    use crate::transport::mock::MockTransport;

    fn fmp_client(mock: &Arc<MockTransport>) -> ProviderClient {
        let config = ProviderConfig::for_provider(&fmp::DESCRIPTOR)
            .with_credential(Credential::ApiKey(Secret::new("fmp-key")));
        ProviderClient::new(&fmp::DESCRIPTOR, config, mock.clone())
    }

    #[tokio::test]
    async fn test_success_returns_body() {
        let mock = Arc::new(MockTransport::responding(200, r#"[{"symbol":"AAPL","price":189.5}]"#));
        let client = fmp_client(&mock);

        let body = client
            .execute("quote", params([("symbol", "AAPL")]))
            .await
            .unwrap();

        assert_eq!(body[0]["price"], 189.5);
        let request = mock.last_request().unwrap();
        assert_eq!(
            request.url,
            "https://financialmodelingprep.com/api/v3/quote/AAPL?apikey=fmp-key"
        );
        assert_eq!(request.method, HttpMethod::Get);
    }

    #[tokio::test]
    async fn test_fmp_error_message_maps_to_provider_failure() {
        let mock = Arc::new(MockTransport::responding(
            200,
            r#"{"Error Message": "Invalid API key"}"#,
        ));
        let err = fmp_client(&mock)
            .execute("quote", params([("symbol", "AAPL")]))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), FailureKind::Provider);
        assert_eq!(err.message(), "Invalid API key");
    }

    #[tokio::test]
    async fn test_marketstack_error_maps_to_provider_failure() {
        let mock = Arc::new(MockTransport::responding(200, r#"{"error": "bad request"}"#));
        let config = ProviderConfig::for_provider(&marketstack::DESCRIPTOR)
            .with_credential(Credential::ApiKey(Secret::new("ms")));
        let client = ProviderClient::new(&marketstack::DESCRIPTOR, config, mock.clone());

        let err = client
            .execute("eod", params([("symbols", "AAPL")]))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), FailureKind::Provider);
        assert_eq!(err.message(), "bad request");
    }

    #[tokio::test]
    async fn test_non_2xx_maps_to_http_status() {
        let mock = Arc::new(MockTransport::responding(503, "Service Unavailable"));
        let err = fmp_client(&mock)
            .execute("quote", params([("symbol", "AAPL")]))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), FailureKind::HttpStatus);
        assert_eq!(err.http_status(), Some(503));
        assert!(err.message().contains("Service Unavailable"));
    }

    #[tokio::test]
    async fn test_non_2xx_uses_provider_message_when_present() {
        let mock = Arc::new(MockTransport::responding(
            401,
            r#"{"Error Message": "Invalid API KEY. Please retry"}"#,
        ));
        let err = fmp_client(&mock)
            .execute("quote", params([("symbol", "AAPL")]))
            .await
            .unwrap_err();

        assert_eq!(err.http_status(), Some(401));
        assert!(err.message().ends_with("Invalid API KEY. Please retry"));
    }

    #[tokio::test]
    async fn test_malformed_json_is_decode_failure() {
        let mock = Arc::new(MockTransport::responding(200, "<html>oops</html>"));
        let err = fmp_client(&mock)
            .execute("quote", params([("symbol", "AAPL")]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::Decode);
    }

    #[tokio::test]
    async fn test_empty_success_body_is_null() {
        let mock = Arc::new(MockTransport::responding(204, ""));
        let body = fmp_client(&mock)
            .execute("quote", params([("symbol", "AAPL")]))
            .await
            .unwrap();
        assert!(body.is_null());
    }

    #[tokio::test]
    async fn test_transport_failure_is_not_retried() {
        let mock = Arc::new(MockTransport::failing("connection refused"));
        let err = fmp_client(&mock)
            .execute("quote", params([("symbol", "AAPL")]))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), FailureKind::Transport);
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_invalid_endpoint_never_reaches_transport() {
        let mock = Arc::new(MockTransport::responding(200, "{}"));
        let client = fmp_client(&mock);

        let err = client.execute("does_not_exist", Params::new()).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Decode);

        let err = client.execute("quote", Params::new()).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidEndpoint { .. }));
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_credential_without_fixture() {
        let mock = Arc::new(MockTransport::responding(200, "{}"));
        let client = ProviderClient::new(
            &fmp::DESCRIPTOR,
            ProviderConfig::for_provider(&fmp::DESCRIPTOR),
            mock.clone(),
        );

        assert!(client.uses_demo_data());
        let err = client
            .execute("income_statement", params([("symbol", "AAPL")]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::Configuration);
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn test_demo_flag_without_fixture_is_unsupported() {
        let mock = Arc::new(MockTransport::responding(200, "{}"));
        let config = ProviderConfig::for_provider(&ibkr::DESCRIPTOR).with_demo_mode(true);
        let client = ProviderClient::new(&ibkr::DESCRIPTOR, config, mock.clone());

        let err = client.execute("tickle", Params::new()).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Unsupported);
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn test_defaults_merge_under_caller_params() {
        let mock = Arc::new(MockTransport::responding(200, "[]"));
        let config =
            ProviderConfig::for_provider(&ibkr::DESCRIPTOR).with_default("accountId", "U1");
        let client = ProviderClient::new(&ibkr::DESCRIPTOR, config, mock.clone());

        client.execute("positions", Params::new()).await.unwrap();
        assert_eq!(
            mock.last_request().unwrap().url,
            "http://localhost:5000/portal/portfolio/U1/positions/0"
        );

        client
            .execute("positions", params([("accountId", "U2"), ("pageId", "3")]))
            .await
            .unwrap();
        assert_eq!(
            mock.last_request().unwrap().url,
            "http://localhost:5000/portal/portfolio/U2/positions/3"
        );
    }
}
