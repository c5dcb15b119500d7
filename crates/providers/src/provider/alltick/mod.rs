//! AllTick provider.
//!
//! The endpoint table is complete and resolves URLs (REST and the quote
//! stream), but the client methods are not wired to the network yet and
//! return `NotImplemented`. [`DESCRIPTOR`] advertises this through
//! [`Wiring::Placeholder`].

use std::sync::Arc;

use serde_json::json;

use crate::client::{
    DataType, ErrorShape, ProviderCapabilities, ProviderClient, ProviderDescriptor, Wiring,
};
use crate::config::{ProviderConfig, SettingsStore};
use crate::endpoint::{AuthPlacement, EndpointDefinition, EndpointRegistry, HttpMethod, ParamPolicy};
use crate::errors::{ApiError, RequestResult};
use crate::models::params;
use crate::transport::HttpTransport;

const PROVIDER_ID: &str = "alltick";

pub static ENDPOINTS: EndpointRegistry = EndpointRegistry {
    provider: PROVIDER_ID,
    auth: AuthPlacement::QueryParam("token"),
    param_policy: ParamPolicy::Declared,
    param_aliases: &[("symbol", "code")],
    static_headers: &[],
    request_id_header: None,
    endpoints: &[
        EndpointDefinition {
            name: "stock_quote",
            path: "/api/v1/quote",
            method: HttpMethod::Get,
            required: &["code"],
            optional: &[],
            description: "Latest quote for a code such as AAPL.US or 700.HK",
            example_response: Some(
                r#"{"ret":200,"msg":"ok","trace":"3baf1a7c-5b42-4f33-8c12-7e6b2f1f0f7a","data":{"tick_list":[{"code":"AAPL.US","seq":"1605509068","tick_time":"1712347200000","price":"189.84","volume":"100","turnover":"18984","trade_direction":1}]}}"#,
            ),
        },
        EndpointDefinition {
            name: "kline",
            path: "/api/v1/kline",
            method: HttpMethod::Get,
            required: &["code", "kline_type"],
            optional: &["kline_timestamp_end", "query_kline_num", "adjust_type"],
            description: "Candles; kline_type 1=1m ... 8=1d, 9=1w, 10=1M",
            example_response: None,
        },
        EndpointDefinition {
            name: "depth",
            path: "/api/v1/depth",
            method: HttpMethod::Get,
            required: &["code"],
            optional: &[],
            description: "Order book levels",
            example_response: None,
        },
        EndpointDefinition {
            name: "trade_tick",
            path: "/api/v1/trade-tick",
            method: HttpMethod::Get,
            required: &["code"],
            optional: &[],
            description: "Latest trade ticks",
            example_response: None,
        },
        EndpointDefinition {
            name: "static_info",
            path: "/api/v1/static-info",
            method: HttpMethod::Get,
            required: &["code"],
            optional: &[],
            description: "Instrument reference data",
            example_response: None,
        },
        EndpointDefinition {
            name: "stream",
            path: "/ws/v1/quote",
            method: HttpMethod::Ws,
            required: &[],
            optional: &["cmd_id", "seq_id", "trace", "data"],
            description: "Real-time tick and depth subscriptions",
            example_response: None,
        },
    ],
};

pub static DESCRIPTOR: ProviderDescriptor = ProviderDescriptor {
    id: PROVIDER_ID,
    name: "AllTick",
    default_base_url: "https://quote.alltick.io",
    sandbox_base_url: None,
    encrypted_by_default: true,
    account_param: None,
    registry: &ENDPOINTS,
    capabilities: ProviderCapabilities {
        data_types: &[DataType::Quotes, DataType::HistoricalBars, DataType::OrderBook],
        supports_trading: false,
        supports_streaming: true,
        wiring: Wiring::Placeholder,
    },
    error_shapes: &[ErrorShape::Status {
        code: "ret",
        ok: 200,
        message: "msg",
    }],
    default_params: &[],
    requires_credential: true,
};

/// AllTick client. Methods are placeholders.
pub struct AlltickClient {
    inner: ProviderClient,
}

impl AlltickClient {
    pub fn new(config: ProviderConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            inner: ProviderClient::new(&DESCRIPTOR, config, transport),
        }
    }

    pub fn from_settings(store: &dyn SettingsStore) -> Self {
        Self {
            inner: ProviderClient::from_settings(&DESCRIPTOR, store),
        }
    }

    pub fn inner(&self) -> &ProviderClient {
        &self.inner
    }

    pub async fn get_quote(&self, _symbol: &str) -> RequestResult {
        Err(ApiError::not_implemented(PROVIDER_ID, "get_quote"))
    }

    pub async fn get_kline(&self, _symbol: &str, _kline_type: u8, _count: u32) -> RequestResult {
        Err(ApiError::not_implemented(PROVIDER_ID, "get_kline"))
    }

    pub async fn get_depth(&self, _symbol: &str) -> RequestResult {
        Err(ApiError::not_implemented(PROVIDER_ID, "get_depth"))
    }

    pub async fn get_trade_tick(&self, _symbol: &str) -> RequestResult {
        Err(ApiError::not_implemented(PROVIDER_ID, "get_trade_tick"))
    }

    /// Websocket URL for the quote stream, with the token attached.
    pub fn stream_url(&self) -> Option<String> {
        self.inner
            .endpoint_url("stream", params([("cmd_id", json!(22002))]))
    }
}
