//! IEX Cloud provider.
//!
//! Stock quotes, charts, company data and news. Publishable tokens travel as
//! the `token` query parameter; `iex_sandbox` switches to the sandbox host.

use std::sync::Arc;

use serde_json::json;

use crate::client::{
    DataType, ErrorShape, ProviderCapabilities, ProviderClient, ProviderDescriptor, Wiring,
};
use crate::config::{ProviderConfig, SettingsStore};
use crate::endpoint::{AuthPlacement, EndpointDefinition, EndpointRegistry, HttpMethod, ParamPolicy};
use crate::errors::RequestResult;
use crate::models::{params, Params};
use crate::transport::HttpTransport;

const PROVIDER_ID: &str = "iex";

pub static ENDPOINTS: EndpointRegistry = EndpointRegistry {
    provider: PROVIDER_ID,
    auth: AuthPlacement::QueryParam("token"),
    param_policy: ParamPolicy::PassThrough,
    param_aliases: &[],
    static_headers: &[],
    request_id_header: None,
    endpoints: &[
        EndpointDefinition {
            name: "quote",
            path: "/stock/{symbol}/quote",
            method: HttpMethod::Get,
            required: &["symbol"],
            optional: &["displayPercent"],
            description: "Latest quote",
            example_response: Some(
                r#"{"symbol":"AAPL","companyName":"Apple Inc","primaryExchange":"NASDAQ","latestPrice":189.84,"latestSource":"Close","latestTime":"April 5, 2024","latestVolume":48211020,"change":2.32,"changePercent":0.01237,"open":187.15,"high":190.32,"low":186.9,"previousClose":187.52,"marketCap":2936155330560,"peRatio":29.52,"week52High":199.62,"week52Low":164.08,"isUSMarketOpen":false}"#,
            ),
        },
        EndpointDefinition {
            name: "chart",
            path: "/stock/{symbol}/chart/{range}",
            method: HttpMethod::Get,
            required: &["symbol", "range"],
            optional: &["chartByDay", "chartCloseOnly", "chartInterval"],
            description: "Historical bars for a range (5d, 1m, 3m, 6m, ytd, 1y, 5y, max)",
            example_response: None,
        },
        EndpointDefinition {
            name: "intraday_prices",
            path: "/stock/{symbol}/intraday-prices",
            method: HttpMethod::Get,
            required: &["symbol"],
            optional: &["chartIEXOnly", "chartInterval"],
            description: "Minute bars for the current session",
            example_response: None,
        },
        EndpointDefinition {
            name: "previous",
            path: "/stock/{symbol}/previous",
            method: HttpMethod::Get,
            required: &["symbol"],
            optional: &[],
            description: "Previous session bar",
            example_response: None,
        },
        EndpointDefinition {
            name: "company",
            path: "/stock/{symbol}/company",
            method: HttpMethod::Get,
            required: &["symbol"],
            optional: &[],
            description: "Company information",
            example_response: None,
        },
        EndpointDefinition {
            name: "stats",
            path: "/stock/{symbol}/stats",
            method: HttpMethod::Get,
            required: &["symbol"],
            optional: &[],
            description: "Key statistics",
            example_response: None,
        },
        EndpointDefinition {
            name: "news",
            path: "/stock/{symbol}/news/last/{last}",
            method: HttpMethod::Get,
            required: &["symbol", "last"],
            optional: &[],
            description: "Latest news articles",
            example_response: None,
        },
        EndpointDefinition {
            name: "batch",
            path: "/stock/market/batch",
            method: HttpMethod::Get,
            required: &["symbols", "types"],
            optional: &["range", "last"],
            description: "Several data types for several symbols in one call",
            example_response: None,
        },
    ],
};

pub static DESCRIPTOR: ProviderDescriptor = ProviderDescriptor {
    id: PROVIDER_ID,
    name: "IEX Cloud",
    default_base_url: "https://cloud.iexapis.com/stable",
    sandbox_base_url: Some("https://sandbox.iexapis.com/stable"),
    encrypted_by_default: true,
    account_param: None,
    registry: &ENDPOINTS,
    capabilities: ProviderCapabilities {
        data_types: &[
            DataType::Quotes,
            DataType::HistoricalBars,
            DataType::Intraday,
            DataType::Fundamentals,
            DataType::News,
        ],
        supports_trading: false,
        supports_streaming: false,
        wiring: Wiring::Full,
    },
    error_shapes: &[ErrorShape::Field("error")],
    default_params: &[],
    requires_credential: true,
};

/// IEX Cloud client.
pub struct IexClient {
    inner: ProviderClient,
}

impl IexClient {
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

    pub async fn get_quote(&self, symbol: &str) -> RequestResult {
        self.inner.execute("quote", params([("symbol", symbol)])).await
    }

    /// Historical bars; `range` is one of IEX's range tokens (`1m`, `1y`, ...).
    pub async fn get_chart(&self, symbol: &str, range: &str) -> RequestResult {
        self.inner
            .execute("chart", params([("symbol", symbol), ("range", range)]))
            .await
    }

    pub async fn get_intraday_prices(&self, symbol: &str) -> RequestResult {
        self.inner
            .execute("intraday_prices", params([("symbol", symbol)]))
            .await
    }

    pub async fn get_previous(&self, symbol: &str) -> RequestResult {
        self.inner.execute("previous", params([("symbol", symbol)])).await
    }

    pub async fn get_company(&self, symbol: &str) -> RequestResult {
        self.inner.execute("company", params([("symbol", symbol)])).await
    }

    pub async fn get_stats(&self, symbol: &str) -> RequestResult {
        self.inner.execute("stats", params([("symbol", symbol)])).await
    }

    pub async fn get_news(&self, symbol: &str, last: u32) -> RequestResult {
        let p = params([("symbol", json!(symbol)), ("last", json!(last))]);
        self.inner.execute("news", p).await
    }

    /// Fetch several `types` (`quote`, `news`, `chart`) for several symbols.
    pub async fn get_batch(&self, symbols: &[&str], types: &[&str]) -> RequestResult {
        let p: Params = params([("symbols", json!(symbols)), ("types", json!(types))]);
        self.inner.execute("batch", p).await
    }
}
