//! MarketStack provider.
//!
//! End-of-day and intraday prices for global exchanges. The key travels as
//! `access_key`. HTTPS is a paid-plan feature, so the transport defaults to
//! plain HTTP unless `marketstack_use_https` is set.

use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::json;

use crate::client::{
    DataType, ErrorShape, ProviderCapabilities, ProviderClient, ProviderDescriptor, Wiring,
};
use crate::config::{ProviderConfig, SettingsStore};
use crate::endpoint::{AuthPlacement, EndpointDefinition, EndpointRegistry, HttpMethod, ParamPolicy};
use crate::errors::RequestResult;
use crate::models::{insert_opt, params, Params};
use crate::transport::HttpTransport;

const PROVIDER_ID: &str = "marketstack";

pub static ENDPOINTS: EndpointRegistry = EndpointRegistry {
    provider: PROVIDER_ID,
    auth: AuthPlacement::QueryParam("access_key"),
    param_policy: ParamPolicy::Declared,
    param_aliases: &[],
    static_headers: &[],
    request_id_header: None,
    endpoints: &[
        EndpointDefinition {
            name: "eod",
            path: "/eod",
            method: HttpMethod::Get,
            required: &["symbols"],
            optional: &["exchange", "sort", "date_from", "date_to", "limit", "offset"],
            description: "End-of-day bars",
            example_response: None,
        },
        EndpointDefinition {
            name: "eod_latest",
            path: "/eod/latest",
            method: HttpMethod::Get,
            required: &["symbols"],
            optional: &["exchange", "limit", "offset"],
            description: "Most recent end-of-day bar",
            example_response: Some(
                r#"{"pagination":{"limit":100,"offset":0,"count":1,"total":1},"data":[{"open":187.15,"high":190.32,"low":186.9,"close":189.84,"volume":48211020.0,"adj_high":190.32,"adj_low":186.9,"adj_close":189.84,"adj_open":187.15,"adj_volume":48211020.0,"split_factor":1.0,"dividend":0.0,"symbol":"AAPL","exchange":"XNAS","date":"2024-04-05T00:00:00+0000"}]}"#,
            ),
        },
        EndpointDefinition {
            name: "eod_date",
            path: "/eod/{date}",
            method: HttpMethod::Get,
            required: &["date", "symbols"],
            optional: &["exchange", "limit", "offset"],
            description: "End-of-day bar for one date",
            example_response: None,
        },
        EndpointDefinition {
            name: "intraday",
            path: "/intraday",
            method: HttpMethod::Get,
            required: &["symbols"],
            optional: &["interval", "exchange", "sort", "date_from", "date_to", "limit", "offset"],
            description: "Intraday bars (IEX venue)",
            example_response: None,
        },
        EndpointDefinition {
            name: "intraday_latest",
            path: "/intraday/latest",
            method: HttpMethod::Get,
            required: &["symbols"],
            optional: &["interval", "exchange", "limit", "offset"],
            description: "Most recent intraday bar",
            example_response: None,
        },
        EndpointDefinition {
            name: "tickers",
            path: "/tickers",
            method: HttpMethod::Get,
            required: &[],
            optional: &["exchange", "search", "limit", "offset"],
            description: "Ticker directory",
            example_response: None,
        },
        EndpointDefinition {
            name: "ticker",
            path: "/tickers/{symbol}",
            method: HttpMethod::Get,
            required: &["symbol"],
            optional: &[],
            description: "One ticker with its exchange",
            example_response: None,
        },
        EndpointDefinition {
            name: "exchanges",
            path: "/exchanges",
            method: HttpMethod::Get,
            required: &[],
            optional: &["search", "limit", "offset"],
            description: "Supported exchanges",
            example_response: None,
        },
        EndpointDefinition {
            name: "currencies",
            path: "/currencies",
            method: HttpMethod::Get,
            required: &[],
            optional: &["limit", "offset"],
            description: "Supported currencies",
            example_response: None,
        },
    ],
};

pub static DESCRIPTOR: ProviderDescriptor = ProviderDescriptor {
    id: PROVIDER_ID,
    name: "MarketStack",
    default_base_url: "https://api.marketstack.com/v1",
    sandbox_base_url: None,
    encrypted_by_default: false,
    account_param: None,
    registry: &ENDPOINTS,
    capabilities: ProviderCapabilities {
        data_types: &[
            DataType::Quotes,
            DataType::HistoricalBars,
            DataType::Intraday,
            DataType::Search,
        ],
        supports_trading: false,
        supports_streaming: false,
        wiring: Wiring::Full,
    },
    error_shapes: &[ErrorShape::Field("error")],
    default_params: &[("limit", "100")],
    requires_credential: true,
};

/// MarketStack client.
pub struct MarketstackClient {
    inner: ProviderClient,
}

impl MarketstackClient {
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

    /// End-of-day bars for `symbols` between `from` and `to`.
    pub async fn get_eod(
        &self,
        symbols: &[&str],
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> RequestResult {
        let mut p = params([("symbols", json!(symbols))]);
        insert_opt(&mut p, "date_from", from.map(|d| d.format("%Y-%m-%d").to_string()));
        insert_opt(&mut p, "date_to", to.map(|d| d.format("%Y-%m-%d").to_string()));
        self.inner.execute("eod", p).await
    }

    pub async fn get_eod_latest(&self, symbols: &[&str]) -> RequestResult {
        self.inner
            .execute("eod_latest", params([("symbols", json!(symbols))]))
            .await
    }

    /// Intraday bars; `interval` is e.g. `1min`, `15min`, `1hour`.
    pub async fn get_intraday(&self, symbols: &[&str], interval: Option<&str>) -> RequestResult {
        let mut p = params([("symbols", json!(symbols))]);
        insert_opt(&mut p, "interval", interval);
        self.inner.execute("intraday", p).await
    }

    pub async fn get_ticker(&self, symbol: &str) -> RequestResult {
        self.inner.execute("ticker", params([("symbol", symbol)])).await
    }

    pub async fn get_exchanges(&self) -> RequestResult {
        self.inner.execute("exchanges", Params::new()).await
    }

    pub async fn search_tickers(&self, query: &str) -> RequestResult {
        self.inner
            .execute("tickers", params([("search", query)]))
            .await
    }
}
