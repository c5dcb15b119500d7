//! Financial Modeling Prep provider.
//!
//! - Quotes and profiles via `/quote/{symbol}` and `/profile/{symbol}`
//! - Daily history via `/historical-price-full/{symbol}`
//! - Statements, key metrics and news
//!
//! The key travels as the `apikey` query parameter. FMP tables do not
//! declare optional parameters exhaustively, so unlisted parameters are
//! passed through untouched. Errors arrive as `{"Error Message": "..."}`.

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

const PROVIDER_ID: &str = "fmp";

pub static ENDPOINTS: EndpointRegistry = EndpointRegistry {
    provider: PROVIDER_ID,
    auth: AuthPlacement::QueryParam("apikey"),
    param_policy: ParamPolicy::PassThrough,
    param_aliases: &[],
    static_headers: &[],
    request_id_header: None,
    endpoints: &[
        EndpointDefinition {
            name: "quote",
            path: "/quote/{symbol}",
            method: HttpMethod::Get,
            required: &["symbol"],
            optional: &[],
            description: "Real-time quote, comma-separated symbols allowed",
            example_response: Some(
                r#"[{"symbol":"AAPL","name":"Apple Inc.","price":189.84,"changesPercentage":1.2345,"change":2.32,"dayLow":186.9,"dayHigh":190.32,"yearHigh":199.62,"yearLow":164.08,"marketCap":2936155330560,"priceAvg50":178.44,"priceAvg200":181.23,"exchange":"NASDAQ","volume":48211020,"avgVolume":55430123,"open":187.15,"previousClose":187.52,"eps":6.43,"pe":29.52,"timestamp":1712347201}]"#,
            ),
        },
        EndpointDefinition {
            name: "quote_short",
            path: "/quote-short/{symbol}",
            method: HttpMethod::Get,
            required: &["symbol"],
            optional: &[],
            description: "Price and volume only",
            example_response: None,
        },
        EndpointDefinition {
            name: "profile",
            path: "/profile/{symbol}",
            method: HttpMethod::Get,
            required: &["symbol"],
            optional: &[],
            description: "Company profile",
            example_response: Some(
                r#"[{"symbol":"AAPL","companyName":"Apple Inc.","currency":"USD","exchangeShortName":"NASDAQ","industry":"Consumer Electronics","sector":"Technology","country":"US","website":"https://www.apple.com","description":"Apple Inc. designs, manufactures, and markets smartphones, personal computers, tablets, wearables, and accessories worldwide.","ceo":"Mr. Timothy D. Cook","fullTimeEmployees":"161000","ipoDate":"1980-12-12","isEtf":false,"isActivelyTrading":true}]"#,
            ),
        },
        EndpointDefinition {
            name: "historical_price_full",
            path: "/historical-price-full/{symbol}",
            method: HttpMethod::Get,
            required: &["symbol"],
            optional: &["from", "to", "serietype", "timeseries"],
            description: "Daily OHLCV history",
            example_response: Some(
                r#"{"symbol":"AAPL","historical":[{"date":"2024-04-05","open":169.59,"high":170.39,"low":168.95,"close":169.58,"adjClose":169.58,"volume":42104826,"change":-0.01,"changePercent":-0.0059,"label":"April 05, 24"}]}"#,
            ),
        },
        EndpointDefinition {
            name: "historical_chart",
            path: "/historical-chart/{interval}/{symbol}",
            method: HttpMethod::Get,
            required: &["interval", "symbol"],
            optional: &["from", "to"],
            description: "Intraday bars (1min, 5min, 15min, 30min, 1hour, 4hour)",
            example_response: None,
        },
        EndpointDefinition {
            name: "search",
            path: "/search",
            method: HttpMethod::Get,
            required: &["query"],
            optional: &["limit", "exchange"],
            description: "Symbol and company name search",
            example_response: None,
        },
        EndpointDefinition {
            name: "income_statement",
            path: "/income-statement/{symbol}",
            method: HttpMethod::Get,
            required: &["symbol"],
            optional: &["period", "limit"],
            description: "Income statements, annual or quarterly",
            example_response: None,
        },
        EndpointDefinition {
            name: "balance_sheet",
            path: "/balance-sheet-statement/{symbol}",
            method: HttpMethod::Get,
            required: &["symbol"],
            optional: &["period", "limit"],
            description: "Balance sheet statements",
            example_response: None,
        },
        EndpointDefinition {
            name: "cash_flow",
            path: "/cash-flow-statement/{symbol}",
            method: HttpMethod::Get,
            required: &["symbol"],
            optional: &["period", "limit"],
            description: "Cash flow statements",
            example_response: None,
        },
        EndpointDefinition {
            name: "key_metrics",
            path: "/key-metrics/{symbol}",
            method: HttpMethod::Get,
            required: &["symbol"],
            optional: &["period", "limit"],
            description: "Valuation and per-share metrics",
            example_response: None,
        },
        EndpointDefinition {
            name: "stock_news",
            path: "/stock_news",
            method: HttpMethod::Get,
            required: &[],
            optional: &["tickers", "limit", "page"],
            description: "Latest news, optionally filtered by tickers",
            example_response: None,
        },
        EndpointDefinition {
            name: "gainers",
            path: "/stock_market/gainers",
            method: HttpMethod::Get,
            required: &[],
            optional: &[],
            description: "Top gainers today",
            example_response: None,
        },
        EndpointDefinition {
            name: "losers",
            path: "/stock_market/losers",
            method: HttpMethod::Get,
            required: &[],
            optional: &[],
            description: "Top losers today",
            example_response: None,
        },
        EndpointDefinition {
            name: "market_open",
            path: "/is-the-market-open",
            method: HttpMethod::Get,
            required: &[],
            optional: &["exchange"],
            description: "Exchange trading hours and status",
            example_response: None,
        },
    ],
};

pub static DESCRIPTOR: ProviderDescriptor = ProviderDescriptor {
    id: PROVIDER_ID,
    name: "Financial Modeling Prep",
    default_base_url: "https://financialmodelingprep.com/api/v3",
    sandbox_base_url: None,
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
            DataType::Search,
        ],
        supports_trading: false,
        supports_streaming: false,
        wiring: Wiring::Full,
    },
    error_shapes: &[ErrorShape::Field("Error Message"), ErrorShape::Field("error")],
    default_params: &[],
    requires_credential: true,
};

/// Financial statement granularity.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Period {
    Annual,
    Quarter,
}

impl Period {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Annual => "annual",
            Self::Quarter => "quarter",
        }
    }
}

/// Financial Modeling Prep client.
pub struct FmpClient {
    inner: ProviderClient,
}

impl FmpClient {
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

    pub async fn get_company_profile(&self, symbol: &str) -> RequestResult {
        self.inner.execute("profile", params([("symbol", symbol)])).await
    }

    /// Daily bars between `from` and `to` (inclusive).
    pub async fn get_historical_prices(
        &self,
        symbol: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> RequestResult {
        let mut p = params([("symbol", symbol)]);
        insert_opt(&mut p, "from", from.map(|d| d.format("%Y-%m-%d").to_string()));
        insert_opt(&mut p, "to", to.map(|d| d.format("%Y-%m-%d").to_string()));
        self.inner.execute("historical_price_full", p).await
    }

    pub async fn get_intraday_chart(&self, symbol: &str, interval: &str) -> RequestResult {
        self.inner
            .execute(
                "historical_chart",
                params([("symbol", symbol), ("interval", interval)]),
            )
            .await
    }

    pub async fn search(&self, query: &str, limit: Option<u32>) -> RequestResult {
        let mut p = params([("query", query)]);
        insert_opt(&mut p, "limit", limit);
        self.inner.execute("search", p).await
    }

    pub async fn get_income_statement(
        &self,
        symbol: &str,
        period: Period,
        limit: Option<u32>,
    ) -> RequestResult {
        self.statement("income_statement", symbol, period, limit).await
    }

    pub async fn get_balance_sheet(
        &self,
        symbol: &str,
        period: Period,
        limit: Option<u32>,
    ) -> RequestResult {
        self.statement("balance_sheet", symbol, period, limit).await
    }

    pub async fn get_cash_flow(
        &self,
        symbol: &str,
        period: Period,
        limit: Option<u32>,
    ) -> RequestResult {
        self.statement("cash_flow", symbol, period, limit).await
    }

    pub async fn get_key_metrics(
        &self,
        symbol: &str,
        period: Period,
        limit: Option<u32>,
    ) -> RequestResult {
        self.statement("key_metrics", symbol, period, limit).await
    }

    pub async fn get_stock_news(&self, tickers: &[&str], limit: Option<u32>) -> RequestResult {
        let mut p = Params::new();
        if !tickers.is_empty() {
            p.insert("tickers".to_string(), json!(tickers));
        }
        insert_opt(&mut p, "limit", limit);
        self.inner.execute("stock_news", p).await
    }

    pub async fn get_market_gainers(&self) -> RequestResult {
        self.inner.execute("gainers", Params::new()).await
    }

    pub async fn get_market_losers(&self) -> RequestResult {
        self.inner.execute("losers", Params::new()).await
    }

    async fn statement(
        &self,
        endpoint: &str,
        symbol: &str,
        period: Period,
        limit: Option<u32>,
    ) -> RequestResult {
        let mut p = params([("symbol", symbol), ("period", period.as_str())]);
        insert_opt(&mut p, "limit", limit);
        self.inner.execute(endpoint, p).await
    }
}
