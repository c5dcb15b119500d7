//! eToro provider.
//!
//! Account, portfolio, trading and watchlist operations against the eToro
//! public API. Requests carry the `x-api-key` / `x-user-key` header pair
//! and a fresh `x-request-id` per call. Without credentials every read that
//! has a fixture answers from demo data.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;

use crate::client::{
    DataType, ErrorShape, ProviderCapabilities, ProviderClient, ProviderDescriptor, Wiring,
};
use crate::config::{ProviderConfig, SettingsStore};
use crate::endpoint::{AuthPlacement, EndpointDefinition, EndpointRegistry, HttpMethod, ParamPolicy};
use crate::errors::{ApiError, RequestResult};
use crate::models::{insert_opt, object_params, params, Params};
use crate::transport::HttpTransport;

const PROVIDER_ID: &str = "etoro";

pub static ENDPOINTS: EndpointRegistry = EndpointRegistry {
    provider: PROVIDER_ID,
    auth: AuthPlacement::Headers {
        key: "x-api-key",
        secret: "x-user-key",
    },
    param_policy: ParamPolicy::Declared,
    param_aliases: &[],
    static_headers: &[],
    request_id_header: Some("x-request-id"),
    endpoints: &[
        EndpointDefinition {
            name: "account_info",
            path: "/api/v1/account/info",
            method: HttpMethod::Get,
            required: &[],
            optional: &[],
            description: "Account profile and balances",
            example_response: Some(
                r#"{"accountId":"demo-account","username":"tradepress_demo","currency":"USD","balance":10000.0,"equity":10018.6,"availableToTrade":9000.0,"isVirtual":true}"#,
            ),
        },
        EndpointDefinition {
            name: "portfolio",
            path: "/api/v1/trading/info/portfolio",
            method: HttpMethod::Get,
            required: &[],
            optional: &[],
            description: "Portfolio summary with credit and open positions",
            example_response: Some(
                r#"{"clientPortfolio":{"credit":9000.0,"unrealizedPnL":18.6,"positions":[{"positionId":"1621284697","instrumentId":100000,"isBuy":true,"amount":1000.0,"leverage":1}],"orders":[]}}"#,
            ),
        },
        EndpointDefinition {
            name: "positions",
            path: "/api/v1/trading/info/positions",
            method: HttpMethod::Get,
            required: &[],
            optional: &[],
            description: "Open positions",
            example_response: Some(
                r#"{"positions":[{"positionId":"1621284697","instrumentId":100000,"symbol":"BTC","isBuy":true,"amount":1000.0,"units":0.0152,"openRate":65789.12,"currentRate":67012.5,"leverage":1,"netProfit":18.6,"openDateTime":"2024-04-02T14:21:07Z"}]}"#,
            ),
        },
        EndpointDefinition {
            name: "instruments",
            path: "/api/v1/market-data/instruments",
            method: HttpMethod::Get,
            required: &[],
            optional: &["instrumentIds", "searchText"],
            description: "Instrument metadata",
            example_response: Some(
                r#"{"instrumentDisplayDatas":[{"instrumentId":100000,"symbolFull":"BTC","instrumentDisplayName":"Bitcoin","instrumentTypeId":10,"exchangeId":8},{"instrumentId":1001,"symbolFull":"AAPL","instrumentDisplayName":"Apple","instrumentTypeId":5,"exchangeId":4}]}"#,
            ),
        },
        EndpointDefinition {
            name: "quote",
            path: "/api/v1/market-data/instruments/rates",
            method: HttpMethod::Get,
            required: &["instrumentIds"],
            optional: &[],
            description: "Current bid/ask rates",
            example_response: Some(
                r#"{"rates":[{"instrumentId":100000,"bid":67012.5,"ask":67080.1,"lastExecution":67040.0,"date":"2024-04-05T20:00:00Z"}]}"#,
            ),
        },
        EndpointDefinition {
            name: "place_order",
            path: "/api/v1/trading/execution/market-open-orders/by-amount",
            method: HttpMethod::Post,
            required: &["instrumentId", "isBuy", "amount"],
            optional: &["leverage", "stopLossRate", "takeProfitRate", "isTslEnabled"],
            description: "Open a market position sized by cash amount",
            example_response: None,
        },
        EndpointDefinition {
            name: "close_position",
            path: "/api/v1/trading/execution/market-close-orders/positions/{positionId}",
            method: HttpMethod::Post,
            required: &["positionId"],
            optional: &["unitsToDeduct"],
            description: "Close all or part of a position",
            example_response: None,
        },
        EndpointDefinition {
            name: "watchlists",
            path: "/api/v1/watchlists",
            method: HttpMethod::Get,
            required: &[],
            optional: &[],
            description: "User watchlists",
            example_response: Some(
                r#"{"watchlists":[{"watchlistId":"wl-1","name":"Crypto","items":[{"instrumentId":100000,"symbol":"BTC"}]}]}"#,
            ),
        },
        EndpointDefinition {
            name: "add_to_watchlist",
            path: "/api/v1/watchlists/{watchlistId}/items",
            method: HttpMethod::Post,
            required: &["watchlistId", "instrumentId"],
            optional: &[],
            description: "Add an instrument to a watchlist",
            example_response: None,
        },
        EndpointDefinition {
            name: "remove_from_watchlist",
            path: "/api/v1/watchlists/{watchlistId}/items/{instrumentId}",
            method: HttpMethod::Delete,
            required: &["watchlistId", "instrumentId"],
            optional: &[],
            description: "Remove an instrument from a watchlist",
            example_response: None,
        },
        EndpointDefinition {
            name: "trade_history",
            path: "/api/v1/trading/info/trade/history",
            method: HttpMethod::Get,
            required: &["minDate"],
            optional: &["page", "pageSize"],
            description: "Closed trades since a date",
            example_response: None,
        },
    ],
};

pub static DESCRIPTOR: ProviderDescriptor = ProviderDescriptor {
    id: PROVIDER_ID,
    name: "eToro",
    default_base_url: "https://public-api.etoro.com",
    sandbox_base_url: None,
    encrypted_by_default: true,
    account_param: None,
    registry: &ENDPOINTS,
    capabilities: ProviderCapabilities {
        data_types: &[
            DataType::Quotes,
            DataType::Search,
            DataType::Account,
            DataType::Positions,
            DataType::Orders,
            DataType::Watchlists,
        ],
        supports_trading: true,
        supports_streaming: false,
        wiring: Wiring::Full,
    },
    error_shapes: &[ErrorShape::Field("errorMessage"), ErrorShape::Field("error")],
    default_params: &[],
    requires_credential: true,
};

/// Market order sized by cash amount.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EtoroOrder {
    pub instrument_id: u32,
    pub is_buy: bool,
    pub amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leverage: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_loss_rate: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub take_profit_rate: Option<Decimal>,
}

impl EtoroOrder {
    pub fn buy(instrument_id: u32, amount: Decimal) -> Self {
        Self {
            instrument_id,
            is_buy: true,
            amount,
            leverage: None,
            stop_loss_rate: None,
            take_profit_rate: None,
        }
    }

    pub fn sell(instrument_id: u32, amount: Decimal) -> Self {
        Self {
            is_buy: false,
            ..Self::buy(instrument_id, amount)
        }
    }
}

/// eToro client.
pub struct EtoroClient {
    inner: ProviderClient,
}

impl EtoroClient {
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

    pub async fn get_account_info(&self) -> RequestResult {
        self.inner.execute("account_info", Params::new()).await
    }

    pub async fn get_portfolio(&self) -> RequestResult {
        self.inner.execute("portfolio", Params::new()).await
    }

    pub async fn get_positions(&self) -> RequestResult {
        self.inner.execute("positions", Params::new()).await
    }

    pub async fn get_instruments(&self, search: Option<&str>) -> RequestResult {
        let mut p = Params::new();
        insert_opt(&mut p, "searchText", search);
        self.inner.execute("instruments", p).await
    }

    pub async fn get_quote(&self, instrument_ids: &[u32]) -> RequestResult {
        self.inner
            .execute("quote", params([("instrumentIds", json!(instrument_ids))]))
            .await
    }

    /// eToro exposes no candle history through this API.
    pub async fn get_historical_data(
        &self,
        _symbol: &str,
        _from: NaiveDate,
        _to: NaiveDate,
    ) -> RequestResult {
        Err(ApiError::unsupported(PROVIDER_ID, "get_historical_data"))
    }

    pub async fn place_order(&self, order: &EtoroOrder) -> RequestResult {
        let p = object_params(order).map_err(|e| ApiError::Decode {
            provider: PROVIDER_ID.to_string(),
            message: e.to_string(),
        })?;
        self.inner.execute("place_order", p).await
    }

    /// Close a position, or only `units` of it.
    pub async fn close_position(&self, position_id: &str, units: Option<Decimal>) -> RequestResult {
        let mut p = params([("positionId", position_id)]);
        insert_opt(&mut p, "unitsToDeduct", units.map(|u| u.to_string()));
        self.inner.execute("close_position", p).await
    }

    pub async fn get_watchlists(&self) -> RequestResult {
        self.inner.execute("watchlists", Params::new()).await
    }

    pub async fn add_to_watchlist(&self, watchlist_id: &str, instrument_id: u32) -> RequestResult {
        let p = params([
            ("watchlistId", json!(watchlist_id)),
            ("instrumentId", json!(instrument_id)),
        ]);
        self.inner.execute("add_to_watchlist", p).await
    }

    pub async fn remove_from_watchlist(
        &self,
        watchlist_id: &str,
        instrument_id: u32,
    ) -> RequestResult {
        let p = params([
            ("watchlistId", json!(watchlist_id)),
            ("instrumentId", json!(instrument_id)),
        ]);
        self.inner.execute("remove_from_watchlist", p).await
    }

    pub async fn get_trade_history(&self, since: NaiveDate, page: Option<u32>) -> RequestResult {
        let mut p = params([("minDate", since.format("%Y-%m-%d").to_string())]);
        insert_opt(&mut p, "page", page);
        self.inner.execute("trade_history", p).await
    }
}
