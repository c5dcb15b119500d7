//! Interactive Brokers Client Portal gateway.
//!
//! The gateway runs locally (default `http://localhost:5000`) and holds the
//! brokerage session itself, so requests carry no credential. The account
//! id configured under `ibkr_account_id` is injected as `accountId`.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{json, Value};

use crate::client::{
    DataType, ErrorShape, ProviderCapabilities, ProviderClient, ProviderDescriptor, Wiring,
};
use crate::config::{ProviderConfig, SettingsStore};
use crate::endpoint::{AuthPlacement, EndpointDefinition, EndpointRegistry, HttpMethod, ParamPolicy};
use crate::errors::{ApiError, RequestResult};
use crate::models::{insert_opt, object_params, params, Params};
use crate::transport::HttpTransport;

const PROVIDER_ID: &str = "ibkr";

pub static ENDPOINTS: EndpointRegistry = EndpointRegistry {
    provider: PROVIDER_ID,
    auth: AuthPlacement::None,
    param_policy: ParamPolicy::Declared,
    param_aliases: &[],
    static_headers: &[("Accept", "application/json")],
    request_id_header: None,
    endpoints: &[
        EndpointDefinition {
            name: "accounts",
            path: "/portal/iserver/accounts",
            method: HttpMethod::Get,
            required: &[],
            optional: &[],
            description: "Brokerage accounts available to the session",
            example_response: Some(
                r#"{"accounts":["U1234567"],"selectedAccount":"U1234567","isPaper":false}"#,
            ),
        },
        EndpointDefinition {
            name: "portfolio_accounts",
            path: "/portal/portfolio/accounts",
            method: HttpMethod::Get,
            required: &[],
            optional: &[],
            description: "Accounts with portfolio metadata",
            example_response: None,
        },
        EndpointDefinition {
            name: "positions",
            path: "/portal/portfolio/{accountId}/positions/{pageId}",
            method: HttpMethod::Get,
            required: &["accountId", "pageId"],
            optional: &["model", "sort", "direction"],
            description: "Open positions, 100 per page",
            example_response: Some(
                r#"[{"acctId":"U1234567","conid":265598,"contractDesc":"AAPL","position":50.0,"mktPrice":189.84,"mktValue":9492.0,"currency":"USD","avgCost":152.1,"avgPrice":152.1,"realizedPnl":0.0,"unrealizedPnl":1887.0,"assetClass":"STK"}]"#,
            ),
        },
        EndpointDefinition {
            name: "account_summary",
            path: "/portal/portfolio/{accountId}/summary",
            method: HttpMethod::Get,
            required: &["accountId"],
            optional: &[],
            description: "Balances, margin and buying power",
            example_response: Some(
                r#"{"netliquidation":{"amount":25430.12,"currency":"USD"},"buyingpower":{"amount":101720.48,"currency":"USD"},"totalcashvalue":{"amount":15938.12,"currency":"USD"}}"#,
            ),
        },
        EndpointDefinition {
            name: "account_ledger",
            path: "/portal/portfolio/{accountId}/ledger",
            method: HttpMethod::Get,
            required: &["accountId"],
            optional: &[],
            description: "Cash balances per currency",
            example_response: None,
        },
        EndpointDefinition {
            name: "search_contract",
            path: "/portal/iserver/secdef/search",
            method: HttpMethod::Post,
            required: &["symbol"],
            optional: &["name", "secType"],
            description: "Find contract ids by symbol or name",
            example_response: Some(
                r#"[{"conid":"265598","companyHeader":"APPLE INC - NASDAQ","companyName":"APPLE INC","symbol":"AAPL","description":"NASDAQ"}]"#,
            ),
        },
        EndpointDefinition {
            name: "contract_info",
            path: "/portal/iserver/contract/{conid}/info",
            method: HttpMethod::Get,
            required: &["conid"],
            optional: &[],
            description: "Contract details",
            example_response: None,
        },
        EndpointDefinition {
            name: "market_data_snapshot",
            path: "/portal/iserver/marketdata/snapshot",
            method: HttpMethod::Get,
            required: &["conids"],
            optional: &["fields", "since"],
            description: "Top-of-book snapshot for one or more contracts",
            example_response: Some(
                r#"[{"conid":265598,"31":"189.84","84":"189.83","86":"189.85","_updated":1712345678901}]"#,
            ),
        },
        EndpointDefinition {
            name: "market_data_history",
            path: "/portal/iserver/marketdata/history",
            method: HttpMethod::Get,
            required: &["conid", "period"],
            optional: &["bar", "exchange", "outsideRth", "startTime"],
            description: "Historical bars",
            example_response: Some(
                r#"{"symbol":"AAPL","text":"APPLE INC","priceFactor":100,"data":[{"o":187.15,"c":189.84,"h":190.32,"l":186.9,"v":48211.0,"t":1712275200000}],"points":1,"mktDataDelay":0}"#,
            ),
        },
        EndpointDefinition {
            name: "place_order",
            path: "/portal/iserver/account/{accountId}/orders",
            method: HttpMethod::Post,
            required: &["accountId", "orders"],
            optional: &[],
            description: "Submit one or more orders",
            example_response: None,
        },
        EndpointDefinition {
            name: "order_reply",
            path: "/portal/iserver/reply/{replyId}",
            method: HttpMethod::Post,
            required: &["replyId", "confirmed"],
            optional: &[],
            description: "Answer an order confirmation prompt",
            example_response: None,
        },
        EndpointDefinition {
            name: "modify_order",
            path: "/portal/iserver/account/{accountId}/order/{orderId}",
            method: HttpMethod::Post,
            required: &["accountId", "orderId"],
            optional: &["conid", "orderType", "price", "quantity", "side", "tif"],
            description: "Modify a working order",
            example_response: None,
        },
        EndpointDefinition {
            name: "cancel_order",
            path: "/portal/iserver/account/{accountId}/order/{orderId}",
            method: HttpMethod::Delete,
            required: &["accountId", "orderId"],
            optional: &[],
            description: "Cancel a working order",
            example_response: None,
        },
        EndpointDefinition {
            name: "live_orders",
            path: "/portal/iserver/account/orders",
            method: HttpMethod::Get,
            required: &[],
            optional: &["filters", "force"],
            description: "Working and recently filled orders",
            example_response: None,
        },
        EndpointDefinition {
            name: "trades",
            path: "/portal/iserver/account/trades",
            method: HttpMethod::Get,
            required: &[],
            optional: &[],
            description: "Executions for the current and previous six days",
            example_response: None,
        },
        EndpointDefinition {
            name: "tickle",
            path: "/portal/tickle",
            method: HttpMethod::Post,
            required: &[],
            optional: &[],
            description: "Keep the gateway session alive",
            example_response: None,
        },
        EndpointDefinition {
            name: "auth_status",
            path: "/portal/iserver/auth/status",
            method: HttpMethod::Post,
            required: &[],
            optional: &[],
            description: "Brokerage session status",
            example_response: Some(r#"{"authenticated":true,"competing":false,"connected":true}"#),
        },
        EndpointDefinition {
            name: "reauthenticate",
            path: "/portal/iserver/reauthenticate",
            method: HttpMethod::Post,
            required: &[],
            optional: &[],
            description: "Restart the brokerage session",
            example_response: None,
        },
        EndpointDefinition {
            name: "stream",
            path: "/portal/ws",
            method: HttpMethod::Ws,
            required: &[],
            optional: &[],
            description: "Streaming market data and order updates",
            example_response: None,
        },
    ],
};

pub static DESCRIPTOR: ProviderDescriptor = ProviderDescriptor {
    id: PROVIDER_ID,
    name: "Interactive Brokers",
    default_base_url: "http://localhost:5000",
    sandbox_base_url: None,
    encrypted_by_default: true,
    account_param: Some("accountId"),
    registry: &ENDPOINTS,
    capabilities: ProviderCapabilities {
        data_types: &[
            DataType::Quotes,
            DataType::HistoricalBars,
            DataType::Search,
            DataType::Account,
            DataType::Positions,
            DataType::Orders,
        ],
        supports_trading: true,
        supports_streaming: true,
        wiring: Wiring::Full,
    },
    error_shapes: &[ErrorShape::Field("error")],
    default_params: &[("pageId", "0")],
    requires_credential: false,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum OrderType {
    #[serde(rename = "MKT")]
    Market,
    #[serde(rename = "LMT")]
    Limit,
    #[serde(rename = "STP")]
    Stop,
    #[serde(rename = "STOP_LIMIT")]
    StopLimit,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TimeInForce {
    Day,
    Gtc,
    Ioc,
}

/// One order ticket for the gateway.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IbkrOrder {
    pub conid: u64,
    pub order_type: OrderType,
    pub side: OrderSide,
    pub quantity: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    pub tif: TimeInForce,
    /// Client order id.
    #[serde(rename = "cOID", skip_serializing_if = "Option::is_none")]
    pub client_order_id: Option<String>,
}

/// Client Portal gateway client.
pub struct IbkrClient {
    inner: ProviderClient,
}

impl IbkrClient {
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

    pub async fn get_accounts(&self) -> RequestResult {
        self.inner.execute("accounts", Params::new()).await
    }

    /// Positions for the configured account. Pages are zero-based.
    pub async fn get_positions(&self, page: Option<u32>) -> RequestResult {
        let mut p = Params::new();
        insert_opt(&mut p, "pageId", page.map(|n| n.to_string()));
        self.inner.execute("positions", p).await
    }

    pub async fn get_account_summary(&self) -> RequestResult {
        self.inner.execute("account_summary", Params::new()).await
    }

    pub async fn search_contract(&self, symbol: &str, sec_type: Option<&str>) -> RequestResult {
        let mut p = params([("symbol", symbol)]);
        insert_opt(&mut p, "secType", sec_type);
        self.inner.execute("search_contract", p).await
    }

    /// Snapshot for `conids`; `fields` are the gateway's numeric field codes.
    pub async fn get_market_snapshot(&self, conids: &[u64], fields: &[&str]) -> RequestResult {
        let mut p = params([("conids", json!(conids))]);
        if !fields.is_empty() {
            p.insert("fields".to_string(), json!(fields));
        }
        self.inner.execute("market_data_snapshot", p).await
    }

    /// Historical bars, e.g. `period = "1m"`, `bar = "1d"`.
    pub async fn get_market_history(
        &self,
        conid: &str,
        period: &str,
        bar: Option<&str>,
    ) -> RequestResult {
        let mut p = params([("conid", conid), ("period", period)]);
        insert_opt(&mut p, "bar", bar);
        self.inner.execute("market_data_history", p).await
    }

    pub async fn place_order(&self, order: &IbkrOrder) -> RequestResult {
        let ticket = object_params(order).map_err(|e| ApiError::Decode {
            provider: PROVIDER_ID.to_string(),
            message: format!("could not encode order: {}", e),
        })?;
        let orders = Value::Array(vec![Value::Object(ticket.into_iter().collect())]);
        self.inner
            .execute("place_order", params([("orders", orders)]))
            .await
    }

    /// Confirm or reject a prompt returned by `place_order`.
    pub async fn confirm_order_reply(&self, reply_id: &str, confirmed: bool) -> RequestResult {
        let p = params([("replyId", json!(reply_id)), ("confirmed", json!(confirmed))]);
        self.inner.execute("order_reply", p).await
    }

    pub async fn cancel_order(&self, order_id: &str) -> RequestResult {
        self.inner
            .execute("cancel_order", params([("orderId", order_id)]))
            .await
    }

    pub async fn get_live_orders(&self) -> RequestResult {
        self.inner.execute("live_orders", Params::new()).await
    }

    pub async fn get_trades(&self) -> RequestResult {
        self.inner.execute("trades", Params::new()).await
    }

    pub async fn tickle(&self) -> RequestResult {
        self.inner.execute("tickle", Params::new()).await
    }

    pub async fn auth_status(&self) -> RequestResult {
        self.inner.execute("auth_status", Params::new()).await
    }

    /// Websocket URL of the gateway stream.
    pub fn stream_url(&self) -> Option<String> {
        self.inner.endpoint_url("stream", Params::new())
    }
}
