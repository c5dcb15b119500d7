//! TradePress Provider Client Crate
//!
//! Thin, table-driven clients for the financial data, brokerage and
//! repository APIs used by the TradePress dashboard.
//!
//! # Overview
//!
//! - One generic executor ([`ProviderClient`]) shared by every provider
//! - Declarative endpoint tables that turn an operation name plus
//!   parameters into a URL ([`EndpointRegistry::build_url`])
//! - A single failure type ([`ApiError`]) with a stable tag ([`FailureKind`])
//! - Demo fixtures served when credentials are absent
//! - A TTL cache in front of GitHub's rate-limited reads
//!
//! # Architecture
//!
//! ```text
//! +------------------+     +--------------------+
//! | Provider facade  | --> |  ProviderClient    |  (demo branch, defaults)
//! +------------------+     +--------------------+
//!                                   |
//!                                   v
//!                          +--------------------+
//!                          |  EndpointRegistry  |  (path/query/body/auth)
//!                          +--------------------+
//!                                   |
//!                                   v
//!                          +--------------------+
//!                          |   HttpTransport    |  (reqwest, or the host's)
//!                          +--------------------+
//!                                   |
//!                                   v
//!                          +--------------------+
//!                          |   RequestResult    |  (JSON body or ApiError)
//!                          +--------------------+
//! ```
//!
//! # Providers
//!
//! AllTick (placeholder), eToro, Financial Modeling Prep, GitHub,
//! Interactive Brokers (Client Portal gateway), IEX Cloud and MarketStack.
//! See [`provider::catalog`].

pub mod cache;
pub mod client;
pub mod config;
pub mod endpoint;
pub mod errors;
pub mod models;
pub mod provider;
pub mod transport;

// Re-export the types most callers need
pub use cache::{CacheStore, MemoryCache};
pub use client::{
    DataType, ErrorShape, ProviderCapabilities, ProviderClient, ProviderDescriptor, Wiring,
};
pub use config::{
    Credential, MemorySettings, ProviderConfig, Secret, SettingsStore, DEMO_MODE_KEY,
};
pub use endpoint::{
    AuthPlacement, EndpointDefinition, EndpointRegistry, HttpMethod, ParamPolicy, PreparedRequest,
};
pub use errors::{ApiError, FailureKind, RequestResult};
pub use models::{params, Params};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, TransportError};

// Re-export provider facades
pub use provider::alltick::AlltickClient;
pub use provider::etoro::{EtoroClient, EtoroOrder};
pub use provider::fmp::FmpClient;
pub use provider::github::{
    GithubClient, IssueQuery, IssueState, IssueUpdate, NewIssue, RefreshReport,
};
pub use provider::ibkr::{IbkrClient, IbkrOrder};
pub use provider::iex::IexClient;
pub use provider::marketstack::MarketstackClient;
pub use provider::{catalog, descriptor};
