//! Provider capability metadata.
//!
//! Callers use this to decide which provider can serve a request and
//! whether its client is wired to the network at all.

/// Kinds of data a provider can return.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum DataType {
    Quotes,
    HistoricalBars,
    Intraday,
    OrderBook,
    Fundamentals,
    News,
    Search,
    Account,
    Positions,
    Orders,
    Watchlists,
    Repository,
    Issues,
}

/// Whether a client's methods reach the provider.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Wiring {
    /// Methods call the provider.
    Full,
    /// Methods are declared but return `NotImplemented`.
    Placeholder,
}

/// Describes the capabilities of a provider.
#[derive(Clone, Debug)]
pub struct ProviderCapabilities {
    pub data_types: &'static [DataType],

    /// Order placement and cancellation.
    pub supports_trading: bool,

    /// Declares websocket endpoints.
    pub supports_streaming: bool,

    pub wiring: Wiring,
}

impl ProviderCapabilities {
    pub fn supports(&self, data_type: DataType) -> bool {
        self.data_types.contains(&data_type)
    }

    pub fn is_fully_wired(&self) -> bool {
        self.wiring == Wiring::Full
    }
}
