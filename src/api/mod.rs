//! External collaborators: market data providers and the host runtime.
//!
//! Provider adapters are thin request/response wrappers that normalize
//! upstream JSON into typed records; [`DataConverter`] turns those records
//! into template payloads. The [`HostRuntime`] contract covers artifact
//! uploads and platform integration calls.

mod converter;
mod defillama;
mod dexscreener;
mod host;
mod http;
mod models;
mod provider;

pub use converter::DataConverter;
pub use defillama::DefiLlamaProvider;
pub use dexscreener::DexScreenerProvider;
pub use host::{HostRuntime, HttpHostRuntime, UploadResult};
pub use models::{
    CategoryTvl, ChainTvl, ProtocolSnapshot, SeriesKind, SeriesPoint, TokenSnapshot,
};
pub use provider::{CompositeProvider, MarketDataProvider};

#[cfg(test)]
pub use host::MockHostRuntime;
#[cfg(test)]
pub use provider::MockMarketDataProvider;
