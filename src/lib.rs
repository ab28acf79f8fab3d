//! # Chartcast - Market Data Visualization and Social Distribution
//!
//! Turns DeFi market data into chart artifacts and fans them out to social
//! platforms with platform-shaped post text.
//!
//! ## Architecture
//!
//! The crate is layered leaves first:
//!
//! - **API**: Market data providers, the data converter and the host runtime
//! - **Template**: Visualization templates and payload-to-template matching
//! - **Render**: Artifact rendering, format conversion and persistence
//! - **Content**: Platform metadata, hashtags and post formatting
//! - **Distribution**: Concurrent publishing and campaign assembly
//! - **Capabilities / App**: Named host capabilities over the services above
//! - **Config**: Configuration management

pub mod api;
pub mod app;
pub mod capabilities;
pub mod config;
pub mod content;
pub mod distribution;
pub mod error;
pub mod format;
pub mod render;
pub mod template;

pub use app::App;
pub use capabilities::{Capability, CapabilityOutput};
pub use config::Config;
pub use error::{Error, Result};
pub use render::{Artifact, ArtifactFormat, Renderer};
pub use template::{Template, TemplateOptions, TemplateRegistry};
