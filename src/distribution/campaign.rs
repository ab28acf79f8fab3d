//! Campaign assembly.
//!
//! A campaign turns a free-text topic into rendered visualizations,
//! per-platform post content and a posting schedule. Building a campaign
//! never publishes anything.

use super::schedule::{ScheduledPost, Scheduler};
use crate::api::{DataConverter, MarketDataProvider, SeriesKind};
use crate::content::{ContentType, PlatformContent, PlatformSpec, format_content, require_platform};
use crate::error::{Error, Result};
use crate::render::{ArtifactFormat, ArtifactStore, Renderer};
use crate::template::{Template, TemplateOptions, TemplateRegistry};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Upper bound on scheduled posts per campaign.
pub const MAX_POST_COUNT: usize = 100;

/// Number of protocols gathered for market-focused campaigns.
const MARKET_PROTOCOLS: usize = 10;

const TVL_KEYWORDS: &[&str] = &[
    "tvl", "protocol", "protocols", "lending", "dex", "dexes", "yield", "staking", "locked",
];

const TOKEN_KEYWORDS: &[&str] = &["price", "token", "coin", "pump", "rally", "trading"];

/// Known tokens: topic word to symbol.
const KNOWN_TOKENS: &[(&str, &str)] = &[
    ("bitcoin", "BTC"),
    ("btc", "BTC"),
    ("ethereum", "ETH"),
    ("ether", "ETH"),
    ("eth", "ETH"),
    ("solana", "SOL"),
    ("sol", "SOL"),
    ("bnb", "BNB"),
    ("avax", "AVAX"),
    ("matic", "MATIC"),
    ("arb", "ARB"),
    ("op", "OP"),
    ("link", "LINK"),
    ("chainlink", "LINK"),
    ("doge", "DOGE"),
    ("pepe", "PEPE"),
];

/// Known chains: topic word to provider chain name.
const KNOWN_CHAINS: &[(&str, &str)] = &[
    ("ethereum", "Ethereum"),
    ("eth", "Ethereum"),
    ("solana", "Solana"),
    ("arbitrum", "Arbitrum"),
    ("base", "Base"),
    ("polygon", "Polygon"),
    ("optimism", "Optimism"),
    ("avalanche", "Avalanche"),
    ("bsc", "BSC"),
    ("tron", "Tron"),
];

const KNOWN_PROTOCOLS: &[&str] = &[
    "aave", "uniswap", "lido", "curve", "makerdao", "compound", "eigenlayer", "pendle", "gmx",
    "jupiter", "raydium", "morpho", "ethena", "convex", "balancer", "spark", "rocket pool",
];

/// What a campaign topic is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TopicFocus {
    /// A single token, by symbol.
    Token { symbol: String },
    /// Protocol or chain TVL.
    Protocol {
        protocol: Option<String>,
        chain: Option<String>,
    },
    /// The market as a whole.
    Market,
}

impl TopicFocus {
    /// Classify a topic by keyword. Best effort: unrecognized topics fall
    /// back to the whole market.
    pub fn classify(topic: &str) -> Self {
        let lower = topic.to_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| !(c.is_alphanumeric() || c == '$'))
            .filter(|w| !w.is_empty())
            .collect();
        let has = |list: &[&str]| words.iter().any(|w| list.contains(w));
        let lookup = |table: &[(&str, &'static str)]| {
            words
                .iter()
                .find_map(|w| table.iter().find(|(key, _)| key == w).map(|(_, v)| *v))
        };

        if let Some(symbol) = words
            .iter()
            .find_map(|w| w.strip_prefix('$'))
            .filter(|s| !s.is_empty() && s.chars().all(char::is_alphanumeric))
        {
            return Self::Token {
                symbol: symbol.to_uppercase(),
            };
        }

        let protocol = KNOWN_PROTOCOLS
            .iter()
            .find(|p| {
                if p.contains(' ') {
                    lower.contains(*p)
                } else {
                    words.contains(p)
                }
            })
            .map(|p| p.to_string());

        if has(TVL_KEYWORDS) || protocol.is_some() {
            let chain = if protocol.is_some() {
                None
            } else {
                lookup(KNOWN_CHAINS).map(str::to_string)
            };
            return Self::Protocol { protocol, chain };
        }

        if let Some(symbol) = lookup(KNOWN_TOKENS) {
            return Self::Token {
                symbol: symbol.to_string(),
            };
        }
        if has(TOKEN_KEYWORDS) {
            if let Some(chain) = lookup(KNOWN_CHAINS) {
                return Self::Token {
                    symbol: chain.to_uppercase(),
                };
            }
        }
        Self::Market
    }

    /// Visualization type used when a request names none.
    fn default_visualization(&self) -> &'static str {
        match self {
            Self::Token { .. } => "price",
            Self::Protocol { .. } => "tvl",
            Self::Market => "overview",
        }
    }
}

/// Campaign request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CampaignRequest {
    pub topic: String,
    pub platforms: Vec<String>,
    #[serde(default)]
    pub visualization_types: Vec<String>,
    /// Posts to schedule, between 1 and [`MAX_POST_COUNT`].
    #[serde(default = "default_post_count")]
    pub post_count: usize,
    #[serde(default)]
    pub include_thread: bool,
}

fn default_post_count() -> usize {
    3
}

/// One rendered visualization of a campaign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignVisualization {
    /// Requested visualization type.
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub template_id: String,
    /// Saved artifacts: markup first, raster when produced.
    pub artifact_paths: Vec<PathBuf>,
}

/// An assembled campaign. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    id: Uuid,
    topic: String,
    focus: TopicFocus,
    created_at: DateTime<Utc>,
    visualizations: Vec<CampaignVisualization>,
    platform_content: BTreeMap<String, Vec<PlatformContent>>,
    schedule: Vec<ScheduledPost>,
}

impl Campaign {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn focus(&self) -> &TopicFocus {
        &self.focus
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn visualizations(&self) -> &[CampaignVisualization] {
        &self.visualizations
    }

    pub fn platform_content(&self) -> &BTreeMap<String, Vec<PlatformContent>> {
        &self.platform_content
    }

    pub fn schedule(&self) -> &[ScheduledPost] {
        &self.schedule
    }
}

/// Builds campaigns from provider data.
#[derive(Clone)]
pub struct CampaignPlanner {
    registry: Arc<TemplateRegistry>,
    renderer: Renderer,
    store: ArtifactStore,
    provider: Arc<dyn MarketDataProvider>,
    scheduler: Scheduler,
}

impl CampaignPlanner {
    pub fn new(
        registry: Arc<TemplateRegistry>,
        renderer: Renderer,
        store: ArtifactStore,
        provider: Arc<dyn MarketDataProvider>,
        scheduler: Scheduler,
    ) -> Self {
        Self {
            registry,
            renderer,
            store,
            provider,
            scheduler,
        }
    }

    /// Assemble a campaign.
    ///
    /// Visualization types that resolve to nothing usable are skipped with a
    /// warning; producing no visualization at all fails with
    /// `NoSuitableTemplate`.
    pub async fn build_campaign(&self, request: &CampaignRequest) -> Result<Campaign> {
        let topic = request.topic.trim();
        if topic.is_empty() {
            return Err(Error::invalid_argument("campaign topic must not be empty"));
        }
        if !(1..=MAX_POST_COUNT).contains(&request.post_count) {
            return Err(Error::invalid_argument(format!(
                "postCount must be between 1 and {MAX_POST_COUNT}, got {}",
                request.post_count
            )));
        }
        let platforms = resolve_platforms(&request.platforms)?;
        let focus = TopicFocus::classify(topic);
        info!("Building campaign for '{}' ({:?})", topic, focus);

        let payloads = self.gather(&focus).await?;
        let needs_image = platforms.iter().any(|p| p.requires_image);

        let requested: Vec<String> = if request.visualization_types.is_empty() {
            vec![focus.default_visualization().to_string()]
        } else {
            request.visualization_types.clone()
        };

        let mut visualizations = Vec::new();
        let mut platform_content: BTreeMap<String, Vec<PlatformContent>> = BTreeMap::new();

        for kind in &requested {
            let Some(template) = self.resolve(kind) else {
                warn!("No template resolves visualization type '{}', skipping", kind);
                continue;
            };
            if visualizations
                .iter()
                .any(|v: &CampaignVisualization| v.template_id == template.id())
            {
                warn!("Visualization type '{}' duplicates {}, skipping", kind, template.id());
                continue;
            }
            let Some(payload) = payloads.iter().find(|p| template.is_suitable_for(p)) else {
                warn!("Template {} is unsuitable for the gathered data, skipping", template.id());
                continue;
            };

            let artifact_paths = match self.produce(topic, template.as_ref(), payload, needs_image).await {
                Ok(paths) => paths,
                Err(e) => {
                    warn!("Visualization '{}' failed: {}", kind, e);
                    continue;
                }
            };

            for platform in &platforms {
                let content_type = if request.include_thread && platform.supports_threads {
                    ContentType::Thread
                } else {
                    platform.default_content_type()
                };
                platform_content
                    .entry(platform.id.to_string())
                    .or_default()
                    .push(format_content(payload, platform, content_type));
            }

            visualizations.push(CampaignVisualization {
                kind: kind.clone(),
                title: format!("{}: {topic}", template.name()),
                template_id: template.id().to_string(),
                artifact_paths,
            });
        }

        if visualizations.is_empty() {
            return Err(Error::NoSuitableTemplate(format!(
                "no visualization could be produced for topic '{topic}' (requested: {})",
                requested.join(", ")
            )));
        }

        let created_at = Utc::now();
        let platform_ids: Vec<&str> = platforms.iter().map(|p| p.id).collect();
        let schedule = self.scheduler.slots(
            created_at,
            &platform_ids,
            request.post_count,
            &mut rand::thread_rng(),
        )?;

        info!(
            "Campaign ready: {} visualizations, {} scheduled posts",
            visualizations.len(),
            schedule.len()
        );
        Ok(Campaign {
            id: Uuid::new_v4(),
            topic: topic.to_string(),
            focus,
            created_at,
            visualizations,
            platform_content,
            schedule,
        })
    }

    /// Exact template id first, then keyword fallback.
    fn resolve(&self, kind: &str) -> Option<Arc<dyn Template>> {
        if let Some(template) = self.registry.get(kind) {
            return Some(template);
        }
        let lower = kind.to_lowercase();
        let fallback = if lower.contains("price") {
            "token-price-chart"
        } else if lower.contains("tvl") {
            "protocol-tvl-chart"
        } else {
            "market-overview"
        };
        self.registry.get(fallback)
    }

    /// Render and save one visualization, rasterizing when requested.
    async fn produce(
        &self,
        topic: &str,
        template: &dyn Template,
        payload: &Value,
        needs_image: bool,
    ) -> Result<Vec<PathBuf>> {
        let name = format!("{topic}-{}", template.id());
        let artifact = self
            .renderer
            .render(template, payload, &TemplateOptions::default())?;
        let mut paths = vec![self.store.save(&name, &artifact).await?];

        if needs_image {
            match self.renderer.convert_format(artifact, ArtifactFormat::Png).await {
                Ok(png) => match self.store.save(&name, &png).await {
                    Ok(path) => paths.push(path),
                    Err(e) => warn!("Saving raster for {} failed: {}", template.id(), e),
                },
                Err(e) => warn!("Rasterizing {} failed, keeping markup only: {}", template.id(), e),
            }
        }
        Ok(paths)
    }

    /// Fetch the payloads a focus calls for. Individual fetch failures are
    /// logged; the first one is returned only when nothing was gathered.
    async fn gather(&self, focus: &TopicFocus) -> Result<Vec<Value>> {
        let mut gathered = Gathered::default();
        let provider = self.provider.as_ref();

        match focus {
            TopicFocus::Token { symbol } => match provider.fetch_token_snapshot(symbol, None).await {
                Ok(token) => {
                    let history = provider
                        .fetch_historical_series(&token.price_key(), SeriesKind::Price)
                        .await
                        .unwrap_or_else(|e| {
                            warn!("Price history for {} unavailable: {}", token.symbol, e);
                            Vec::new()
                        });
                    gathered.push(DataConverter::token_payload(&token, &history));
                }
                Err(e) => gathered.fail(e),
            },
            TopicFocus::Protocol {
                protocol: Some(name),
                ..
            } => match provider.fetch_protocol_snapshot(name).await {
                Ok(protocol) => {
                    match provider
                        .fetch_historical_series(&protocol.slug, SeriesKind::ProtocolTvl)
                        .await
                    {
                        Ok(history) => {
                            gathered.push(DataConverter::protocol_payload(&protocol, &history))
                        }
                        Err(e) => gathered.fail(e),
                    }
                }
                Err(e) => gathered.fail(e),
            },
            TopicFocus::Protocol {
                protocol: None,
                chain,
            } => {
                match provider
                    .fetch_historical_series(chain.as_deref().unwrap_or(""), SeriesKind::ChainTvl)
                    .await
                {
                    Ok(history) => gathered.push(DataConverter::chain_tvl_payload(
                        chain.as_deref(),
                        &history,
                    )),
                    Err(e) => gathered.fail(e),
                }
                match provider.fetch_chains_tvl().await {
                    Ok(chains) => gathered.push(DataConverter::chain_distribution_payload(&chains)),
                    Err(e) => gathered.fail(e),
                }
            }
            TopicFocus::Market => {
                let protocols = provider.fetch_top_protocols(MARKET_PROTOCOLS).await;
                let chains = provider.fetch_chains_tvl().await;
                match (protocols, chains) {
                    (Ok(protocols), Ok(chains)) => gathered.push(DataConverter::market_payload(
                        &protocols,
                        &chains,
                        Utc::now(),
                    )),
                    (Ok(protocols), Err(e)) => {
                        gathered.fail(e);
                        gathered.push(DataConverter::market_payload(&protocols, &[], Utc::now()));
                    }
                    (Err(e), Ok(chains)) => {
                        gathered.fail(e);
                        gathered.push(DataConverter::chain_distribution_payload(&chains));
                    }
                    (Err(e), Err(_)) => gathered.fail(e),
                }
                match provider.fetch_category_distribution().await {
                    Ok(categories) => {
                        gathered.push(DataConverter::category_distribution_payload(&categories))
                    }
                    Err(e) => gathered.fail(e),
                }
            }
        }

        gathered.finish()
    }
}

#[derive(Default)]
struct Gathered {
    payloads: Vec<Value>,
    first_error: Option<Error>,
}

impl Gathered {
    fn push(&mut self, payload: Value) {
        self.payloads.push(payload);
    }

    fn fail(&mut self, error: Error) {
        warn!("Campaign data fetch failed: {}", error);
        self.first_error.get_or_insert(error);
    }

    fn finish(self) -> Result<Vec<Value>> {
        match (self.payloads.is_empty(), self.first_error) {
            (true, Some(error)) => Err(error),
            _ => Ok(self.payloads),
        }
    }
}

/// Validate and de-duplicate platform ids, keeping request order.
fn resolve_platforms(ids: &[String]) -> Result<Vec<&'static PlatformSpec>> {
    if ids.is_empty() {
        return Err(Error::invalid_argument("at least one platform is required"));
    }
    let mut platforms: Vec<&'static PlatformSpec> = Vec::with_capacity(ids.len());
    for id in ids {
        let spec = require_platform(id)?;
        if !platforms.iter().any(|p| p.id == spec.id) {
            platforms.push(spec);
        }
    }
    Ok(platforms)
}
