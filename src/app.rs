//! Main application module.
//!
//! [`App`] owns the shared services (template registry, renderer, artifact
//! store, provider, publisher, campaign planner) and dispatches capability
//! calls to them.

use crate::api::{
    CompositeProvider, DataConverter, HostRuntime, HttpHostRuntime, MarketDataProvider, SeriesKind,
};
use crate::capabilities::{
    Breakdown, CampaignRequest, Capability, CapabilityOutput, DistributeArgs,
    FindSuitableTemplatesArgs, GenerateVisualizationArgs, MarketOverviewArgs, NoArgs,
    PriceChartArgs, SaveVisualizationArgs, SocialContentArgs, TvlChartArgs,
};
use crate::config::Config;
use crate::content::{PLATFORMS, format_content, require_platform};
use crate::distribution::{CampaignPlanner, Publisher, Scheduler};
use crate::error::{Error, Result};
use crate::render::{Artifact, ArtifactFormat, ArtifactStore, Renderer};
use crate::template::{Template, TemplateOptions, TemplateRegistry};
use chrono::Utc;
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Rows shown by the market overview when the caller names no limit.
const DEFAULT_OVERVIEW_LIMIT: usize = 10;

/// The application: shared services plus capability dispatch.
pub struct App {
    /// Configuration.
    config: Config,
    /// Template registry, built once.
    registry: Arc<TemplateRegistry>,
    /// Renderer and format converter.
    renderer: Renderer,
    /// Artifact store.
    store: ArtifactStore,
    /// Market data provider.
    provider: Arc<dyn MarketDataProvider>,
    /// Social publisher.
    publisher: Publisher,
    /// Campaign planner.
    planner: CampaignPlanner,
}

impl App {
    /// Create a new application with the HTTP provider and host adapters.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let provider = Arc::new(CompositeProvider::from_config(&config.providers)?);
        let host = Arc::new(HttpHostRuntime::new(
            config.distribution.host_url.clone(),
            config.distribution.publish_timeout(),
        )?);
        let renderer = Renderer::from_config(config.render.clone());
        Self::with_services(config, provider, host, renderer)
    }

    /// Create an application over explicit collaborators.
    pub fn with_services(
        config: Config,
        provider: Arc<dyn MarketDataProvider>,
        host: Arc<dyn HostRuntime>,
        renderer: Renderer,
    ) -> Result<Self> {
        let registry = Arc::new(TemplateRegistry::with_builtin());
        let store = ArtifactStore::new(config.output.dir.clone());
        let publisher = Publisher::new(
            host,
            config.distribution.workspace_id.clone(),
            config.distribution.publish_timeout(),
        );
        let planner = CampaignPlanner::new(
            registry.clone(),
            renderer.clone(),
            store.clone(),
            provider.clone(),
            Scheduler::from_config(&config.distribution)?,
        );

        info!(
            "Chartcast ready: {} templates, output in {}",
            registry.len(),
            store.root().display()
        );

        Ok(Self {
            config,
            registry,
            renderer,
            store,
            provider,
            publisher,
            planner,
        })
    }

    /// Get the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the template registry.
    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    /// Invoke a capability by its host-facing name.
    pub async fn invoke_by_name(&self, name: &str, args: Value) -> Result<CapabilityOutput> {
        let capability: Capability = name.parse()?;
        self.invoke(capability, args).await
    }

    /// Invoke a capability with raw JSON arguments.
    pub async fn invoke(&self, capability: Capability, args: Value) -> Result<CapabilityOutput> {
        debug!("Invoking {}", capability);
        let result = match capability {
            Capability::GenerateVisualization => {
                self.generate_visualization(capability.parse_args(args)?).await
            }
            Capability::GetAvailableTemplates => {
                let _: NoArgs = capability.parse_args(args)?;
                json_output(&self.registry.descriptors())
            }
            Capability::FindSuitableTemplates => {
                let args: FindSuitableTemplatesArgs = capability.parse_args(args)?;
                let descriptors: Vec<_> = self
                    .registry
                    .find_suitable(&args.data)
                    .iter()
                    .map(|t| t.descriptor())
                    .collect();
                json_output(&descriptors)
            }
            Capability::GeneratePriceChart => {
                self.generate_price_chart(capability.parse_args(args)?).await
            }
            Capability::GenerateMarketOverview => {
                self.generate_market_overview(capability.parse_args(args)?).await
            }
            Capability::GenerateTvlChart => {
                self.generate_tvl_chart(capability.parse_args(args)?).await
            }
            Capability::SaveVisualization => {
                self.save_visualization(capability.parse_args(args)?).await
            }
            Capability::DistributeToSocial => {
                self.distribute(capability.parse_args(args)?).await
            }
            Capability::GenerateSocialContent => {
                let args: SocialContentArgs = capability.parse_args(args)?;
                let platform = require_platform(&args.platform)?;
                let content_type = args
                    .content_type
                    .unwrap_or_else(|| platform.default_content_type());
                json_output(&format_content(&args.data, platform, content_type))
            }
            Capability::CreateSocialCampaign => {
                let request: CampaignRequest = capability.parse_args(args)?;
                let campaign = self.planner.build_campaign(&request).await?;
                json_output(&campaign)
            }
            Capability::GetSupportedSocialPlatforms => {
                let _: NoArgs = capability.parse_args(args)?;
                json_output(PLATFORMS)
            }
        };

        if let Err(e) = &result {
            warn!("{} failed ({}): {}", capability, e.kind(), e);
        }
        result
    }

    async fn generate_visualization(&self, args: GenerateVisualizationArgs) -> Result<CapabilityOutput> {
        let template = match args.template_id.as_deref() {
            Some(id) => {
                let template = self.registry.require(id)?;
                if !template.is_suitable_for(&args.data) {
                    return Err(Error::UnsuitableTemplate(id.to_string()));
                }
                template
            }
            None => self
                .registry
                .find_best(&args.data, args.type_hint.as_deref())
                .ok_or_else(|| no_suitable_template(&args.data))?,
        };

        self.emit(
            template.as_ref(),
            &args.data,
            &args.options,
            args.output_format,
            args.name.as_deref(),
        )
        .await
    }

    async fn generate_price_chart(&self, args: PriceChartArgs) -> Result<CapabilityOutput> {
        let query = args.address.trim();
        if query.is_empty() {
            return Err(Error::invalid_argument("token address must not be empty"));
        }
        // Symbol searches span chains; only contract addresses get the default.
        let chain = args.chain.clone().or_else(|| {
            query
                .starts_with("0x")
                .then(|| self.config.providers.default_chain.clone())
        });

        let token = self.provider.fetch_token_snapshot(query, chain).await?;
        let history = self
            .provider
            .fetch_historical_series(&token.price_key(), SeriesKind::Price)
            .await
            .unwrap_or_else(|e| {
                warn!("Price history for {} unavailable: {}", token.symbol, e);
                Vec::new()
            });

        let data = DataConverter::token_payload(&token, &history);
        let mut options = args.options;
        options.days = args.days.or(options.days);
        let name = args
            .name
            .unwrap_or_else(|| format!("{}-price", token.symbol));

        let template = self.registry.require("token-price-chart")?;
        self.emit(template.as_ref(), &data, &options, args.output_format, Some(&name))
            .await
    }

    async fn generate_market_overview(&self, args: MarketOverviewArgs) -> Result<CapabilityOutput> {
        let limit = args.limit.unwrap_or(DEFAULT_OVERVIEW_LIMIT);
        if limit == 0 {
            return Err(Error::invalid_argument("limit must be positive"));
        }

        let protocols = self.provider.fetch_top_protocols(limit).await?;
        let chains = self.provider.fetch_chains_tvl().await.unwrap_or_else(|e| {
            warn!("Chain TVL unavailable for market overview: {}", e);
            Vec::new()
        });

        let data = DataConverter::market_payload(&protocols, &chains, Utc::now());
        let mut options = args.options;
        options
            .extra
            .entry("limit".to_string())
            .or_insert_with(|| json!(limit));
        let name = args.name.unwrap_or_else(|| "market-overview".to_string());

        let template = self.registry.require("market-overview")?;
        self.emit(template.as_ref(), &data, &options, args.output_format, Some(&name))
            .await
    }

    async fn generate_tvl_chart(&self, args: TvlChartArgs) -> Result<CapabilityOutput> {
        let (template_id, data, default_name) = match (args.breakdown, args.protocol.as_deref()) {
            (Some(Breakdown::Chains), _) => {
                let chains = self.provider.fetch_chains_tvl().await?;
                (
                    "tvl-distribution",
                    DataConverter::chain_distribution_payload(&chains),
                    "tvl-by-chain".to_string(),
                )
            }
            (Some(Breakdown::Categories), _) => {
                let categories = self.provider.fetch_category_distribution().await?;
                (
                    "tvl-distribution",
                    DataConverter::category_distribution_payload(&categories),
                    "tvl-by-category".to_string(),
                )
            }
            (None, Some(protocol)) => {
                let snapshot = self.provider.fetch_protocol_snapshot(protocol).await?;
                let history = self
                    .provider
                    .fetch_historical_series(&snapshot.slug, SeriesKind::ProtocolTvl)
                    .await?;
                (
                    "protocol-tvl-chart",
                    DataConverter::protocol_payload(&snapshot, &history),
                    format!("{}-tvl", snapshot.slug),
                )
            }
            (None, None) => {
                let chain = args.chain.as_deref().filter(|c| !c.trim().is_empty());
                let history = self
                    .provider
                    .fetch_historical_series(chain.unwrap_or(""), SeriesKind::ChainTvl)
                    .await?;
                (
                    "protocol-tvl-chart",
                    DataConverter::chain_tvl_payload(chain, &history),
                    format!("{}-tvl", chain.unwrap_or("defi")),
                )
            }
        };

        let mut options = args.options;
        options.days = args.days.or(options.days);
        let name = args.name.unwrap_or(default_name);

        let template = self.registry.require(template_id)?;
        self.emit(template.as_ref(), &data, &options, args.output_format, Some(&name))
            .await
    }

    async fn save_visualization(&self, args: SaveVisualizationArgs) -> Result<CapabilityOutput> {
        if args.content.trim().is_empty() {
            return Err(Error::invalid_argument("content must not be empty"));
        }
        let source = if args.content.trim_start().starts_with("<svg") {
            Artifact::Vector(args.content)
        } else {
            Artifact::Markup(args.content)
        };
        let target = args.format.unwrap_or_else(|| source.format());

        let artifact = self.renderer.convert_format(source, target).await?;
        let path = self.store.save(&args.name, &artifact).await?;
        Ok(CapabilityOutput::Json(json!({
            "path": path.display().to_string(),
            "format": artifact.format(),
        })))
    }

    async fn distribute(&self, args: DistributeArgs) -> Result<CapabilityOutput> {
        if args.platforms.is_empty() {
            return Err(Error::invalid_argument("at least one platform is required"));
        }
        let results = self
            .publisher
            .publish(&args.artifact_path, &args.platforms, &args.message, &args.tags)
            .await;
        json_output(&results)
    }

    /// Render, convert, and hand the artifact back. Markup and vector output
    /// is returned as text; raster output is saved and its path returned.
    async fn emit(
        &self,
        template: &dyn Template,
        data: &Value,
        options: &TemplateOptions,
        format: Option<ArtifactFormat>,
        name: Option<&str>,
    ) -> Result<CapabilityOutput> {
        let artifact = self.renderer.render(template, data, options)?;
        let artifact = self
            .renderer
            .convert_format(artifact, format.unwrap_or(ArtifactFormat::Html))
            .await?;

        match artifact {
            Artifact::Markup(text) | Artifact::Vector(text) => Ok(CapabilityOutput::Text(text)),
            raster @ Artifact::Raster(_) => {
                let name = name.map(str::to_string).unwrap_or_else(|| {
                    format!("{}-{}", template.id(), Utc::now().format("%Y%m%d-%H%M%S"))
                });
                let path = self.store.save(&name, &raster).await?;
                Ok(CapabilityOutput::Json(json!({
                    "path": path.display().to_string(),
                    "format": raster.format(),
                    "templateId": template.id(),
                })))
            }
        }
    }
}

fn json_output<T: Serialize + ?Sized>(value: &T) -> Result<CapabilityOutput> {
    Ok(CapabilityOutput::Json(serde_json::to_value(value)?))
}

fn no_suitable_template(data: &Value) -> Error {
    let keys = match data.as_object() {
        Some(object) => object.keys().cloned().collect::<Vec<_>>().join(", "),
        None => format!("non-object {}", value_kind(data)),
    };
    Error::NoSuitableTemplate(format!("no template accepts data with keys [{keys}]"))
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{
        CategoryTvl, MockHostRuntime, MockMarketDataProvider, ProtocolSnapshot,
        SeriesPoint, TokenSnapshot, UploadResult,
    };
    use crate::render::{
        Bounds, MockRenderSandbox, MockSandboxLauncher, RenderSandbox, UnavailableLauncher,
    };
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G'];

    fn config(dir: &std::path::Path) -> Config {
        let mut config = Config::default();
        config.output.dir = dir.to_path_buf();
        config
    }

    fn app(dir: &std::path::Path, provider: MockMarketDataProvider) -> App {
        app_with(dir, provider, MockHostRuntime::new(), Arc::new(UnavailableLauncher))
    }

    fn app_with(
        dir: &std::path::Path,
        provider: MockMarketDataProvider,
        host: MockHostRuntime,
        launcher: Arc<dyn crate::render::SandboxLauncher>,
    ) -> App {
        let config = config(dir);
        let renderer = Renderer::new(launcher, config.render.clone());
        App::with_services(config, Arc::new(provider), Arc::new(host), renderer).unwrap()
    }

    fn capturing_launcher() -> Arc<MockSandboxLauncher> {
        let mut sandbox = MockRenderSandbox::new();
        sandbox.expect_load().returning(|_| Ok(()));
        sandbox.expect_element_bounds().returning(|_| {
            Ok(Some(Bounds {
                x: 0.0,
                y: 0.0,
                width: 800.0,
                height: 400.0,
            }))
        });
        sandbox.expect_capture().returning(|_| Ok(PNG.to_vec()));
        sandbox.expect_close().times(1).returning(|| Ok(()));

        let mut launcher = MockSandboxLauncher::new();
        launcher
            .expect_launch()
            .return_once(move || Ok(Box::new(sandbox) as Box<dyn RenderSandbox>));
        Arc::new(launcher)
    }

    fn tvl_payload() -> Value {
        json!({
            "name": "Aave",
            "historicalTvl": [
                {"date": "2024-01-01", "tvl": 1.0e10},
                {"date": "2024-01-02", "tvl": 1.1e10}
            ]
        })
    }

    fn eth_token() -> TokenSnapshot {
        TokenSnapshot {
            address: "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2".to_string(),
            symbol: "WETH".to_string(),
            name: "Wrapped Ether".to_string(),
            chain: "ethereum".to_string(),
            price_usd: 3120.55,
            change_24h: Some(2.4),
            volume_24h: Some(1.2e9),
            liquidity_usd: Some(4.0e8),
            market_cap: None,
            dex: Some("uniswap".to_string()),
            pair_address: None,
        }
    }

    #[tokio::test]
    async fn test_generate_visualization_picks_tvl_template() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path(), MockMarketDataProvider::new());

        let output = app
            .invoke(Capability::GenerateVisualization, json!({"data": tvl_payload()}))
            .await
            .unwrap();
        let html = output.as_text().unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("Aave"));
    }

    #[tokio::test]
    async fn test_generate_visualization_vector_output() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path(), MockMarketDataProvider::new());

        let output = app
            .invoke_by_name(
                "generateVisualization",
                json!({"data": tvl_payload(), "outputFormat": "svg"}),
            )
            .await
            .unwrap();
        let svg = output.as_text().unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
    }

    #[tokio::test]
    async fn test_explicit_template_errors() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path(), MockMarketDataProvider::new());

        let err = app
            .invoke(
                Capability::GenerateVisualization,
                json!({"data": tvl_payload(), "templateId": "token-price-chart"}),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnsuitableTemplate(ref id) if id == "token-price-chart"));

        let err = app
            .invoke(
                Capability::GenerateVisualization,
                json!({"data": tvl_payload(), "templateId": "candles"}),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "TemplateNotFound");
    }

    #[tokio::test]
    async fn test_no_suitable_template_names_keys() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path(), MockMarketDataProvider::new());

        let err = app
            .invoke(
                Capability::GenerateVisualization,
                json!({"data": {"weather": "sunny"}}),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "NoSuitableTemplate");
        assert!(err.to_string().contains("weather"));
    }

    #[tokio::test]
    async fn test_template_listing_and_matching() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path(), MockMarketDataProvider::new());

        let all = app
            .invoke(Capability::GetAvailableTemplates, Value::Null)
            .await
            .unwrap();
        let ids: Vec<&str> = all
            .as_json()
            .unwrap()
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["id"].as_str().unwrap())
            .collect();
        assert_eq!(
            ids,
            vec![
                "token-price-chart",
                "protocol-tvl-chart",
                "market-overview",
                "tvl-distribution"
            ]
        );

        let suitable = app
            .invoke(Capability::FindSuitableTemplates, json!({"data": tvl_payload()}))
            .await
            .unwrap();
        assert_eq!(suitable.as_json().unwrap()[0]["id"], "protocol-tvl-chart");
        assert_eq!(suitable.as_json().unwrap().as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_price_chart_raster_is_saved() {
        let dir = tempfile::tempdir().unwrap();
        let mut provider = MockMarketDataProvider::new();
        provider
            .expect_fetch_token_snapshot()
            .withf(|query, chain| {
                query == "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2"
                    && chain.as_deref() == Some("ethereum")
            })
            .returning(|_, _| Ok(eth_token()));
        provider
            .expect_fetch_historical_series()
            .withf(|entity, kind| {
                entity == "ethereum:0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2"
                    && *kind == SeriesKind::Price
            })
            .returning(|_, _| {
                Ok(vec![SeriesPoint {
                    timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
                    value: 3050.0,
                }])
            });

        let app = app_with(
            dir.path(),
            provider,
            MockHostRuntime::new(),
            capturing_launcher(),
        );
        let output = app
            .invoke(
                Capability::GeneratePriceChart,
                json!({
                    "tokenAddress": "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2",
                    "outputFormat": "png"
                }),
            )
            .await
            .unwrap();

        let result = output.as_json().unwrap();
        assert_eq!(result["format"], "png");
        assert_eq!(result["templateId"], "token-price-chart");
        let path = std::path::PathBuf::from(result["path"].as_str().unwrap());
        assert_eq!(path, dir.path().join("weth-price.png"));
        assert_eq!(std::fs::read(path).unwrap(), PNG);
    }

    #[tokio::test]
    async fn test_price_chart_history_is_best_effort() {
        let dir = tempfile::tempdir().unwrap();
        let mut provider = MockMarketDataProvider::new();
        provider
            .expect_fetch_token_snapshot()
            .withf(|query, chain| query == "WETH" && chain.is_none())
            .returning(|_, _| Ok(eth_token()));
        provider
            .expect_fetch_historical_series()
            .returning(|_, _| Err(Error::provider("defillama", "HTTP 500")));

        let app = app(dir.path(), provider);
        let output = app
            .invoke(Capability::GeneratePriceChart, json!({"address": "WETH"}))
            .await
            .unwrap();
        assert!(output.as_text().unwrap().contains("WETH"));
    }

    #[tokio::test]
    async fn test_market_overview_forwards_limit() {
        let dir = tempfile::tempdir().unwrap();
        let mut provider = MockMarketDataProvider::new();
        provider
            .expect_fetch_top_protocols()
            .withf(|limit| *limit == 5)
            .times(1)
            .returning(|_| {
                Ok(vec![ProtocolSnapshot {
                    name: "Lido".to_string(),
                    slug: "lido".to_string(),
                    category: Some("Liquid Staking".to_string()),
                    chains: vec!["Ethereum".to_string()],
                    tvl: 3.1e10,
                    change_1d: Some(0.4),
                    change_7d: None,
                    symbol: Some("LDO".to_string()),
                }])
            });
        provider
            .expect_fetch_chains_tvl()
            .returning(|| Err(Error::timeout("chains")));

        let app = app(dir.path(), provider);
        let output = app
            .invoke(Capability::GenerateMarketOverview, json!({"limit": 5}))
            .await
            .unwrap();
        assert!(output.as_text().unwrap().contains("Lido"));
    }

    #[tokio::test]
    async fn test_tvl_chart_by_category() {
        let dir = tempfile::tempdir().unwrap();
        let mut provider = MockMarketDataProvider::new();
        provider.expect_fetch_category_distribution().returning(|| {
            Ok(vec![
                CategoryTvl {
                    category: "Lending".to_string(),
                    tvl: 3.5e10,
                },
                CategoryTvl {
                    category: "Dexes".to_string(),
                    tvl: 2.0e10,
                },
            ])
        });
        provider.expect_fetch_chains_tvl().never();

        let app = app(dir.path(), provider);
        let output = app
            .invoke(
                Capability::GenerateTvlChart,
                json!({"breakdown": "categories"}),
            )
            .await
            .unwrap();
        let html = output.as_text().unwrap();
        assert!(html.contains("Lending"));
        assert!(html.contains("Dexes"));
    }

    #[tokio::test]
    async fn test_tvl_chart_for_chain() {
        let dir = tempfile::tempdir().unwrap();
        let mut provider = MockMarketDataProvider::new();
        provider
            .expect_fetch_historical_series()
            .withf(|entity, kind| entity == "Arbitrum" && *kind == SeriesKind::ChainTvl)
            .returning(|_, _| {
                Ok((1..=2)
                    .map(|day| SeriesPoint {
                        timestamp: Utc.with_ymd_and_hms(2024, 5, day, 0, 0, 0).unwrap(),
                        value: 2.5e9,
                    })
                    .collect())
            });

        let app = app(dir.path(), provider);
        let output = app
            .invoke(Capability::GenerateTvlChart, json!({"chain": "Arbitrum", "days": 30}))
            .await
            .unwrap();
        assert!(output.as_text().unwrap().contains("Arbitrum"));
    }

    #[tokio::test]
    async fn test_save_visualization_infers_format() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path(), MockMarketDataProvider::new());

        let output = app
            .invoke(
                Capability::SaveVisualization,
                json!({"content": "<svg><rect/></svg>", "name": "My Chart"}),
            )
            .await
            .unwrap();
        let result = output.as_json().unwrap();
        assert_eq!(result["format"], "svg");
        let path = std::path::PathBuf::from(result["path"].as_str().unwrap());
        assert_eq!(path, dir.path().join("my-chart.svg"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "<svg><rect/></svg>");
    }

    #[tokio::test]
    async fn test_save_png_without_browser_fails() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path(), MockMarketDataProvider::new());

        let err = app
            .invoke(
                Capability::SaveVisualization,
                json!({"content": "<html></html>", "name": "x", "format": "png"}),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "SandboxError");
    }

    #[tokio::test]
    async fn test_distribute_reports_each_platform() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("chart.png");
        std::fs::write(&artifact, PNG).unwrap();

        let mut host = MockHostRuntime::new();
        host.expect_upload_artifact()
            .withf(|workspace, _, _| workspace == "default")
            .returning(|_, _, _| {
                Ok(UploadResult {
                    url: "https://cdn.example/chart.png".to_string(),
                })
            });
        host.expect_call_platform_integration()
            .returning(|_, _, _, _| Ok(json!({"id": "99"})));

        let app = app_with(
            dir.path(),
            MockMarketDataProvider::new(),
            host,
            Arc::new(UnavailableLauncher),
        );
        let output = app
            .invoke(
                Capability::DistributeToSocial,
                json!({
                    "artifactPath": artifact,
                    "platforms": ["telegram", "friendster"],
                    "message": "Daily TVL",
                    "tags": ["DeFi"]
                }),
            )
            .await
            .unwrap();

        let results = output.as_json().unwrap();
        assert_eq!(results["telegram"]["success"], true);
        assert_eq!(results["telegram"]["postId"], "99");
        assert_eq!(results["friendster"]["success"], false);
        assert_eq!(results["friendster"]["errorKind"], "InvalidArgument");
    }

    #[tokio::test]
    async fn test_social_content_uses_platform_default() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path(), MockMarketDataProvider::new());

        let output = app
            .invoke(
                Capability::GenerateSocialContent,
                json!({"data": tvl_payload(), "platform": "linkedin"}),
            )
            .await
            .unwrap();
        let content = output.as_json().unwrap();
        assert_eq!(content["contentType"], "detailed");
        assert!(content["message"].as_str().unwrap().chars().count() <= 3000);
    }

    #[tokio::test]
    async fn test_platform_listing() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path(), MockMarketDataProvider::new());

        let output = app
            .invoke(Capability::GetSupportedSocialPlatforms, json!({}))
            .await
            .unwrap();
        let platforms = output.as_json().unwrap().as_array().unwrap().clone();
        assert_eq!(platforms.len(), 4);
        assert_eq!(platforms[0]["id"], "twitter");
        assert_eq!(platforms[0]["charLimit"], 280);
    }

    #[tokio::test]
    async fn test_invalid_arguments() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path(), MockMarketDataProvider::new());

        let err = app.invoke_by_name("mintNft", json!({})).await.unwrap_err();
        assert_eq!(err.kind(), "InvalidArgument");

        let err = app
            .invoke(Capability::GenerateTvlChart, json!({"breakdown": "planets"}))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "InvalidArgument");

        let err = app
            .invoke(Capability::CreateSocialCampaign, json!({"topic": "ETH"}))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "InvalidArgument");
    }
}
