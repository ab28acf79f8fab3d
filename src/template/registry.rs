//! Template registry - holds templates and resolves which one renders a payload.

use super::templates::{
    MarketOverviewTemplate, ProtocolTvlTemplate, TokenPriceTemplate, TvlDistributionTemplate,
};
use super::{Template, TemplateDescriptor};
use crate::error::{Error, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Ordered set of visualization templates.
///
/// Resolution is first-match in registration order. The order of the
/// built-in templates is part of the contract:
///
/// 1. `token-price-chart`
/// 2. `protocol-tvl-chart`
/// 3. `market-overview`
/// 4. `tvl-distribution`
///
/// Build it once at startup and share it behind an `Arc`; reads are
/// lock-free.
#[derive(Debug, Default)]
pub struct TemplateRegistry {
    /// Templates in registration order.
    templates: Vec<Arc<dyn Template>>,
    /// Position of each id in `templates`.
    index: HashMap<String, usize>,
}

impl TemplateRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in templates in their fixed order.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(TokenPriceTemplate::new());
        registry.register(ProtocolTvlTemplate::new());
        registry.register(MarketOverviewTemplate::new());
        registry.register(TvlDistributionTemplate::new());
        registry
    }

    /// Register a template, replacing any template with the same id.
    ///
    /// A replaced template keeps the position of the one it replaces.
    pub fn register<T: Template + 'static>(&mut self, template: T) {
        self.register_arc(Arc::new(template));
    }

    /// Register an already shared template.
    pub fn register_arc(&mut self, template: Arc<dyn Template>) {
        let id = template.id().to_string();

        if let Some(&position) = self.index.get(&id) {
            self.templates[position] = template;
            info!("Replaced template: {}", id);
        } else {
            self.index.insert(id.clone(), self.templates.len());
            self.templates.push(template);
            info!("Registered template: {}", id);
        }
    }

    /// Get a template by id.
    pub fn get(&self, id: &str) -> Option<Arc<dyn Template>> {
        self.index
            .get(id)
            .map(|&position| Arc::clone(&self.templates[position]))
    }

    /// Get a template by id, failing with `TemplateNotFound`.
    pub fn require(&self, id: &str) -> Result<Arc<dyn Template>> {
        self.get(id)
            .ok_or_else(|| Error::TemplateNotFound(id.to_string()))
    }

    /// All templates whose predicate accepts `data`, in registration order.
    pub fn find_suitable(&self, data: &Value) -> Vec<Arc<dyn Template>> {
        self.templates
            .iter()
            .filter(|template| template.is_suitable_for(data))
            .cloned()
            .collect()
    }

    /// Pick a template for `data`.
    ///
    /// This is a deliberately simple tie-break, not a ranking: with a hint,
    /// the first suitable template whose id contains the hint wins; without
    /// one (or when no suitable id contains it) the first suitable template
    /// in registration order wins. `None` means nothing is suitable.
    pub fn find_best(&self, data: &Value, hint: Option<&str>) -> Option<Arc<dyn Template>> {
        let suitable = self.find_suitable(data);

        let hinted = hint
            .filter(|h| !h.is_empty())
            .and_then(|h| suitable.iter().find(|t| t.id().contains(h)).cloned());

        let chosen = hinted.or_else(|| suitable.into_iter().next());
        debug!(
            "Template match (hint: {:?}): {:?}",
            hint,
            chosen.as_ref().map(|t| t.id().to_string())
        );
        chosen
    }

    /// Metadata of every template, in registration order.
    pub fn descriptors(&self) -> Vec<TemplateDescriptor> {
        self.templates.iter().map(|t| t.descriptor()).collect()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
