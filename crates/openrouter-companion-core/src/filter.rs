use crate::capability::{Capabilities, SortOrder};
use crate::catalog::ModelSource;
use crate::error::{OrcError, Result};
use crate::model::ModelView;
use crate::settings::FilterSettings;

/// Fetches the catalog and narrows it down by capability, deprecation and slug checks.
///
/// Every query performs exactly one fetch; nothing is cached between calls.
pub struct ModelFilter<S> {
    source: S,
    settings: FilterSettings,
}

impl<S: ModelSource> ModelFilter<S> {
    pub fn new(source: S) -> Self {
        Self::with_settings(source, FilterSettings::default())
    }

    pub fn with_settings(source: S, settings: FilterSettings) -> Self {
        Self { source, settings }
    }

    pub fn settings(&self) -> &FilterSettings {
        &self.settings
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetch all models, wrapped. Source failures come back as [`OrcError::Fetch`].
    pub async fn fetch_models(&self) -> Result<Vec<ModelView>> {
        let entries = self
            .source
            .list_models()
            .await
            .map_err(|e| OrcError::Fetch(Box::new(e)))?;
        Ok(entries.into_iter().map(ModelView::new).collect())
    }

    /// Models that have every capability in `capabilities`, ordered by `sort_order`.
    ///
    /// The include flags override the ones in this filter's settings; keywords,
    /// reasoning marker and slug rule are taken from the settings.
    pub async fn filter_models(
        &self,
        capabilities: Capabilities,
        include_deprecated: bool,
        include_problematic_variants: bool,
        sort_order: SortOrder,
    ) -> Result<Vec<ModelView>> {
        let settings = FilterSettings {
            include_deprecated,
            include_problematic_variants,
            ..self.settings.clone()
        };
        self.filter_with(capabilities, &settings, sort_order).await
    }

    pub async fn filter_with(
        &self,
        capabilities: Capabilities,
        settings: &FilterSettings,
        sort_order: SortOrder,
    ) -> Result<Vec<ModelView>> {
        let models = self.fetch_models().await?;
        let kept = apply_filters(&models, capabilities, settings);
        tracing::debug!(
            fetched = models.len(),
            kept = kept.len(),
            %capabilities,
            %sort_order,
            "filtered catalog"
        );
        Ok(sort_models(&kept, sort_order))
    }
}

/// True if the model has every requested capability.
pub fn has_capabilities(
    model: &ModelView,
    capabilities: Capabilities,
    settings: &FilterSettings,
) -> bool {
    capabilities.iter().all(|flag| match flag {
        Capabilities::IMAGE_INPUT => model.supports_images(),
        Capabilities::STRUCTURED_OUTPUT => model.supports_structured_output(),
        Capabilities::REASONING => model.supports_parameter(&settings.reasoning_marker),
        _ => true,
    })
}

/// Whether a single model survives the filters.
pub fn retain_model(
    model: &ModelView,
    capabilities: Capabilities,
    settings: &FilterSettings,
) -> bool {
    if !has_capabilities(model, capabilities, settings) {
        return false;
    }
    if !settings.include_deprecated && settings.is_deprecated(model.description()) {
        tracing::debug!(id = model.id(), "skipping deprecated model");
        return false;
    }
    if !settings.include_problematic_variants
        && model.canonical_slug_mismatch_by(settings.slug_comparator)
    {
        tracing::debug!(id = model.id(), "skipping variant listing");
        return false;
    }
    true
}

/// Filtered copy of `models`, in input order.
pub fn apply_filters(
    models: &[ModelView],
    capabilities: Capabilities,
    settings: &FilterSettings,
) -> Vec<ModelView> {
    models
        .iter()
        .filter(|m| retain_model(m, capabilities, settings))
        .cloned()
        .collect()
}

/// Sorted copy of `models`. The sort is stable, so ties keep their input order.
pub fn sort_models(models: &[ModelView], order: SortOrder) -> Vec<ModelView> {
    let mut out = models.to_vec();
    let by_price = |a: &ModelView, b: &ModelView| {
        a.price_per_million_tokens().total_cmp(&b.price_per_million_tokens())
    };
    match order {
        SortOrder::None => {}
        SortOrder::PriceAsc => out.sort_by(by_price),
        SortOrder::PriceDesc => out.sort_by(|a, b| by_price(b, a)),
        SortOrder::NameAsc => out.sort_by(|a, b| a.sort_name().cmp(b.sort_name())),
        SortOrder::NameDesc => out.sort_by(|a, b| b.sort_name().cmp(a.sort_name())),
        SortOrder::ContextAsc => out.sort_by_key(ModelView::sort_context_length),
        SortOrder::ContextDesc => {
            out.sort_by(|a, b| b.sort_context_length().cmp(&a.sort_context_length()))
        }
    }
    out
}

#[cfg(feature = "network")]
impl ModelFilter<crate::api::OpenRouterClient> {
    /// Filter backed by OpenRouter, key from `$OPENROUTER_API_KEY`.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(crate::api::OpenRouterClient::new(None)?))
    }

    pub fn with_api_key(api_key: impl Into<String>) -> Result<Self> {
        Ok(Self::new(crate::api::OpenRouterClient::new(Some(api_key.into()))?))
    }
}
