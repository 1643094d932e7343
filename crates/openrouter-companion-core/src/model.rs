use chrono::{DateTime, Utc};
use crate::catalog::{Architecture, CatalogEntry, Pricing};
use crate::pricing;

/// Supported-parameter marker that flags reasoning support on OpenRouter.
pub const DEFAULT_REASONING_MARKER: &str = "reasoning";

/// Parameters that indicate structured output support.
pub const STRUCTURED_OUTPUT_PARAMS: &[&str] = &["response_format", "structured_outputs"];

/// Decides whether `id` is a variant listing of `canonical_slug`.
pub type SlugComparator = fn(id: &str, canonical_slug: &str) -> bool;

/// Default rule: any non-empty canonical slug that differs from the id.
pub fn slug_differs(id: &str, canonical_slug: &str) -> bool {
    !canonical_slug.is_empty() && canonical_slug != id
}

/// Read-only view over one catalog entry with normalized accessors.
///
/// Nothing here fails on missing data: absent fields fall back to the
/// documented defaults (infinite price, zero context, id as name).
#[derive(Debug, Clone, PartialEq)]
pub struct ModelView {
    entry: CatalogEntry,
}

impl ModelView {
    pub fn new(entry: CatalogEntry) -> Self {
        Self { entry }
    }

    pub fn entry(&self) -> &CatalogEntry {
        &self.entry
    }

    pub fn id(&self) -> &str {
        &self.entry.id
    }

    pub fn name(&self) -> Option<&str> {
        self.entry.name.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.entry.description.as_deref()
    }

    pub fn canonical_slug(&self) -> Option<&str> {
        self.entry.canonical_slug.as_deref()
    }

    pub fn pricing(&self) -> Option<&Pricing> {
        self.entry.pricing.as_ref()
    }

    pub fn architecture(&self) -> Option<&Architecture> {
        self.entry.architecture.as_ref()
    }

    pub fn supported_parameters(&self) -> &[String] {
        self.entry.supported_parameters.as_deref().unwrap_or_default()
    }

    pub fn context_length(&self) -> Option<u64> {
        self.entry.context_length
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.entry.created?, 0)
    }

    /// Prompt price in dollars per 1M tokens, `f64::INFINITY` when unknown.
    pub fn price_per_million_tokens(&self) -> f64 {
        pricing::per_million(self.pricing().and_then(|p| p.prompt.as_deref()))
    }

    /// Per-image price, only when it parses and is strictly positive.
    pub fn image_price(&self) -> Option<f64> {
        self.pricing()
            .and_then(|p| p.image.as_deref())
            .and_then(pricing::parse_price)
            .filter(|p| *p > 0.0)
    }

    pub fn is_free(&self) -> bool {
        self.price_per_million_tokens() == 0.0
    }

    pub fn has_pricing(&self) -> bool {
        self.price_per_million_tokens() < f64::INFINITY
    }

    pub fn supports_images(&self) -> bool {
        self.architecture()
            .and_then(|a| a.input_modalities.as_deref())
            .is_some_and(|m| m.iter().any(|x| x == "image"))
    }

    pub fn supports_parameter(&self, name: &str) -> bool {
        self.supported_parameters().iter().any(|p| p == name)
    }

    pub fn supports_structured_output(&self) -> bool {
        STRUCTURED_OUTPUT_PARAMS.iter().any(|p| self.supports_parameter(p))
    }

    pub fn supports_reasoning(&self) -> bool {
        self.supports_parameter(DEFAULT_REASONING_MARKER)
    }

    /// Structured-output parameters this model advertises.
    pub fn structured_output_params(&self) -> Vec<&str> {
        self.supported_parameters()
            .iter()
            .map(String::as_str)
            .filter(|p| STRUCTURED_OUTPUT_PARAMS.contains(p))
            .collect()
    }

    /// Name for sorting, falling back to the id when the name is missing or empty.
    pub fn sort_name(&self) -> &str {
        match self.name() {
            Some(n) if !n.is_empty() => n,
            _ => self.id(),
        }
    }

    pub fn sort_context_length(&self) -> u64 {
        self.context_length().unwrap_or(0)
    }

    pub fn has_canonical_slug_mismatch(&self) -> bool {
        self.canonical_slug_mismatch_by(slug_differs)
    }

    /// Slug check with a caller-supplied rule. Entries without a canonical slug never mismatch.
    pub fn canonical_slug_mismatch_by(&self, cmp: SlugComparator) -> bool {
        self.canonical_slug().is_some_and(|slug| cmp(self.id(), slug))
    }
}

impl From<CatalogEntry> for ModelView {
    fn from(entry: CatalogEntry) -> Self {
        Self::new(entry)
    }
}
