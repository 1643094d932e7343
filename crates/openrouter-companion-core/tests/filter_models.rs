use std::sync::atomic::{AtomicUsize, Ordering};

use openrouter_companion_core::catalog::{CatalogEntry, ModelSource};
use openrouter_companion_core::error::{OrcError, Result};
use openrouter_companion_core::filter::{apply_filters, sort_models};
use openrouter_companion_core::{Capabilities, FilterSettings, ModelFilter, ModelView, SortOrder};
use serde_json::json;

/// In-memory source that counts how often it was asked.
struct CountingSource {
    entries: Vec<CatalogEntry>,
    calls: AtomicUsize,
}

impl CountingSource {
    fn new(v: serde_json::Value) -> Self {
        Self {
            entries: serde_json::from_value(v).expect("valid catalog"),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ModelSource for CountingSource {
    async fn list_models(&self) -> Result<Vec<CatalogEntry>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.entries.clone())
    }
}

struct FailingSource;

impl ModelSource for FailingSource {
    async fn list_models(&self) -> Result<Vec<CatalogEntry>> {
        Err(OrcError::Api {
            status: 429,
            body: "rate limited".into(),
        })
    }
}

fn ids(models: &[ModelView]) -> Vec<&str> {
    models.iter().map(ModelView::id).collect()
}

fn sample_catalog() -> serde_json::Value {
    json!([
        {
            "id": "vendor/vision-json",
            "name": "Vision JSON",
            "description": "Multimodal model with JSON mode",
            "context_length": 128000,
            "pricing": {"prompt": "0.000003", "image": "0.002"},
            "architecture": {"input_modalities": ["text", "image"]},
            "supported_parameters": ["response_format", "tools"]
        },
        {
            "id": "vendor/old-json",
            "name": "Old JSON",
            "description": "This model is being deprecated in favour of v2.",
            "context_length": 8192,
            "pricing": {"prompt": "0.000001"},
            "supported_parameters": ["structured_outputs"]
        },
        {
            "id": "vendor/vision",
            "name": "Vision",
            "pricing": {"prompt": "0"},
            "architecture": {"input_modalities": ["image", "text"]},
            "supported_parameters": ["temperature"]
        },
        {
            "id": "vendor/thinker:beta",
            "canonical_slug": "vendor/thinker",
            "name": "Thinker (beta)",
            "context_length": 200000,
            "pricing": {"prompt": "0.00001"},
            "supported_parameters": ["reasoning", "response_format"]
        },
        {
            "id": "vendor/plain",
            "description": "Plain text model",
            "supported_parameters": []
        }
    ])
}

#[tokio::test]
async fn structured_output_by_price_scenario() {
    let source = CountingSource::new(json!([
        {"id": "a", "pricing": {"prompt": "0.000002"}, "supported_parameters": ["response_format"]},
        {"id": "b", "pricing": {"prompt": "0"}, "supported_parameters": []},
        {"id": "c", "pricing": {"prompt": null}, "supported_parameters": ["structured_outputs"]}
    ]));
    let filter = ModelFilter::new(source);
    let models = filter
        .filter_models(Capabilities::STRUCTURED_OUTPUT, false, false, SortOrder::PriceAsc)
        .await
        .unwrap();
    assert_eq!(ids(&models), ["a", "c"]);
    assert!((models[0].price_per_million_tokens() - 2.0).abs() < 1e-9);
    assert_eq!(models[1].price_per_million_tokens(), f64::INFINITY);
}

#[tokio::test]
async fn deprecated_and_variants_excluded_by_default() {
    let filter = ModelFilter::new(CountingSource::new(sample_catalog()));
    let models = filter
        .filter_models(Capabilities::NONE, false, false, SortOrder::None)
        .await
        .unwrap();
    assert_eq!(ids(&models), ["vendor/vision-json", "vendor/vision", "vendor/plain"]);

    let all = filter
        .filter_models(Capabilities::NONE, true, true, SortOrder::None)
        .await
        .unwrap();
    assert_eq!(all.len(), 5);

    let with_deprecated = filter
        .filter_models(Capabilities::NONE, true, false, SortOrder::None)
        .await
        .unwrap();
    assert!(ids(&with_deprecated).contains(&"vendor/old-json"));
    assert!(!ids(&with_deprecated).contains(&"vendor/thinker:beta"));
}

#[tokio::test]
async fn one_fetch_per_query() {
    let filter = ModelFilter::new(CountingSource::new(sample_catalog()));
    for order in [SortOrder::PriceAsc, SortOrder::NameDesc, SortOrder::ContextAsc] {
        filter
            .filter_models(Capabilities::IMAGE_INPUT, false, false, order)
            .await
            .unwrap();
    }
    assert_eq!(filter.source().calls(), 3);
}

#[tokio::test]
async fn fetch_failure_is_wrapped() {
    let filter = ModelFilter::new(FailingSource);
    let err = filter
        .filter_models(Capabilities::NONE, false, false, SortOrder::PriceAsc)
        .await
        .unwrap_err();
    match &err {
        OrcError::Fetch(inner) => {
            assert!(matches!(**inner, OrcError::Api { status: 429, .. }));
        }
        other => panic!("expected Fetch, got {other:?}"),
    }
    assert!(err.to_string().starts_with("failed to fetch models from OpenRouter API"));
    assert!(err.to_string().contains("rate limited"));
}

#[tokio::test]
async fn custom_settings_drive_keywords_and_marker() {
    let settings = FilterSettings::default()
        .with_deprecation_keywords(["JSON MODE"])
        .with_reasoning_marker("response_format");
    let filter = ModelFilter::with_settings(CountingSource::new(sample_catalog()), settings);

    // "being deprecated" is no longer a keyword; "json mode" is.
    let models = filter
        .filter_models(Capabilities::NONE, false, true, SortOrder::None)
        .await
        .unwrap();
    assert_eq!(
        ids(&models),
        ["vendor/old-json", "vendor/vision", "vendor/thinker:beta", "vendor/plain"]
    );

    let reasoning = filter
        .filter_models(Capabilities::REASONING, true, true, SortOrder::None)
        .await
        .unwrap();
    assert_eq!(ids(&reasoning), ["vendor/vision-json", "vendor/thinker:beta"]);
}

#[tokio::test]
async fn injected_slug_rule() {
    fn never(_id: &str, _slug: &str) -> bool {
        false
    }
    let settings = FilterSettings::default().with_slug_comparator(never);
    let filter = ModelFilter::with_settings(CountingSource::new(sample_catalog()), settings);
    let models = filter
        .filter_models(Capabilities::REASONING, false, false, SortOrder::None)
        .await
        .unwrap();
    assert_eq!(ids(&models), ["vendor/thinker:beta"]);
}

#[tokio::test]
async fn repeated_queries_see_the_same_catalog() {
    let filter = ModelFilter::new(CountingSource::new(sample_catalog()));
    let before = filter.fetch_models().await.unwrap();
    let _ = filter
        .filter_models(Capabilities::ALL, false, false, SortOrder::NameAsc)
        .await
        .unwrap();
    let _ = filter
        .filter_models(Capabilities::NONE, true, true, SortOrder::PriceDesc)
        .await
        .unwrap();
    let after = filter.fetch_models().await.unwrap();
    assert_eq!(before, after);
    assert_eq!(filter.source().entries.len(), 5);
}

#[test]
fn filtering_is_intersective() {
    let models: Vec<ModelView> = serde_json::from_value::<Vec<CatalogEntry>>(sample_catalog())
        .unwrap()
        .into_iter()
        .map(ModelView::new)
        .collect();
    let s = FilterSettings {
        include_deprecated: true,
        include_problematic_variants: true,
        ..FilterSettings::default()
    };
    let flags = [
        Capabilities::IMAGE_INPUT,
        Capabilities::STRUCTURED_OUTPUT,
        Capabilities::REASONING,
    ];
    for a in flags {
        for b in flags {
            let both = apply_filters(&models, a | b, &s);
            let only_a = apply_filters(&models, a, &s);
            let only_b = apply_filters(&models, b, &s);
            for m in &both {
                assert!(only_a.contains(m), "{} missing from {a}", m.id());
                assert!(only_b.contains(m), "{} missing from {b}", m.id());
            }
        }
    }
    let input_copy = models.clone();
    let _ = apply_filters(&models, Capabilities::ALL, &s);
    let _ = sort_models(&models, SortOrder::PriceDesc);
    assert_eq!(models, input_copy);
}

#[test]
fn price_desc_is_reverse_of_price_asc_for_distinct_prices() {
    let models: Vec<ModelView> = serde_json::from_value::<Vec<CatalogEntry>>(json!([
        {"id": "m1", "pricing": {"prompt": "0.000004"}},
        {"id": "m2"},
        {"id": "m3", "pricing": {"prompt": "0"}},
        {"id": "m4", "pricing": {"prompt": "0.0000001"}}
    ]))
    .unwrap()
    .into_iter()
    .map(ModelView::new)
    .collect();
    let mut asc = ids(&sort_models(&models, SortOrder::PriceAsc))
        .into_iter()
        .map(String::from)
        .collect::<Vec<_>>();
    asc.reverse();
    let desc = ids(&sort_models(&models, SortOrder::PriceDesc))
        .into_iter()
        .map(String::from)
        .collect::<Vec<_>>();
    assert_eq!(asc, desc);
}

#[test]
fn price_desc_mirrors_price_asc_with_ties() {
    let models: Vec<ModelView> = serde_json::from_value::<Vec<CatalogEntry>>(json!([
        {"id": "a", "pricing": {"prompt": "0.000001"}},
        {"id": "b"},
        {"id": "c", "pricing": {"prompt": "0.000001"}},
        {"id": "d", "pricing": {"prompt": "garbage"}},
        {"id": "e", "pricing": {"prompt": "0"}}
    ]))
    .unwrap()
    .into_iter()
    .map(ModelView::new)
    .collect();

    let asc = sort_models(&models, SortOrder::PriceAsc);
    let desc = sort_models(&models, SortOrder::PriceDesc);

    // Same price sequence once reversed.
    let mut asc_prices: Vec<f64> = asc.iter().map(|m| m.price_per_million_tokens()).collect();
    asc_prices.reverse();
    let desc_prices: Vec<f64> = desc.iter().map(|m| m.price_per_million_tokens()).collect();
    assert_eq!(asc_prices, desc_prices);

    // Ties keep input order in both directions.
    assert_eq!(ids(&asc), ["e", "a", "c", "b", "d"]);
    assert_eq!(ids(&desc), ["b", "d", "a", "c", "e"]);
}
