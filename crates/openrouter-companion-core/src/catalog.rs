use std::future::Future;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{OrcError, Result};

/// One model as listed by the catalog endpoint.
///
/// Every field other than `id` may be missing or null upstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    #[serde(default)]
    pub canonical_slug: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub created: Option<i64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub context_length: Option<u64>,
    #[serde(default)]
    pub pricing: Option<Pricing>,
    #[serde(default)]
    pub architecture: Option<Architecture>,
    #[serde(default)]
    pub supported_parameters: Option<Vec<String>>,
}

/// Raw prices, dollars per token (or per image), kept as decimal text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pricing {
    #[serde(default, deserialize_with = "decimal_text")]
    pub prompt: Option<String>,
    #[serde(default, deserialize_with = "decimal_text")]
    pub completion: Option<String>,
    #[serde(default, deserialize_with = "decimal_text")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Architecture {
    #[serde(default)]
    pub modality: Option<String>,
    #[serde(default)]
    pub input_modalities: Option<Vec<String>>,
    #[serde(default)]
    pub output_modalities: Option<Vec<String>>,
    #[serde(default)]
    pub tokenizer: Option<String>,
}

/// Envelope returned by `GET /models`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogResponse {
    #[serde(default)]
    pub data: Vec<CatalogEntry>,
}

// Prices come as strings from OpenRouter but some mirrors emit bare numbers.
fn decimal_text<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_u64<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<u64>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        _ => None,
    })
}

fn lenient_i64<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<i64>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        _ => None,
    })
}

/// Anything that can list the model catalog.
///
/// The filter engine calls this exactly once per query.
pub trait ModelSource {
    fn list_models(&self) -> impl Future<Output = Result<Vec<CatalogEntry>>> + Send;
}

/// A fixed, in-memory catalog. Useful offline and in tests.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    entries: Vec<CatalogEntry>,
}

impl StaticCatalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    /// Parse either a bare array of entries or the `{ "data": [...] }` envelope.
    pub fn from_json(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        let entries = if value.is_array() {
            serde_json::from_value(value)?
        } else {
            serde_json::from_value::<CatalogResponse>(value)?.data
        };
        Ok(Self { entries })
    }

    /// Load a catalog previously saved from the API.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            OrcError::Config(format!("cannot read catalog {}: {e}", path.display()))
        })?;
        Self::from_json(&text)
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }
}

impl ModelSource for StaticCatalog {
    async fn list_models(&self) -> Result<Vec<CatalogEntry>> {
        Ok(self.entries.clone())
    }
}
