use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{OrcError, Result};
use crate::model::{slug_differs, SlugComparator, DEFAULT_REASONING_MARKER};

/// Keywords whose presence in a description marks a model as deprecated.
pub const DEFAULT_DEPRECATION_KEYWORDS: &[&str] =
    &["deprecated", "removed", "discontinued", "being deprecated"];

/// Filtering knobs. Built once and not mutated by the engine.
///
/// Loadable from TOML; every key is optional:
///
/// ```toml
/// include_deprecated = false
/// include_problematic_variants = false
/// deprecation_keywords = ["deprecated", "sunset"]
/// reasoning_marker = "reasoning"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    pub include_deprecated: bool,
    pub include_problematic_variants: bool,
    pub deprecation_keywords: Vec<String>,
    pub reasoning_marker: String,
    #[serde(skip, default = "default_slug_comparator")]
    pub slug_comparator: SlugComparator,
}

fn default_slug_comparator() -> SlugComparator {
    slug_differs
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            include_deprecated: false,
            include_problematic_variants: false,
            deprecation_keywords: DEFAULT_DEPRECATION_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
            reasoning_marker: DEFAULT_REASONING_MARKER.to_string(),
            slug_comparator: slug_differs,
        }
    }
}

impl FilterSettings {
    pub fn from_toml(text: &str) -> Result<Self> {
        let mut settings: Self =
            toml::from_str(text).map_err(|e| OrcError::Config(e.to_string()))?;
        settings.normalize();
        Ok(settings)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| OrcError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml(&text)
    }

    /// Load from [`default_config_path`] if it exists, otherwise defaults.
    pub fn load_default() -> Result<Self> {
        match default_config_path() {
            Some(path) if path.is_file() => {
                tracing::debug!(path = %path.display(), "loading filter settings");
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    pub fn with_deprecation_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.deprecation_keywords = keywords.into_iter().map(Into::into).collect();
        self.normalize();
        self
    }

    pub fn with_reasoning_marker(mut self, marker: impl Into<String>) -> Self {
        self.reasoning_marker = marker.into();
        self
    }

    pub fn with_slug_comparator(mut self, cmp: SlugComparator) -> Self {
        self.slug_comparator = cmp;
        self
    }

    /// Heuristic: the lowercased description contains any deprecation keyword.
    pub fn is_deprecated(&self, description: Option<&str>) -> bool {
        let Some(desc) = description else {
            return false;
        };
        let desc = desc.to_lowercase();
        self.deprecation_keywords.iter().any(|k| desc.contains(k.as_str()))
    }

    // Keywords are matched against a lowercased description.
    fn normalize(&mut self) {
        for k in &mut self.deprecation_keywords {
            *k = k.to_lowercase();
        }
        self.deprecation_keywords.retain(|k| !k.is_empty());
    }
}

/// `<config dir>/openrouter-companion/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    Some(dirs::config_dir()?.join("openrouter-companion").join("config.toml"))
}
