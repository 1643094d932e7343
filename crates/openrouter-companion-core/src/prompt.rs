//! Prompt rendering.
//!
//! A [`Prompt`] turns a parameter map into the final prompt text. The body
//! comes from [`Prompt::render_content`]; a non-empty [`Prompt::prompt_suffix`]
//! is appended after a blank line.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::Result;

/// Template parameters keyed by variable name.
pub type Params = HashMap<String, String>;

pub trait Prompt {
    /// Main prompt body.
    fn render_content(&self, params: &Params) -> Result<String>;

    /// Body plus suffix.
    fn render(&self, params: &Params) -> Result<String> {
        let body = self.render_content(params)?;
        Ok(join_suffix(body, &self.prompt_suffix()))
    }

    /// Trailing instructions, e.g. output format. Empty means none.
    fn prompt_suffix(&self) -> String {
        String::new()
    }

    fn validate_params(&self, _params: &Params) -> Result<()> {
        Ok(())
    }

    fn required_params(&self) -> Vec<String> {
        Vec::new()
    }

    fn optional_params(&self) -> Vec<String> {
        Vec::new()
    }

    /// JSON schema the response is expected to follow, if any.
    fn schema(&self) -> Option<Value> {
        None
    }
}

pub(crate) fn join_suffix(body: String, suffix: &str) -> String {
    if suffix.is_empty() {
        body
    } else {
        format!("{body}\n\n{suffix}")
    }
}

/// Build [`Params`] from `(key, value)` pairs.
pub fn params<I, K, V>(pairs: I) -> Params
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
