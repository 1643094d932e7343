use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde_json::Value;

use crate::error::{OrcError, Result};
use crate::prompt::{join_suffix, Params, Prompt};

// `$$` escape, `$name`, `${name}`, or an invalid `$` (empty group 4).
fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\$(?:(\$)|([A-Za-z_][A-Za-z0-9_]*)|\{([A-Za-z_][A-Za-z0-9_]*)\}|())")
            .expect("placeholder pattern is valid")
    })
}

// `$` followed by an identifier, with no regard for escapes or braces.
fn variable_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\$([A-Za-z_][A-Za-z0-9_]*)").expect("variable pattern is valid")
    })
}

fn placeholder_name<'t>(caps: &Captures<'t>) -> Option<&'t str> {
    caps.get(2).or_else(|| caps.get(3)).map(|m| m.as_str())
}

// 1-based line and column of a byte offset.
fn line_col(text: &str, offset: usize) -> (usize, usize) {
    let before = &text[..offset];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    (line, before[line_start..].chars().count() + 1)
}

/// Inline template with `$variable` placeholders.
///
/// `$$` renders a literal `$` and `${name}` is the braced form of `$name`.
/// Any other `$` is an invalid placeholder: strict rendering fails on it,
/// [`StringTemplatePrompt::safe_render`] keeps it as is.
#[derive(Debug, Clone, PartialEq)]
pub struct StringTemplatePrompt {
    template: String,
    suffix: String,
    schema: Option<Value>,
}

impl StringTemplatePrompt {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            suffix: String::new(),
            schema: None,
        }
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Like [`Prompt::render`], but unresolved placeholders stay in the output verbatim.
    pub fn safe_render(&self, params: &Params) -> String {
        let body = placeholder_re()
            .replace_all(&self.template, |caps: &Captures| {
                if caps.get(1).is_some() {
                    return "$".to_string();
                }
                placeholder_name(caps)
                    .and_then(|name| params.get(name))
                    .cloned()
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned();
        join_suffix(body, &self.suffix)
    }

    /// Distinct names found after a `$`, as a plain textual scan.
    ///
    /// Braced `${name}` forms are not reported and a `$$name` escape is.
    /// [`Prompt::required_params`] gives the names substitution actually needs.
    pub fn template_variables(&self) -> BTreeSet<String> {
        variable_re()
            .captures_iter(&self.template)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// Names that substitution resolves, in order of first appearance.
    pub fn substitution_variables(&self) -> Vec<String> {
        let mut seen = Vec::<String>::new();
        for caps in placeholder_re().captures_iter(&self.template) {
            if let Some(name) = placeholder_name(&caps) {
                if !seen.iter().any(|s| s == name) {
                    seen.push(name.to_string());
                }
            }
        }
        seen
    }
}

impl Prompt for StringTemplatePrompt {
    fn render_content(&self, params: &Params) -> Result<String> {
        let mut out = String::with_capacity(self.template.len());
        let mut last = 0;
        for caps in placeholder_re().captures_iter(&self.template) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            out.push_str(&self.template[last..whole.start()]);
            last = whole.end();
            if caps.get(1).is_some() {
                out.push('$');
                continue;
            }
            if caps.get(4).is_some() {
                let (line, col) = line_col(&self.template, whole.start());
                return Err(OrcError::InvalidPlaceholder { line, col });
            }
            if let Some(name) = placeholder_name(&caps) {
                let value = params
                    .get(name)
                    .ok_or_else(|| OrcError::MissingVariable(name.to_string()))?;
                out.push_str(value);
            }
        }
        out.push_str(&self.template[last..]);
        Ok(out)
    }

    fn prompt_suffix(&self) -> String {
        self.suffix.clone()
    }

    fn required_params(&self) -> Vec<String> {
        self.substitution_variables()
    }

    /// Fails on the first problem strict rendering would hit.
    fn validate_params(&self, params: &Params) -> Result<()> {
        self.render_content(params).map(|_| ())
    }

    fn schema(&self) -> Option<Value> {
        self.schema.clone()
    }
}
