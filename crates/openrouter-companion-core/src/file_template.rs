use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::{OrcError, Result};
use crate::prompt::{Params, Prompt};

/// Prompt whose body is the full contents of a file, read at render time.
///
/// The file is not a template: parameters are accepted and ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct FileTemplatePrompt {
    path: PathBuf,
    suffix: String,
    schema: Option<Value>,
}

impl FileTemplatePrompt {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
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

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn set_path(&mut self, path: impl Into<PathBuf>) {
        self.path = path.into();
    }
}

impl Prompt for FileTemplatePrompt {
    fn render_content(&self, _params: &Params) -> Result<String> {
        tracing::debug!(path = %self.path.display(), "reading prompt template");
        std::fs::read_to_string(&self.path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => OrcError::TemplateNotFound(self.path.clone()),
            _ => OrcError::TemplateRead {
                path: self.path.clone(),
                source: e,
            },
        })
    }

    fn prompt_suffix(&self) -> String {
        self.suffix.clone()
    }

    fn validate_params(&self, _params: &Params) -> Result<()> {
        if !self.path.exists() {
            return Err(OrcError::TemplateNotFound(self.path.clone()));
        }
        if !self.path.is_file() {
            return Err(OrcError::NotAFile(self.path.clone()));
        }
        Ok(())
    }

    fn schema(&self) -> Option<Value> {
        self.schema.clone()
    }
}
