#[cfg(feature = "network")]
pub mod api;
pub mod capability;
pub mod catalog;
pub mod error;
pub mod file_template;
pub mod filter;
pub mod model;
pub mod pricing;
pub mod prompt;
pub mod settings;
pub mod string_template;

#[cfg(feature = "network")]
pub use api::OpenRouterClient;
pub use capability::{Capabilities, SortOrder};
pub use catalog::{CatalogEntry, ModelSource, StaticCatalog};
pub use error::OrcError;
pub use file_template::FileTemplatePrompt;
pub use filter::ModelFilter;
pub use model::ModelView;
pub use prompt::{Params, Prompt};
pub use settings::FilterSettings;
pub use string_template::StringTemplatePrompt;
