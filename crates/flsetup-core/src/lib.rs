// flsetup-core: CLI と GUI で共有するビジネスロジック

pub mod commands;
pub mod config;
pub mod progress;
pub mod retry;
pub mod template;
pub mod validation;
pub mod xcode;

pub use config::{load_config, CliConfig};
pub use template::context::{TemplateContext, TemplateContextBuilder};
pub use template::TemplateEngine;
pub use validation::{validate_app_name, validate_org, validate_project_name};
