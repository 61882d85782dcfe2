//! Message templates: storage, resolution, and variable substitution.

mod defaults;
mod render;
mod store;
mod types;

pub use defaults::default_templates;
pub use render::{placeholders, render};
pub use store::TemplateStore;
pub use types::{
    CreateTemplateRequest, Template, TemplateError, TemplateKey, TemplateListResponse,
    TemplateResult, UpdateTemplateRequest,
};
