pub mod settings;

pub use settings::{
    ApiConfig, OtelConfig, ProviderConfig, ServerConfig, Settings, TemplateConfig, WebhookConfig,
};
