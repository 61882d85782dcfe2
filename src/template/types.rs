//! Template types and error definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::render::placeholders;

/// Template-specific error type
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template not found: {name} ({language})")]
    NotFound { name: String, language: String },

    #[error("Template already exists: {name} ({language})")]
    AlreadyExists { name: String, language: String },

    #[error("Missing required variable: {0}")]
    MissingVariable(String),

    #[error("Invalid template: {0}")]
    InvalidTemplate(String),
}

/// Result type for template operations
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Lookup key for a template: a name is unique within a language scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TemplateKey {
    pub name: String,
    pub language: String,
}

impl TemplateKey {
    pub fn new(name: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            language: language.into(),
        }
    }
}

/// A message template with `{{variable}}` placeholder slots
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    /// Template name (alphanumeric, dash, underscore), e.g. "order_confirmation"
    pub name: String,

    /// Language code, e.g. "en" or "es"
    pub language: String,

    /// Message body with {{variable}} placeholders
    pub body: String,

    /// Declared variables; every one of them is required at render time
    #[serde(default)]
    pub variables: Vec<String>,

    /// Inactive templates are invisible to resolution
    #[serde(default = "default_active")]
    pub is_active: bool,

    /// Creation timestamp
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

impl Template {
    pub fn key(&self) -> TemplateKey {
        TemplateKey::new(self.name.clone(), self.language.clone())
    }

    /// Validate the template
    pub fn validate(&self) -> TemplateResult<()> {
        if self.name.is_empty() || self.name.len() > 100 {
            return Err(TemplateError::InvalidTemplate(
                "Name must be 1-100 characters".to_string(),
            ));
        }

        if !self
            .name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
        {
            return Err(TemplateError::InvalidTemplate(
                "Name must contain only alphanumeric, dash, or underscore".to_string(),
            ));
        }

        if self.language.is_empty() || self.language.len() > 8 {
            return Err(TemplateError::InvalidTemplate(
                "Language must be 1-8 characters".to_string(),
            ));
        }

        if self.body.is_empty() {
            return Err(TemplateError::InvalidTemplate(
                "Body must not be empty".to_string(),
            ));
        }

        // Every placeholder in the body must be a declared variable,
        // otherwise it could never be substituted.
        for placeholder in placeholders(&self.body) {
            if !self.variables.iter().any(|v| v == &placeholder) {
                return Err(TemplateError::InvalidTemplate(format!(
                    "Placeholder '{{{{{}}}}}' is not a declared variable",
                    placeholder
                )));
            }
        }

        Ok(())
    }
}

/// Request to create a new template
#[derive(Debug, Deserialize)]
pub struct CreateTemplateRequest {
    pub name: String,
    pub language: String,
    pub body: String,
    #[serde(default)]
    pub variables: Vec<String>,
}

impl From<CreateTemplateRequest> for Template {
    fn from(req: CreateTemplateRequest) -> Self {
        let now = Utc::now();
        Template {
            name: req.name,
            language: req.language,
            body: req.body,
            variables: req.variables,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Request to update an existing template
#[derive(Debug, Deserialize)]
pub struct UpdateTemplateRequest {
    /// New body (optional)
    pub body: Option<String>,

    /// New declared-variable list (optional)
    pub variables: Option<Vec<String>>,

    /// Activate or deactivate (optional)
    pub is_active: Option<bool>,
}

/// Response for listing templates
#[derive(Debug, Serialize)]
pub struct TemplateListResponse {
    pub templates: Vec<Template>,
    pub total: usize,
}
