//! Template storage with CRUD operations and language-fallback resolution

use chrono::Utc;
use dashmap::DashMap;

use super::types::{
    Template, TemplateError, TemplateKey, TemplateResult, UpdateTemplateRequest,
};

/// In-memory template storage keyed by (name, language).
///
/// Read-only to the dispatcher; created/updated through the admin surface.
pub struct TemplateStore {
    templates: DashMap<TemplateKey, Template>,
    default_language: String,
}

impl TemplateStore {
    /// Create a new template store with the given fallback language
    pub fn new(default_language: impl Into<String>) -> Self {
        Self {
            templates: DashMap::new(),
            default_language: default_language.into(),
        }
    }

    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    /// Create a new template
    pub fn create(&self, template: Template) -> TemplateResult<Template> {
        template.validate()?;

        let key = template.key();
        if self.templates.contains_key(&key) {
            return Err(TemplateError::AlreadyExists {
                name: key.name,
                language: key.language,
            });
        }

        self.templates.insert(key, template.clone());
        Ok(template)
    }

    /// Get a template by exact (name, language), regardless of active flag
    pub fn get(&self, name: &str, language: &str) -> TemplateResult<Template> {
        self.templates
            .get(&TemplateKey::new(name, language))
            .map(|t| t.clone())
            .ok_or_else(|| TemplateError::NotFound {
                name: name.to_string(),
                language: language.to_string(),
            })
    }

    /// Resolve a template for sending.
    ///
    /// Looks up the active template for (name, language); when the requested
    /// language has no active template, falls back exactly once to the
    /// configured default language. Inactive templates are invisible here.
    pub fn resolve(&self, name: &str, language: Option<&str>) -> TemplateResult<Template> {
        let requested = language.unwrap_or(&self.default_language);

        if let Some(template) = self.get_active(name, requested) {
            return Ok(template);
        }

        if requested != self.default_language {
            if let Some(template) = self.get_active(name, &self.default_language) {
                return Ok(template);
            }
        }

        Err(TemplateError::NotFound {
            name: name.to_string(),
            language: requested.to_string(),
        })
    }

    fn get_active(&self, name: &str, language: &str) -> Option<Template> {
        self.templates
            .get(&TemplateKey::new(name, language))
            .filter(|t| t.is_active)
            .map(|t| t.clone())
    }

    /// List templates, optionally filtered by language
    pub fn list(&self, language: Option<&str>) -> Vec<Template> {
        let mut templates: Vec<Template> = self
            .templates
            .iter()
            .filter(|entry| language.map_or(true, |l| entry.key().language == l))
            .map(|entry| entry.value().clone())
            .collect();

        templates.sort_by(|a, b| a.name.cmp(&b.name).then(a.language.cmp(&b.language)));
        templates
    }

    /// Update an existing template
    pub fn update(
        &self,
        name: &str,
        language: &str,
        updates: UpdateTemplateRequest,
    ) -> TemplateResult<Template> {
        let mut template = self.get(name, language)?;

        if let Some(body) = updates.body {
            template.body = body;
        }

        if let Some(variables) = updates.variables {
            template.variables = variables;
        }

        if let Some(is_active) = updates.is_active {
            template.is_active = is_active;
        }

        template.updated_at = Utc::now();
        template.validate()?;

        self.templates.insert(template.key(), template.clone());
        Ok(template)
    }

    /// Deactivate a template (soft delete).
    ///
    /// Templates are never hard-deleted so existing message records can keep
    /// referring to them.
    pub fn deactivate(&self, name: &str, language: &str) -> TemplateResult<()> {
        let mut entry = self
            .templates
            .get_mut(&TemplateKey::new(name, language))
            .ok_or_else(|| TemplateError::NotFound {
                name: name.to_string(),
                language: language.to_string(),
            })?;

        entry.is_active = false;
        entry.updated_at = Utc::now();
        Ok(())
    }

    /// Get the number of active templates
    pub fn active_count(&self) -> usize {
        self.templates.iter().filter(|e| e.is_active).count()
    }
}
