//! Variable substitution for template bodies.
//!
//! Substitution is purely textual: supplied values are spliced in verbatim
//! and never evaluated, so template content cannot trigger any expression
//! or lookup machinery.

use std::collections::HashMap;

use super::types::{Template, TemplateError, TemplateResult};

/// Render a template body by substituting `{{variable}}` placeholders.
///
/// Every declared variable must be supplied; extra supplied variables are
/// silently ignored.
pub fn render(template: &Template, variables: &HashMap<String, String>) -> TemplateResult<String> {
    for required in &template.variables {
        if !variables.contains_key(required) {
            return Err(TemplateError::MissingVariable(required.clone()));
        }
    }

    let mut body = template.body.clone();
    for (name, value) in variables {
        let pattern = format!("{{{{{}}}}}", name);
        body = body.replace(&pattern, value);
    }

    Ok(body)
}

/// Extract the placeholder names appearing in a template body.
pub fn placeholders(body: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = body;

    while let Some(start) = rest.find("{{") {
        rest = &rest[start + 2..];
        let Some(end) = rest.find("}}") else {
            break;
        };
        let name = rest[..end].trim();
        if !name.is_empty() && !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
        rest = &rest[end + 2..];
    }

    names
}
