//! System prompt construction from the embedded or a user-supplied template.

use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::error::TemplateError;

/// Template used when no template file is configured or found.
pub const DEFAULT_TEMPLATE: &str = r#"You are an expert programmer helping to write concise, informative git commit messages.
The user will provide you with a git diff, and you will respond with ONLY a commit message.

Here are the characteristics of a good commit message:
- Start with a short summary line (50-72 characters)
- Use the imperative mood ("Add feature" not "Added feature")
- Optionally include a more detailed explanatory paragraph after the summary, separated by a blank line
- Explain WHAT changed and WHY, but not HOW (that's in the diff)
- Reference relevant issue numbers if applicable (e.g. "Fixes #123")

Current branch: {{.Branch}}
User context: {{.UserContext}}

Respond with ONLY the commit message, no additional explanations, introductions, or notes."#;

/// Values available to the template.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PromptData<'a> {
    pub branch: &'a str,
    pub user_context: &'a str,
}

impl<'a> PromptData<'a> {
    fn field(&self, name: &str) -> Result<&'a str, TemplateError> {
        match name {
            "Branch" => Ok(self.branch),
            "UserContext" => Ok(self.user_context),
            other => Err(TemplateError::UnknownField(other.to_string())),
        }
    }
}

/// Read the template at `path`, or fall back to [`DEFAULT_TEMPLATE`].
pub fn load_template(path: Option<&Path>) -> Result<String, TemplateError> {
    match path {
        Some(path) if path.exists() => {
            let content = fs::read_to_string(path).map_err(|source| TemplateError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            info!("Using template from: {}", path.display());
            Ok(content)
        }
        Some(path) => {
            warn!(
                "Template file {} not found, using default embedded template",
                path.display()
            );
            Ok(DEFAULT_TEMPLATE.to_string())
        }
        None => {
            info!("Using default embedded template");
            Ok(DEFAULT_TEMPLATE.to_string())
        }
    }
}

/// Substitute `{{.Branch}}` and `{{.UserContext}}` in `template`.
///
/// Spaces inside the braces are allowed, and `{{-` / `-}}` trim adjacent
/// whitespace, so templates written for Go's text/template keep working.
pub fn render(template: &str, data: &PromptData<'_>) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len() + data.branch.len() + data.user_context.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        let offset = template.len() - rest.len() + start;
        let after_open = &rest[start + 2..];
        let end = after_open
            .find("}}")
            .ok_or(TemplateError::Unclosed { offset })?;

        let mut action = &after_open[..end];
        let mut literal = &rest[..start];

        if let Some(trimmed) = action.strip_prefix("- ") {
            literal = literal.trim_end();
            action = trimmed;
        }
        let trim_right = if let Some(trimmed) = action.strip_suffix(" -") {
            action = trimmed;
            true
        } else {
            false
        };

        out.push_str(literal);

        let action = action.trim();
        let field = action
            .strip_prefix('.')
            .filter(|name| !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'))
            .ok_or_else(|| TemplateError::UnsupportedAction(action.to_string()))?;
        out.push_str(data.field(field)?);

        rest = &after_open[end + 2..];
        if trim_right {
            rest = rest.trim_start();
        }
    }

    out.push_str(rest);
    Ok(out)
}

/// Load the configured template and render it.
pub fn render_prompt(path: Option<&Path>, data: &PromptData<'_>) -> Result<String, TemplateError> {
    let template = load_template(path)?;
    render(&template, data)
}
