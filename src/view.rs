//! View rendering collaborators.
//!
//! The [`Mailer`](crate::Mailer) does not look anything up globally. It asks a
//! [`PathResolver`] to turn its view path into a directory and a
//! [`TemplateRenderer`] to render the file found there. The defaults are
//! [`Aliases`] and [`MiniJinjaRenderer`]; both can be replaced with
//! [`Mailer::with_resolver`](crate::Mailer::with_resolver) and
//! [`Mailer::with_renderer`](crate::Mailer::with_renderer).

use minijinja::Environment;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::MailError;

/// File extension appended to view names.
pub const VIEW_EXTENSION: &str = "html";

/// Renders a template file with named parameters.
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, path: &Path, params: &serde_json::Value) -> Result<String, MailError>;
}

/// Turns an aliased path such as `@app/views/mailer` into a filesystem path.
pub trait PathResolver: Send + Sync {
    fn resolve(&self, path: &str) -> Result<PathBuf, MailError>;
}

/// Alias table. `@name/rest` resolves to the path registered for `@name`
/// joined with `rest`; paths without a leading `@` pass through.
#[derive(Debug, Clone)]
pub struct Aliases {
    aliases: BTreeMap<String, PathBuf>,
}

impl Aliases {
    /// An empty table.
    pub fn new() -> Self {
        Self {
            aliases: BTreeMap::new(),
        }
    }

    /// Register an alias. A missing leading `@` is added.
    pub fn alias(mut self, name: &str, path: impl Into<PathBuf>) -> Self {
        let name = if name.starts_with('@') {
            name.to_string()
        } else {
            format!("@{}", name)
        };
        self.aliases.insert(name, path.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Path> {
        self.aliases.get(name).map(PathBuf::as_path)
    }
}

/// `@app` points at the current directory.
impl Default for Aliases {
    fn default() -> Self {
        Self::new().alias("@app", ".")
    }
}

impl PathResolver for Aliases {
    fn resolve(&self, path: &str) -> Result<PathBuf, MailError> {
        if !path.starts_with('@') {
            return Ok(PathBuf::from(path));
        }

        let (name, rest) = match path.find('/') {
            Some(pos) => (&path[..pos], &path[pos + 1..]),
            None => (path, ""),
        };

        let root = self
            .get(name)
            .ok_or_else(|| MailError::Configuration(format!("Unknown path alias: {}", name)))?;

        Ok(if rest.is_empty() {
            root.to_path_buf()
        } else {
            root.join(rest)
        })
    }
}

/// Template renderer backed by minijinja.
///
/// Templates are read from disk on every render. Files ending in `.html`
/// get HTML auto-escaping.
pub struct MiniJinjaRenderer {
    env: Environment<'static>,
}

impl MiniJinjaRenderer {
    pub fn new() -> Self {
        Self {
            env: Environment::new(),
        }
    }

    /// Use a pre-configured environment (filters, globals).
    pub fn with_environment(env: Environment<'static>) -> Self {
        Self { env }
    }
}

impl Default for MiniJinjaRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer for MiniJinjaRenderer {
    fn render(&self, path: &Path, params: &serde_json::Value) -> Result<String, MailError> {
        let source = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => MailError::TemplateNotFound(path.display().to_string()),
            _ => MailError::TemplateError(format!("{}: {}", path.display(), e)),
        })?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(self.env.render_named_str(&name, &source, params)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_alias_resolution() {
        let aliases = Aliases::new().alias("app", "/srv/site");

        assert_eq!(
            aliases.resolve("@app/views/mailer").unwrap(),
            PathBuf::from("/srv/site/views/mailer")
        );
        assert_eq!(aliases.resolve("@app").unwrap(), PathBuf::from("/srv/site"));
        assert_eq!(aliases.resolve("views/mail").unwrap(), PathBuf::from("views/mail"));
    }

    #[test]
    fn test_unknown_alias() {
        let result = Aliases::default().resolve("@runtime/mail");
        assert!(matches!(result, Err(MailError::Configuration(_))));
    }

    #[test]
    fn test_default_app_alias() {
        assert_eq!(Aliases::default().get("@app"), Some(Path::new(".")));
    }

    #[test]
    fn test_render_escapes_html() {
        let dir = std::env::temp_dir().join(format!("mailkit-view-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("welcome.html");
        std::fs::write(&path, "<p>Hello {{ name }}!</p>").unwrap();

        let html = MiniJinjaRenderer::new()
            .render(&path, &json!({ "name": "<Alice>" }))
            .unwrap();
        assert_eq!(html, "<p>Hello &lt;Alice&gt;!</p>");

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_render_missing_file() {
        let result = MiniJinjaRenderer::new().render(
            Path::new("/nonexistent/mailkit/view.html"),
            &serde_json::Value::Null,
        );
        assert!(matches!(result, Err(MailError::TemplateNotFound(_))));
    }

    #[test]
    fn test_render_syntax_error() {
        let dir = std::env::temp_dir().join(format!("mailkit-view-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("broken.html");
        std::fs::write(&path, "{% if %}").unwrap();

        let result = MiniJinjaRenderer::new().render(&path, &serde_json::Value::Null);
        assert!(matches!(result, Err(MailError::TemplateError(_))));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
