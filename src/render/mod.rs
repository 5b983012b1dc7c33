//! Message body rendering.
//!
//! Templates are loaded by name from a template root directory and rendered
//! with strict undefined-variable handling: a template that references a
//! key absent from the [`RenderModel`] fails instead of printing a blank.

use std::path::{Path, PathBuf};

use minijinja::{Environment, ErrorKind as TemplateErrorKind, UndefinedBehavior};
use tracing::debug;

use crate::error::{FileMailerError, Result};
use crate::model::message::RenderModel;

/// Produces a message body from a template name and a data model.
pub trait BodyRenderer: Send + Sync {
    fn render(&self, template: &str, model: &RenderModel) -> Result<String>;
}

/// [`BodyRenderer`] backed by a directory of minijinja templates.
pub struct TemplateRenderer {
    root: PathBuf,
    env: Environment<'static>,
}

impl std::fmt::Debug for TemplateRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateRenderer")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl TemplateRenderer {
    /// Load templates lazily from `root`.
    ///
    /// Templates ending in `.html` are auto-escaped.
    pub fn from_dir(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        let mut env = Environment::new();
        env.set_loader(minijinja::path_loader(&root));
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        Self { root, env }
    }
}

impl BodyRenderer for TemplateRenderer {
    fn render(&self, template: &str, model: &RenderModel) -> Result<String> {
        let tmpl = self.env.get_template(template).map_err(|e| {
            if e.kind() == TemplateErrorKind::TemplateNotFound {
                FileMailerError::TemplateNotFound(template.to_string())
            } else {
                FileMailerError::Template {
                    name: template.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

        let body = tmpl.render(model).map_err(|e| FileMailerError::Template {
            name: template.to_string(),
            reason: e.to_string(),
        })?;

        debug!(template, bytes = body.len(), "Rendered template");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn renderer_with(name: &str, source: &str) -> (tempfile::TempDir, TemplateRenderer) {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join(name), source).unwrap();
        let r = TemplateRenderer::from_dir(tmp.path());
        (tmp, r)
    }

    #[test]
    fn test_renders_model_values() {
        let (_tmp, r) = renderer_with("m.txt", "Hi {{ to }}, see {{ archive_name }}.");
        let model = RenderModel::new()
            .with("to", "user@example.com")
            .with("archive_name", "backup.zip");
        let out = r.render("m.txt", &model).unwrap();
        assert_eq!(out, "Hi user@example.com, see backup.zip.");
    }

    #[test]
    fn test_unknown_template_is_error() {
        let (_tmp, r) = renderer_with("m.txt", "x");
        let err = r.render("other.txt", &RenderModel::new()).unwrap_err();
        assert!(matches!(err, FileMailerError::TemplateNotFound(ref n) if n == "other.txt"));
        assert_eq!(err.kind(), ErrorKind::Template);
    }

    #[test]
    fn test_missing_variable_is_error() {
        let (_tmp, r) = renderer_with("m.txt", "Hi {{ nobody }}");
        let err = r
            .render("m.txt", &RenderModel::new().with("to", "a@b.c"))
            .unwrap_err();
        assert!(matches!(err, FileMailerError::Template { .. }));
    }

    #[test]
    fn test_html_is_escaped() {
        let (_tmp, r) = renderer_with("m.html", "<p>{{ to }}</p>");
        let out = r
            .render("m.html", &RenderModel::new().with("to", "<b>x"))
            .unwrap();
        assert_eq!(out, "<p>&lt;b&gt;x</p>");
    }

    #[test]
    fn test_syntax_error_is_template_error() {
        let (_tmp, r) = renderer_with("m.txt", "{% if %}");
        let err = r.render("m.txt", &RenderModel::new()).unwrap_err();
        assert!(matches!(err, FileMailerError::Template { .. }));
    }
}
