//! Text rendering for report lines.
//!
//! Uses Handlebars with HTML escaping disabled: the output goes into a PDF
//! content stream, not a web page.

use handlebars::Handlebars;
use once_cell::sync::Lazy;
use serde_json::Value;

use ror_core::RorError;

use crate::templates::{LineTemplate, TemplatesFile, DEFAULT_TEMPLATES};

const GENERATED_ON: &str = "generated_on";

static DEFAULT_RENDERER: Lazy<TemplateRenderer> = Lazy::new(|| {
    let templates = TemplatesFile::from_yaml(DEFAULT_TEMPLATES)
        .expect("bundled report templates are valid");
    TemplateRenderer::new(templates).expect("bundled report templates compile")
});

/// Compiled report templates
pub struct TemplateRenderer {
    handlebars: Handlebars<'static>,
    templates: TemplatesFile,
}

impl TemplateRenderer {
    /// Compile every line template of `templates`.
    pub fn new(templates: TemplatesFile) -> Result<Self, RorError> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);
        handlebars.register_escape_fn(handlebars::no_escape);

        handlebars
            .register_template_string(GENERATED_ON, &templates.generated_on)
            .map_err(|e| RorError::Render(format!("{}: {}", GENERATED_ON, e)))?;
        for line in LineTemplate::ALL {
            let source = templates.line(line).unwrap_or_default();
            handlebars
                .register_template_string(line.name(), source)
                .map_err(|e| RorError::Render(format!("{}: {}", line.name(), e)))?;
        }

        Ok(TemplateRenderer {
            handlebars,
            templates,
        })
    }

    /// Renderer for the bundled report copy.
    pub fn bundled() -> &'static TemplateRenderer {
        &DEFAULT_RENDERER
    }

    pub fn templates(&self) -> &TemplatesFile {
        &self.templates
    }

    pub fn render_line(&self, line: LineTemplate, data: &Value) -> Result<String, RorError> {
        self.render(line.name(), data)
    }

    pub fn generated_on(&self, timestamp: &str) -> Result<String, RorError> {
        self.render(GENERATED_ON, &serde_json::json!({ "timestamp": timestamp }))
    }

    fn render(&self, name: &str, data: &Value) -> Result<String, RorError> {
        self.handlebars
            .render(name, data)
            .map_err(|e| RorError::Render(format!("{}: {}", name, e)))
    }
}
