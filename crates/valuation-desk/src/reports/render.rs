use mime::Mime;
use serde::Serialize;
use serde_json::Value;

use super::document::ReportDocument;
use super::domain::{Orientation, ReportTemplateId, TemplateStyling};

/// Page setup sent with every render; templates override individual fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageOptions {
    pub format: String,
    pub orientation: Orientation,
    pub margin_top: u32,
    pub margin_bottom: u32,
    pub margin_left: u32,
    pub margin_right: u32,
    pub default_font: String,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            format: "A4".to_string(),
            orientation: Orientation::Portrait,
            margin_top: 20,
            margin_bottom: 20,
            margin_left: 15,
            margin_right: 15,
            default_font: "DejaVu Sans".to_string(),
        }
    }
}

impl PageOptions {
    pub fn with_styling(mut self, styling: &TemplateStyling) -> Self {
        if let Some(format) = &styling.format {
            self.format = format.clone();
        }
        if let Some(orientation) = styling.orientation {
            self.orientation = orientation;
        }
        if let Some(margin) = styling.margin_top {
            self.margin_top = margin;
        }
        if let Some(margin) = styling.margin_bottom {
            self.margin_bottom = margin;
        }
        if let Some(margin) = styling.margin_left {
            self.margin_left = margin;
        }
        if let Some(margin) = styling.margin_right {
            self.margin_right = margin;
        }
        if let Some(font) = &styling.default_font {
            self.default_font = font.clone();
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderRequest {
    pub view: String,
    pub template_id: Option<ReportTemplateId>,
    pub page: PageOptions,
    pub document: ReportDocument,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedDocument {
    pub bytes: Vec<u8>,
    pub content_type: Mime,
}

impl RenderedDocument {
    pub fn pdf(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            content_type: mime::APPLICATION_PDF,
        }
    }

    pub fn extension(&self) -> &'static str {
        let (kind, subtype) = (self.content_type.type_(), self.content_type.subtype());
        if kind == mime::APPLICATION && subtype == mime::PDF {
            "pdf"
        } else if kind == mime::TEXT && subtype == mime::HTML {
            "html"
        } else {
            "bin"
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("view '{view}' could not be rendered: {reason}")]
    View { view: String, reason: String },
    #[error("renderer unavailable: {0}")]
    Unavailable(String),
}

/// HTML-to-document engine boundary.
pub trait DocumentRenderer: Send + Sync {
    fn render(&self, request: &RenderRequest) -> Result<RenderedDocument, RenderError>;
}

/// Renders the flat document as an HTML table. Used when no PDF engine is wired in.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlPreviewRenderer;

impl DocumentRenderer for HtmlPreviewRenderer {
    fn render(&self, request: &RenderRequest) -> Result<RenderedDocument, RenderError> {
        let page = &request.page;
        let orientation = match page.orientation {
            Orientation::Portrait => "portrait",
            Orientation::Landscape => "landscape",
        };
        let mut html = format!(
            "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{view}</title>\
             <style>@page {{ size: {format} {orientation}; margin: {top}mm {right}mm {bottom}mm {left}mm; }} \
             body {{ font-family: '{font}'; }}</style></head><body><table>",
            view = escape(&request.view),
            format = escape(&page.format),
            top = page.margin_top,
            right = page.margin_right,
            bottom = page.margin_bottom,
            left = page.margin_left,
            font = escape(&page.default_font),
        );
        for (key, value) in request.document.entries() {
            let text = match value {
                Value::Null => String::new(),
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            html.push_str(&format!(
                "<tr><th>{}</th><td>{}</td></tr>",
                escape(key),
                escape(&text)
            ));
        }
        html.push_str("</table></body></html>");

        Ok(RenderedDocument {
            bytes: html.into_bytes(),
            content_type: mime::TEXT_HTML_UTF_8,
        })
    }
}

fn escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
