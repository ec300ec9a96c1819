//! Report templates, recipient types, and valuation report export.

pub mod document;
pub mod domain;
pub mod render;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use document::{ReportContext, ReportDocument};
pub use domain::{
    AvailableTemplates, NewReportTemplate, NewToWhomType, Orientation, RecipientKind,
    ReportTemplate, ReportTemplateId, TemplateStyling, TemplateType, ToWhomType, ToWhomTypeId,
};
pub use render::{
    DocumentRenderer, HtmlPreviewRenderer, PageOptions, RenderError, RenderRequest,
    RenderedDocument,
};
pub use repository::TemplateRepository;
pub use router::report_router;
pub use service::{report_filename, ExportedReport, ReportError, ReportPreview, ReportService};
