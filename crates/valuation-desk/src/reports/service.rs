use std::sync::Arc;

use chrono::{DateTime, Utc};
use mime::Mime;
use serde::Serialize;
use tracing::info;

use super::document::{ReportContext, ReportDocument};
use super::domain::{
    AvailableTemplates, NewReportTemplate, NewToWhomType, ReportTemplate, ReportTemplateId,
    TemplateType, ToWhomType,
};
use super::render::{DocumentRenderer, PageOptions, RenderError, RenderRequest};
use super::repository::TemplateRepository;
use crate::api::{ApiError, ErrorCode};
use crate::identity::IdentityRepository;
use crate::sketches::SketchRepository;
use crate::store::RepositoryError;
use crate::validation::ValidationErrors;
use crate::valuations::{Valuation, ValuationId, ValuationRepository};

/// The document prepared for one valuation, before rendering.
#[derive(Debug, Clone, Serialize)]
pub struct ReportPreview {
    pub view: String,
    pub template: Option<ReportTemplate>,
    pub document: ReportDocument,
}

#[derive(Debug, Clone)]
pub struct ExportedReport {
    pub filename: String,
    pub content_type: Mime,
    pub bytes: Vec<u8>,
}

/// Template selection, document assembly, and hand-off to the renderer.
pub struct ReportService<S, D> {
    store: Arc<S>,
    renderer: Arc<D>,
}

impl<S, D> ReportService<S, D>
where
    S: ValuationRepository + IdentityRepository + TemplateRepository + SketchRepository + 'static,
    D: DocumentRenderer + 'static,
{
    pub fn new(store: Arc<S>, renderer: Arc<D>) -> Self {
        Self { store, renderer }
    }

    /// Explicit template, else the recipient type's default, else the active `general` one.
    pub fn select_template(
        &self,
        valuation: &Valuation,
        explicit: Option<ReportTemplateId>,
    ) -> Result<Option<ReportTemplate>, ReportError> {
        if let Some(id) = explicit {
            let template = self
                .store
                .template(id)?
                .ok_or(RepositoryError::NotFound("report template"))?;
            return Ok(Some(template));
        }

        if let Some(to_whom) = self.to_whom_of(valuation)? {
            if let Some(template_id) = to_whom.template_id {
                if let Some(template) = self.store.template(template_id)? {
                    return Ok(Some(template));
                }
            }
        }

        Ok(self.store.active_template_of(TemplateType::General)?)
    }

    pub fn preview(
        &self,
        valuation_id: ValuationId,
        template_id: Option<ReportTemplateId>,
    ) -> Result<ReportPreview, ReportError> {
        self.preview_at(valuation_id, template_id, Utc::now())
    }

    pub fn preview_at(
        &self,
        valuation_id: ValuationId,
        template_id: Option<ReportTemplateId>,
        now: DateTime<Utc>,
    ) -> Result<ReportPreview, ReportError> {
        let valuation = self.valuation(valuation_id)?;
        let template = self.select_template(&valuation, template_id)?;

        let preparer = IdentityRepository::user(self.store.as_ref(), valuation.prepared_by)?;
        let client = match valuation.client_id {
            Some(id) => self.store.client(id)?,
            None => None,
        };
        let to_whom = self.to_whom_of(&valuation)?;
        let sketch = self.store.sketch(valuation.id)?;

        let document = ReportContext {
            valuation: &valuation,
            preparer: preparer.as_ref(),
            client: client.as_ref(),
            to_whom: to_whom.as_ref(),
            sketch: sketch.as_ref(),
            template: template.as_ref(),
            generated_at: now,
        }
        .assemble();

        let view = template
            .as_ref()
            .map_or(TemplateType::General, |template| template.template_type)
            .view_name();
        Ok(ReportPreview {
            view,
            template,
            document,
        })
    }

    pub fn export(
        &self,
        valuation_id: ValuationId,
        template_id: Option<ReportTemplateId>,
    ) -> Result<ExportedReport, ReportError> {
        let now = Utc::now();
        let valuation = self.valuation(valuation_id)?;
        let preview = self.preview_at(valuation_id, template_id, now)?;

        let page = preview
            .template
            .as_ref()
            .map_or_else(PageOptions::default, |template| {
                PageOptions::default().with_styling(&template.styling)
            });
        let request = RenderRequest {
            view: preview.view,
            template_id: preview.template.as_ref().map(|template| template.id),
            page,
            document: preview.document,
        };
        let rendered = self.renderer.render(&request)?;

        let filename = report_filename(&valuation, now, rendered.extension());
        info!(
            valuation = %valuation_id,
            view = %request.view,
            bytes = rendered.bytes.len(),
            "valuation report rendered"
        );
        Ok(ExportedReport {
            filename,
            content_type: rendered.content_type,
            bytes: rendered.bytes,
        })
    }

    pub fn available_templates(
        &self,
        valuation_id: ValuationId,
    ) -> Result<AvailableTemplates, ReportError> {
        let valuation = self.valuation(valuation_id)?;
        let recommended_template = match self.to_whom_of(&valuation)? {
            Some(ToWhomType {
                template_id: Some(id),
                ..
            }) => self.store.template(id)?,
            _ => None,
        };
        Ok(AvailableTemplates {
            templates: self.store.templates(true)?,
            recommended_template,
        })
    }

    pub fn templates(&self) -> Result<Vec<ReportTemplate>, ReportError> {
        Ok(self.store.templates(false)?)
    }

    pub fn create_template(
        &self,
        template: NewReportTemplate,
    ) -> Result<ReportTemplate, ReportError> {
        let mut errors = ValidationErrors::new();
        errors.length("name_en", &template.name_en, 1, 255);
        errors.length("name_ar", &template.name_ar, 1, 255);
        errors.max_length("description", template.description.as_deref(), 1000);
        if let Some(to_whom) = template.to_whom_type_id {
            if self.store.to_whom_type(to_whom)?.is_none() {
                errors.add(
                    "to_whom_type_id",
                    format!("recipient type {to_whom} does not exist"),
                );
            }
        }
        errors.into_result()?;

        let stored = self.store.insert_template(template)?;
        info!(
            template = %stored.id,
            kind = stored.template_type.label(),
            "report template created"
        );
        Ok(stored)
    }

    pub fn to_whom_types(&self) -> Result<Vec<ToWhomType>, ReportError> {
        Ok(self.store.to_whom_types()?)
    }

    pub fn create_to_whom_type(&self, to_whom: NewToWhomType) -> Result<ToWhomType, ReportError> {
        let mut errors = ValidationErrors::new();
        errors.length("name_en", &to_whom.name_en, 1, 255);
        errors.length("name_ar", &to_whom.name_ar, 1, 255);
        if let Some(template) = to_whom.template_id {
            if self.store.template(template)?.is_none() {
                errors.add("template_id", format!("template {template} does not exist"));
            }
        }
        errors.into_result()?;

        let stored = self.store.insert_to_whom_type(to_whom)?;
        info!(to_whom = %stored.id, kind = stored.kind.label(), "recipient type created");
        Ok(stored)
    }

    fn valuation(&self, id: ValuationId) -> Result<Valuation, ReportError> {
        Ok(self
            .store
            .valuation(id)?
            .ok_or(RepositoryError::NotFound("valuation"))?)
    }

    fn to_whom_of(&self, valuation: &Valuation) -> Result<Option<ToWhomType>, RepositoryError> {
        match valuation.to_whom_type_id {
            Some(id) => self.store.to_whom_type(id),
            None => Ok(None),
        }
    }
}

/// `valuation_report_<reference or id>_<YYYY-MM-DD>.<ext>`
pub fn report_filename(valuation: &Valuation, now: DateTime<Utc>, extension: &str) -> String {
    let reference = valuation
        .report
        .reference_number
        .as_deref()
        .map(str::trim)
        .filter(|reference| !reference.is_empty())
        .map(|reference| {
            reference
                .chars()
                .map(|ch| if ch.is_ascii_alphanumeric() || ch == '-' { ch } else { '_' })
                .collect::<String>()
        })
        .unwrap_or_else(|| valuation.id.to_string());
    format!(
        "valuation_report_{reference}_{}.{extension}",
        now.format("%Y-%m-%d")
    )
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<ReportError> for ApiError {
    fn from(value: ReportError) -> Self {
        match value {
            ReportError::Validation(errors) => ApiError::validation(errors),
            ReportError::Render(err) => ApiError::internal(ErrorCode::RenderFailed, &err),
            ReportError::Repository(err) => err.into(),
        }
    }
}
