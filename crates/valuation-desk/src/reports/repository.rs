use super::domain::{
    NewReportTemplate, NewToWhomType, ReportTemplate, ReportTemplateId, TemplateType, ToWhomType,
    ToWhomTypeId,
};
use crate::store::RepositoryError;

/// Storage abstraction for report templates and recipient types.
pub trait TemplateRepository: Send + Sync {
    fn insert_template(&self, template: NewReportTemplate)
        -> Result<ReportTemplate, RepositoryError>;
    fn template(&self, id: ReportTemplateId) -> Result<Option<ReportTemplate>, RepositoryError>;
    fn templates(&self, active_only: bool) -> Result<Vec<ReportTemplate>, RepositoryError>;

    /// First active template of `template_type`, lowest id first.
    fn active_template_of(
        &self,
        template_type: TemplateType,
    ) -> Result<Option<ReportTemplate>, RepositoryError> {
        Ok(self
            .templates(true)?
            .into_iter()
            .find(|template| template.template_type == template_type))
    }

    fn insert_to_whom_type(&self, to_whom: NewToWhomType)
        -> Result<ToWhomType, RepositoryError>;
    fn to_whom_type(&self, id: ToWhomTypeId) -> Result<Option<ToWhomType>, RepositoryError>;
    fn to_whom_types(&self) -> Result<Vec<ToWhomType>, RepositoryError>;
}
