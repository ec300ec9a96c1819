use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToWhomTypeId(pub u64);

impl fmt::Display for ToWhomTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportTemplateId(pub u64);

impl fmt::Display for ReportTemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who the report is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipientKind {
    Bank,
    Government,
    PrivateCompany,
    Court,
    Individual,
    #[default]
    Other,
}

impl RecipientKind {
    pub const fn label(self) -> &'static str {
        match self {
            RecipientKind::Bank => "bank",
            RecipientKind::Government => "government",
            RecipientKind::PrivateCompany => "private_company",
            RecipientKind::Court => "court",
            RecipientKind::Individual => "individual",
            RecipientKind::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateType {
    Bank,
    Government,
    PrivateCompany,
    Court,
    Individual,
    #[default]
    General,
}

impl TemplateType {
    pub const fn label(self) -> &'static str {
        match self {
            TemplateType::Bank => "bank",
            TemplateType::Government => "government",
            TemplateType::PrivateCompany => "private_company",
            TemplateType::Court => "court",
            TemplateType::Individual => "individual",
            TemplateType::General => "general",
        }
    }

    /// Renderer view, e.g. `pdf.valuation.bank`.
    pub fn view_name(self) -> String {
        format!("pdf.valuation.{}", self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToWhomType {
    pub id: ToWhomTypeId,
    pub name_en: String,
    pub name_ar: String,
    pub kind: RecipientKind,
    /// Default report template for this recipient.
    pub template_id: Option<ReportTemplateId>,
    pub description: Option<String>,
    pub is_active: bool,
}

impl ToWhomType {
    pub fn display_name(&self) -> &str {
        &self.name_en
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewToWhomType {
    #[serde(default)]
    pub name_en: String,
    #[serde(default)]
    pub name_ar: String,
    #[serde(default)]
    pub kind: RecipientKind,
    #[serde(default)]
    pub template_id: Option<ReportTemplateId>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Page options a template may override, merged over the A4 portrait defaults.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateStyling {
    pub format: Option<String>,
    pub orientation: Option<Orientation>,
    pub margin_top: Option<u32>,
    pub margin_bottom: Option<u32>,
    pub margin_left: Option<u32>,
    pub margin_right: Option<u32>,
    pub default_font: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportTemplate {
    pub id: ReportTemplateId,
    pub name_en: String,
    pub name_ar: String,
    pub template_type: TemplateType,
    pub to_whom_type_id: Option<ToWhomTypeId>,
    pub description: Option<String>,
    pub styling: TemplateStyling,
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewReportTemplate {
    #[serde(default)]
    pub name_en: String,
    #[serde(default)]
    pub name_ar: String,
    #[serde(default)]
    pub template_type: TemplateType,
    #[serde(default)]
    pub to_whom_type_id: Option<ToWhomTypeId>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub styling: TemplateStyling,
    #[serde(default = "active_by_default")]
    pub is_active: bool,
}

fn active_by_default() -> bool {
    true
}

/// Templates offered for one valuation plus the one its recipient type points at.
#[derive(Debug, Clone, Serialize)]
pub struct AvailableTemplates {
    pub templates: Vec<ReportTemplate>,
    pub recommended_template: Option<ReportTemplate>,
}
