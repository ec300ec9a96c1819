use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Staff member identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub u64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleId(pub u64);

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub job_title: Option<String>,
    pub is_active: bool,
    pub role_ids: Vec<RoleId>,
    pub created_at: DateTime<Utc>,
}

/// Employee intake payload.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub role_ids: Vec<RoleId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub id: PermissionId,
    pub name: String,
    pub display_name_en: String,
    pub display_name_ar: String,
    pub module: String,
    pub action: String,
    pub resource: String,
}

/// Catalogue entry used when seeding; the store assigns the identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionSpec {
    pub name: &'static str,
    pub display_name_en: &'static str,
    pub display_name_ar: &'static str,
}

impl PermissionSpec {
    pub fn module(&self) -> &'static str {
        self.name.split_once('.').map_or(self.name, |(module, _)| module)
    }

    pub fn action(&self) -> &'static str {
        self.name.split_once('.').map_or("", |(_, action)| action)
    }
}

/// Seniority grouping of permissions. Lower `level` is more senior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub slug: String,
    pub name_en: String,
    pub name_ar: String,
    pub description: Option<String>,
    pub level: u8,
    pub is_active: bool,
    pub permission_ids: Vec<PermissionId>,
}

/// Create/update payload for a role.
#[derive(Debug, Clone, Deserialize)]
pub struct RoleInput {
    pub slug: String,
    pub name_en: String,
    #[serde(default)]
    pub name_ar: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub level: u8,
    #[serde(default = "active_by_default")]
    pub is_active: bool,
    #[serde(default)]
    pub permission_ids: Vec<PermissionId>,
}

fn active_by_default() -> bool {
    true
}

/// A role together with its permissions, loaded eagerly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedRole {
    pub role: Role,
    pub permissions: Vec<Permission>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientKind {
    #[default]
    Client,
    Institution,
}

impl ClientKind {
    pub const fn label(self) -> &'static str {
        match self {
            ClientKind::Client => "client",
            ClientKind::Institution => "institution",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub kind: ClientKind,
    pub address: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewClient {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub kind: ClientKind,
    #[serde(default)]
    pub address: Option<String>,
}
