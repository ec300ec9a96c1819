use std::collections::BTreeMap;

use serde::Serialize;

use super::domain::{Permission, PermissionSpec, ResolvedRole, UserId};
use crate::api::ApiError;

/// Effective permissions of one user: the union over every assigned role keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PermissionSet {
    by_name: BTreeMap<String, Permission>,
}

impl PermissionSet {
    pub fn from_roles(roles: &[ResolvedRole]) -> Self {
        let by_name = roles
            .iter()
            .flat_map(|resolved| resolved.permissions.iter())
            .map(|permission| (permission.name.clone(), permission.clone()))
            .collect();
        Self { by_name }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.by_name.keys().cloned().collect()
    }

    pub fn into_permissions(self) -> Vec<Permission> {
        self.by_name.into_values().collect()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

/// Authenticated staff member on whose behalf an operation runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Caller {
    pub id: UserId,
    pub name: String,
    pub is_active: bool,
    pub roles: Vec<ResolvedRole>,
}

impl Caller {
    pub fn permissions(&self) -> PermissionSet {
        PermissionSet::from_roles(&self.roles)
    }

    /// Linear scan over every role's permissions.
    pub fn has_permission(&self, name: &str) -> bool {
        self.roles
            .iter()
            .flat_map(|resolved| resolved.permissions.iter())
            .any(|permission| permission.name == name)
    }

    pub fn max_role_level(&self) -> Option<u8> {
        max_role_level(&self.roles)
    }

    pub fn require(&self, permission: &str) -> Result<(), ApiError> {
        if self.has_permission(permission) {
            Ok(())
        } else {
            Err(ApiError::forbidden(format!(
                "missing required permission '{permission}'"
            )))
        }
    }
}

pub fn max_role_level(roles: &[ResolvedRole]) -> Option<u8> {
    roles.iter().map(|resolved| resolved.role.level).max()
}

/// Strict seniority comparison: the manager's maximum level must be lower than the target's.
/// Users without roles cannot manage anyone and can be managed by anyone holding a role.
pub fn can_manage(manager_level: Option<u8>, target_level: Option<u8>) -> bool {
    match (manager_level, target_level) {
        (Some(manager), Some(target)) => manager < target,
        (Some(_), None) => true,
        (None, _) => false,
    }
}

pub const DEFAULT_PERMISSIONS: &[PermissionSpec] = &[
    entry("valuations.create", "Create Valuation", "إنشاء تقييم"),
    entry("valuations.read", "View Valuations", "عرض التقييمات"),
    entry("valuations.update", "Update Valuation", "تعديل التقييم"),
    entry("valuations.delete", "Delete Valuation", "حذف التقييم"),
    entry("valuations.approve", "Approve Valuation", "اعتماد التقييم"),
    entry("valuations.reject", "Reject Valuation", "رفض التقييم"),
    entry("valuations.transfer", "Transfer Valuation", "تحويل التقييم"),
    entry("valuations.export_pdf", "Export Valuation PDF", "تصدير التقييم PDF"),
    entry("clients.create", "Create Client", "إنشاء عميل"),
    entry("clients.read", "View Clients", "عرض العملاء"),
    entry("clients.update", "Update Client", "تعديل العميل"),
    entry("clients.delete", "Delete Client", "حذف العميل"),
    entry("users.create", "Create User", "إنشاء مستخدم"),
    entry("users.read", "View Users", "عرض المستخدمين"),
    entry("users.update", "Update User", "تعديل المستخدم"),
    entry("users.delete", "Delete User", "حذف المستخدم"),
    entry("users.assign_roles", "Assign Roles", "تعيين الأدوار"),
    entry("reports.view", "View Reports", "عرض التقارير"),
    entry("reports.export", "Export Reports", "تصدير التقارير"),
    entry("settings.view", "View Settings", "عرض الإعدادات"),
    entry("settings.update", "Update Settings", "تعديل الإعدادات"),
    entry("templates.create", "Create Template", "إنشاء قالب"),
    entry("templates.read", "View Templates", "عرض القوالب"),
    entry("templates.update", "Update Template", "تعديل القالب"),
    entry("templates.delete", "Delete Template", "حذف القالب"),
];

const fn entry(
    name: &'static str,
    display_name_en: &'static str,
    display_name_ar: &'static str,
) -> PermissionSpec {
    PermissionSpec {
        name,
        display_name_en,
        display_name_ar,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DefaultRole {
    pub slug: &'static str,
    pub name_en: &'static str,
    pub name_ar: &'static str,
    pub level: u8,
    pub grants: RoleGrants,
}

/// Which catalogue entries a default role receives.
#[derive(Debug, Clone, Copy)]
pub enum RoleGrants {
    Everything,
    Except(&'static [&'static str]),
    Only(&'static [&'static str]),
}

impl RoleGrants {
    pub fn includes(&self, permission: &str) -> bool {
        match self {
            RoleGrants::Everything => true,
            RoleGrants::Except(excluded) => !excluded.contains(&permission),
            RoleGrants::Only(included) => included.contains(&permission),
        }
    }
}

pub const DEFAULT_ROLES: &[DefaultRole] = &[
    DefaultRole {
        slug: "general-manager",
        name_en: "General Manager",
        name_ar: "مدير عام",
        level: 1,
        grants: RoleGrants::Everything,
    },
    DefaultRole {
        slug: "valuation-manager",
        name_en: "Valuation Manager",
        name_ar: "مدير التقييم",
        level: 2,
        grants: RoleGrants::Except(&["settings.update", "users.delete"]),
    },
    DefaultRole {
        slug: "valuation-supervisor",
        name_en: "Valuation Supervisor",
        name_ar: "مشرف التقييم",
        level: 3,
        grants: RoleGrants::Only(&[
            "valuations.create",
            "valuations.read",
            "valuations.update",
            "valuations.approve",
            "valuations.reject",
            "valuations.transfer",
            "valuations.export_pdf",
            "clients.create",
            "clients.read",
            "clients.update",
            "users.read",
            "reports.view",
            "reports.export",
            "templates.read",
        ]),
    },
    DefaultRole {
        slug: "senior-valuator",
        name_en: "Senior Valuator",
        name_ar: "مقيم أول",
        level: 4,
        grants: RoleGrants::Only(&[
            "valuations.create",
            "valuations.read",
            "valuations.update",
            "valuations.transfer",
            "valuations.export_pdf",
            "clients.create",
            "clients.read",
            "reports.view",
            "templates.read",
        ]),
    },
    DefaultRole {
        slug: "certified-valuator",
        name_en: "Certified Valuator",
        name_ar: "مقيم معتمد",
        level: 5,
        grants: RoleGrants::Only(&[
            "valuations.create",
            "valuations.read",
            "valuations.update",
            "valuations.transfer",
            "valuations.export_pdf",
            "clients.read",
            "templates.read",
        ]),
    },
    DefaultRole {
        slug: "assistant-valuator",
        name_en: "Assistant Valuator",
        name_ar: "مساعد مقيم",
        level: 6,
        grants: RoleGrants::Only(&["valuations.read", "valuations.update", "clients.read"]),
    },
    DefaultRole {
        slug: "data-entry",
        name_en: "Data Entry",
        name_ar: "إدخال بيانات",
        level: 7,
        grants: RoleGrants::Only(&["valuations.create", "valuations.read", "clients.create", "clients.read"]),
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::domain::{PermissionId, Role, RoleId};

    fn permission(id: u64, name: &str) -> Permission {
        Permission {
            id: PermissionId(id),
            name: name.to_string(),
            display_name_en: name.to_string(),
            display_name_ar: name.to_string(),
            module: name.split('.').next().unwrap_or_default().to_string(),
            action: name.split('.').nth(1).unwrap_or_default().to_string(),
            resource: name.split('.').next().unwrap_or_default().to_string(),
        }
    }

    fn role(id: u64, level: u8, permissions: Vec<Permission>) -> ResolvedRole {
        ResolvedRole {
            role: Role {
                id: RoleId(id),
                slug: format!("role-{id}"),
                name_en: format!("Role {id}"),
                name_ar: format!("Role {id}"),
                description: None,
                level,
                is_active: true,
                permission_ids: permissions.iter().map(|p| p.id).collect(),
            },
            permissions,
        }
    }

    #[test]
    fn union_collapses_duplicate_names() {
        let roles = vec![
            role(1, 4, vec![permission(1, "valuations.read"), permission(2, "clients.read")]),
            role(2, 5, vec![permission(1, "valuations.read")]),
        ];
        let set = PermissionSet::from_roles(&roles);
        assert_eq!(set.len(), 2);
        assert_eq!(set.names(), vec!["clients.read", "valuations.read"]);
    }

    #[test]
    fn caller_checks_permissions_across_roles() {
        let caller = Caller {
            id: UserId(9),
            name: "Noura".to_string(),
            is_active: true,
            roles: vec![
                role(1, 6, vec![permission(1, "valuations.read")]),
                role(2, 3, vec![permission(3, "valuations.approve")]),
            ],
        };
        assert!(caller.has_permission("valuations.approve"));
        assert!(!caller.has_permission("users.assign_roles"));
        assert_eq!(caller.max_role_level(), Some(6));
        assert!(caller.require("users.assign_roles").is_err());
    }

    #[test]
    fn equal_levels_cannot_manage_each_other() {
        assert!(can_manage(Some(2), Some(5)));
        assert!(!can_manage(Some(5), Some(5)));
        assert!(!can_manage(Some(6), Some(5)));
        assert!(can_manage(Some(7), None));
        assert!(!can_manage(None, Some(7)));
        assert!(!can_manage(None, None));
    }

    #[test]
    fn default_catalogue_is_consistent() {
        let mut names: Vec<_> = DEFAULT_PERMISSIONS.iter().map(|p| p.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), DEFAULT_PERMISSIONS.len());

        let mut levels: Vec<_> = DEFAULT_ROLES.iter().map(|r| r.level).collect();
        levels.dedup();
        assert_eq!(levels, vec![1, 2, 3, 4, 5, 6, 7]);

        for role in DEFAULT_ROLES {
            if let RoleGrants::Only(names) = role.grants {
                for name in names {
                    assert!(
                        DEFAULT_PERMISSIONS.iter().any(|p| p.name == *name),
                        "{} grants unknown permission {name}",
                        role.slug
                    );
                }
            }
        }
    }
}
