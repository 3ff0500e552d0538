//! Static role → permission table.
//!
//! The table is a pure lookup: same role in, same permissions out. Roles not
//! present in the table (legacy values still sitting in the database) fall
//! back to view-only access rather than no access, matching what unmapped
//! roles have always been able to do.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Student,
    Mentor,
    Ia,
    Leadership,
    Admin,
    Ec,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "STUDENT",
            Role::Mentor => "MENTOR",
            Role::Ia => "IA",
            Role::Leadership => "LEADERSHIP",
            Role::Admin => "ADMIN",
            Role::Ec => "EC",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "STUDENT" => Some(Role::Student),
            "MENTOR" => Some(Role::Mentor),
            "IA" => Some(Role::Ia),
            "LEADERSHIP" => Some(Role::Leadership),
            "ADMIN" => Some(Role::Admin),
            "EC" => Some(Role::Ec),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    CreateMeeting,
    EditMeeting,
    DeleteMeeting,
    ViewMeeting,
    ManageUsers,
}

impl Permission {
    pub const ALL: [Permission; 5] = [
        Permission::CreateMeeting,
        Permission::EditMeeting,
        Permission::DeleteMeeting,
        Permission::ViewMeeting,
        Permission::ManageUsers,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::CreateMeeting => "create_meeting",
            Permission::EditMeeting => "edit_meeting",
            Permission::DeleteMeeting => "delete_meeting",
            Permission::ViewMeeting => "view_meeting",
            Permission::ManageUsers => "manage_users",
        }
    }
}

/// Derive the permission set for a role name. Total: unknown roles get the
/// minimal view-only set.
pub fn derive_permissions(role: &str) -> &'static [Permission] {
    match Role::parse(role) {
        Some(Role::Admin) => &Permission::ALL,
        Some(Role::Leadership) => &[Permission::CreateMeeting, Permission::ViewMeeting],
        Some(Role::Mentor) => &[
            Permission::CreateMeeting,
            Permission::ViewMeeting,
            Permission::EditMeeting,
        ],
        Some(Role::Student) | Some(Role::Ia) | Some(Role::Ec) | None => {
            &[Permission::ViewMeeting]
        }
    }
}

/// A user's stored permission codes, with a `has()` check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionSet(pub Vec<String>);

impl PermissionSet {
    pub fn has(&self, permission: Permission) -> bool {
        self.0.iter().any(|p| p == permission.as_str())
    }

    pub fn from_csv(csv: &str) -> Self {
        let codes = csv
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        PermissionSet(codes)
    }

    pub fn to_csv(&self) -> String {
        self.0.join(",")
    }

    pub fn from_role(role: &str) -> Self {
        PermissionSet(
            derive_permissions(role)
                .iter()
                .map(|p| p.as_str().to_string())
                .collect(),
        )
    }
}
