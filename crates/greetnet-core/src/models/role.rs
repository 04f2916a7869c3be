//! Role enumeration and the mapping from role-holder form fields to
//! roles.

use serde::{Deserialize, Serialize};

/// The closed set of roles a user can hold.
///
/// Membership is stored as (user, role) pairs; which object a role
/// applies to follows from the user's cluster/destination assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    SuperAdmin,
    Admin,
    Referent,
    Gestionnaire,
    Manager,
    Financier,
    Greeter,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "SuperAdmin",
            Role::Admin => "Admin",
            Role::Referent => "Referent",
            Role::Gestionnaire => "Gestionnaire",
            Role::Manager => "Manager",
            Role::Financier => "Financier",
            Role::Greeter => "Greeter",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "SuperAdmin" => Some(Role::SuperAdmin),
            "Admin" => Some(Role::Admin),
            "Referent" => Some(Role::Referent),
            "Gestionnaire" => Some(Role::Gestionnaire),
            "Manager" => Some(Role::Manager),
            "Financier" => Some(Role::Financier),
            "Greeter" => Some(Role::Greeter),
            _ => None,
        }
    }

    /// All roles, in display order.
    pub fn all() -> &'static [Role] {
        &[
            Role::SuperAdmin,
            Role::Admin,
            Role::Referent,
            Role::Gestionnaire,
            Role::Manager,
            Role::Financier,
            Role::Greeter,
        ]
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A role-holder field on a cluster or destination form.
///
/// Each field grants exactly one role; the mapping is total, so adding
/// a new holder field forces a decision about the granted role at
/// compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RoleField {
    ClusterAdmin,
    ClusterAdminAlt,
    DestManager,
    DestReferent,
    DestMatcher,
    DestMatcherAlt,
    DestFinancier,
}

impl RoleField {
    /// The role granted by holding this field.
    pub fn role(&self) -> Role {
        match self {
            RoleField::ClusterAdmin | RoleField::ClusterAdminAlt => Role::Admin,
            RoleField::DestManager => Role::Manager,
            RoleField::DestReferent => Role::Referent,
            RoleField::DestMatcher | RoleField::DestMatcherAlt => Role::Gestionnaire,
            RoleField::DestFinancier => Role::Financier,
        }
    }

    /// Form-field name, for error reporting.
    pub fn field_name(&self) -> &'static str {
        match self {
            RoleField::ClusterAdmin => "admin",
            RoleField::ClusterAdminAlt => "admin_alt",
            RoleField::DestManager => "manager",
            RoleField::DestReferent => "referent",
            RoleField::DestMatcher => "matcher",
            RoleField::DestMatcherAlt => "matcher_alt",
            RoleField::DestFinancier => "financier",
        }
    }
}

/// The destination fields a Gestionnaire may edit.
///
/// This is the single authoritative list: the permission enforcer and
/// the destination form both resolve Gestionnaire access through it.
pub const MATCHER_DESTINATION_FIELDS: &[&str] = &[
    "places",
    "min_places",
    "max_places",
    "min_interests",
    "max_interests",
    "require_stay_dates",
    "dispersion_days",
];

/// The cluster fields an Admin may be granted on a per-cluster basis.
///
/// Every form field except the short code, which is immutable after
/// creation and so never toggleable. Scalar fields first, then the
/// five tag lists.
pub const ADMIN_CLUSTER_FIELDS: &[&str] = &[
    "name",
    "status",
    "address",
    "description",
    "paypal_url",
    "admin",
    "admin_alt",
    "max_participants",
    "comm_langs",
    "backup_email",
    "library_url",
    "greeter_library_url",
    "experiences",
    "interest_centers",
    "no_reply_greeter",
    "no_reply_visitor",
    "notoriety",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_strings_round_trip() {
        for role in Role::all() {
            assert_eq!(Role::parse(role.as_str()), Some(*role));
        }
    }

    #[test]
    fn both_admin_fields_grant_admin() {
        assert_eq!(RoleField::ClusterAdmin.role(), Role::Admin);
        assert_eq!(RoleField::ClusterAdminAlt.role(), Role::Admin);
    }

    #[test]
    fn both_matcher_fields_grant_gestionnaire() {
        assert_eq!(RoleField::DestMatcher.role(), Role::Gestionnaire);
        assert_eq!(RoleField::DestMatcherAlt.role(), Role::Gestionnaire);
    }
}
