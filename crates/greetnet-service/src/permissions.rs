//! Field-permission store and enforcer.
//!
//! Permission rows are opinions about concrete (target, field, role)
//! triples. Absence of a row means the field is editable; the enforcer
//! only ever disables what a stored row says to disable.

use std::collections::{HashMap, HashSet};

use greetnet_core::error::GreetnetResult;
use greetnet_core::models::entity::EntityRef;
use greetnet_core::models::role::{ADMIN_CLUSTER_FIELDS, MATCHER_DESTINATION_FIELDS, Role};
use greetnet_core::repository::FieldPermissionRepository;

/// Roles allowed to configure field permissions on the target.
pub fn granting_roles(target: EntityRef) -> &'static [Role] {
    match target {
        EntityRef::Cluster(_) => &[Role::SuperAdmin],
        EntityRef::Destination(_) => &[Role::SuperAdmin, Role::Admin],
    }
}

/// The fields a role may be granted or denied on the target's form.
///
/// Roles without an entry have no toggleable fields; permission rows
/// are only ever written for fields listed here.
pub fn editable_fields(target: EntityRef, role: Role) -> &'static [&'static str] {
    match (target, role) {
        (EntityRef::Cluster(_), Role::Admin) => ADMIN_CLUSTER_FIELDS,
        (EntityRef::Destination(_), Role::Gestionnaire) => MATCHER_DESTINATION_FIELDS,
        _ => &[],
    }
}

/// True when the caller holds a role that may configure permissions on
/// the target.
pub fn can_grant(target: EntityRef, caller_roles: &[Role]) -> bool {
    let granting = granting_roles(target);
    caller_roles.iter().any(|r| granting.contains(r))
}

/// Stored opinions for (target, role): field name to editability.
/// Fields without a row are absent; the call site treats them as
/// editable.
pub async fn field_permissions<R: FieldPermissionRepository>(
    repo: &R,
    target: EntityRef,
    role: Role,
) -> GreetnetResult<HashMap<String, bool>> {
    let rows = repo.list_for(target, role).await?;
    Ok(rows
        .into_iter()
        .map(|row| (row.field_name, row.is_editable))
        .collect())
}

/// Apply a submitted set of toggles for one role.
///
/// Every field in `editable_fields` gets a row; a field absent from
/// `toggles` is stored as not-editable. Rows for fields no longer in
/// the editable list are pruned across all roles.
pub async fn update_field_permissions<R: FieldPermissionRepository>(
    repo: &R,
    target: EntityRef,
    toggles: &HashMap<String, bool>,
    editable_fields: &[&str],
    role: Role,
    granted_by: &[Role],
) -> GreetnetResult<()> {
    let keep: Vec<String> = editable_fields.iter().map(|f| f.to_string()).collect();
    repo.delete_stale(target, &keep).await?;

    for field in editable_fields {
        let is_editable = toggles.get(*field).copied().unwrap_or(false);
        repo.upsert(target, field, role, is_editable, granted_by)
            .await?;
    }

    Ok(())
}

/// Fields the caller may not edit on this form.
///
/// Callers holding a granting role bypass stored rows entirely. The
/// short code is disabled on update for everyone.
pub async fn disabled_fields<R: FieldPermissionRepository>(
    repo: &R,
    target: EntityRef,
    role: Role,
    caller_roles: &[Role],
    editable_fields: &[&str],
    is_update: bool,
) -> GreetnetResult<HashSet<String>> {
    let mut disabled = HashSet::new();
    if is_update {
        disabled.insert("code".to_string());
    }

    if can_grant(target, caller_roles) {
        return Ok(disabled);
    }

    let stored = field_permissions(repo, target, role).await?;
    for field in editable_fields {
        if stored.get(*field) == Some(&false) {
            disabled.insert((*field).to_string());
        }
    }

    Ok(disabled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn cluster_admin_fields_are_toggleable() {
        let cluster = EntityRef::Cluster(Uuid::nil());
        let fields = editable_fields(cluster, Role::Admin);
        assert!(fields.contains(&"name"));
        assert!(fields.contains(&"interest_centers"));
        assert!(!fields.contains(&"code"), "the short code is immutable");
        assert!(editable_fields(cluster, Role::Gestionnaire).is_empty());
    }

    #[test]
    fn cluster_permissions_are_superadmin_only() {
        let cluster = EntityRef::Cluster(Uuid::nil());
        assert!(can_grant(cluster, &[Role::SuperAdmin]));
        assert!(!can_grant(cluster, &[Role::Admin, Role::Manager]));

        let dest = EntityRef::Destination(Uuid::nil());
        assert!(can_grant(dest, &[Role::Admin]));
        assert!(!can_grant(dest, &[Role::Gestionnaire]));
    }
}
