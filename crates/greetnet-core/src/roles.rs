//! Role-change computation.
//!
//! The caller snapshots the role-holder fields of a cluster or
//! destination before and after an edit and asks for the difference.
//! Everything here is pure; applying the change set (memberships,
//! assignment pointers, activation mail) is the service layer's job.

use std::collections::{BTreeMap, BTreeSet};

use uuid::Uuid;

use crate::models::role::{Role, RoleField};

/// The role-holder fields of one object at one point in time.
///
/// Unset fields are simply absent from the map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleHolders {
    holders: BTreeMap<RoleField, Uuid>,
}

impl RoleHolders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a cluster's two admin fields.
    pub fn cluster(admin: Option<Uuid>, admin_alt: Option<Uuid>) -> Self {
        let mut h = Self::new();
        h.set(RoleField::ClusterAdmin, admin);
        h.set(RoleField::ClusterAdminAlt, admin_alt);
        h
    }

    /// Snapshot of a destination's five holder fields.
    pub fn destination(
        manager: Option<Uuid>,
        referent: Option<Uuid>,
        matcher: Option<Uuid>,
        matcher_alt: Option<Uuid>,
        financier: Option<Uuid>,
    ) -> Self {
        let mut h = Self::new();
        h.set(RoleField::DestManager, manager);
        h.set(RoleField::DestReferent, referent);
        h.set(RoleField::DestMatcher, matcher);
        h.set(RoleField::DestMatcherAlt, matcher_alt);
        h.set(RoleField::DestFinancier, financier);
        h
    }

    pub fn set(&mut self, field: RoleField, user: Option<Uuid>) {
        match user {
            Some(id) => {
                self.holders.insert(field, id);
            }
            None => {
                self.holders.remove(&field);
            }
        }
    }

    pub fn get(&self, field: RoleField) -> Option<Uuid> {
        self.holders.get(&field).copied()
    }

    /// Users holding any field that maps to the given role.
    fn users_with_role(&self, role: Role) -> BTreeSet<Uuid> {
        self.holders
            .iter()
            .filter(|(field, _)| field.role() == role)
            .map(|(_, user)| *user)
            .collect()
    }

    /// Every user holding at least one field.
    fn all_users(&self) -> BTreeSet<Uuid> {
        self.holders.values().copied().collect()
    }

    fn roles(&self) -> BTreeSet<Role> {
        self.holders.keys().map(RoleField::role).collect()
    }
}

/// The outcome of diffing two [`RoleHolders`] snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleChangeSet {
    /// Memberships to create.
    pub added: Vec<(Uuid, Role)>,
    /// Memberships to remove.
    pub removed: Vec<(Uuid, Role)>,
    /// Users present before and absent after: deactivate and clear
    /// their assignment pointers.
    pub departed: Vec<Uuid>,
    /// Users absent before and present after: adopt if pending, then
    /// send the activation mail.
    pub arrived: Vec<Uuid>,
}

impl RoleChangeSet {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && self.departed.is_empty()
            && self.arrived.is_empty()
    }
}

/// Compute the membership and presence changes between two snapshots.
///
/// Set-difference semantics per role: a user moving between two fields
/// that grant the same role produces no churn, and a user keeping any
/// field mapped to a role stays in that role.
pub fn compute_role_changes(old: &RoleHolders, new: &RoleHolders) -> RoleChangeSet {
    let mut change_set = RoleChangeSet::default();

    let mut roles: BTreeSet<Role> = old.roles();
    roles.extend(new.roles());

    for role in roles {
        let old_users = old.users_with_role(role);
        let new_users = new.users_with_role(role);

        for user in old_users.difference(&new_users) {
            change_set.removed.push((*user, role));
        }
        for user in new_users.difference(&old_users) {
            change_set.added.push((*user, role));
        }
    }

    let old_all = old.all_users();
    let new_all = new.all_users();
    change_set.departed = old_all.difference(&new_all).copied().collect();
    change_set.arrived = new_all.difference(&old_all).copied().collect();

    change_set
}
