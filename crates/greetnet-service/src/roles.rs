//! Role-assignment synchronizer, the I/O half.
//!
//! The pure diff lives in `greetnet_core::roles`; this module executes
//! a computed [`RoleChangeSet`] through the repositories and queues the
//! password emails for first-time holders.

use std::collections::BTreeMap;

use greetnet_core::error::GreetnetResult;
use greetnet_core::models::email::codes;
use greetnet_core::models::role::Role;
use greetnet_core::models::user::UpdateUser;
use greetnet_core::repository::{RoleMembershipRepository, UserRepository};
use greetnet_core::roles::RoleChangeSet;
use tracing::{info, warn};
use uuid::Uuid;

use crate::effects::{Effect, EffectQueue};

/// The object whose role holders are being synchronized, carrying its
/// short code for the account pointers.
#[derive(Debug, Clone)]
pub enum RoleScope {
    Cluster(String),
    Destination(String),
}

impl RoleScope {
    fn pointer_update(&self, set: bool) -> UpdateUser {
        let value = |code: &str| if set { Some(Some(code.to_string())) } else { Some(None) };
        match self {
            RoleScope::Cluster(code) => UpdateUser {
                cluster_code: value(code),
                ..Default::default()
            },
            RoleScope::Destination(code) => UpdateUser {
                dest_code: value(code),
                ..Default::default()
            },
        }
    }
}

/// Execute a change set: adopt and assign arrived holders, churn the
/// remaining memberships, unassign departed holders.
///
/// Each arrived holder is handled together with their membership
/// writes. A failure mid-holder unwinds that holder back to a pending
/// state before the error propagates, so a retried save still sees
/// the user as arrived.
pub async fn apply_role_changes<U, M>(
    users: &U,
    memberships: &M,
    changes: &RoleChangeSet,
    scope: &RoleScope,
    effects: &mut EffectQueue,
) -> GreetnetResult<()>
where
    U: UserRepository,
    M: RoleMembershipRepository,
{
    for &user_id in &changes.arrived {
        adopt_and_assign(users, memberships, changes, scope, user_id, effects).await?;
    }

    for (user_id, role) in &changes.added {
        if changes.arrived.contains(user_id) {
            // Handled above, together with the adoption.
            continue;
        }
        memberships.add(*user_id, *role).await?;
    }
    for (user_id, role) in &changes.removed {
        memberships.remove(*user_id, *role).await?;
    }

    // Users holding no field on the object anymore lose the pointer
    // and are deactivated.
    for &user_id in &changes.departed {
        let mut update = scope.pointer_update(false);
        update.is_active = Some(false);
        users.update(user_id, update).await?;
        info!(%user_id, "Unassigned departed role holder");
    }

    Ok(())
}

/// Claim one arrived holder, point their account at the object and
/// write their memberships as a unit. The set-password mail is only
/// queued once all the writes went through.
async fn adopt_and_assign<U, M>(
    users: &U,
    memberships: &M,
    changes: &RoleChangeSet,
    scope: &RoleScope,
    user_id: Uuid,
    effects: &mut EffectQueue,
) -> GreetnetResult<()>
where
    U: UserRepository,
    M: RoleMembershipRepository,
{
    let user = users.get_by_id(user_id).await?;
    let newly_adopted = !user.is_active;

    if newly_adopted {
        // Atomic conditional flip; a concurrent save adopting the
        // same placeholder fails here and aborts.
        users.adopt_pending(user_id).await?;
    }

    if let Err(e) = users.update(user_id, scope.pointer_update(true)).await {
        unwind_arrival(users, scope, user_id, newly_adopted).await;
        return Err(e);
    }

    let roles: Vec<Role> = changes
        .added
        .iter()
        .filter(|(id, _)| *id == user_id)
        .map(|(_, role)| *role)
        .collect();
    let mut applied = Vec::new();
    for role in roles {
        if let Err(e) = memberships.add(user_id, role).await {
            for &done in &applied {
                if let Err(undo) = memberships.remove(user_id, done).await {
                    warn!(%user_id, role = %done, error = %undo, "Failed to unwind role membership");
                }
            }
            unwind_arrival(users, scope, user_id, newly_adopted).await;
            return Err(e);
        }
        applied.push(role);
    }

    if newly_adopted {
        effects.push(Effect::SendTemplateEmail {
            code: codes::SET_PASSWORD.to_string(),
            user_id,
            variables: BTreeMap::new(),
        });
        info!(%user_id, "Adopted pending user");
    }

    Ok(())
}

/// Best-effort rollback of a half-assigned arrival: clear the pointer
/// and, when the placeholder was adopted by this very save, flip it
/// back to pending so a retried save can claim it again.
async fn unwind_arrival<U: UserRepository>(
    users: &U,
    scope: &RoleScope,
    user_id: Uuid,
    newly_adopted: bool,
) {
    let mut update = scope.pointer_update(false);
    if newly_adopted {
        update.is_active = Some(false);
    }
    if let Err(e) = users.update(user_id, update).await {
        warn!(%user_id, error = %e, "Failed to unwind arrived role holder");
    }
}

/// Delete placeholder users created for a save that then failed
/// validation. Only rows never pointed at an object are touched.
pub async fn discard_unadopted<U: UserRepository>(
    users: &U,
    pending_ids: &[Uuid],
) -> GreetnetResult<u64> {
    let deleted = users.delete_unadopted(pending_ids).await?;
    if deleted > 0 {
        info!(deleted, "Discarded unadopted placeholder users");
    }
    Ok(deleted)
}
