//! Cluster save orchestration, including the per-cluster Admin field
//! restrictions.

use std::collections::HashMap;

use greetnet_core::error::{GreetnetError, GreetnetResult, ValidationErrors};
use greetnet_core::models::cluster::{Cluster, CreateCluster, UpdateCluster};
use greetnet_core::models::entity::EntityRef;
use greetnet_core::models::role::{ADMIN_CLUSTER_FIELDS, Role};
use greetnet_core::models::tag::TagKind;
use greetnet_core::repository::{
    ClusterRepository, DestinationRepository, FieldPermissionRepository,
    RoleMembershipRepository, TagRepository, UserRepository,
};
use greetnet_core::roles::{RoleHolders, compute_role_changes};
use uuid::Uuid;

use crate::effects::{Effect, EffectQueue};
use crate::permissions::{can_grant, disabled_fields, editable_fields, granting_roles,
    update_field_permissions};
use crate::roles::{RoleScope, apply_role_changes, discard_unadopted};
use crate::tags::{TagListPlan, sync_owner_tags};
use crate::validation;

/// The five tag lists of the cluster form, already parsed.
#[derive(Debug, Clone, Default)]
pub struct ClusterTagLists {
    pub experiences: Vec<String>,
    pub interest_centers: Vec<String>,
    pub no_reply_greeter: Vec<String>,
    pub no_reply_visitor: Vec<String>,
    pub notoriety: Vec<String>,
}

impl ClusterTagLists {
    fn plan(&self) -> Vec<TagListPlan> {
        vec![
            TagListPlan {
                field: "experiences",
                kind: TagKind::Experience,
                submitted: self.experiences.clone(),
            },
            TagListPlan {
                field: "interest_centers",
                kind: TagKind::InterestCenter,
                submitted: self.interest_centers.clone(),
            },
            TagListPlan {
                field: "no_reply_greeter",
                kind: TagKind::NoReplyGreeter,
                submitted: self.no_reply_greeter.clone(),
            },
            TagListPlan {
                field: "no_reply_visitor",
                kind: TagKind::NoReplyVisitor,
                submitted: self.no_reply_visitor.clone(),
            },
            TagListPlan {
                field: "notoriety",
                kind: TagKind::Notoriety,
                submitted: self.notoriety.clone(),
            },
        ]
    }

    fn validate(&self, errors: &mut ValidationErrors) {
        use validation::{CLUSTER_LIST_MAX, CLUSTER_LIST_MIN, NO_REPLY_LIST_MIN, validate_tag_list};

        validate_tag_list(
            errors,
            "experiences",
            &self.experiences,
            CLUSTER_LIST_MIN,
            CLUSTER_LIST_MAX,
        );
        validate_tag_list(
            errors,
            "interest_centers",
            &self.interest_centers,
            CLUSTER_LIST_MIN,
            CLUSTER_LIST_MAX,
        );
        validate_tag_list(
            errors,
            "no_reply_greeter",
            &self.no_reply_greeter,
            NO_REPLY_LIST_MIN,
            CLUSTER_LIST_MAX,
        );
        validate_tag_list(
            errors,
            "no_reply_visitor",
            &self.no_reply_visitor,
            NO_REPLY_LIST_MIN,
            CLUSTER_LIST_MAX,
        );
        validate_tag_list(
            errors,
            "notoriety",
            &self.notoriety,
            CLUSTER_LIST_MIN,
            CLUSTER_LIST_MAX,
        );
    }
}

/// Result of a successful cluster save: the stored entity and the
/// post-commit effects for the caller to flush.
#[derive(Debug)]
pub struct ClusterSaveOutcome {
    pub cluster: Cluster,
    pub effects: Vec<Effect>,
}

/// Cluster orchestration.
///
/// Generic over repository implementations so that the service layer
/// has no dependency on the database crate.
pub struct ClusterService<C, D, U, M, T, P> {
    clusters: C,
    destinations: D,
    users: U,
    memberships: M,
    tags: T,
    permissions: P,
}

impl<C, D, U, M, T, P> ClusterService<C, D, U, M, T, P>
where
    C: ClusterRepository,
    D: DestinationRepository,
    U: UserRepository,
    M: RoleMembershipRepository,
    T: TagRepository,
    P: FieldPermissionRepository,
{
    pub fn new(
        clusters: C,
        destinations: D,
        users: U,
        memberships: M,
        tags: T,
        permissions: P,
    ) -> Self {
        Self {
            clusters,
            destinations,
            users,
            memberships,
            tags,
            permissions,
        }
    }

    /// Create a cluster.
    ///
    /// `pending_user_ids` lists placeholder users created while the
    /// form was filled in; they are discarded if validation fails.
    pub async fn create(
        &self,
        actor_roles: &[Role],
        input: CreateCluster,
        tag_lists: ClusterTagLists,
        permission_toggles: Option<HashMap<String, bool>>,
        pending_user_ids: &[Uuid],
    ) -> GreetnetResult<ClusterSaveOutcome> {
        // 1. Authorize before any mutation.
        if !actor_roles.contains(&Role::SuperAdmin) {
            return Err(GreetnetError::AuthorizationDenied {
                reason: "only a super admin may create clusters".into(),
            });
        }

        // 2. Validate; a failure discards the placeholders.
        let mut errors = ValidationErrors::new();
        validation::validate_short_code(&mut errors, "code", &input.code);
        tag_lists.validate(&mut errors);
        validation::validate_max_participants(
            &mut errors,
            "max_participants",
            input.max_participants,
        );
        if !errors.is_empty() {
            discard_unadopted(&self.users, pending_user_ids).await?;
            return Err(GreetnetError::Invalid(errors));
        }

        let has_description = !input.description.trim().is_empty();
        let new_holders = RoleHolders::cluster(input.admin, input.admin_alt);

        // 3. Persist. A duplicate short code surfaces as a field error.
        let cluster = match self.clusters.create(input).await {
            Ok(c) => c,
            Err(GreetnetError::AlreadyExists { .. }) => {
                discard_unadopted(&self.users, pending_user_ids).await?;
                let mut errors = ValidationErrors::new();
                errors.push("code", "a cluster with this code already exists");
                return Err(GreetnetError::Invalid(errors));
            }
            Err(e) => return Err(e),
        };

        let owner = EntityRef::Cluster(cluster.id);
        let mut effects = EffectQueue::new();

        // 4. Tag sync.
        sync_owner_tags(&self.tags, owner, &tag_lists.plan(), &mut effects).await?;

        // 5. Role sync.
        let changes = compute_role_changes(&RoleHolders::new(), &new_holders);
        let scope = RoleScope::Cluster(cluster.code.clone());
        apply_role_changes(&self.users, &self.memberships, &changes, &scope, &mut effects)
            .await?;

        // 6. Permission toggles, only from a granting caller.
        self.apply_permission_toggles(owner, actor_roles, permission_toggles)
            .await?;

        // 7. Translation fan-out for the prose field.
        if has_description {
            effects.push(Effect::TranslateField {
                entity: owner,
                field: "description".into(),
            });
        }

        Ok(ClusterSaveOutcome {
            cluster,
            effects: effects.drain(),
        })
    }

    /// Update a cluster. The short code never changes; fields a
    /// restricted caller may not edit are dropped before persisting.
    pub async fn update(
        &self,
        actor_roles: &[Role],
        id: Uuid,
        mut input: UpdateCluster,
        mut tag_lists: ClusterTagLists,
        permission_toggles: Option<HashMap<String, bool>>,
        pending_user_ids: &[Uuid],
    ) -> GreetnetResult<ClusterSaveOutcome> {
        // 1. Authorize.
        if !actor_roles.contains(&Role::SuperAdmin) && !actor_roles.contains(&Role::Admin) {
            return Err(GreetnetError::AuthorizationDenied {
                reason: "only an admin may update clusters".into(),
            });
        }

        let existing = self.clusters.get_by_id(id).await?;
        let owner = EntityRef::Cluster(id);

        // 2. Enforce stored field permissions on restricted callers.
        if !can_grant(owner, actor_roles) && actor_roles.contains(&Role::Admin) {
            let disabled = disabled_fields(
                &self.permissions,
                owner,
                Role::Admin,
                actor_roles,
                ADMIN_CLUSTER_FIELDS,
                true,
            )
            .await?;

            if disabled.contains("name") {
                input.name = None;
            }
            if disabled.contains("status") {
                input.status = None;
            }
            if disabled.contains("address") {
                input.address = None;
            }
            if disabled.contains("description") {
                input.description = None;
            }
            if disabled.contains("paypal_url") {
                input.paypal_url = None;
            }
            if disabled.contains("admin") {
                input.admin = None;
            }
            if disabled.contains("admin_alt") {
                input.admin_alt = None;
            }
            if disabled.contains("max_participants") {
                input.max_participants = None;
            }
            if disabled.contains("comm_langs") {
                input.comm_langs = None;
            }
            if disabled.contains("backup_email") {
                input.backup_email = None;
            }
            if disabled.contains("library_url") {
                input.library_url = None;
            }
            if disabled.contains("greeter_library_url") {
                input.greeter_library_url = None;
            }

            // Disabled tag lists keep their current labels instead of
            // the submission.
            if disabled.contains("experiences") {
                tag_lists.experiences = self.owned_labels(owner, TagKind::Experience).await?;
            }
            if disabled.contains("interest_centers") {
                tag_lists.interest_centers =
                    self.owned_labels(owner, TagKind::InterestCenter).await?;
            }
            if disabled.contains("no_reply_greeter") {
                tag_lists.no_reply_greeter =
                    self.owned_labels(owner, TagKind::NoReplyGreeter).await?;
            }
            if disabled.contains("no_reply_visitor") {
                tag_lists.no_reply_visitor =
                    self.owned_labels(owner, TagKind::NoReplyVisitor).await?;
            }
            if disabled.contains("notoriety") {
                tag_lists.notoriety = self.owned_labels(owner, TagKind::Notoriety).await?;
            }
        }

        // 3. Validate against the effective state after the update.
        let admin_after = match input.admin {
            Some(value) => value,
            None => existing.admin,
        };
        let admin_alt_after = match input.admin_alt {
            Some(value) => value,
            None => existing.admin_alt,
        };
        let max_participants_after = input.max_participants.unwrap_or(existing.max_participants);

        let mut errors = ValidationErrors::new();
        tag_lists.validate(&mut errors);
        validation::validate_max_participants(
            &mut errors,
            "max_participants",
            max_participants_after,
        );
        validation::validate_cluster_retains_admin(&mut errors, admin_after);
        if !errors.is_empty() {
            discard_unadopted(&self.users, pending_user_ids).await?;
            return Err(GreetnetError::Invalid(errors));
        }

        let description_changed = input.description.is_some();

        // 4. Persist.
        let cluster = self.clusters.update(id, input).await?;

        let mut effects = EffectQueue::new();

        // 5. Tag sync.
        sync_owner_tags(&self.tags, owner, &tag_lists.plan(), &mut effects).await?;

        // 6. Role sync against the previous snapshot.
        let old_holders = RoleHolders::cluster(existing.admin, existing.admin_alt);
        let new_holders = RoleHolders::cluster(admin_after, admin_alt_after);
        let changes = compute_role_changes(&old_holders, &new_holders);
        let scope = RoleScope::Cluster(cluster.code.clone());
        apply_role_changes(&self.users, &self.memberships, &changes, &scope, &mut effects)
            .await?;

        // 7. Permission toggles, only from a granting caller.
        self.apply_permission_toggles(owner, actor_roles, permission_toggles)
            .await?;

        // 8. Translation fan-out only when the field changed.
        if description_changed {
            effects.push(Effect::TranslateField {
                entity: owner,
                field: "description".into(),
            });
        }

        Ok(ClusterSaveOutcome {
            cluster,
            effects: effects.drain(),
        })
    }

    async fn owned_labels(
        &self,
        owner: EntityRef,
        kind: TagKind,
    ) -> GreetnetResult<Vec<String>> {
        Ok(self
            .tags
            .owned(owner, kind)
            .await?
            .into_iter()
            .map(|t| t.label)
            .collect())
    }

    /// Toggles from callers without a granting role are ignored, not
    /// rejected.
    async fn apply_permission_toggles(
        &self,
        target: EntityRef,
        actor_roles: &[Role],
        toggles: Option<HashMap<String, bool>>,
    ) -> GreetnetResult<()> {
        let Some(toggles) = toggles else {
            return Ok(());
        };
        if !can_grant(target, actor_roles) {
            return Ok(());
        }

        let fields = editable_fields(target, Role::Admin);
        let granted_by: Vec<Role> = actor_roles
            .iter()
            .copied()
            .filter(|r| granting_roles(target).contains(r))
            .collect();

        update_field_permissions(
            &self.permissions,
            target,
            &toggles,
            fields,
            Role::Admin,
            &granted_by,
        )
        .await
    }

    /// Delete a cluster. Refused while destinations still point at it.
    pub async fn delete(&self, actor_roles: &[Role], id: Uuid) -> GreetnetResult<()> {
        if !actor_roles.contains(&Role::SuperAdmin) {
            return Err(GreetnetError::AuthorizationDenied {
                reason: "only a super admin may delete clusters".into(),
            });
        }

        let attached = self.destinations.count_by_cluster(id).await?;
        if attached > 0 {
            let mut errors = ValidationErrors::new();
            errors.push(
                "cluster",
                format!("{attached} destinations still belong to this cluster"),
            );
            return Err(GreetnetError::Invalid(errors));
        }

        // Release the tag lists so orphaned tags are collected.
        let mut effects = EffectQueue::new();
        let empty = ClusterTagLists::default();
        sync_owner_tags(&self.tags, EntityRef::Cluster(id), &empty.plan(), &mut effects).await?;

        self.clusters.delete(id).await
    }

    pub async fn get(&self, id: Uuid) -> GreetnetResult<Cluster> {
        self.clusters.get_by_id(id).await
    }
}
