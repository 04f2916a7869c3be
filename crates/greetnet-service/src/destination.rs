//! Destination save orchestration, including the one-to-one
//! configuration blocks and the Gestionnaire field restrictions.

use std::collections::HashMap;

use greetnet_core::error::{GreetnetError, GreetnetResult, ValidationErrors};
use greetnet_core::models::destination::{
    CreateDestination, Destination, DestinationData, DestinationFlux, UpdateDestination,
};
use greetnet_core::models::entity::EntityRef;
use greetnet_core::models::role::{MATCHER_DESTINATION_FIELDS, Role};
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

/// Roles allowed to touch destination forms at all.
const DESTINATION_EDITOR_ROLES: &[Role] = &[
    Role::SuperAdmin,
    Role::Admin,
    Role::Manager,
    Role::Referent,
    Role::Gestionnaire,
    Role::Financier,
];

/// Result of a successful destination save.
#[derive(Debug)]
pub struct DestinationSaveOutcome {
    pub destination: Destination,
    pub effects: Vec<Effect>,
}

/// Result of saving a configuration block.
#[derive(Debug)]
pub struct DataSaveOutcome {
    pub data: DestinationData,
    pub effects: Vec<Effect>,
}

/// Destination orchestration.
pub struct DestinationService<D, C, U, M, T, P> {
    destinations: D,
    clusters: C,
    users: U,
    memberships: M,
    tags: T,
    permissions: P,
}

impl<D, C, U, M, T, P> DestinationService<D, C, U, M, T, P>
where
    D: DestinationRepository,
    C: ClusterRepository,
    U: UserRepository,
    M: RoleMembershipRepository,
    T: TagRepository,
    P: FieldPermissionRepository,
{
    pub fn new(
        destinations: D,
        clusters: C,
        users: U,
        memberships: M,
        tags: T,
        permissions: P,
    ) -> Self {
        Self {
            destinations,
            clusters,
            users,
            memberships,
            tags,
            permissions,
        }
    }

    fn authorize(actor_roles: &[Role]) -> GreetnetResult<()> {
        if !actor_roles
            .iter()
            .any(|r| DESTINATION_EDITOR_ROLES.contains(r))
        {
            return Err(GreetnetError::AuthorizationDenied {
                reason: "no destination role held".into(),
            });
        }
        Ok(())
    }

    async fn validate_bounds(
        &self,
        errors: &mut ValidationErrors,
        cluster_id: Uuid,
        min_places: u32,
        max_places: u32,
        min_interests: u32,
        max_interests: u32,
        places: &[String],
    ) -> GreetnetResult<()> {
        validation::validate_tag_list(
            errors,
            "places",
            places,
            validation::PLACES_MIN,
            validation::PLACES_MAX,
        );
        validation::validate_bounds_pair(errors, "max_places", min_places, max_places);
        validation::validate_bounds_pair(errors, "max_interests", min_interests, max_interests);

        let cluster_interests = self
            .tags
            .owned(EntityRef::Cluster(cluster_id), TagKind::InterestCenter)
            .await?;
        validation::validate_destination_caps(
            errors,
            max_interests,
            cluster_interests.len(),
            max_places,
            places.iter().filter(|p| !p.trim().is_empty()).count(),
        );
        Ok(())
    }

    /// Create a destination under an existing cluster.
    pub async fn create(
        &self,
        actor_roles: &[Role],
        input: CreateDestination,
        places: Vec<String>,
        permission_toggles: Option<HashMap<String, bool>>,
        pending_user_ids: &[Uuid],
    ) -> GreetnetResult<DestinationSaveOutcome> {
        // 1. Authorize before any mutation; creation needs an admin.
        if !can_grant(EntityRef::Destination(Uuid::nil()), actor_roles) {
            return Err(GreetnetError::AuthorizationDenied {
                reason: "only an admin may create destinations".into(),
            });
        }

        // The owning cluster must exist.
        let cluster = self.clusters.get_by_id(input.cluster_id).await?;

        // 2. Validate; a failure discards the placeholders.
        let mut errors = ValidationErrors::new();
        validation::validate_short_code(&mut errors, "code", &input.code);
        self.validate_bounds(
            &mut errors,
            cluster.id,
            input.min_places,
            input.max_places,
            input.min_interests,
            input.max_interests,
            &places,
        )
        .await?;
        if !errors.is_empty() {
            discard_unadopted(&self.users, pending_user_ids).await?;
            return Err(GreetnetError::Invalid(errors));
        }

        let has_description = !input.description.trim().is_empty();
        let has_notice = input
            .disability_notice
            .as_deref()
            .is_some_and(|n| !n.trim().is_empty());
        let new_holders = RoleHolders::destination(
            input.manager,
            input.referent,
            input.matcher,
            input.matcher_alt,
            input.financier,
        );

        // 3. Persist. A duplicate short code surfaces as a field error.
        let destination = match self.destinations.create(input).await {
            Ok(d) => d,
            Err(GreetnetError::AlreadyExists { .. }) => {
                discard_unadopted(&self.users, pending_user_ids).await?;
                let mut errors = ValidationErrors::new();
                errors.push("code", "a destination with this code already exists");
                return Err(GreetnetError::Invalid(errors));
            }
            Err(e) => return Err(e),
        };

        let target = EntityRef::Destination(destination.id);
        let mut effects = EffectQueue::new();

        // 4. Tag sync (the places list).
        let plan = [TagListPlan {
            field: "places",
            kind: TagKind::Place,
            submitted: places,
        }];
        sync_owner_tags(&self.tags, target, &plan, &mut effects).await?;

        // 5. Role sync.
        let changes = compute_role_changes(&RoleHolders::new(), &new_holders);
        let scope = RoleScope::Destination(destination.code.clone());
        apply_role_changes(&self.users, &self.memberships, &changes, &scope, &mut effects)
            .await?;

        // 6. Permission toggles, only from a granting caller.
        self.apply_permission_toggles(target, actor_roles, permission_toggles)
            .await?;

        // 7. Translation fan-out for the prose fields.
        if has_description {
            effects.push(Effect::TranslateField {
                entity: target,
                field: "description".into(),
            });
        }
        if has_notice {
            effects.push(Effect::TranslateField {
                entity: target,
                field: "disability_notice".into(),
            });
        }

        Ok(DestinationSaveOutcome {
            destination,
            effects: effects.drain(),
        })
    }

    /// Update a destination. The short code never changes; fields a
    /// restricted caller may not edit are dropped before persisting.
    pub async fn update(
        &self,
        actor_roles: &[Role],
        id: Uuid,
        mut input: UpdateDestination,
        mut places: Vec<String>,
        permission_toggles: Option<HashMap<String, bool>>,
        pending_user_ids: &[Uuid],
    ) -> GreetnetResult<DestinationSaveOutcome> {
        // 1. Authorize.
        Self::authorize(actor_roles)?;

        let existing = self.destinations.get_by_id(id).await?;
        let target = EntityRef::Destination(id);

        // 2. Enforce stored field permissions on restricted callers.
        if !can_grant(target, actor_roles) && actor_roles.contains(&Role::Gestionnaire) {
            let disabled = disabled_fields(
                &self.permissions,
                target,
                Role::Gestionnaire,
                actor_roles,
                MATCHER_DESTINATION_FIELDS,
                true,
            )
            .await?;

            if disabled.contains("min_places") {
                input.min_places = None;
            }
            if disabled.contains("max_places") {
                input.max_places = None;
            }
            if disabled.contains("min_interests") {
                input.min_interests = None;
            }
            if disabled.contains("max_interests") {
                input.max_interests = None;
            }
            if disabled.contains("require_stay_dates") {
                input.require_stay_dates = None;
            }
            if disabled.contains("dispersion_days") {
                input.dispersion_days = None;
            }
            if disabled.contains("places") {
                // Keep the current list instead of the submission.
                places = self
                    .tags
                    .owned(target, TagKind::Place)
                    .await?
                    .into_iter()
                    .map(|t| t.label)
                    .collect();
            }
        }

        // 3. Validate against the effective state after the update.
        let mut errors = ValidationErrors::new();
        self.validate_bounds(
            &mut errors,
            existing.cluster_id,
            input.min_places.unwrap_or(existing.min_places),
            input.max_places.unwrap_or(existing.max_places),
            input.min_interests.unwrap_or(existing.min_interests),
            input.max_interests.unwrap_or(existing.max_interests),
            &places,
        )
        .await?;
        if !errors.is_empty() {
            discard_unadopted(&self.users, pending_user_ids).await?;
            return Err(GreetnetError::Invalid(errors));
        }

        let description_changed = input.description.is_some();
        let notice_changed = input.disability_notice.is_some();

        let holder_after = |update: &Option<Option<Uuid>>, current: Option<Uuid>| match update {
            Some(value) => *value,
            None => current,
        };
        let new_holders = RoleHolders::destination(
            holder_after(&input.manager, existing.manager),
            holder_after(&input.referent, existing.referent),
            holder_after(&input.matcher, existing.matcher),
            holder_after(&input.matcher_alt, existing.matcher_alt),
            holder_after(&input.financier, existing.financier),
        );

        // 4. Persist.
        let destination = self.destinations.update(id, input).await?;

        let mut effects = EffectQueue::new();

        // 5. Tag sync.
        let plan = [TagListPlan {
            field: "places",
            kind: TagKind::Place,
            submitted: places,
        }];
        sync_owner_tags(&self.tags, target, &plan, &mut effects).await?;

        // 6. Role sync against the previous snapshot.
        let old_holders = RoleHolders::destination(
            existing.manager,
            existing.referent,
            existing.matcher,
            existing.matcher_alt,
            existing.financier,
        );
        let changes = compute_role_changes(&old_holders, &new_holders);
        let scope = RoleScope::Destination(destination.code.clone());
        apply_role_changes(&self.users, &self.memberships, &changes, &scope, &mut effects)
            .await?;

        // 7. Permission toggles, only from a granting caller.
        self.apply_permission_toggles(target, actor_roles, permission_toggles)
            .await?;

        // 8. Translation fan-out only for changed fields.
        if description_changed {
            effects.push(Effect::TranslateField {
                entity: target,
                field: "description".into(),
            });
        }
        if notice_changed {
            effects.push(Effect::TranslateField {
                entity: target,
                field: "disability_notice".into(),
            });
        }

        Ok(DestinationSaveOutcome {
            destination,
            effects: effects.drain(),
        })
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

        let fields = editable_fields(target, Role::Gestionnaire);
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
            Role::Gestionnaire,
            &granted_by,
        )
        .await
    }

    /// Replace the functional configuration block.
    pub async fn save_data(
        &self,
        actor_roles: &[Role],
        data: DestinationData,
    ) -> GreetnetResult<DataSaveOutcome> {
        Self::authorize(actor_roles)?;

        // The destination must exist.
        self.destinations.get_by_id(data.destination_id).await?;

        let mut errors = ValidationErrors::new();
        validation::validate_destination_data(&mut errors, &data);
        errors.into_result()?;

        let previous = self.destinations.get_data(data.destination_id).await?;
        let stored = self.destinations.upsert_data(data).await?;

        // Queue fan-out for translatable fields whose value changed.
        let target = EntityRef::Destination(stored.destination_id);
        let mut effects = EffectQueue::new();
        let prev = previous.unwrap_or_else(|| DestinationData {
            destination_id: stored.destination_id,
            ..Default::default()
        });

        let changed: [(&str, &Option<String>, &Option<String>); 6] = [
            ("donation_text", &prev.donation_text, &stored.donation_text),
            (
                "visitor_comment_prompt",
                &prev.visitor_comment_prompt,
                &stored.visitor_comment_prompt,
            ),
            ("closure_text", &prev.closure_text, &stored.closure_text),
            (
                "signature_tagline",
                &prev.signature_tagline,
                &stored.signature_tagline,
            ),
            ("footer_title", &prev.footer_title, &stored.footer_title),
            ("footer_text", &prev.footer_text, &stored.footer_text),
        ];
        for (field, before, after) in changed {
            if before != after && after.as_deref().is_some_and(|v| !v.trim().is_empty()) {
                effects.push(Effect::TranslateField {
                    entity: target,
                    field: field.into(),
                });
            }
        }

        Ok(DataSaveOutcome {
            data: stored,
            effects: effects.drain(),
        })
    }

    /// Replace the booking-lifecycle timings.
    pub async fn save_flux(
        &self,
        actor_roles: &[Role],
        flux: DestinationFlux,
    ) -> GreetnetResult<DestinationFlux> {
        Self::authorize(actor_roles)?;
        self.destinations.get_by_id(flux.destination_id).await?;
        self.destinations.upsert_flux(flux).await
    }

    pub async fn delete(&self, actor_roles: &[Role], id: Uuid) -> GreetnetResult<()> {
        if !can_grant(EntityRef::Destination(id), actor_roles) {
            return Err(GreetnetError::AuthorizationDenied {
                reason: "only an admin may delete destinations".into(),
            });
        }

        // Release the places list so orphaned tags are collected.
        let target = EntityRef::Destination(id);
        let mut effects = EffectQueue::new();
        let plan = [TagListPlan {
            field: "places",
            kind: TagKind::Place,
            submitted: Vec::new(),
        }];
        sync_owner_tags(&self.tags, target, &plan, &mut effects).await?;

        self.destinations.delete(id).await
    }

    pub async fn get(&self, id: Uuid) -> GreetnetResult<Destination> {
        self.destinations.get_by_id(id).await
    }
}
