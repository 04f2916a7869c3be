//! Tag-list synchronizer.
//!
//! Clusters carry five tag lists, destinations one. Saving a form
//! replaces each list's ownership edges wholesale; tags that lose
//! their last owner anywhere in the network are deleted.

use greetnet_core::error::GreetnetResult;
use greetnet_core::models::entity::EntityRef;
use greetnet_core::models::tag::TagKind;
use greetnet_core::repository::TagRepository;
use tracing::debug;
use uuid::Uuid;

use crate::effects::{Effect, EffectQueue};

/// One tag list of a save form: the form field it came from, the kind
/// it maps to, and the parsed labels.
#[derive(Debug, Clone)]
pub struct TagListPlan {
    pub field: &'static str,
    pub kind: TagKind,
    pub submitted: Vec<String>,
}

/// Synchronize every tag list of the plan against the owner's current
/// edges. Newly created tags queue a translation effect; dropped tags
/// nobody else references are deleted.
///
/// Count bounds are validated before this runs; failures here abort
/// the caller's save.
pub async fn sync_owner_tags<R: TagRepository>(
    repo: &R,
    owner: EntityRef,
    plan: &[TagListPlan],
    effects: &mut EffectQueue,
) -> GreetnetResult<()> {
    for list in plan {
        sync_kind(repo, owner, list, effects).await?;
    }
    Ok(())
}

async fn sync_kind<R: TagRepository>(
    repo: &R,
    owner: EntityRef,
    list: &TagListPlan,
    effects: &mut EffectQueue,
) -> GreetnetResult<()> {
    let previous = repo.owned(owner, list.kind).await?;

    // 1. Resolve labels, creating missing tags. Duplicates collapse
    //    through get-or-create.
    let mut ids: Vec<Uuid> = Vec::with_capacity(list.submitted.len());
    for raw in &list.submitted {
        let label = raw.trim();
        if label.is_empty() {
            continue;
        }
        let (tag, created) = repo.get_or_create(list.kind, label).await?;
        if created {
            effects.push(Effect::TranslateTag { tag_id: tag.id });
        }
        if !ids.contains(&tag.id) {
            ids.push(tag.id);
        }
    }

    // 2. Replace the ownership edges with the new set.
    repo.set_owned(owner, list.kind, &ids).await?;

    // 3. Orphan collection: dropped tags with no owner left anywhere
    //    are deleted.
    for old in previous {
        if ids.contains(&old.id) {
            continue;
        }
        if repo.reference_count(old.id).await? == 0 {
            debug!(tag = %old.id, label = %old.label, "Deleting orphaned tag");
            repo.delete(old.id).await?;
        }
    }

    Ok(())
}
