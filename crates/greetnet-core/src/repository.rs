//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. The service layer is generic
//! over these traits so that orchestration code has no dependency on
//! the database crate.

use std::collections::BTreeMap;

use uuid::Uuid;

use crate::error::GreetnetResult;
use crate::models::{
    cluster::{Cluster, CreateCluster, UpdateCluster},
    destination::{
        CreateDestination, Destination, DestinationData, DestinationFlux, UpdateDestination,
    },
    email::{CreateEmailTemplate, EmailTemplate},
    entity::EntityRef,
    greeter::{CreateGreeter, Greeter, UpdateGreeter},
    permission::FieldPermission,
    role::Role,
    tag::{Tag, TagKind},
    user::{CreateUser, UpdateUser, User},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Clusters & destinations
// ---------------------------------------------------------------------------

pub trait ClusterRepository: Send + Sync {
    /// Create a cluster. The short code is upper-cased before storage.
    fn create(&self, input: CreateCluster) -> impl Future<Output = GreetnetResult<Cluster>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = GreetnetResult<Cluster>> + Send;
    fn get_by_code(&self, code: &str) -> impl Future<Output = GreetnetResult<Cluster>> + Send;
    /// Update a cluster. The short code cannot change.
    fn update(
        &self,
        id: Uuid,
        input: UpdateCluster,
    ) -> impl Future<Output = GreetnetResult<Cluster>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = GreetnetResult<()>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = GreetnetResult<PaginatedResult<Cluster>>> + Send;
}

pub trait DestinationRepository: Send + Sync {
    /// Create a destination. Code fields are upper-cased before storage.
    fn create(
        &self,
        input: CreateDestination,
    ) -> impl Future<Output = GreetnetResult<Destination>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = GreetnetResult<Destination>> + Send;
    fn get_by_code(&self, code: &str) -> impl Future<Output = GreetnetResult<Destination>> + Send;
    /// Update a destination. The short code cannot change.
    fn update(
        &self,
        id: Uuid,
        input: UpdateDestination,
    ) -> impl Future<Output = GreetnetResult<Destination>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = GreetnetResult<()>> + Send;
    fn list_by_cluster(
        &self,
        cluster_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = GreetnetResult<PaginatedResult<Destination>>> + Send;
    /// Number of destinations attached to a cluster (delete protection).
    fn count_by_cluster(&self, cluster_id: Uuid) -> impl Future<Output = GreetnetResult<u64>> + Send;

    fn get_data(
        &self,
        destination_id: Uuid,
    ) -> impl Future<Output = GreetnetResult<Option<DestinationData>>> + Send;
    /// Replace the functional configuration row as a whole.
    fn upsert_data(
        &self,
        data: DestinationData,
    ) -> impl Future<Output = GreetnetResult<DestinationData>> + Send;

    fn get_flux(
        &self,
        destination_id: Uuid,
    ) -> impl Future<Output = GreetnetResult<Option<DestinationFlux>>> + Send;
    fn upsert_flux(
        &self,
        flux: DestinationFlux,
    ) -> impl Future<Output = GreetnetResult<DestinationFlux>> + Send;
}

// ---------------------------------------------------------------------------
// Users, greeters, roles
// ---------------------------------------------------------------------------

pub trait UserRepository: Send + Sync {
    fn create(&self, input: CreateUser) -> impl Future<Output = GreetnetResult<User>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = GreetnetResult<User>> + Send;
    fn get_by_email(&self, email: &str) -> impl Future<Output = GreetnetResult<User>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateUser,
    ) -> impl Future<Output = GreetnetResult<User>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = GreetnetResult<()>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = GreetnetResult<PaginatedResult<User>>> + Send;
    fn list_by_cluster_code(
        &self,
        cluster_code: &str,
    ) -> impl Future<Output = GreetnetResult<Vec<User>>> + Send;
    fn list_by_dest_code(
        &self,
        dest_code: &str,
    ) -> impl Future<Output = GreetnetResult<Vec<User>>> + Send;

    /// Atomically claim a pending placeholder: flips `is_active` from
    /// false to true in one conditional statement. Fails with
    /// `AlreadyExists` when the row was already adopted.
    fn adopt_pending(&self, id: Uuid) -> impl Future<Output = GreetnetResult<User>> + Send;

    /// Delete placeholder rows that were never assigned anywhere.
    /// Only touches rows that are still inactive with no cluster
    /// pointer; returns the number deleted.
    fn delete_unadopted(&self, ids: &[Uuid]) -> impl Future<Output = GreetnetResult<u64>> + Send;
}

pub trait GreeterRepository: Send + Sync {
    fn create(&self, input: CreateGreeter) -> impl Future<Output = GreetnetResult<Greeter>> + Send;
    fn get_by_user(&self, user_id: Uuid) -> impl Future<Output = GreetnetResult<Greeter>> + Send;
    fn update(
        &self,
        user_id: Uuid,
        input: UpdateGreeter,
    ) -> impl Future<Output = GreetnetResult<Greeter>> + Send;
    fn delete(&self, user_id: Uuid) -> impl Future<Output = GreetnetResult<()>> + Send;
}

pub trait RoleMembershipRepository: Send + Sync {
    /// Add a (user, role) membership. Idempotent.
    fn add(&self, user_id: Uuid, role: Role) -> impl Future<Output = GreetnetResult<()>> + Send;
    fn remove(&self, user_id: Uuid, role: Role)
    -> impl Future<Output = GreetnetResult<()>> + Send;
    fn roles_of(&self, user_id: Uuid) -> impl Future<Output = GreetnetResult<Vec<Role>>> + Send;
}

// ---------------------------------------------------------------------------
// Tags
// ---------------------------------------------------------------------------

pub trait TagRepository: Send + Sync {
    /// Look up a tag by (kind, label), creating it when missing.
    /// The boolean is `true` when the row was created by this call.
    fn get_or_create(
        &self,
        kind: TagKind,
        label: &str,
    ) -> impl Future<Output = GreetnetResult<(Tag, bool)>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = GreetnetResult<Tag>> + Send;
    /// Tags currently owned by the entity for the given kind.
    fn owned(
        &self,
        owner: EntityRef,
        kind: TagKind,
    ) -> impl Future<Output = GreetnetResult<Vec<Tag>>> + Send;
    /// Replace the entity's ownership edges for a kind with exactly
    /// the given tag ids.
    fn set_owned(
        &self,
        owner: EntityRef,
        kind: TagKind,
        tag_ids: &[Uuid],
    ) -> impl Future<Output = GreetnetResult<()>> + Send;
    /// Number of entities owning the tag, across all kinds.
    fn reference_count(&self, tag_id: Uuid) -> impl Future<Output = GreetnetResult<u64>> + Send;
    fn delete(&self, tag_id: Uuid) -> impl Future<Output = GreetnetResult<()>> + Send;
    fn set_translations(
        &self,
        tag_id: Uuid,
        translations: BTreeMap<String, String>,
    ) -> impl Future<Output = GreetnetResult<()>> + Send;
}

// ---------------------------------------------------------------------------
// Field permissions
// ---------------------------------------------------------------------------

pub trait FieldPermissionRepository: Send + Sync {
    /// All stored rows for (target, role).
    fn list_for(
        &self,
        target: EntityRef,
        role: Role,
    ) -> impl Future<Output = GreetnetResult<Vec<FieldPermission>>> + Send;

    /// Create or update the row keyed by (target, field, role).
    /// `granted_by` entries are merged idempotently.
    fn upsert(
        &self,
        target: EntityRef,
        field_name: &str,
        target_role: Role,
        is_editable: bool,
        granted_by: &[Role],
    ) -> impl Future<Output = GreetnetResult<FieldPermission>> + Send;

    /// Delete every row of the target whose field name is not in
    /// `keep_fields`; returns the number deleted.
    fn delete_stale(
        &self,
        target: EntityRef,
        keep_fields: &[String],
    ) -> impl Future<Output = GreetnetResult<u64>> + Send;
}

// ---------------------------------------------------------------------------
// Email templates & translations
// ---------------------------------------------------------------------------

pub trait EmailTemplateRepository: Send + Sync {
    fn create(
        &self,
        input: CreateEmailTemplate,
    ) -> impl Future<Output = GreetnetResult<EmailTemplate>> + Send;
    /// Resolve the template for a code in a recipient's language.
    fn get(
        &self,
        code: &str,
        lang: &str,
    ) -> impl Future<Output = GreetnetResult<EmailTemplate>> + Send;
    fn list(&self) -> impl Future<Output = GreetnetResult<Vec<EmailTemplate>>> + Send;
}

/// Access to translatable text fields and their shadow slots, keyed by
/// entity reference and field name.
pub trait TranslationRepository: Send + Sync {
    /// Current source text of the field, `None` when the row or the
    /// value is missing.
    fn load_field(
        &self,
        entity: EntityRef,
        field: &str,
    ) -> impl Future<Output = GreetnetResult<Option<String>>> + Send;

    /// Overwrite the field's shadow slots in one write.
    fn store_field_translations(
        &self,
        entity: EntityRef,
        field: &str,
        translations: BTreeMap<String, String>,
    ) -> impl Future<Output = GreetnetResult<()>> + Send;
}
