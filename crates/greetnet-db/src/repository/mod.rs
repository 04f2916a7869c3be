//! SurrealDB repository implementations.

mod cluster;
mod destination;
mod email_template;
mod field_permission;
mod greeter;
mod role_member;
mod tag;
mod translation;
mod user;

pub use cluster::SurrealClusterRepository;
pub use destination::SurrealDestinationRepository;
pub use email_template::SurrealEmailTemplateRepository;
pub use field_permission::SurrealFieldPermissionRepository;
pub use greeter::SurrealGreeterRepository;
pub use role_member::SurrealRoleMembershipRepository;
pub use tag::SurrealTagRepository;
pub use translation::SurrealTranslationRepository;
pub use user::SurrealUserRepository;
