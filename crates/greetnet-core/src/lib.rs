//! GreetNet Core — domain models, repository traits and the role
//! diff engine shared by all crates.

pub mod error;
pub mod models;
pub mod repository;
pub mod roles;
