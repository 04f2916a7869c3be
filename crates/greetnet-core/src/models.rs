//! Domain models for GreetNet.
//!
//! These are the core types shared across all crates.

pub mod cluster;
pub mod destination;
pub mod email;
pub mod entity;
pub mod greeter;
pub mod permission;
pub mod role;
pub mod tag;
pub mod user;
