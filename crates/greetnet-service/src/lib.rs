//! Orchestration layer for the greeter-network admin backend.
//!
//! Services in this crate are generic over the repository traits of
//! `greetnet-core`. Each save method returns the stored entity together
//! with the post-commit [`effects::Effect`] list; the caller flushes
//! that list through [`jobs::spawn_all`] once the save has committed.

pub mod cluster;
pub mod config;
pub mod destination;
pub mod effects;
pub mod email;
pub mod greeter;
pub mod jobs;
pub mod permissions;
pub mod roles;
pub mod tags;
pub mod translate;
pub mod user;
pub mod validation;
