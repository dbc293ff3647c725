//! Business rules of the identity platform.
//!
//! Re-exports the entity models so consumers of the `domain` crate (notably
//! `web`) do not need to depend on `entity_api` directly.

// Re-exports from `entity` crate via `entity_api`
pub use entity_api::{
    authorization_requests, authorization_status, project_users, projects, provider,
    refresh_tokens, users, Id,
};

pub mod authorization;
pub mod error;
pub mod jwt;
pub mod project;
pub mod project_user;
pub mod token;
pub mod user;

pub mod gateway;

#[cfg(test)]
mod test_support;
