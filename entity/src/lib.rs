use uuid::Uuid;

pub mod authorization_requests;
pub mod authorization_status;
pub mod project_users;
pub mod projects;
pub mod provider;
pub mod refresh_tokens;
pub mod users;

/// A type alias that represents any Entity's internal id field data type.
/// Aliased so that it's easy to change the underlying type if necessary.
pub type Id = Uuid;
