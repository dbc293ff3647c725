//! Developer accounts that sign in to the dashboard.

pub use entity_api::user::{AuthSession, Backend, Credentials};
