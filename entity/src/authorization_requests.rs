//! Server side record of a single SDK authorize attempt. Its id is the opaque
//! `request_id` handed to the hosted login page and used as the `state`
//! parameter toward social providers.

use crate::authorization_status::AuthorizationStatus;
use crate::provider::Provider;
use crate::Id;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(schema_name = "identity_platform", table_name = "authorization_requests")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Id,
    pub project_id: Id,
    pub redirect_uri: String,
    pub provider: Provider,
    pub code_challenge: String,
    pub code_challenge_method: String,
    pub state: Option<String>,
    /// PKCE verifier for the leg between this service and a social provider.
    #[serde(skip_serializing)]
    pub provider_code_verifier: Option<String>,
    pub project_user_id: Option<Id>,
    /// SHA-256 hex digest of the issued authorization code.
    #[serde(skip_serializing)]
    pub code_hash: Option<String>,
    pub code_expires_at: Option<DateTimeWithTimeZone>,
    pub status: AuthorizationStatus,
    pub expires_at: DateTimeWithTimeZone,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::projects::Entity",
        from = "Column::ProjectId",
        to = "super::projects::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Projects,
    #[sea_orm(
        belongs_to = "super::project_users::Entity",
        from = "Column::ProjectUserId",
        to = "super::project_users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    ProjectUsers,
}

impl Related<super::projects::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Projects.def()
    }
}

impl Related<super::project_users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProjectUsers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
