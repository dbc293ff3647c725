use crate::Id;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(schema_name = "identity_platform", table_name = "refresh_tokens")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Id,
    pub project_id: Id,
    pub project_user_id: Id,
    /// The authorization request whose code redemption started this token's family.
    pub authorization_request_id: Option<Id>,
    /// Every rotation of one refresh token shares the family of its ancestor.
    pub family_id: Id,
    /// SHA-256 hex digest of the opaque token handed to the client.
    #[sea_orm(unique)]
    #[serde(skip_serializing)]
    pub token_hash: String,
    pub expires_at: DateTimeWithTimeZone,
    pub revoked_at: Option<DateTimeWithTimeZone>,
    /// Successor issued when this token was rotated.
    pub replaced_by: Option<Id>,
    pub created_at: DateTimeWithTimeZone,
}

impl Model {
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::project_users::Entity",
        from = "Column::ProjectUserId",
        to = "super::project_users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    ProjectUsers,
}

impl Related<super::project_users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProjectUsers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
