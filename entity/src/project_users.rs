//! End users of a project, as opposed to the developers in `users`.

use crate::provider::Provider;
use crate::Id;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize, ToSchema)]
#[schema(as = entity::project_users::Model)]
#[sea_orm(schema_name = "identity_platform", table_name = "project_users")]
pub struct Model {
    #[serde(skip_deserializing)]
    #[sea_orm(primary_key)]
    pub id: Id,
    #[schema(value_type = String, format = Uuid)]
    pub project_id: Id,
    /// Stored lowercased; unique per project.
    pub email: String,
    pub name: Option<String>,
    /// Absent for users that only ever signed in through a social provider.
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub provider: Provider,
    pub provider_account_id: Option<String>,
    pub avatar_url: Option<String>,
    pub email_verified: bool,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub last_login_at: Option<DateTimeWithTimeZone>,
    #[serde(skip_deserializing)]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTimeWithTimeZone,
    #[serde(skip_deserializing)]
    #[schema(value_type = String, format = DateTime)]
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
}

impl Related<super::projects::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Projects.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
