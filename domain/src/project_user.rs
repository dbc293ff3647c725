//! End users of a project.

use crate::error::Error;
use crate::{project_users, Id};
use entity_api::project_user;
use sea_orm::DatabaseConnection;

pub async fn find_by_project(
    db: &DatabaseConnection,
    project_id: Id,
) -> Result<Vec<project_users::Model>, Error> {
    Ok(project_user::find_by_project(db, project_id).await?)
}

pub async fn find_by_id(db: &DatabaseConnection, id: Id) -> Result<project_users::Model, Error> {
    Ok(project_user::find_by_id(db, id).await?)
}
