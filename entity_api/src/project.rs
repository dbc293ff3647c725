use super::error::Error;
use chrono::Utc;
use entity::projects::{ActiveModel, Column, Entity, Model};
use entity::Id;
use log::*;
use sea_orm::{
    entity::prelude::*,
    ActiveValue::{Set, Unchanged},
    ConnectionTrait, QueryOrder,
};

/// Fields a developer may change on an existing project. `None` leaves the
/// stored value untouched.
#[derive(Debug, Default, Clone)]
pub struct ProjectChanges {
    pub name: Option<String>,
    pub redirect_uris: Option<Vec<String>>,
    pub enabled_providers: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

pub async fn create(
    db: &impl ConnectionTrait,
    owner_id: Id,
    public_key: String,
    project_model: Model,
) -> Result<Model, Error> {
    debug!(
        "New Project \"{}\" to be inserted for owner {owner_id}",
        project_model.name
    );

    let now = Utc::now();
    let active_model = ActiveModel {
        owner_id: Set(owner_id),
        name: Set(project_model.name),
        public_key: Set(public_key),
        redirect_uris: Set(project_model.redirect_uris),
        enabled_providers: Set(project_model.enabled_providers),
        is_active: Set(project_model.is_active),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
        ..Default::default()
    };

    Ok(active_model.insert(db).await?)
}

pub async fn find_by_id(db: &impl ConnectionTrait, id: Id) -> Result<Model, Error> {
    Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(Error::not_found)
}

pub async fn find_by_public_key(
    db: &impl ConnectionTrait,
    public_key: &str,
) -> Result<Model, Error> {
    Entity::find()
        .filter(Column::PublicKey.eq(public_key))
        .one(db)
        .await?
        .ok_or_else(Error::not_found)
}

pub async fn find_by_owner(db: &impl ConnectionTrait, owner_id: Id) -> Result<Vec<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::OwnerId.eq(owner_id))
        .order_by_asc(Column::CreatedAt)
        .all(db)
        .await?)
}

pub async fn update(
    db: &impl ConnectionTrait,
    id: Id,
    changes: ProjectChanges,
) -> Result<Model, Error> {
    let existing = find_by_id(db, id).await?;

    let mut active_model = ActiveModel {
        id: Unchanged(existing.id),
        owner_id: Unchanged(existing.owner_id),
        name: Unchanged(existing.name),
        public_key: Unchanged(existing.public_key),
        redirect_uris: Unchanged(existing.redirect_uris),
        enabled_providers: Unchanged(existing.enabled_providers),
        is_active: Unchanged(existing.is_active),
        created_at: Unchanged(existing.created_at),
        updated_at: Set(Utc::now().into()),
    };

    if let Some(name) = changes.name {
        active_model.name = Set(name);
    }
    if let Some(redirect_uris) = changes.redirect_uris {
        active_model.redirect_uris = Set(redirect_uris);
    }
    if let Some(enabled_providers) = changes.enabled_providers {
        active_model.enabled_providers = Set(enabled_providers);
    }
    if let Some(is_active) = changes.is_active {
        active_model.is_active = Set(is_active);
    }

    Ok(active_model.update(db).await?)
}

/// Replaces the project's public key. Clients still embedding the old key stop
/// working immediately.
pub async fn set_public_key(
    db: &impl ConnectionTrait,
    id: Id,
    public_key: String,
) -> Result<Model, Error> {
    let existing = find_by_id(db, id).await?;
    info!("Rotating public key for project {id}");

    let mut active_model: ActiveModel = existing.into();
    active_model.public_key = Set(public_key);
    active_model.updated_at = Set(Utc::now().into());

    Ok(active_model.update(db).await?)
}

pub async fn delete_by_id(db: &impl ConnectionTrait, id: Id) -> Result<(), Error> {
    let result = Entity::delete_by_id(id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::not_found());
    }
    Ok(())
}

#[cfg(test)]
#[cfg(feature = "mock")]
mod tests {
    use super::*;
    use crate::error::EntityApiErrorKind;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn test_project() -> Model {
        let now = Utc::now();
        Model {
            id: Id::new_v4(),
            owner_id: Id::new_v4(),
            name: "Storefront".to_string(),
            public_key: "pk_test".to_string(),
            redirect_uris: vec!["https://app.example.com/callback".to_string()],
            enabled_providers: vec!["local".to_string(), "google".to_string()],
            is_active: true,
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    #[tokio::test]
    async fn find_by_public_key_returns_the_project() -> Result<(), Error> {
        let project = test_project();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[project.clone()]])
            .into_connection();

        let found = find_by_public_key(&db, "pk_test").await?;

        assert_eq!(found.id, project.id);
        Ok(())
    }

    #[tokio::test]
    async fn find_by_public_key_returns_not_found_for_unknown_key() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results::<Model, Vec<Model>, _>(vec![vec![]])
            .into_connection();

        let result = find_by_public_key(&db, "pk_unknown").await;

        assert_eq!(
            result.unwrap_err().error_kind,
            EntityApiErrorKind::RecordNotFound
        );
    }

    #[tokio::test]
    async fn update_only_changes_requested_fields() -> Result<(), Error> {
        let project = test_project();
        let mut renamed = project.clone();
        renamed.name = "Renamed".to_string();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[project.clone()]])
            .append_query_results([[renamed.clone()]])
            .into_connection();

        let updated = update(
            &db,
            project.id,
            ProjectChanges {
                name: Some("Renamed".to_string()),
                ..Default::default()
            },
        )
        .await?;

        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.redirect_uris, project.redirect_uris);
        Ok(())
    }

    #[tokio::test]
    async fn delete_by_id_reports_missing_project() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        let result = delete_by_id(&db, Id::new_v4()).await;

        assert_eq!(
            result.unwrap_err().error_kind,
            EntityApiErrorKind::RecordNotFound
        );
    }
}
