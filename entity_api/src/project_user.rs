use super::error::Error;
use chrono::Utc;
use entity::project_users::{ActiveModel, Column, Entity, Model};
use entity::provider::Provider;
use entity::Id;
use log::*;
use sea_orm::{entity::prelude::*, ActiveValue::Set, ConnectionTrait, QueryOrder};

/// Attributes for a new project user. The password, when present, is plain text
/// and is hashed here.
#[derive(Debug, Clone)]
pub struct NewProjectUser {
    pub project_id: Id,
    pub email: String,
    pub name: Option<String>,
    pub password: Option<String>,
    pub provider: Provider,
    pub provider_account_id: Option<String>,
    pub avatar_url: Option<String>,
    pub email_verified: bool,
}

pub async fn create(db: &impl ConnectionTrait, new_user: NewProjectUser) -> Result<Model, Error> {
    debug!(
        "Creating {} project user for project {}",
        new_user.provider, new_user.project_id
    );

    let now = Utc::now();
    let active_model = ActiveModel {
        project_id: Set(new_user.project_id),
        email: Set(new_user.email.to_lowercase()),
        name: Set(new_user.name),
        password: Set(new_user.password.map(|plain| password_auth::generate_hash(plain))),
        provider: Set(new_user.provider),
        provider_account_id: Set(new_user.provider_account_id),
        avatar_url: Set(new_user.avatar_url),
        email_verified: Set(new_user.email_verified),
        last_login_at: Set(None),
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

pub async fn find_by_email(
    db: &impl ConnectionTrait,
    project_id: Id,
    email: &str,
) -> Result<Option<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::ProjectId.eq(project_id))
        .filter(Column::Email.eq(email.to_lowercase()))
        .one(db)
        .await?)
}

pub async fn find_by_provider_account(
    db: &impl ConnectionTrait,
    project_id: Id,
    provider: Provider,
    provider_account_id: &str,
) -> Result<Option<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::ProjectId.eq(project_id))
        .filter(Column::Provider.eq(provider))
        .filter(Column::ProviderAccountId.eq(provider_account_id))
        .one(db)
        .await?)
}

pub async fn find_by_project(db: &impl ConnectionTrait, project_id: Id) -> Result<Vec<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::ProjectId.eq(project_id))
        .order_by_asc(Column::CreatedAt)
        .all(db)
        .await?)
}

/// Attaches a social identity to an existing (email matched) project user.
pub async fn link_provider(
    db: &impl ConnectionTrait,
    existing: Model,
    provider: Provider,
    provider_account_id: String,
    avatar_url: Option<String>,
) -> Result<Model, Error> {
    info!(
        "Linking {provider} account to project user {}",
        existing.id
    );

    let keep_avatar = existing.avatar_url.clone();
    let mut active_model: ActiveModel = existing.into();
    active_model.provider = Set(provider);
    active_model.provider_account_id = Set(Some(provider_account_id));
    active_model.avatar_url = Set(avatar_url.or(keep_avatar));
    active_model.email_verified = Set(true);
    active_model.updated_at = Set(Utc::now().into());

    Ok(active_model.update(db).await?)
}

pub async fn record_login(db: &impl ConnectionTrait, existing: Model) -> Result<Model, Error> {
    let now = Utc::now();
    let mut active_model: ActiveModel = existing.into();
    active_model.last_login_at = Set(Some(now.into()));
    active_model.updated_at = Set(now.into());

    Ok(active_model.update(db).await?)
}

/// Checks `password` against the stored hash. Users without a password (social
/// only accounts) never authenticate this way.
pub fn verify_password(user: &Model, password: &str) -> Result<(), Error> {
    match user.password.as_deref() {
        Some(hash) => {
            password_auth::verify_password(password, hash).map_err(|_| Error::unauthenticated())
        }
        None => Err(Error::unauthenticated()),
    }
}

#[cfg(test)]
#[cfg(feature = "mock")]
mod tests {
    use super::*;
    use crate::error::EntityApiErrorKind;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn project_user(password: Option<&str>) -> Model {
        let now = Utc::now();
        Model {
            id: Id::new_v4(),
            project_id: Id::new_v4(),
            email: "shopper@example.com".to_string(),
            name: None,
            password: password.map(|p| password_auth::generate_hash(p)),
            provider: Provider::Local,
            provider_account_id: None,
            avatar_url: None,
            email_verified: false,
            last_login_at: None,
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    #[test]
    fn verify_password_accepts_the_right_password() {
        let user = project_user(Some("hunter22hunter"));
        assert!(verify_password(&user, "hunter22hunter").is_ok());
    }

    #[test]
    fn verify_password_rejects_wrong_password() {
        let user = project_user(Some("hunter22hunter"));
        assert_eq!(
            verify_password(&user, "nope").unwrap_err().error_kind,
            EntityApiErrorKind::RecordUnauthenticated
        );
    }

    #[test]
    fn verify_password_rejects_social_only_users() {
        let user = project_user(None);
        assert!(verify_password(&user, "").is_err());
    }

    #[tokio::test]
    async fn create_returns_the_inserted_user() -> Result<(), Error> {
        let user = project_user(Some("hunter22hunter"));
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[user.clone()]])
            .into_connection();

        let created = create(
            &db,
            NewProjectUser {
                project_id: user.project_id,
                email: "Shopper@Example.com".to_string(),
                name: None,
                password: Some("hunter22hunter".to_string()),
                provider: Provider::Local,
                provider_account_id: None,
                avatar_url: None,
                email_verified: false,
            },
        )
        .await?;

        assert_eq!(created.email, "shopper@example.com");
        Ok(())
    }

    #[tokio::test]
    async fn find_by_email_returns_none_for_unknown_email() -> Result<(), Error> {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results::<Model, Vec<Model>, _>(vec![vec![]])
            .into_connection();

        let found = find_by_email(&db, Id::new_v4(), "ghost@example.com").await?;

        assert!(found.is_none());
        Ok(())
    }
}
