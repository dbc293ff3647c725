use super::error::Error;
use chrono::{DateTime, Utc};
use entity::authorization_requests::{ActiveModel, Column, Entity, Model};
use entity::authorization_status::AuthorizationStatus;
use entity::provider::Provider;
use entity::Id;
use log::*;
use sea_orm::{entity::prelude::*, ActiveValue::Set, Condition, ConnectionTrait};

#[derive(Debug, Clone)]
pub struct NewAuthorizationRequest {
    pub project_id: Id,
    pub redirect_uri: String,
    pub provider: Provider,
    pub code_challenge: String,
    pub code_challenge_method: String,
    pub state: Option<String>,
    pub provider_code_verifier: Option<String>,
    pub expires_at: DateTime<Utc>,
}

pub async fn create(
    db: &impl ConnectionTrait,
    request: NewAuthorizationRequest,
) -> Result<Model, Error> {
    let now = Utc::now();
    let id = Id::new_v4();
    debug!(
        "Creating authorization request {id} for project {} via {}",
        request.project_id, request.provider
    );

    let active_model = ActiveModel {
        id: Set(id),
        project_id: Set(request.project_id),
        redirect_uri: Set(request.redirect_uri),
        provider: Set(request.provider),
        code_challenge: Set(request.code_challenge),
        code_challenge_method: Set(request.code_challenge_method),
        state: Set(request.state),
        provider_code_verifier: Set(request.provider_code_verifier),
        project_user_id: Set(None),
        code_hash: Set(None),
        code_expires_at: Set(None),
        status: Set(AuthorizationStatus::Pending),
        expires_at: Set(request.expires_at.into()),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };

    Ok(active_model.insert(db).await?)
}

pub async fn find_by_id(db: &impl ConnectionTrait, id: Id) -> Result<Model, Error> {
    Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(Error::not_found)
}

pub async fn find_by_code_hash(
    db: &impl ConnectionTrait,
    code_hash: &str,
) -> Result<Option<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::CodeHash.eq(code_hash))
        .one(db)
        .await?)
}

/// Binds a signed-in project user to a pending request and stores the hash of the
/// authorization code issued for it.
///
/// The update only applies while the request is still `pending`, so two concurrent
/// sign-ins cannot both issue a code. The loser gets `RecordNotUpdated`.
pub async fn authorize(
    db: &impl ConnectionTrait,
    existing: Model,
    project_user_id: Id,
    code_hash: String,
    code_expires_at: DateTime<Utc>,
) -> Result<Model, Error> {
    let id = existing.id;
    let mut active_model: ActiveModel = existing.into();
    active_model.project_user_id = Set(Some(project_user_id));
    active_model.code_hash = Set(Some(code_hash));
    active_model.code_expires_at = Set(Some(code_expires_at.into()));
    active_model.status = Set(AuthorizationStatus::Authorized);
    active_model.updated_at = Set(Utc::now().into());

    let updated = Entity::update(active_model)
        .filter(Column::Status.eq(AuthorizationStatus::Pending))
        .exec(db)
        .await?;

    info!("Authorization request {id} authorized for project user {project_user_id}");
    Ok(updated)
}

/// Flags the request's code as spent. Guarded on `authorized` so a code can be
/// redeemed at most once even under concurrent token requests.
pub async fn mark_redeemed(db: &impl ConnectionTrait, existing: Model) -> Result<Model, Error> {
    let mut active_model: ActiveModel = existing.into();
    active_model.status = Set(AuthorizationStatus::Redeemed);
    active_model.updated_at = Set(Utc::now().into());

    Ok(Entity::update(active_model)
        .filter(Column::Status.eq(AuthorizationStatus::Authorized))
        .exec(db)
        .await?)
}

/// Removes requests that can no longer be used for anything: the request window
/// has closed and any code issued from it has expired too.
pub async fn delete_expired(db: &impl ConnectionTrait, now: DateTime<Utc>) -> Result<u64, Error> {
    let result = Entity::delete_many()
        .filter(Column::ExpiresAt.lt(now))
        .filter(
            Condition::any()
                .add(Column::CodeExpiresAt.is_null())
                .add(Column::CodeExpiresAt.lt(now)),
        )
        .exec(db)
        .await?;

    Ok(result.rows_affected)
}

#[cfg(test)]
#[cfg(feature = "mock")]
mod tests {
    use super::*;
    use crate::error::EntityApiErrorKind;
    use chrono::Duration;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn pending_request() -> Model {
        let now = Utc::now();
        Model {
            id: Id::new_v4(),
            project_id: Id::new_v4(),
            redirect_uri: "https://app.example.com/callback".to_string(),
            provider: Provider::Local,
            code_challenge: "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM".to_string(),
            code_challenge_method: "S256".to_string(),
            state: Some("xyz".to_string()),
            provider_code_verifier: None,
            project_user_id: None,
            code_hash: None,
            code_expires_at: None,
            status: AuthorizationStatus::Pending,
            expires_at: (now + Duration::minutes(10)).into(),
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    #[tokio::test]
    async fn authorize_moves_request_to_authorized() -> Result<(), Error> {
        let request = pending_request();
        let user_id = Id::new_v4();
        let mut authorized = request.clone();
        authorized.status = AuthorizationStatus::Authorized;
        authorized.project_user_id = Some(user_id);
        authorized.code_hash = Some("abc".to_string());

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[authorized.clone()]])
            .into_connection();

        let result = authorize(
            &db,
            request,
            user_id,
            "abc".to_string(),
            Utc::now() + Duration::minutes(5),
        )
        .await?;

        assert_eq!(result.status, AuthorizationStatus::Authorized);
        assert_eq!(result.project_user_id, Some(user_id));
        Ok(())
    }

    #[tokio::test]
    async fn mark_redeemed_fails_when_guard_does_not_match() {
        let mut request = pending_request();
        request.status = AuthorizationStatus::Authorized;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results::<Model, Vec<Model>, _>(vec![vec![]])
            .into_connection();

        let result = mark_redeemed(&db, request).await;

        assert_eq!(
            result.unwrap_err().error_kind,
            EntityApiErrorKind::RecordNotUpdated
        );
    }

    #[tokio::test]
    async fn delete_expired_reports_rows_removed() -> Result<(), Error> {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 3,
            }])
            .into_connection();

        assert_eq!(delete_expired(&db, Utc::now()).await?, 3);
        Ok(())
    }
}
