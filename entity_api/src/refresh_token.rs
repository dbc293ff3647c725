use super::error::Error;
use chrono::{DateTime, Utc};
use entity::refresh_tokens::{ActiveModel, Column, Entity, Model};
use entity::Id;
use log::*;
use sea_orm::{
    entity::prelude::*, sea_query::Expr, ActiveValue::Set, ConnectionTrait, TransactionTrait,
};

#[derive(Debug, Clone)]
pub struct NewRefreshToken {
    pub project_id: Id,
    pub project_user_id: Id,
    pub authorization_request_id: Option<Id>,
    pub family_id: Id,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

pub async fn create(db: &impl ConnectionTrait, token: NewRefreshToken) -> Result<Model, Error> {
    debug!(
        "Issuing refresh token in family {} for project user {}",
        token.family_id, token.project_user_id
    );

    let active_model = ActiveModel {
        id: Set(Id::new_v4()),
        project_id: Set(token.project_id),
        project_user_id: Set(token.project_user_id),
        authorization_request_id: Set(token.authorization_request_id),
        family_id: Set(token.family_id),
        token_hash: Set(token.token_hash),
        expires_at: Set(token.expires_at.into()),
        revoked_at: Set(None),
        replaced_by: Set(None),
        created_at: Set(Utc::now().into()),
    };

    Ok(active_model.insert(db).await?)
}

pub async fn find_by_hash(
    db: &impl ConnectionTrait,
    token_hash: &str,
) -> Result<Option<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::TokenHash.eq(token_hash))
        .one(db)
        .await?)
}

/// Swaps `current` for a successor in the same family inside one transaction.
///
/// `current` is revoked with `replaced_by` pointing at the successor. The revoke
/// is guarded on `revoked_at IS NULL`, so when two requests race with the same
/// token only one of them gets a successor; the other fails with `RecordNotUpdated`.
pub async fn rotate(
    db: &impl TransactionTrait,
    current: Model,
    successor_hash: String,
    successor_expires_at: DateTime<Utc>,
) -> Result<Model, Error> {
    let txn = db.begin().await?;

    let successor = create(
        &txn,
        NewRefreshToken {
            project_id: current.project_id,
            project_user_id: current.project_user_id,
            authorization_request_id: current.authorization_request_id,
            family_id: current.family_id,
            token_hash: successor_hash,
            expires_at: successor_expires_at,
        },
    )
    .await?;

    let mut active_model: ActiveModel = current.into();
    active_model.revoked_at = Set(Some(Utc::now().into()));
    active_model.replaced_by = Set(Some(successor.id));

    Entity::update(active_model)
        .filter(Column::RevokedAt.is_null())
        .exec(&txn)
        .await?;

    txn.commit().await?;

    Ok(successor)
}

/// Revokes every still-active token of a family. Returns the number revoked.
pub async fn revoke_family(db: &impl ConnectionTrait, family_id: Id) -> Result<u64, Error> {
    let result = Entity::update_many()
        .col_expr(Column::RevokedAt, Expr::value(Utc::now()))
        .filter(Column::FamilyId.eq(family_id))
        .filter(Column::RevokedAt.is_null())
        .exec(db)
        .await?;

    warn!(
        "Revoked {} refresh token(s) in family {family_id}",
        result.rows_affected
    );
    Ok(result.rows_affected)
}

/// Revokes every token descending from one authorization request's code.
pub async fn revoke_by_authorization_request(
    db: &impl ConnectionTrait,
    authorization_request_id: Id,
) -> Result<u64, Error> {
    let result = Entity::update_many()
        .col_expr(Column::RevokedAt, Expr::value(Utc::now()))
        .filter(Column::AuthorizationRequestId.eq(authorization_request_id))
        .filter(Column::RevokedAt.is_null())
        .exec(db)
        .await?;

    Ok(result.rows_affected)
}
