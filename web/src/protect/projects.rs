use crate::{extractors::authenticated_user::AuthenticatedUser, AppState};
use axum::{
    extract::{Path, Request, State},
    middleware::Next,
    response::IntoResponse,
};
use domain::Id;

use super::{authorize, Predicate, UserOwnsProject};

/// Guards every `/projects/{id}` route: only the owning developer may touch it.
pub(crate) async fn owner(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(project_id): Path<Id>,
    request: Request,
    next: Next,
) -> impl IntoResponse {
    let checks = vec![Predicate::new(UserOwnsProject, vec![project_id])];
    authorize(&app_state, user, request, next, checks).await
}
