use crate::controller::ApiResponse;
use crate::extractors::compare_api_version::CompareApiVersion;
use crate::{AppState, Error};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::project_user as ProjectUserApi;
use domain::Id;
use service::config::ApiVersion;

use log::*;

/// GET the end users who have signed in to a project
#[utoipa::path(
    get,
    path = "/projects/{id}/users",
    params(
        ApiVersion,
        ("id" = Uuid, Path, description = "Project id whose users to list")
    ),
    responses(
        (status = 200, description = "Successfully retrieved the project's users", body = [domain::project_users::Model]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn index(
    CompareApiVersion(_v): CompareApiVersion,
    State(app_state): State<AppState>,
    Path(project_id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    let users = ProjectUserApi::find_by_project(app_state.db_conn_ref(), project_id).await?;

    debug!("Found {} users in project {project_id}", users.len());

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), users)))
}
