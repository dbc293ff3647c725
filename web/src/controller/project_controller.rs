use crate::controller::ApiResponse;
use crate::extractors::{
    authenticated_user::AuthenticatedUser, compare_api_version::CompareApiVersion,
};
use crate::params::project::UpdateParams;
use crate::{AppState, Error};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::project as ProjectApi;
use domain::{projects::Model, Id};
use service::config::ApiVersion;

use log::*;

/// POST register a new project owned by the signed-in developer
#[utoipa::path(
    post,
    path = "/projects",
    params(ApiVersion),
    request_body = domain::projects::Model,
    responses(
        (status = 201, description = "Successfully created a new project", body = domain::projects::Model),
        (status = 401, description = "Unauthorized"),
        (status = 422, description = "Unprocessable Entity"),
        (status = 503, description = "Service temporarily unavailable")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn create(
    CompareApiVersion(_v): CompareApiVersion,
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Json(project_model): Json<Model>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST Create a new project: {}", project_model.name);

    let project = ProjectApi::create(app_state.db_conn_ref(), user.id, project_model).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(StatusCode::CREATED.into(), project)),
    ))
}

/// GET all projects owned by the signed-in developer
#[utoipa::path(
    get,
    path = "/projects",
    params(ApiVersion),
    responses(
        (status = 200, description = "Successfully retrieved all projects", body = [domain::projects::Model]),
        (status = 401, description = "Unauthorized"),
        (status = 503, description = "Service temporarily unavailable")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn index(
    CompareApiVersion(_v): CompareApiVersion,
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, Error> {
    let projects = ProjectApi::find_by_owner(app_state.db_conn_ref(), user.id).await?;

    debug!("Found {} projects for developer {}", projects.len(), user.id);

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), projects)))
}

/// GET a project by its id
#[utoipa::path(
    get,
    path = "/projects/{id}",
    params(
        ApiVersion,
        ("id" = Uuid, Path, description = "Project id to retrieve")
    ),
    responses(
        (status = 200, description = "Successfully retrieved the project", body = domain::projects::Model),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Project not found")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn read(
    CompareApiVersion(_v): CompareApiVersion,
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    let project = ProjectApi::find_by_id(app_state.db_conn_ref(), id).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), project)))
}

#[utoipa::path(
    put,
    path = "/projects/{id}",
    params(
        ApiVersion,
        ("id" = Uuid, Path, description = "Id of the project to update"),
    ),
    request_body = crate::params::project::UpdateParams,
    responses(
        (status = 200, description = "Successfully updated the project", body = domain::projects::Model),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 422, description = "Unprocessable Entity")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn update(
    CompareApiVersion(_v): CompareApiVersion,
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
    Json(params): Json<UpdateParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("PUT Update project {id}");

    let project = ProjectApi::update(app_state.db_conn_ref(), id, params.into()).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), project)))
}

/// POST replace a project's public key. SDK clients holding the old key stop working.
#[utoipa::path(
    post,
    path = "/projects/{id}/rotate_key",
    params(
        ApiVersion,
        ("id" = Uuid, Path, description = "Id of the project whose key to rotate"),
    ),
    responses(
        (status = 200, description = "Successfully issued a new public key", body = domain::projects::Model),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Project not found")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn rotate_key(
    CompareApiVersion(_v): CompareApiVersion,
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    info!("Rotating public key of project {id}");

    let project = ProjectApi::rotate_key(app_state.db_conn_ref(), id).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), project)))
}

#[utoipa::path(
    delete,
    path = "/projects/{id}",
    params(
        ApiVersion,
        ("id" = Uuid, Path, description = "Id of the project to delete"),
    ),
    responses(
        (status = 204, description = "Successfully deleted the project"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Project not found")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn delete(
    CompareApiVersion(_v): CompareApiVersion,
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    debug!("DELETE project {id}");

    ProjectApi::delete_by_id(app_state.db_conn_ref(), id).await?;

    Ok(Json(ApiResponse::<()>::no_content(
        StatusCode::NO_CONTENT.into(),
    )))
}
