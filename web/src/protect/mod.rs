//! Authorization rules for dashboard resources.
//!
//! Each submodule holds the `from_fn_with_state` middleware guarding one resource
//! family. The rules themselves implement [`Check`] and are composed with
//! [`Predicate`] and [`authorize`].

pub(crate) mod projects;

use crate::AppState;
use async_trait::async_trait;
use axum::{extract::Request, http::StatusCode, middleware::Next, response::IntoResponse};
use domain::{project as ProjectApi, Id};
use log::*;

/// A single authorization rule: may the authenticated developer proceed?
#[async_trait]
pub trait Check: Send + Sync {
    async fn eval(&self, app: &AppState, user: &domain::users::Model, args: Vec<Id>) -> bool;
}

/// A [`Check`] bound to the arguments it will be evaluated with.
pub(crate) struct Predicate {
    predicate: Box<dyn Check>,
    args: Vec<Id>,
}

impl Predicate {
    pub(crate) fn new<C: Check + 'static>(predicate: C, args: Vec<Id>) -> Self {
        Self {
            predicate: Box::new(predicate),
            args,
        }
    }

    pub(crate) async fn check(&self, app_state: &AppState, user: &domain::users::Model) -> bool {
        self.predicate
            .eval(app_state, user, self.args.clone())
            .await
    }
}

/// Runs `checks` in order and answers 403 at the first one that fails.
pub(crate) async fn authorize(
    app_state: &AppState,
    authenticated_user: domain::users::Model,
    request: Request,
    next: Next,
    checks: Vec<Predicate>,
) -> impl IntoResponse {
    for check in checks {
        if !check.check(app_state, &authenticated_user).await {
            return (StatusCode::FORBIDDEN, "FORBIDDEN").into_response();
        }
    }
    next.run(request).await
}

/// Passes when the project named by the first argument is owned by the user.
pub struct UserOwnsProject;

#[async_trait]
impl Check for UserOwnsProject {
    async fn eval(
        &self,
        app_state: &AppState,
        authenticated_user: &domain::users::Model,
        args: Vec<Id>,
    ) -> bool {
        let Some(project_id) = args.first().copied() else {
            return false;
        };
        match ProjectApi::find_by_id(app_state.db_conn_ref(), project_id).await {
            Ok(project) => project.owner_id == authenticated_user.id,
            Err(e) => {
                warn!("Project {project_id} not found while authorizing: {e:?}");
                false
            }
        }
    }
}
