use crate::{
    controller::health_check_controller, middleware::auth::require_auth, params, protect, AppState,
};
use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post, put},
    Router,
};
use log::*;
use service::config::ApiVersion;
use tower_http::cors::{Any, CorsLayer};

use crate::controller::{
    project, project_controller,
    sdk::{authorization_controller, token_controller},
    user_session_controller,
};

use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_rapidoc::RapiDoc;

// Global OpenAPI definition. A path or schema only shows up in the rendered
// document when it is listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "Identity Platform API"
        ),
        paths(
            health_check_controller::health_check,
            user_session_controller::login,
            user_session_controller::delete,
            project_controller::create,
            project_controller::index,
            project_controller::read,
            project_controller::update,
            project_controller::rotate_key,
            project_controller::delete,
            project::user_controller::index,
            authorization_controller::authorize,
            authorization_controller::login,
            authorization_controller::register,
            authorization_controller::callback,
            token_controller::token,
            token_controller::refresh,
            token_controller::revoke,
            token_controller::user_info,
        ),
        components(
            schemas(
                domain::projects::Model,
                domain::project_users::Model,
                domain::users::Model,
                domain::provider::Provider,
                domain::user::Credentials,
                params::project::UpdateParams,
                params::sdk::LocalSignInBody,
                params::sdk::RedirectBody,
                params::sdk::RefreshTokenBody,
                params::sdk::TokenRequest,
                params::sdk::TokenResponse,
            )
        ),
        modifiers(&SecurityAddon),
        tags(
            (name = "identity_platform", description = "Identity platform dashboard and SDK API")
        )
    )]
struct ApiDoc;

struct SecurityAddon;

// Dashboard routes authenticate with the session cookie, /sdk/userinfo with a
// bearer access token.
impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "cookie_auth",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    "id",
                    "Session id value returned from successful login via Set-Cookie header",
                ))),
            );
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

pub fn define_routes(app_state: AppState) -> Router {
    let dashboard_cors = dashboard_cors(&app_state.config.allowed_origins);

    Router::new()
        .merge(health_routes())
        .merge(user_session_routes().layer(dashboard_cors.clone()))
        .merge(user_session_protected_routes(app_state.clone()).layer(dashboard_cors.clone()))
        .merge(project_routes(app_state.clone()).layer(dashboard_cors))
        .merge(sdk_routes(app_state).layer(sdk_cors()))
        // **** FIXME: protect the OpenAPI web UI
        .merge(RapiDoc::with_openapi("/api-docs/openapi2.json", ApiDoc::openapi()).path("/rapidoc"))
}

/// The dashboard sends its session cookie cross-origin, so only configured
/// origins are allowed.
fn dashboard_cors(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring invalid CORS origin {origin:?}: {e}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static(ApiVersion::field_name()),
        ])
}

/// SDK clients run on every project's own origin and never send cookies.
fn sdk_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}

pub fn user_session_routes() -> Router {
    Router::new().route("/login", post(user_session_controller::login))
}

pub fn user_session_protected_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/delete", delete(user_session_controller::delete))
        .route_layer(from_fn(require_auth))
        .with_state(app_state)
}

fn project_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/projects", post(project_controller::create))
        .route("/projects", get(project_controller::index))
        .merge(
            // every /projects/{id} route is owner only
            Router::new()
                .route("/projects/{id}", get(project_controller::read))
                .route("/projects/{id}", put(project_controller::update))
                .route("/projects/{id}", delete(project_controller::delete))
                .route(
                    "/projects/{id}/rotate_key",
                    post(project_controller::rotate_key),
                )
                .route("/projects/{id}/users", get(project::user_controller::index))
                .route_layer(from_fn_with_state(
                    app_state.clone(),
                    protect::projects::owner,
                )),
        )
        .route_layer(from_fn(require_auth))
        .with_state(app_state)
}

fn sdk_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/sdk/authorize", get(authorization_controller::authorize))
        .route("/sdk/login", post(authorization_controller::login))
        .route("/sdk/register", post(authorization_controller::register))
        .route(
            "/sdk/callback/{provider}",
            get(authorization_controller::callback),
        )
        .route("/sdk/token", post(token_controller::token))
        .route("/sdk/refresh", post(token_controller::refresh))
        .route("/sdk/revoke", post(token_controller::revoke))
        .route("/sdk/userinfo", get(token_controller::user_info))
        .with_state(app_state)
}

#[cfg(test)]
#[cfg(feature = "mock")]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum_login::{
        tower_sessions::{MemoryStore, SessionManagerLayer},
        AuthManagerLayerBuilder,
    };
    use chrono::{Duration, Utc};
    use domain::{
        authorization_requests, authorization_status::AuthorizationStatus, projects,
        provider::Provider, user::Backend, Id,
    };
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
    use serde_json::{json, Value};
    use service::config::Config;
    use std::sync::Arc;
    use tower::ServiceExt;

    const CHALLENGE: &str = "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM";
    const REDIRECT_URI: &str = "https://app.example.com/callback";

    fn test_app(db: DatabaseConnection) -> Router {
        let db = Arc::new(db);
        let config =
            Config::from_args(["identity_platform_rs"]).set_jwt_signing_key("k".to_string());
        let app_state = AppState::new(config, &db);
        let session_layer = SessionManagerLayer::new(MemoryStore::default()).with_secure(false);
        let auth_layer = AuthManagerLayerBuilder::new(Backend::new(&db), session_layer).build();
        define_routes(app_state).layer(auth_layer)
    }

    fn project() -> projects::Model {
        let now = Utc::now();
        projects::Model {
            id: Id::new_v4(),
            owner_id: Id::new_v4(),
            name: "Storefront".to_string(),
            public_key: "pk_test_storefront".to_string(),
            redirect_uris: vec![REDIRECT_URI.to_string()],
            enabled_providers: vec!["local".to_string()],
            is_active: true,
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    fn pending_request(project_id: Id) -> authorization_requests::Model {
        let now = Utc::now();
        authorization_requests::Model {
            id: Id::new_v4(),
            project_id,
            redirect_uri: REDIRECT_URI.to_string(),
            provider: Provider::Local,
            code_challenge: CHALLENGE.to_string(),
            code_challenge_method: "S256".to_string(),
            state: Some("client-state".to_string()),
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

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_responds_healthy() {
        let app = test_app(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn authorize_redirects_local_sign_in_to_hosted_login() {
        let project = project();
        let request = pending_request(project.id);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[project.clone()]])
            .append_query_results([[request.clone()]])
            .into_connection();

        let uri = format!(
            "/sdk/authorize?public_key=pk_test_storefront&redirect_uri={}&code_challenge={CHALLENGE}&code_challenge_method=S256&state=client-state",
            "https%3A%2F%2Fapp.example.com%2Fcallback"
        );
        let response = test_app(db)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let location = response.headers()[header::LOCATION].to_str().unwrap();
        assert!(location.ends_with(&format!("?request_id={}", request.id)));
    }

    #[tokio::test]
    async fn authorize_rejects_unregistered_redirect_uri() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[project()]])
            .into_connection();

        let uri = format!(
            "/sdk/authorize?public_key=pk_test_storefront&redirect_uri={}&code_challenge={CHALLENGE}",
            "https%3A%2F%2Fevil.example.com%2Fcallback"
        );
        let response = test_app(db)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(response.headers().get(header::LOCATION).is_none());
        assert_eq!(json_body(response).await["error"], "invalid_request");
    }

    #[tokio::test]
    async fn authorize_without_code_challenge_is_invalid_request() {
        let app = test_app(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let uri = format!(
            "/sdk/authorize?public_key=pk_test_storefront&redirect_uri={}",
            "https%3A%2F%2Fapp.example.com%2Fcallback"
        );
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");
        assert_eq!(json_body(response).await["error"], "invalid_request");
    }

    #[tokio::test]
    async fn login_with_malformed_body_is_invalid_request() {
        let app = test_app(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/sdk/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"email": "shopper@example.com""#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "invalid_request");
    }

    #[tokio::test]
    async fn register_without_json_content_type_is_invalid_request() {
        let app = test_app(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/sdk/register")
                    .body(Body::from("email=new%40example.com"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "invalid_request");
    }

    #[tokio::test]
    async fn token_rejects_unknown_grant_type_in_oauth_shape() {
        let app = test_app(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/sdk/token")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({"grant_type": "password", "public_key": "pk_test"}).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "invalid_request");
    }

    #[tokio::test]
    async fn token_with_unknown_public_key_is_invalid_client() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results::<projects::Model, Vec<projects::Model>, _>(vec![vec![]])
            .into_connection();

        let response = test_app(db)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/sdk/token")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({
                            "grant_type": "authorization_code",
                            "public_key": "pk_unknown",
                            "code": "some-code",
                            "code_verifier": "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk",
                            "redirect_uri": REDIRECT_URI
                        })
                        .to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["error"], "invalid_client");
    }

    #[tokio::test]
    async fn userinfo_without_bearer_token_is_401() {
        let app = test_app(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/sdk/userinfo")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));
    }

    #[tokio::test]
    async fn project_routes_require_a_session() {
        let app = test_app(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/projects")
                    .header(ApiVersion::field_name(), ApiVersion::default_version())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
