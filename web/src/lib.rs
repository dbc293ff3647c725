//! HTTP surface of the identity platform: the developer dashboard API and the
//! SDK sign-in endpoints.

use axum_login::{
    tower_sessions::{cookie::SameSite, Expiry, SessionManagerLayer},
    AuthManagerLayerBuilder,
};
use domain::user::Backend;
use log::*;
use std::io;
use time::Duration;
use tokio::net::TcpListener;
use tower_sessions::ExpiredDeletion;
use tower_sessions_sqlx_store::PostgresStore;

pub use self::error::{Error, Result};
pub use service::AppState;

mod controller;
mod error;
mod extractors;
mod middleware;
mod params;
mod protect;
mod router;

const SESSION_TABLE: &str = "authorized_sessions";
const EXPIRED_SESSION_DELETION_SECS: u64 = 60;

pub async fn init_server(app_state: AppState) -> io::Result<()> {
    let config = &app_state.config;

    // Sessions live next to the platform tables in Postgres
    let pool = app_state.db_conn_ref().get_postgres_connection_pool().clone();
    let session_store = PostgresStore::new(pool)
        .with_schema_name(service::DB_SCHEMA)
        .and_then(|store| store.with_table_name(SESSION_TABLE))
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;
    session_store.migrate().await.map_err(io::Error::other)?;

    tokio::task::spawn(
        session_store
            .clone()
            .continuously_delete_expired(tokio::time::Duration::from_secs(
                EXPIRED_SESSION_DELETION_SECS,
            )),
    );

    domain::authorization::spawn_request_cleanup(
        app_state.database_connection.clone(),
        std::time::Duration::from_secs(config.sdk_request_cleanup_interval_secs),
    );

    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(config.is_production())
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(Duration::seconds(
            config.backend_session_expiry_seconds as i64,
        )));

    let backend = Backend::new(&app_state.database_connection);
    let auth_layer = AuthManagerLayerBuilder::new(backend, session_layer).build();

    let interface = config.interface.clone().unwrap_or_else(|| "127.0.0.1".to_string());
    let address = format!("{interface}:{}", config.port);
    let listener = TcpListener::bind(&address).await?;

    info!(
        "Server starting... listening for connections on http://{address} ({})",
        config.runtime_env()
    );

    let app = router::define_routes(app_state).layer(auth_layer);

    axum::serve(listener, app).await
}
