use chrono::Utc;
use log::info;
use sea_orm::DatabaseConnection;

pub use entity::{
    authorization_requests, authorization_status, project_users, projects, provider,
    refresh_tokens, users, Id,
};

pub mod authorization_request;
pub mod error;
pub mod project;
pub mod project_user;
pub mod refresh_token;
pub mod user;

/// Public key of the demo project created by `seed_database`. Stable so local SDK
/// clients can be pointed at it without looking it up.
pub const SEED_PROJECT_PUBLIC_KEY: &str = "pk_local_development_demo_project";

/// Populates an empty database with a developer account, a demo project and one
/// of its end users. Intended for local development only.
pub async fn seed_database(db: &DatabaseConnection) -> Result<(), error::Error> {
    let now = Utc::now();

    let developer = user::create(
        db,
        users::Model {
            id: Id::nil(),
            email: "developer@example.com".to_owned(),
            display_name: Some("Demo Developer".to_owned()),
            password: "password".to_owned(),
            created_at: now.into(),
            updated_at: now.into(),
        },
    )
    .await?;

    let demo_project = project::create(
        db,
        developer.id,
        SEED_PROJECT_PUBLIC_KEY.to_owned(),
        projects::Model {
            id: Id::nil(),
            owner_id: developer.id,
            name: "Demo Project".to_owned(),
            public_key: String::new(),
            redirect_uris: vec![
                "http://localhost:5173/callback".to_owned(),
                "http://localhost:3001/callback".to_owned(),
            ],
            enabled_providers: vec!["local".to_owned(), "google".to_owned(), "github".to_owned()],
            is_active: true,
            created_at: now.into(),
            updated_at: now.into(),
        },
    )
    .await?;

    project_user::create(
        db,
        project_user::NewProjectUser {
            project_id: demo_project.id,
            email: "end.user@example.com".to_owned(),
            name: Some("End User".to_owned()),
            password: Some("password".to_owned()),
            provider: provider::Provider::Local,
            provider_account_id: None,
            avatar_url: None,
            email_verified: true,
        },
    )
    .await?;

    info!(
        "Seeded developer {} with project {} ({})",
        developer.email, demo_project.name, demo_project.public_key
    );

    Ok(())
}
