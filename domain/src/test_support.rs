//! Fixtures shared by the domain tests.

use crate::authorization_status::AuthorizationStatus;
use crate::provider::Provider;
use crate::{authorization_requests, project_users, projects, Id};
use chrono::{Duration, Utc};
use service::config::Config;

// RFC 7636 Appendix B
pub const TEST_VERIFIER: &str = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
pub const TEST_CHALLENGE: &str = "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM";

pub fn test_config() -> Config {
    Config::from_args(["identity_platform_rs"]).set_jwt_signing_key("test-signing-key".to_string())
}

pub fn project() -> projects::Model {
    let now = Utc::now();
    projects::Model {
        id: Id::new_v4(),
        owner_id: Id::new_v4(),
        name: "Storefront".to_string(),
        public_key: "pk_test_storefront".to_string(),
        redirect_uris: vec!["https://app.example.com/callback".to_string()],
        enabled_providers: vec![
            "local".to_string(),
            "google".to_string(),
            "github".to_string(),
        ],
        is_active: true,
        created_at: now.into(),
        updated_at: now.into(),
    }
}

pub fn project_user(project_id: Id) -> project_users::Model {
    let now = Utc::now();
    project_users::Model {
        id: Id::new_v4(),
        project_id,
        email: "shopper@example.com".to_string(),
        name: Some("Shopper".to_string()),
        password: None,
        provider: Provider::Local,
        provider_account_id: None,
        avatar_url: None,
        email_verified: false,
        last_login_at: None,
        created_at: now.into(),
        updated_at: now.into(),
    }
}

pub fn local_user(project_id: Id, password: &str) -> project_users::Model {
    project_users::Model {
        password: Some(password_auth::generate_hash(password)),
        ..project_user(project_id)
    }
}

pub fn pending_request(project_id: Id, provider: Provider) -> authorization_requests::Model {
    let now = Utc::now();
    authorization_requests::Model {
        id: Id::new_v4(),
        project_id,
        redirect_uri: "https://app.example.com/callback".to_string(),
        provider,
        code_challenge: TEST_CHALLENGE.to_string(),
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
