//! Projects: a developer's application registered on the platform.

use crate::error::{Error, SdkErrorKind};
use crate::gateway::oauth::opaque;
use crate::provider::Provider;
use crate::{projects, Id};
use entity_api::error::EntityApiErrorKind;
use entity_api::project;
use log::*;
use sea_orm::DatabaseConnection;
use std::str::FromStr;
use url::Url;

pub use entity_api::project::ProjectChanges;

const PUBLIC_KEY_PREFIX: &str = "pk_";
const PUBLIC_KEY_BYTES: usize = 32;

/// `pk_` followed by 32 random bytes, base64url encoded.
pub fn generate_public_key() -> String {
    format!("{PUBLIC_KEY_PREFIX}{}", opaque::generate(PUBLIC_KEY_BYTES))
}

pub async fn create(
    db: &DatabaseConnection,
    owner_id: Id,
    mut project_model: projects::Model,
) -> Result<projects::Model, Error> {
    project_model.name = validate_name(&project_model.name)?;
    validate_redirect_uris(&project_model.redirect_uris)?;
    project_model.enabled_providers = normalize_providers(project_model.enabled_providers)?;

    let created = project::create(db, owner_id, generate_public_key(), project_model).await?;
    info!("Created project {} for owner {owner_id}", created.id);
    Ok(created)
}

pub async fn find_by_id(db: &DatabaseConnection, id: Id) -> Result<projects::Model, Error> {
    Ok(project::find_by_id(db, id).await?)
}

pub async fn find_by_owner(
    db: &DatabaseConnection,
    owner_id: Id,
) -> Result<Vec<projects::Model>, Error> {
    Ok(project::find_by_owner(db, owner_id).await?)
}

/// Resolves the project an SDK client identifies with its public key.
///
/// An unknown key is reported as `UnknownProject` rather than a missing record so
/// the SDK endpoints can answer in OAuth form.
pub async fn find_by_public_key(
    db: &DatabaseConnection,
    public_key: &str,
) -> Result<projects::Model, Error> {
    project::find_by_public_key(db, public_key)
        .await
        .map_err(|err| match err.error_kind {
            EntityApiErrorKind::RecordNotFound => Error::sdk(SdkErrorKind::UnknownProject),
            _ => err.into(),
        })
}

pub async fn update(
    db: &DatabaseConnection,
    id: Id,
    mut changes: ProjectChanges,
) -> Result<projects::Model, Error> {
    if let Some(name) = changes.name.as_deref() {
        changes.name = Some(validate_name(name)?);
    }
    if let Some(redirect_uris) = changes.redirect_uris.as_ref() {
        validate_redirect_uris(redirect_uris)?;
    }
    if let Some(providers) = changes.enabled_providers.take() {
        changes.enabled_providers = Some(normalize_providers(providers)?);
    }

    Ok(project::update(db, id, changes).await?)
}

/// Issues a fresh public key, invalidating the old one.
pub async fn rotate_key(db: &DatabaseConnection, id: Id) -> Result<projects::Model, Error> {
    Ok(project::set_public_key(db, id, generate_public_key()).await?)
}

pub async fn delete_by_id(db: &DatabaseConnection, id: Id) -> Result<(), Error> {
    project::delete_by_id(db, id).await?;
    info!("Deleted project {id}");
    Ok(())
}

fn validate_name(name: &str) -> Result<String, Error> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::invalid("project name must not be empty"));
    }
    Ok(trimmed.to_string())
}

/// Redirect URIs must be absolute and carry no fragment (RFC 6749 §3.1.2).
fn validate_redirect_uris(redirect_uris: &[String]) -> Result<(), Error> {
    for uri in redirect_uris {
        let parsed = Url::parse(uri)
            .map_err(|_| Error::invalid(format!("redirect URI {uri} is not an absolute URL")))?;
        if parsed.fragment().is_some() {
            return Err(Error::invalid(format!(
                "redirect URI {uri} must not contain a fragment"
            )));
        }
    }
    Ok(())
}

/// Lowercases and de-duplicates provider names. An empty list enables `local` only.
fn normalize_providers(providers: Vec<String>) -> Result<Vec<String>, Error> {
    if providers.is_empty() {
        return Ok(vec![Provider::Local.as_str().to_string()]);
    }

    let mut normalized: Vec<String> = Vec::with_capacity(providers.len());
    for name in providers {
        let provider = Provider::from_str(&name)
            .map_err(|_| Error::invalid(format!("unknown provider {name}")))?;
        let name = provider.as_str().to_string();
        if !normalized.contains(&name) {
            normalized.push(name);
        }
    }
    Ok(normalized)
}
