use domain::project::ProjectChanges;
use serde::Deserialize;
use utoipa::ToSchema;

/// Partial update of a project. Omitted fields are left unchanged.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub(crate) struct UpdateParams {
    pub name: Option<String>,
    pub redirect_uris: Option<Vec<String>>,
    pub enabled_providers: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

impl From<UpdateParams> for ProjectChanges {
    fn from(params: UpdateParams) -> Self {
        ProjectChanges {
            name: params.name,
            redirect_uris: params.redirect_uris,
            enabled_providers: params.enabled_providers,
            is_active: params.is_active,
        }
    }
}
