use crate::extractors::RejectionType;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use log::*;
use semver::Version;
use service::config::ApiVersion;

/// Rejects dashboard requests whose `x-version` header is missing or names an
/// API version this server does not serve.
#[derive(Debug)]
pub(crate) struct CompareApiVersion(pub Version);

impl<S> FromRequestParts<S> for CompareApiVersion
where
    S: Send + Sync,
{
    type Rejection = RejectionType;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(ApiVersion::field_name())
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                (
                    StatusCode::BAD_REQUEST,
                    format!("Missing {} header", ApiVersion::field_name()),
                )
            })?;

        let version = Version::parse(header).map_err(|e| {
            warn!("Unparseable API version {header:?}: {e}");
            (
                StatusCode::BAD_REQUEST,
                format!("Invalid API version: {header}"),
            )
        })?;

        if ApiVersion::versions()
            .iter()
            .any(|supported| Version::parse(supported).is_ok_and(|v| v == version))
        {
            Ok(CompareApiVersion(version))
        } else {
            Err((
                StatusCode::BAD_REQUEST,
                format!("Unsupported API version: {version}"),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(header: Option<&str>) -> Result<CompareApiVersion, RejectionType> {
        let mut builder = Request::builder().uri("/projects");
        if let Some(value) = header {
            builder = builder.header(ApiVersion::field_name(), value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        CompareApiVersion::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn accepts_the_current_version() {
        let CompareApiVersion(version) = extract(Some(ApiVersion::default_version()))
            .await
            .unwrap();
        assert_eq!(version.to_string(), ApiVersion::default_version());
    }

    #[tokio::test]
    async fn rejects_missing_or_unknown_versions() {
        assert_eq!(extract(None).await.unwrap_err().0, StatusCode::BAD_REQUEST);
        assert_eq!(
            extract(Some("9.9.9")).await.unwrap_err().0,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            extract(Some("not-a-version")).await.unwrap_err().0,
            StatusCode::BAD_REQUEST
        );
    }
}
