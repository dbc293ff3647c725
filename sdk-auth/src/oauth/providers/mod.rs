//! Concrete provider implementations.

pub mod github;
pub mod google;

/// Credentials and callback shared by every provider.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Our callback URL registered with the provider.
    pub redirect_uri: String,
}
