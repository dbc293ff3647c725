//! Shared HTTP client for provider calls.

use std::time::Duration;

/// Provider requests that take longer than this fail instead of holding an end
/// user's browser on the callback.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// GitHub rejects API calls without a user agent.
pub fn user_agent() -> String {
    format!("sdk-auth/{}", env!("CARGO_PKG_VERSION"))
}

pub fn build_client() -> Result<reqwest::Client, crate::Error> {
    Ok(reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(user_agent())
        .build()?)
}
