//! Shared HTTP plumbing for the provider backends.

use std::sync::OnceLock;
use std::time::Duration;

use reqwest::{Client, Response};
use serde::Deserialize;

use super::ProviderError;

/// Global HTTP client for reuse across requests (avoids TLS handshake
/// overhead on every turn).
static HTTP_CLIENT: OnceLock<Client> = OnceLock::new();

pub(crate) fn http_client() -> &'static Client {
    HTTP_CLIENT.get_or_init(|| {
        Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to build HTTP client")
    })
}

/// Standard `{"error": {"message": ...}}` error envelope used by the
/// OpenAI-compatible APIs.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Turn a non-success response into a `ProviderError::Api`, preferring the
/// structured error message and falling back to the raw body.
pub(crate) async fn error_from_response(response: Response) -> ProviderError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();

    let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
        Ok(parsed) => parsed.error.message,
        Err(_) => body,
    };

    log::error!("Provider API error ({}): {}", status, message);
    ProviderError::Api { status, message }
}
