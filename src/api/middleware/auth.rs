use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::api::errors::ApiError;

const API_KEY_HEADER: &str = "x-api-key";

/// Shared-secret authentication extractor for protected routes
///
/// The key authenticates the deployment, not the individual agent; the
/// acting agent travels separately as an `agent_id` parameter.
///
/// Usage:
/// ```rust,ignore
/// async fn protected_handler(
///     _auth: ApiKeyAuth,
/// ) -> Result<String, ApiError> {
///     Ok("authenticated".to_string())
/// }
/// ```
pub struct ApiKeyAuth;

#[async_trait]
impl<S> FromRequestParts<S> for ApiKeyAuth
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let provided = parts
            .headers
            .get(API_KEY_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Missing X-API-KEY header"))?;

        let expected =
            std::env::var("SWARMDECK_API_KEY").unwrap_or_else(|_| "dev-api-key".to_string());

        if provided != expected {
            return Err(ApiError::unauthorized("Invalid API key"));
        }

        Ok(ApiKeyAuth)
    }
}
