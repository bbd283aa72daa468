use digest_core::{CoreError, RedditApiError};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error, info};

const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";

/// Application-only bearer token. Read-only scraping needs no user login.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    #[serde(default)]
    pub scope: String,
}

pub(crate) async fn request_app_token(
    http_client: &Client,
    client_id: &str,
    client_secret: &str,
) -> Result<AccessToken, CoreError> {
    debug!("Requesting app-only OAuth token");
    let response = http_client
        .post(TOKEN_URL)
        .basic_auth(client_id, Some(client_secret))
        .form(&[("grant_type", "client_credentials")])
        .send()
        .await
        .map_err(|e| {
            error!("Network error requesting OAuth token: {}", e);
            if e.is_timeout() {
                CoreError::RedditApi(RedditApiError::RequestTimeout)
            } else {
                CoreError::Network(e)
            }
        })?;

    let status = response.status();
    if status.as_u16() == 401 {
        return Err(RedditApiError::AuthenticationFailed {
            reason: "Reddit rejected the client credentials".to_string(),
        }
        .into());
    }
    if status.is_server_error() {
        return Err(RedditApiError::ServerError {
            status_code: status.as_u16(),
        }
        .into());
    }
    if !status.is_success() {
        return Err(RedditApiError::AuthenticationFailed {
            reason: format!("token endpoint returned status {}", status.as_u16()),
        }
        .into());
    }

    let token: AccessToken = response.json().await.map_err(|e| {
        error!("Failed to parse OAuth token response: {}", e);
        CoreError::RedditApi(RedditApiError::InvalidResponse {
            details: "Failed to parse OAuth token response".to_string(),
        })
    })?;

    if token.access_token.is_empty() {
        return Err(RedditApiError::AuthenticationFailed {
            reason: "token endpoint returned an empty access token".to_string(),
        }
        .into());
    }

    info!(
        "Reddit token issued ({}, expires in {}s)",
        token.token_type, token.expires_in
    );
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_response_parse() {
        let raw = r#"{
            "access_token": "abc-123-def",
            "token_type": "bearer",
            "expires_in": 86400,
            "scope": "*"
        }"#;

        let token: AccessToken = serde_json::from_str(raw).unwrap();
        assert_eq!(token.access_token, "abc-123-def");
        assert_eq!(token.token_type, "bearer");
        assert_eq!(token.expires_in, 86400);
        assert_eq!(token.scope, "*");
    }
}
