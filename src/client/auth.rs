//! Password-realm login against the service's identity provider

use super::{HttpConfig, AUTH_SVC_INFO};
use crate::domain::ports::Authenticator;
use crate::domain::remote::{AuthRequest, AuthResponse, AuthServiceInfo};
use crate::error::{Error, Result};
use async_trait::async_trait;
use tracing::{debug, info};

const GRANT_PASSWORD_REALM: &str = "http://auth0.com/oauth/grant-type/password-realm";
const PASSWORD_REALM: &str = "Username-Password-Authentication";
const OPEN_ID_SCOPE: &str = "openid";
const TOKEN_PATH: &str = "/oauth/token";

/// Discovers the identity provider, then exchanges a password for an id token
#[derive(Debug, Clone)]
pub struct PasswordGrantAuthenticator {
    http: reqwest::Client,
}

impl PasswordGrantAuthenticator {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        Ok(Self {
            http: config.build_client()?,
        })
    }

    async fn discover(&self, base_url: &str) -> Result<AuthServiceInfo> {
        let url = format!("{}{}", base_url.trim_end_matches('/'), AUTH_SVC_INFO);
        let response = self.http.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(Error::Authentication(format!(
                "auth service discovery failed: {}",
                response.status()
            )));
        }

        let info: AuthServiceInfo = response
            .json()
            .await
            .map_err(|e| Error::Authentication(format!("auth service info parse failed: {}", e)))?;

        if info.auth_url.is_empty() {
            return Err(Error::Authentication(
                "auth service info does not name an identity provider".into(),
            ));
        }
        Ok(info)
    }
}

/// Pick the token the management API accepts as a bearer
fn session_token(response: AuthResponse) -> Result<String> {
    if response.id_token.is_empty() {
        return Err(Error::Authentication("identity provider returned no id token".into()));
    }
    Ok(response.id_token)
}

#[async_trait]
impl Authenticator for PasswordGrantAuthenticator {
    async fn login(&self, base_url: &str, username: &str, password: &str) -> Result<String> {
        let info = self.discover(base_url).await?;
        debug!("Identity provider at {}", info.auth_url);

        let request = AuthRequest {
            grant_type: GRANT_PASSWORD_REALM,
            client_id: &info.auth_client_id,
            audience: &info.auth_audience,
            username,
            password,
            scope: OPEN_ID_SCOPE,
            realm: PASSWORD_REALM,
        };
        let url = format!("{}{}", info.auth_url.trim_end_matches('/'), TOKEN_PATH);
        let response = self.http.post(&url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Authentication(format!(
                "login for {} rejected ({}): {}",
                username,
                status,
                body.trim()
            )));
        }

        let token = session_token(
            response
                .json()
                .await
                .map_err(|e| Error::Authentication(format!("token response parse failed: {}", e)))?,
        )?;

        info!("Logged in as {}", username);
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_id_token_is_the_session_token() {
        let response: AuthResponse = serde_json::from_str(
            r#"{"id_token":"id-123","access_token":"acc-456","token_type":"Bearer"}"#,
        )
        .unwrap();
        assert_eq!(session_token(response).unwrap(), "id-123");

        assert_matches!(
            session_token(AuthResponse::default()),
            Err(Error::Authentication(_))
        );
    }

    #[test]
    fn test_grant_request_shape() {
        let request = AuthRequest {
            grant_type: GRANT_PASSWORD_REALM,
            client_id: "cid",
            audience: "aud",
            username: "alice",
            password: "pw",
            scope: OPEN_ID_SCOPE,
            realm: PASSWORD_REALM,
        };
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["realm"], "Username-Password-Authentication");
        assert_eq!(body["scope"], "openid");
        assert_eq!(body["client_id"], "cid");
    }

    #[tokio::test]
    async fn test_unreachable_service_is_transport_error() {
        let auth = PasswordGrantAuthenticator::new(&HttpConfig {
            timeout: std::time::Duration::from_millis(200),
            accept_invalid_certs: false,
        })
        .unwrap();
        let result = auth.login("http://127.0.0.1:9", "alice", "pw").await;
        assert_matches!(result, Err(Error::Transport(_)));
    }
}
