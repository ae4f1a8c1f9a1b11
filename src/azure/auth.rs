use crate::azure::client::AzureError;
use crate::config::{AuthMethod, Config};
use async_trait::async_trait;
use azure_core::auth::TokenCredential;
use azure_identity::{AzureCliCredential, DefaultAzureCredential};
use base64::{Engine as _, engine::general_purpose};
use std::sync::Arc;

const AZURE_DEVOPS_SCOPE: &str = "499b84ac-1321-427f-aa17-267ca6975798";

/// Source of the `Authorization` header sent with every request.
#[cfg_attr(any(test, feature = "test-support"), mockall::automock)]
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn authorization_header(&self) -> Result<String, AzureError>;
}

/// Basic auth with a personal access token and an empty user name.
pub struct PatAuth {
    header: String,
}

impl PatAuth {
    pub fn new(pat: &str) -> Self {
        let encoded = general_purpose::STANDARD.encode(format!(":{}", pat));
        Self {
            header: format!("Basic {}", encoded),
        }
    }
}

#[async_trait]
impl AuthProvider for PatAuth {
    async fn authorization_header(&self) -> Result<String, AzureError> {
        Ok(self.header.clone())
    }
}

/// Bearer token obtained from an Azure identity credential.
pub struct CredentialAuth {
    credential: Arc<dyn TokenCredential>,
}

impl CredentialAuth {
    pub fn new(credential: Arc<dyn TokenCredential>) -> Self {
        Self { credential }
    }
}

#[async_trait]
impl AuthProvider for CredentialAuth {
    async fn authorization_header(&self) -> Result<String, AzureError> {
        let token_response = self
            .credential
            .get_token(AZURE_DEVOPS_SCOPE)
            .await
            .map_err(|e| {
                AzureError::AuthError(format!("Failed to get authorization header: {}", e))
            })?;

        let token = token_response.token.secret();
        if token.is_empty() {
            return Err(AzureError::AuthError(
                "Failed to get authorization header: Failed to acquire token for Azure DevOps"
                    .to_string(),
            ));
        }

        Ok(format!("Bearer {}", token))
    }
}

pub fn from_config(config: &Config) -> Arc<dyn AuthProvider> {
    match (config.auth_method, config.pat.as_deref()) {
        (AuthMethod::Pat, Some(pat)) => {
            log::info!("Using personal access token authentication");
            Arc::new(PatAuth::new(pat))
        }
        (AuthMethod::Pat, None) => {
            log::warn!("Auth method is 'pat' but no PAT is configured, using azure-identity");
            Arc::new(CredentialAuth::new(Arc::new(DefaultAzureCredential::default())))
        }
        (AuthMethod::AzureCli, _) => {
            log::info!("Using Azure CLI authentication");
            Arc::new(CredentialAuth::new(Arc::new(AzureCliCredential::new())))
        }
        (AuthMethod::AzureIdentity, _) => {
            log::info!("Using Azure identity authentication");
            Arc::new(CredentialAuth::new(Arc::new(DefaultAzureCredential::default())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn pat_header_is_basic_with_empty_user() {
        let auth = PatAuth::new("my-pat");
        let header = auth.authorization_header().await.unwrap();
        // base64(":my-pat")
        assert_eq!(header, "Basic Om15LXBhdA==");
    }

    #[tokio::test]
    async fn mocked_provider_errors_surface_as_auth_errors() {
        let mut auth = MockAuthProvider::new();
        auth.expect_authorization_header()
            .times(1)
            .returning(|| Err(AzureError::AuthError("no credentials".into())));

        let err = auth.authorization_header().await.unwrap_err();
        assert!(matches!(err, AzureError::AuthError(_)));
        assert_eq!(err.to_string(), "Authentication failed: no credentials");
    }
}
