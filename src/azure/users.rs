use crate::azure::client::{AzureDevOpsClient, AzureError};
use crate::azure::models::{IdentityListResponse, UserProfile};

/// Get the identity behind the configured account name.
pub async fn get_me(client: &AzureDevOpsClient) -> Result<UserProfile, AzureError> {
    let username = client.config().username.as_deref().ok_or_else(|| {
        AzureError::Failed(
            "Failed to get user information: AZURE_DEVOPS_USERNAME is not configured".to_string(),
        )
    })?;

    let path = format!(
        "identities?searchFilter=AccountName&filterValue={}&api-version=6.0",
        urlencoding::encode(username)
    );

    let response: IdentityListResponse = client
        .org_get(&path)
        .await
        .map_err(|e| e.context("Failed to get user information"))?;

    let identity = response
        .value
        .into_iter()
        .next()
        .ok_or_else(|| AzureError::Failed("No user data found in response".to_string()))?;

    let email = identity
        .properties
        .get("Mail")
        .and_then(|p| p.value.as_ref())
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();

    Ok(UserProfile {
        id: identity.id.unwrap_or_default(),
        display_name: identity.provider_display_name.unwrap_or_default(),
        email,
    })
}
