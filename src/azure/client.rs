use crate::azure::auth::{self, AuthProvider};
use crate::config::{Config, ConfigError};
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use thiserror::Error;

const JSON_CONTENT_TYPE: &str = "application/json";
const JSON_PATCH_CONTENT_TYPE: &str = "application/json-patch+json";

#[derive(Error, Debug)]
pub enum AzureError {
    #[error("Authentication failed: {0}")]
    AuthError(String),
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("JSON parsing failed: {0}")]
    SerdeJson(#[from] serde_json::Error),
    #[error("Resource not found: {0}")]
    NotFound(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Failed(String),
}

impl AzureError {
    /// Maps a non-success response to the matching error kind.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let message = extract_message(body).unwrap_or_else(|| {
            if body.trim().is_empty() {
                format!("HTTP {}", status)
            } else {
                body.to_string()
            }
        });

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AzureError::AuthError(message),
            StatusCode::NOT_FOUND => AzureError::NotFound(message),
            _ => AzureError::ApiError {
                status: status.as_u16(),
                message,
            },
        }
    }

    /// Prefixes generic failures with the action that failed. Errors that
    /// already carry a precise kind pass through untouched.
    pub fn context(self, action: &str) -> Self {
        match self {
            AzureError::AuthError(_)
            | AzureError::NotFound(_)
            | AzureError::Validation(_)
            | AzureError::Config(_) => self,
            AzureError::ApiError { message, .. }
                if message.contains("does not exist") || message.contains("not found") =>
            {
                AzureError::NotFound(message)
            }
            AzureError::ApiError { message, .. } if message.contains("Unauthorized") => {
                AzureError::AuthError(message)
            }
            other => AzureError::Failed(format!("{}: {}", action, other)),
        }
    }
}

fn extract_message(body: &str) -> Option<String> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()?
        .get("message")?
        .as_str()
        .map(str::to_string)
}

pub struct AzureDevOpsClient {
    client: Client,
    auth: Arc<dyn AuthProvider>,
    config: Config,
}

impl AzureDevOpsClient {
    pub fn new(config: Config) -> Self {
        let auth = auth::from_config(&config);
        Self::with_auth(config, auth)
    }

    pub fn with_auth(config: Config, auth: Arc<dyn AuthProvider>) -> Self {
        Self {
            client: Client::new(),
            auth,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn org_url(&self) -> &str {
        &self.config.org_url
    }

    pub fn org_url_for(&self, path: &str) -> String {
        format!("{}/_apis/{}", self.config.org_url, path)
    }

    pub fn project_url_for(&self, project: &str, team: Option<&str>, path: &str) -> String {
        match team {
            Some(team) => format!(
                "{}/{}/{}/_apis/{}",
                self.config.org_url,
                urlencoding::encode(project),
                urlencoding::encode(team),
                path
            ),
            None => format!(
                "{}/{}/_apis/{}",
                self.config.org_url,
                urlencoding::encode(project),
                path
            ),
        }
    }

    /// Sends a request to an absolute URL and decodes the JSON response.
    pub async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        body: Option<&(impl Serialize + ?Sized)>,
        content_type: &str,
        accept: Option<&str>,
    ) -> Result<T, AzureError> {
        let auth_header = self.auth.authorization_header().await?;

        log::debug!("Request: {} {}", method, url);
        if let Some(b) = &body
            && let Ok(json) = serde_json::to_string_pretty(b)
        {
            log::debug!("Request body: {}", json);
        }

        let mut request = self
            .client
            .request(method, url)
            .header(reqwest::header::AUTHORIZATION, auth_header)
            .header(reqwest::header::CONTENT_TYPE, content_type);

        if let Some(accept) = accept {
            request = request.header(reqwest::header::ACCEPT, accept);
        }

        if let Some(b) = body {
            request = request.body(serde_json::to_vec(b)?);
        }

        let response = request.send().await?;
        let status = response.status();

        log::debug!("Response status: {}", status);

        if !status.is_success() {
            let error_text = response.text().await?;
            log::debug!("Error response: {}", error_text);
            return Err(AzureError::from_response(status, &error_text));
        }

        let response_text = response.text().await?;
        log::debug!("Response body: {}", response_text);

        let data = serde_json::from_str(&response_text)?;
        Ok(data)
    }

    /// Make a request at the organization level (not project-scoped)
    pub async fn org_request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&(impl Serialize + ?Sized)>,
    ) -> Result<T, AzureError> {
        let url = self.org_url_for(path);
        self.send(method, &url, body, JSON_CONTENT_TYPE, None).await
    }

    pub async fn request<T: DeserializeOwned>(
        &self,
        project: &str,
        method: Method,
        path: &str,
        body: Option<&(impl Serialize + ?Sized)>,
    ) -> Result<T, AzureError> {
        let url = self.project_url_for(project, None, path);
        self.send(method, &url, body, JSON_CONTENT_TYPE, None).await
    }

    /// Make a request at the team level when a team is given, else at the project level
    /// URL format: {org_url}/{project}/{team}/_apis/{path}
    pub async fn team_request<T: DeserializeOwned>(
        &self,
        project: &str,
        team: Option<&str>,
        method: Method,
        path: &str,
        body: Option<&(impl Serialize + ?Sized)>,
    ) -> Result<T, AzureError> {
        let url = self.project_url_for(project, team, path);
        self.send(method, &url, body, JSON_CONTENT_TYPE, None).await
    }

    pub async fn org_get<T: DeserializeOwned>(&self, path: &str) -> Result<T, AzureError> {
        self.org_request(Method::GET, path, None::<&String>).await
    }

    pub async fn get<T: DeserializeOwned>(&self, project: &str, path: &str) -> Result<T, AzureError> {
        self.request(project, Method::GET, path, None::<&String>)
            .await
    }

    pub async fn post_patch<T: DeserializeOwned>(
        &self,
        project: &str,
        path: &str,
        body: &(impl Serialize + ?Sized),
    ) -> Result<T, AzureError> {
        let url = self.project_url_for(project, None, path);
        self.send(Method::POST, &url, Some(body), JSON_PATCH_CONTENT_TYPE, None)
            .await
    }

    /// JSON-patch request at the organization level; work item ids are org-wide.
    pub async fn org_patch_patch<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &(impl Serialize + ?Sized),
    ) -> Result<T, AzureError> {
        let url = self.org_url_for(path);
        self.send(Method::PATCH, &url, Some(body), JSON_PATCH_CONTENT_TYPE, None)
            .await
    }
}
