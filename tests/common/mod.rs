#![allow(dead_code)]

use mcp_for_azure_devops_timelogs::azure::auth::PatAuth;
use mcp_for_azure_devops_timelogs::azure::client::AzureDevOpsClient;
use mcp_for_azure_devops_timelogs::config::{Config, Settings};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const PROJECT: &str = "Web";
pub const USERNAME: &str = "ada@contoso.com";
/// `Basic base64(":pat")`
pub const AUTH_HEADER: &str = "Basic OnBhdA==";

pub fn client_for(server: &MockServer) -> AzureDevOpsClient {
    client_with(server, Some(USERNAME))
}

pub fn client_with(server: &MockServer, username: Option<&str>) -> AzureDevOpsClient {
    let config = Config::try_from(Settings {
        org_url: Some(server.uri()),
        username: username.map(str::to_string),
        default_project: Some(PROJECT.to_string()),
        ..Default::default()
    })
    .unwrap();
    AzureDevOpsClient::with_auth(config, Arc::new(PatAuth::new("pat")))
}

/// Answers the identity lookup for [`USERNAME`].
pub async fn mount_identity(server: &MockServer, id: &str, display_name: &str) {
    Mock::given(method("GET"))
        .and(path("/_apis/identities"))
        .and(query_param("searchFilter", "AccountName"))
        .and(query_param("filterValue", USERNAME))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 1,
            "value": [{
                "id": id,
                "providerDisplayName": display_name,
                "properties": {
                    "Mail": { "$type": "System.String", "$value": USERNAME }
                }
            }]
        })))
        .mount(server)
        .await;
}

pub fn work_item_json(id: u32, title: &str) -> serde_json::Value {
    json!({
        "id": id,
        "rev": 1,
        "fields": {
            "System.Id": id,
            "System.Title": title,
            "System.State": "Active"
        },
        "url": format!("https://dev.azure.com/contoso/_apis/wit/workItems/{}", id)
    })
}
