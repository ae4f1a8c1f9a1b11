use crate::azure::client::{AzureDevOpsClient, AzureError};
use crate::azure::models::{
    JsonPatchOperation, WiqlQuery, WiqlResponse, WorkItem, WorkItemExpand, WorkItemListResponse,
    WorkItemRelation,
};
use crate::azure::wiql;
use futures::future::try_join_all;
use reqwest::Method;
use serde_json::{Map, Value, json};

pub const DEFAULT_TOP: usize = 200;
const BATCH_SIZE: usize = 200;
const LIST_FIELDS: [&str; 4] = [
    "System.Id",
    "System.Title",
    "System.State",
    "System.AssignedTo",
];
const PARENT_LINK_TYPE: &str = "System.LinkTypes.Hierarchy-Reverse";

#[derive(Debug, Clone, Default)]
pub struct ListWorkItemsOptions {
    pub project: String,
    pub team: Option<String>,
    pub query_id: Option<String>,
    pub wiql: Option<String>,
    pub top: Option<usize>,
    pub skip: Option<usize>,
}

/// Field values for create and update. Absent values produce no patch operation.
#[derive(Debug, Clone, Default)]
pub struct WorkItemFields {
    pub title: Option<String>,
    pub description: Option<String>,
    pub assigned_to: Option<String>,
    pub area_path: Option<String>,
    pub iteration_path: Option<String>,
    pub priority: Option<u32>,
    pub state: Option<String>,
    pub original_estimate: Option<f64>,
    pub additional_fields: Map<String, Value>,
}

impl WorkItemFields {
    pub fn to_patch(&self) -> Vec<JsonPatchOperation> {
        let mut ops = Vec::new();
        let mut push = |field: &str, value: Value| ops.push(JsonPatchOperation::add_field(field, value));

        if let Some(title) = &self.title {
            push("System.Title", json!(title));
        }
        if let Some(description) = &self.description {
            push("System.Description", json!(description));
        }
        if let Some(assigned_to) = &self.assigned_to {
            push("System.AssignedTo", json!(assigned_to));
        }
        if let Some(area_path) = &self.area_path {
            push("System.AreaPath", json!(area_path));
        }
        if let Some(iteration_path) = &self.iteration_path {
            push("System.IterationPath", json!(iteration_path));
        }
        if let Some(priority) = self.priority {
            push("Microsoft.VSTS.Common.Priority", json!(priority));
        }
        if let Some(state) = &self.state {
            push("System.State", json!(state));
        }
        if let Some(estimate) = self.original_estimate {
            push("Microsoft.VSTS.Scheduling.OriginalEstimate", json!(estimate));
        }
        for (field, value) in &self.additional_fields {
            push(field, value.clone());
        }

        ops
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOperation {
    Add,
    Remove,
    Update,
}

#[derive(Debug, Clone)]
pub struct LinkOptions {
    pub source_id: u32,
    pub target_id: u32,
    pub operation: LinkOperation,
    pub relation_type: String,
    pub new_relation_type: Option<String>,
    pub comment: Option<String>,
}

/// Maps friendly link names to reference names. The name describes what the
/// target is to the source, e.g. `parent` links the source to its parent.
pub fn resolve_link_type(name: &str) -> String {
    match name.trim().to_lowercase().as_str() {
        "parent" => "System.LinkTypes.Hierarchy-Reverse",
        "child" => "System.LinkTypes.Hierarchy-Forward",
        "related" => "System.LinkTypes.Related",
        "duplicate" => "System.LinkTypes.Duplicate-Forward",
        "duplicate-of" => "System.LinkTypes.Duplicate-Reverse",
        "predecessor" => "System.LinkTypes.Dependency-Reverse",
        "successor" => "System.LinkTypes.Dependency-Forward",
        _ => name.trim(),
    }
    .to_string()
}

pub fn work_item_url(client: &AzureDevOpsClient, id: u32) -> String {
    client.org_url_for(&format!("wit/workItems/{}", id))
}

fn relation_target(relation: &WorkItemRelation) -> Option<u32> {
    relation
        .url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .and_then(|segment| segment.parse().ok())
}

/// List work items of a project through a saved query, a WIQL string or the
/// default query, in that order of precedence.
pub async fn list_work_items(
    client: &AzureDevOpsClient,
    options: &ListWorkItemsOptions,
) -> Result<Vec<WorkItem>, AzureError> {
    list_work_items_unwrapped(client, options)
        .await
        .map_err(|e| e.context("Failed to list work items"))
}

async fn list_work_items_unwrapped(
    client: &AzureDevOpsClient,
    options: &ListWorkItemsOptions,
) -> Result<Vec<WorkItem>, AzureError> {
    let project = options.project.as_str();
    let team = options.team.as_deref();

    let response: WiqlResponse = if let Some(query_id) = &options.query_id {
        let path = format!(
            "wit/wiql/{}?api-version=7.1",
            urlencoding::encode(query_id)
        );
        client
            .team_request(project, team, Method::GET, &path, None::<&String>)
            .await?
    } else {
        let query = match options.wiql.as_deref().map(str::trim) {
            Some(wiql) if !wiql.is_empty() => wiql::ensure_project_scope(wiql, project),
            _ => wiql::default_wiql(project),
        };
        let body = WiqlQuery { query };
        client
            .team_request(
                project,
                team,
                Method::POST,
                "wit/wiql?api-version=7.1",
                Some(&body),
            )
            .await?
    };

    let ids: Vec<u32> = response
        .work_items
        .iter()
        .map(|reference| reference.id)
        .skip(options.skip.unwrap_or(0))
        .take(options.top.unwrap_or(DEFAULT_TOP))
        .collect();

    log::debug!(
        "Query returned {} references, fetching {}",
        response.work_items.len(),
        ids.len()
    );

    if ids.is_empty() {
        return Ok(vec![]);
    }

    get_work_items(client, project, &ids, Some(&LIST_FIELDS)).await
}

/// Fetch work items in batches; ids that no longer exist are skipped.
pub async fn get_work_items(
    client: &AzureDevOpsClient,
    project: &str,
    ids: &[u32],
    fields: Option<&[&str]>,
) -> Result<Vec<WorkItem>, AzureError> {
    if ids.is_empty() {
        return Ok(vec![]);
    }

    let requests = ids.chunks(BATCH_SIZE).map(|chunk| {
        let ids_str = chunk
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let mut path = format!("wit/workitems?ids={}&errorPolicy=omit", ids_str);
        if let Some(fields) = fields {
            path.push_str(&format!("&fields={}", fields.join(",")));
        }
        path.push_str("&api-version=7.1");
        async move { client.get::<WorkItemListResponse>(project, &path).await }
    });

    let responses = try_join_all(requests).await?;
    Ok(responses
        .into_iter()
        .flat_map(|response| response.value.into_iter().flatten())
        .collect())
}

pub async fn get_work_item(
    client: &AzureDevOpsClient,
    id: u32,
    expand: WorkItemExpand,
) -> Result<WorkItem, AzureError> {
    let path = format!(
        "wit/workitems/{}?$expand={}&api-version=7.1",
        id,
        expand.as_str()
    );
    client.org_get(&path).await.map_err(|e| match e {
        AzureError::NotFound(_) => AzureError::NotFound(format!("Work item '{}' not found", id)),
        other => other.context("Failed to get work item"),
    })
}

pub async fn create_work_item(
    client: &AzureDevOpsClient,
    project: &str,
    work_item_type: &str,
    fields: &WorkItemFields,
    parent_id: Option<u32>,
) -> Result<WorkItem, AzureError> {
    if fields.title.as_deref().is_none_or(|t| t.trim().is_empty()) {
        return Err(AzureError::Validation("Title is required".to_string()));
    }
    if work_item_type.eq_ignore_ascii_case("Task") && fields.original_estimate.is_none() {
        return Err(AzureError::Validation(
            "originalEstimate is required when workItemType is \"Task\"".to_string(),
        ));
    }

    let mut operations = fields.to_patch();
    if let Some(parent_id) = parent_id {
        log::info!("Linking new {} to parent {}", work_item_type, parent_id);
        operations.push(JsonPatchOperation::add(
            "/relations/-",
            json!({
                "rel": PARENT_LINK_TYPE,
                "url": work_item_url(client, parent_id),
            }),
        ));
    }

    let path = format!(
        "wit/workitems/${}?api-version=7.1",
        urlencoding::encode(work_item_type)
    );
    client
        .post_patch(project, &path, &operations)
        .await
        .map_err(|e| e.context("Failed to create work item"))
}

pub async fn update_work_item(
    client: &AzureDevOpsClient,
    id: u32,
    fields: &WorkItemFields,
) -> Result<WorkItem, AzureError> {
    let operations = fields.to_patch();
    if operations.is_empty() {
        return Err(AzureError::Validation(
            "At least one field must be provided for update".to_string(),
        ));
    }

    let path = format!("wit/workitems/{}?api-version=7.1", id);
    client
        .org_patch_patch(&path, &operations)
        .await
        .map_err(|e| e.context("Failed to update work item"))
}

/// Add, remove or retype a link between two work items.
pub async fn manage_work_item_link(
    client: &AzureDevOpsClient,
    options: &LinkOptions,
) -> Result<WorkItem, AzureError> {
    let relation_type = resolve_link_type(&options.relation_type);
    let new_relation_type = match (options.operation, options.new_relation_type.as_deref()) {
        (LinkOperation::Update, None) => {
            return Err(AzureError::Validation(
                "newRelationType is required for the update operation".to_string(),
            ));
        }
        (LinkOperation::Update, Some(new_type)) => Some(resolve_link_type(new_type)),
        _ => None,
    };

    let mut operations = Vec::new();
    match options.operation {
        LinkOperation::Add => {
            let mut relation = json!({
                "rel": relation_type,
                "url": work_item_url(client, options.target_id),
            });
            if let Some(comment) = &options.comment {
                relation["attributes"] = json!({ "comment": comment });
            }
            operations.push(JsonPatchOperation::add("/relations/-", relation));
        }
        LinkOperation::Remove | LinkOperation::Update => {
            let source = get_work_item(client, options.source_id, WorkItemExpand::Relations)
                .await
                .map_err(|e| e.context("Failed to manage work item link"))?;

            let (index, existing) = source
                .relations
                .iter()
                .flatten()
                .enumerate()
                .find(|(_, relation)| {
                    relation.rel.eq_ignore_ascii_case(&relation_type)
                        && relation_target(relation) == Some(options.target_id)
                })
                .ok_or_else(|| {
                    AzureError::NotFound(format!(
                        "No '{}' link from work item {} to {}",
                        relation_type, options.source_id, options.target_id
                    ))
                })?;

            operations.push(JsonPatchOperation::remove(format!("/relations/{}", index)));

            if let Some(new_type) = new_relation_type {
                let mut relation = json!({ "rel": new_type, "url": existing.url });
                match (&options.comment, &existing.attributes) {
                    (Some(comment), _) => relation["attributes"] = json!({ "comment": comment }),
                    (None, Some(attributes)) => {
                        if let Some(comment) = attributes.get("comment") {
                            relation["attributes"] = json!({ "comment": comment });
                        }
                    }
                    (None, None) => {}
                }
                operations.push(JsonPatchOperation::add("/relations/-", relation));
            }
        }
    }

    let path = format!("wit/workitems/{}?api-version=7.1", options.source_id);
    client
        .org_patch_patch(&path, &operations)
        .await
        .map_err(|e| e.context("Failed to manage work item link"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn original_estimate_is_only_patched_when_present() {
        let mut fields = WorkItemFields {
            title: Some("Test Task".into()),
            ..Default::default()
        };
        let paths: Vec<String> = fields.to_patch().into_iter().map(|op| op.path).collect();
        assert_eq!(paths, vec!["/fields/System.Title"]);

        fields.original_estimate = Some(8.0);
        let ops = fields.to_patch();
        let estimate = ops
            .iter()
            .find(|op| op.path == "/fields/Microsoft.VSTS.Scheduling.OriginalEstimate")
            .unwrap();
        assert_eq!(estimate.op, "add");
        assert_eq!(estimate.value, Some(json!(8.0)));
    }

    #[test]
    fn additional_fields_become_field_operations() {
        let mut additional_fields = Map::new();
        additional_fields.insert(
            "Microsoft.VSTS.Common.AcceptanceCriteria".into(),
            json!("<p>done</p>"),
        );
        let fields = WorkItemFields {
            state: Some("Active".into()),
            priority: Some(2),
            additional_fields,
            ..Default::default()
        };

        let ops = serde_json::to_value(fields.to_patch()).unwrap();
        assert_eq!(
            ops,
            json!([
                { "op": "add", "path": "/fields/Microsoft.VSTS.Common.Priority", "value": 2 },
                { "op": "add", "path": "/fields/System.State", "value": "Active" },
                { "op": "add", "path": "/fields/Microsoft.VSTS.Common.AcceptanceCriteria", "value": "<p>done</p>" },
            ])
        );
    }

    #[test]
    fn friendly_link_names_resolve_to_reference_names() {
        assert_eq!(resolve_link_type("Parent"), PARENT_LINK_TYPE);
        assert_eq!(
            resolve_link_type("child"),
            "System.LinkTypes.Hierarchy-Forward"
        );
        assert_eq!(
            resolve_link_type("Microsoft.VSTS.Common.TestedBy-Forward"),
            "Microsoft.VSTS.Common.TestedBy-Forward"
        );
    }

    #[test]
    fn relation_target_reads_trailing_id() {
        let relation = WorkItemRelation {
            rel: "System.LinkTypes.Related".into(),
            url: "https://dev.azure.com/org/_apis/wit/workItems/42".into(),
            attributes: None,
        };
        assert_eq!(relation_target(&relation), Some(42));

        let attachment = WorkItemRelation {
            rel: "AttachedFile".into(),
            url: "https://dev.azure.com/org/_apis/wit/attachments/abc-def".into(),
            attributes: None,
        };
        assert_eq!(relation_target(&attachment), None);
    }
}
