use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

// Static regex patterns for text cleaning (compiled once, reused many times)
static RE_SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r" +").unwrap());
static RE_NEWLINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n+").unwrap());
static RE_LEADING_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n[ ]+").unwrap());
static RE_TRAILING_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ ]+\n").unwrap());
static RE_DASHES: Lazy<Regex> = Lazy::new(|| Regex::new(r"-{3,}\n").unwrap());
static RE_IMAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\[image\]").unwrap());

const FIELD_PREFIXES: [&str; 5] = [
    "System.",
    "Microsoft.VSTS.Common.",
    "Microsoft.VSTS.Scheduling.",
    "Microsoft.VSTS.CMMI.",
    "Microsoft.VSTS.TCM.",
];

const SKIPPED_FIELDS: [&str; 8] = [
    "BoardColumnDone",
    "Column.Done",
    "CommentCount",
    "Rev",
    "Watermark",
    "AuthorizedAs",
    "AuthorizedDate",
    "PersonId",
];

const HTML_FIELDS: [&str; 5] = [
    "Acceptance",
    "Description",
    "History",
    "ReproSteps",
    "Justification",
];

/// Recursively simplifies the JSON output to reduce token usage for LLMs.
/// It removes "_links", "url", "descriptor", "imageUrl", "avatar" and simplifies field names.
/// It also flattens the "fields" object to the root level, collapses identities
/// to `Name <unique name>` and reduces relations to their type and target.
pub fn simplify_work_item_json(value: &mut Value) {
    match value {
        Value::Object(map) => {
            if let Some(Value::Array(relations)) = map.get_mut("relations") {
                for relation in relations.iter_mut() {
                    simplify_relation(relation);
                }
            }

            // Remove unnecessary fields at the top level and in nested objects
            map.remove("url");
            map.remove("_links");
            map.remove("descriptor");
            map.remove("imageUrl");
            map.remove("avatar");

            // Process "fields" if present (specific to Work Items)
            if let Some(Value::Object(fields_map)) = map.remove("fields") {
                let mut simplified_fields = Map::new();

                for (key, mut val) in fields_map {
                    // Simplify Identity fields (objects with displayName, uniqueName, etc.)
                    if let Value::Object(ref obj) = val
                        && let Some(Value::String(name)) = obj.get("displayName")
                    {
                        let mut display_value = name.clone();
                        if let Some(Value::String(unique_name)) = obj.get("uniqueName")
                            && !unique_name.is_empty()
                        {
                            display_value = format!("{} <{}>", name, unique_name);
                        }
                        val = Value::String(display_value);
                    }

                    let short_key = short_field_name(&key);
                    if SKIPPED_FIELDS.contains(&short_key.as_str()) {
                        continue;
                    }

                    let final_key = match short_key.as_str() {
                        "BoardColumn" => "Column".to_string(),
                        "BoardLane" => "Lane".to_string(),
                        "AcceptanceCriteria" => "Acceptance".to_string(),
                        "TeamProject" => "Project".to_string(),
                        "WorkItemType" => "Type".to_string(),
                        "IterationPath" => "Iteration".to_string(),
                        _ => short_key,
                    };

                    if HTML_FIELDS.contains(&final_key.as_str())
                        && let Value::String(html_content) = &val
                        && let Some(text) = html_to_text(html_content)
                    {
                        val = Value::String(text);
                    }

                    // Optimize Tags field by removing spaces after semicolons
                    if final_key == "Tags"
                        && let Value::String(tags) = &val
                    {
                        val = Value::String(tags.replace("; ", ";"));
                    }

                    // Only insert if not already present (prefer existing values)
                    if !simplified_fields.contains_key(&final_key) {
                        simplified_fields.insert(final_key, val);
                    }
                }

                // Flatten: move all simplified fields to the root level
                for (k, v) in simplified_fields {
                    map.entry(k).or_insert(v);
                }
            }

            // Recursively process all remaining values
            for (_, v) in map.iter_mut() {
                simplify_work_item_json(v);
            }
        }
        Value::Array(arr) => {
            // Recursively process all array elements
            for item in arr.iter_mut() {
                simplify_work_item_json(item);
            }
        }
        _ => {}
    }
}

fn short_field_name(key: &str) -> String {
    if let Some(stripped) = FIELD_PREFIXES.iter().find_map(|p| key.strip_prefix(p)) {
        return stripped.to_string();
    }
    // Handle dynamic WEF_..._Kanban.Column / Lane
    if key.contains("_Kanban.Column") {
        if key.ends_with(".Done") {
            "Column.Done".to_string()
        } else {
            "Column".to_string()
        }
    } else if key.contains("_Kanban.Lane") {
        "Lane".to_string()
    } else {
        key.to_string()
    }
}

/// Replaces a relation's `url` with the id of the linked work item, or keeps
/// the url as `target` for non work item links (attachments, hyperlinks).
fn simplify_relation(relation: &mut Value) {
    let Value::Object(map) = relation else {
        return;
    };
    let Some(Value::String(url)) = map.remove("url") else {
        return;
    };

    let target = url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .and_then(|segment| segment.parse::<u64>().ok())
        .map_or_else(|| Value::String(url.clone()), Value::from);
    map.insert("target".to_string(), target);

    if let Some(Value::Object(attributes)) = map.get_mut("attributes") {
        attributes.retain(|k, v| matches!(k.as_str(), "comment" | "name") && !v.is_null());
        if attributes.is_empty() {
            map.remove("attributes");
        }
    }
}

fn html_to_text(html_content: &str) -> Option<String> {
    // Convert HTML to plain text, width doesn't matter as we don't need wrapping
    let mut plain_text = html2text::from_read(html_content.as_bytes(), usize::MAX).ok()?;

    plain_text = plain_text.replace('\r', "\n");
    plain_text = plain_text.replace('\t', " ");
    plain_text = plain_text.replace('─', "-");
    plain_text = RE_SPACES.replace_all(&plain_text, " ").to_string();
    plain_text = RE_NEWLINES.replace_all(&plain_text, "\n").to_string();
    plain_text = RE_LEADING_WS.replace_all(&plain_text, "\n").to_string();
    plain_text = RE_TRAILING_WS.replace_all(&plain_text, "\n").to_string();
    // Collapse 3+ dashes followed by newline to just 3 dashes + newline
    plain_text = RE_DASHES.replace_all(&plain_text, "---\n").to_string();
    plain_text = RE_IMAGE.replace_all(&plain_text, "").to_string();

    Some(plain_text.trim().to_string())
}
