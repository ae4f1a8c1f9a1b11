use serde_json::Value;

// Columns produced by list_work_items, in output order
const ALL_FIELDS: [&str; 4] = ["id", "Title", "State", "AssignedTo"];

/// Converts work items JSON to CSV format with dynamic column detection.
/// Only includes columns that have at least one non-null value across all items.
pub fn work_items_to_csv(json_value: &Value) -> Result<String, String> {
    // Normalize input to array
    let items = match json_value {
        Value::Array(arr) => arr.as_slice(),
        Value::Object(_) => std::slice::from_ref(json_value),
        _ => return Err("Invalid input: expected object or array".to_string()),
    };

    if items.is_empty() {
        return Ok(String::new());
    }

    // Detect which fields actually have values
    let active_fields: Vec<&str> = ALL_FIELDS
        .iter()
        .copied()
        .filter(|field| {
            items.iter().any(|item| {
                item.get(field)
                    .map(|v| !v.is_null() && v.as_str().is_none_or(|s| !s.is_empty()))
                    .unwrap_or(false)
            })
        })
        .collect();

    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(&active_fields)
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    for item in items {
        let row: Vec<String> = active_fields
            .iter()
            .map(|field| {
                item.get(*field)
                    .and_then(|v| match v {
                        Value::String(s) => {
                            // Escape newlines and tabs for better LLM consumption
                            let escaped = s
                                .replace('\n', "\\n")
                                .replace('\t', "\\t")
                                .replace('\r', ""); // Remove carriage returns entirely
                            Some(escaped)
                        }
                        Value::Number(n) => Some(n.to_string()),
                        Value::Bool(b) => Some(b.to_string()),
                        _ => None,
                    })
                    .unwrap_or_default()
            })
            .collect();

        wtr.write_record(&row)
            .map_err(|e| format!("Failed to write CSV row: {}", e))?;
    }

    wtr.flush()
        .map_err(|e| format!("Failed to flush CSV writer: {}", e))?;

    let csv_bytes = wtr
        .into_inner()
        .map_err(|e| format!("Failed to get CSV bytes: {}", e))?;

    String::from_utf8(csv_bytes).map_err(|e| format!("Failed to convert CSV to string: {}", e))
}
