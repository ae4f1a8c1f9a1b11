//! Time log documents stored by the "timelog" extension's data service.

use crate::azure::client::{AzureDevOpsClient, AzureError};
use crate::azure::models::{TimeLogApiResponse, TimeLogEntry};
use crate::azure::users;
use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Method;
use serde::{Deserialize, Serialize};

const TIME_LOG_COLLECTION_PATH: &str = "ExtensionManagement/InstalledExtensions/timelog/time-logging-extension/Data/Scopes/Default/Current/Collections/TimeLogData/Documents";
const TIME_LOG_ACCEPT: &str = "application/json;api-version=3.1-preview.1;excludeUrls=true";
const DATE_FORMAT: &str = "%Y-%m-%d";

static RE_DATE_WEEK: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-W(0[1-9]|[1-4]\d|5[0-3])$").unwrap());

#[derive(Debug, Clone)]
pub struct CreateTimeLogOptions {
    pub minutes: u32,
    pub date: String,
    pub work_item_id: u32,
    pub log_type: String,
    pub comment: String,
}

#[derive(Debug, Clone, Default)]
pub struct ReadTimeLogOptions {
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub date_week: Option<String>,
    pub work_item_ids: Vec<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TimeLogPayload<'a> {
    minutes: u32,
    user: &'a str,
    user_id: &'a str,
    date: &'a str,
    date_week: &'a str,
    work_item_id: u32,
    #[serde(rename = "type")]
    log_type: &'a str,
    comment: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreatedDocument {
    #[serde(default)]
    id: Option<String>,
}

/// ISO-8601 week label, e.g. `2024-W01` for 2024-01-01.
pub fn iso_week_label(date: NaiveDate) -> String {
    let week = date.iso_week();
    format!("{}-W{:02}", week.year(), week.week())
}

fn parse_date(name: &str, value: &str) -> Result<NaiveDate, AzureError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
        AzureError::Validation(format!(
            "{} must be a date in YYYY-MM-DD format, got '{}'",
            name, value
        ))
    })
}

fn validate_create(options: &CreateTimeLogOptions) -> Result<NaiveDate, AzureError> {
    if options.minutes < 1 {
        return Err(AzureError::Validation(
            "Minutes must be a positive number".to_string(),
        ));
    }
    if options.date.trim().is_empty() {
        return Err(AzureError::Validation("Date is required".to_string()));
    }
    if options.work_item_id == 0 {
        return Err(AzureError::Validation("Work item ID is required".to_string()));
    }
    if options.log_type.trim().is_empty() {
        return Err(AzureError::Validation("Type is required".to_string()));
    }
    if options.comment.trim().is_empty() {
        return Err(AzureError::Validation("Comment is required".to_string()));
    }
    parse_date("date", &options.date)
}

pub async fn create_time_log(
    client: &AzureDevOpsClient,
    options: &CreateTimeLogOptions,
) -> Result<TimeLogEntry, AzureError> {
    let date = validate_create(options)?;
    let date_str = date.format(DATE_FORMAT).to_string();
    let date_week = iso_week_label(date);

    let profile = users::get_me(client)
        .await
        .map_err(|e| e.context("Failed to create time log entry"))?;

    let user = if !profile.display_name.is_empty() {
        profile.display_name.as_str()
    } else {
        client
            .config()
            .username
            .as_deref()
            .unwrap_or("Unknown User")
    };
    let user_id = if profile.id.is_empty() {
        "Unknown User ID"
    } else {
        profile.id.as_str()
    };

    let payload = TimeLogPayload {
        minutes: options.minutes,
        user,
        user_id,
        date: &date_str,
        date_week: &date_week,
        work_item_id: options.work_item_id,
        log_type: &options.log_type,
        comment: &options.comment,
    };

    log::info!(
        "Creating time log entry: {} minutes on work item {} ({})",
        payload.minutes,
        payload.work_item_id,
        payload.date
    );

    let url = client.org_url_for(TIME_LOG_COLLECTION_PATH);
    let created: CreatedDocument = client
        .send(
            Method::POST,
            &url,
            Some(&payload),
            "application/json",
            Some(TIME_LOG_ACCEPT),
        )
        .await
        .map_err(|e| e.context("Failed to create time log entry"))?;

    Ok(TimeLogEntry {
        id: created.id.unwrap_or_else(|| "unknown".to_string()),
        minutes: f64::from(payload.minutes),
        user: payload.user.to_string(),
        user_id: payload.user_id.to_string(),
        date: date_str.clone(),
        date_week: date_week.clone(),
        work_item_id: payload.work_item_id,
        log_type: payload.log_type.to_string(),
        comment: payload.comment.to_string(),
    })
}

fn validate_read(options: &ReadTimeLogOptions) -> Result<(), AzureError> {
    let from = options
        .date_from
        .as_deref()
        .map(|d| parse_date("dateFrom", d))
        .transpose()?;
    let to = options
        .date_to
        .as_deref()
        .map(|d| parse_date("dateTo", d))
        .transpose()?;
    if let (Some(from), Some(to)) = (from, to)
        && from > to
    {
        return Err(AzureError::Validation(
            "dateFrom must not be after dateTo".to_string(),
        ));
    }
    if let Some(week) = &options.date_week
        && !RE_DATE_WEEK.is_match(week.trim())
    {
        return Err(AzureError::Validation(format!(
            "dateWeek must be in YYYY-Www format, got '{}'",
            week
        )));
    }
    Ok(())
}

fn entry_date(entry: &TimeLogEntry) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(entry.date.trim(), DATE_FORMAT).ok()
}

/// Applies the read filters and sorts the newest entries first. Dates are
/// compared as calendar dates; entries with an unreadable date never match a
/// date range.
pub fn filter_entries(
    entries: Vec<TimeLogEntry>,
    user_id: Option<&str>,
    options: &ReadTimeLogOptions,
) -> Vec<TimeLogEntry> {
    let bound = |value: &Option<String>| {
        value
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d.trim(), DATE_FORMAT).ok())
    };
    let date_from = bound(&options.date_from);
    let date_to = bound(&options.date_to);
    let date_week = options.date_week.as_deref().map(str::trim);

    let mut filtered: Vec<TimeLogEntry> = entries
        .into_iter()
        .filter(|entry| user_id.is_none_or(|id| entry.user_id == id))
        .filter(|entry| {
            if date_from.is_none() && date_to.is_none() {
                return true;
            }
            entry_date(entry).is_some_and(|date| {
                date_from.is_none_or(|from| date >= from) && date_to.is_none_or(|to| date <= to)
            })
        })
        .filter(|entry| date_week.is_none_or(|week| entry.date_week == week))
        .filter(|entry| {
            options.work_item_ids.is_empty() || options.work_item_ids.contains(&entry.work_item_id)
        })
        .collect();

    filtered.sort_by(|a, b| {
        entry_date(b)
            .cmp(&entry_date(a))
            .then_with(|| b.date.cmp(&a.date))
    });
    filtered
}

/// Read the current user's time log entries.
pub async fn read_time_logs(
    client: &AzureDevOpsClient,
    options: &ReadTimeLogOptions,
) -> Result<Vec<TimeLogEntry>, AzureError> {
    validate_read(options)?;

    let url = client.org_url_for(TIME_LOG_COLLECTION_PATH);
    let response: TimeLogApiResponse = client
        .send(
            Method::GET,
            &url,
            None::<&String>,
            "application/json",
            Some(TIME_LOG_ACCEPT),
        )
        .await
        .map_err(|e| e.context("Failed to read time log entries"))?;

    log::info!("Retrieved {} total time log entries", response.count);

    let entries: Vec<TimeLogEntry> = response
        .value
        .into_iter()
        .filter_map(|document| match serde_json::from_value(document) {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::warn!("Skipping malformed time log document: {}", e);
                None
            }
        })
        .collect();

    let profile = users::get_me(client)
        .await
        .map_err(|e| e.context("Failed to read time log entries"))?;
    let user_id = Some(profile.id.as_str()).filter(|id| !id.is_empty());

    let filtered = filter_entries(entries, user_id, options);
    log::info!("Returning {} filtered time log entries", filtered.len());
    Ok(filtered)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, user_id: &str, date: &str, work_item_id: u32) -> TimeLogEntry {
        let parsed = NaiveDate::parse_from_str(date, DATE_FORMAT).unwrap();
        TimeLogEntry {
            id: id.to_string(),
            minutes: 30.0,
            user: "Someone".to_string(),
            user_id: user_id.to_string(),
            date: date.to_string(),
            date_week: iso_week_label(parsed),
            work_item_id,
            log_type: "Development - Project".to_string(),
            comment: "work".to_string(),
        }
    }

    fn ids(entries: &[TimeLogEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn iso_week_label_uses_iso_week_year() {
        let date = |s: &str| NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap();
        assert_eq!(iso_week_label(date("2024-01-01")), "2024-W01");
        assert_eq!(iso_week_label(date("2024-03-15")), "2024-W11");
        assert_eq!(iso_week_label(date("2024-12-30")), "2025-W01");
        assert_eq!(iso_week_label(date("2021-01-03")), "2020-W53");
    }

    #[test]
    fn create_validation_rejects_missing_values() {
        let valid = CreateTimeLogOptions {
            minutes: 15,
            date: "2024-05-02".into(),
            work_item_id: 7,
            log_type: "Meeting".into(),
            comment: "standup".into(),
        };
        assert!(validate_create(&valid).is_ok());

        let cases = [
            (CreateTimeLogOptions { minutes: 0, ..valid.clone() }, "Minutes must be a positive number"),
            (CreateTimeLogOptions { date: "".into(), ..valid.clone() }, "Date is required"),
            (CreateTimeLogOptions { work_item_id: 0, ..valid.clone() }, "Work item ID is required"),
            (CreateTimeLogOptions { comment: " ".into(), ..valid.clone() }, "Comment is required"),
            (CreateTimeLogOptions { date: "02/05/2024".into(), ..valid.clone() }, "date must be a date in YYYY-MM-DD format"),
        ];
        for (options, expected) in cases {
            let err = validate_create(&options).unwrap_err();
            assert!(
                err.to_string().contains(expected),
                "expected '{}' in '{}'",
                expected,
                err
            );
        }
    }

    #[test]
    fn read_validation_checks_formats_and_range() {
        let ok = ReadTimeLogOptions {
            date_from: Some("2024-01-01".into()),
            date_to: Some("2024-01-31".into()),
            date_week: Some("2024-W05".into()),
            work_item_ids: vec![],
        };
        assert!(validate_read(&ok).is_ok());

        let reversed = ReadTimeLogOptions {
            date_from: Some("2024-02-01".into()),
            date_to: Some("2024-01-01".into()),
            ..Default::default()
        };
        assert!(matches!(validate_read(&reversed), Err(AzureError::Validation(_))));

        let bad_week = ReadTimeLogOptions {
            date_week: Some("2024-W60".into()),
            ..Default::default()
        };
        assert!(matches!(validate_read(&bad_week), Err(AzureError::Validation(_))));
    }

    #[test]
    fn entries_are_filtered_to_the_user_and_sorted_newest_first() {
        let entries = vec![
            entry("a", "me", "2024-01-02", 1),
            entry("b", "other", "2024-01-03", 1),
            entry("c", "me", "2024-01-10", 2),
            entry("d", "me", "2024-01-05", 1),
        ];

        let all_mine = filter_entries(entries.clone(), Some("me"), &ReadTimeLogOptions::default());
        assert_eq!(ids(&all_mine), vec!["c", "d", "a"]);

        let everyone = filter_entries(entries, None, &ReadTimeLogOptions::default());
        assert_eq!(everyone.len(), 4);
    }

    #[test]
    fn unpadded_range_bounds_match_padded_entry_dates() {
        let entries = vec![
            entry("a", "me", "2024-03-04", 1),
            entry("b", "me", "2024-03-10", 1),
            entry("c", "me", "2024-03-21", 1),
        ];
        let range = ReadTimeLogOptions {
            date_from: Some("2024-3-5".into()),
            date_to: Some("2024-3-20".into()),
            ..Default::default()
        };
        assert!(validate_read(&range).is_ok());
        assert_eq!(ids(&filter_entries(entries, Some("me"), &range)), vec!["b"]);
    }

    #[test]
    fn date_range_is_inclusive_and_combines_with_other_filters() {
        let entries = vec![
            entry("a", "me", "2024-01-01", 1),
            entry("b", "me", "2024-01-08", 1),
            entry("c", "me", "2024-01-09", 2),
            entry("d", "me", "2024-01-15", 1),
        ];

        let range = ReadTimeLogOptions {
            date_from: Some("2024-01-08".into()),
            date_to: Some("2024-01-15".into()),
            ..Default::default()
        };
        assert_eq!(ids(&filter_entries(entries.clone(), Some("me"), &range)), vec!["d", "c", "b"]);

        let week_and_item = ReadTimeLogOptions {
            date_week: Some("2024-W02".into()),
            work_item_ids: vec![1],
            ..Default::default()
        };
        assert_eq!(ids(&filter_entries(entries, Some("me"), &week_and_item)), vec!["b"]);
    }
}
