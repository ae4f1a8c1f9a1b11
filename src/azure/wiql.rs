//! Scoping of user-supplied WIQL queries to a single project.
//!
//! Queries coming from an agent are arbitrary and may be malformed, so the
//! rewrite works on the raw text: clause keywords are located with regexes on
//! a copy of the query whose string literals (and, for keywords, bracketed
//! field names) are blanked out, and the original text is sliced at the same
//! byte offsets.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_PROJECT_CONSTRAINT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\[System\.TeamProject\]\s*=").unwrap());
static RE_TRAILING_CLAUSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*\b(ORDER\s+BY|GROUP\s+BY|ASOF|MODE)\b").unwrap());
static RE_WHERE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bWHERE\b").unwrap());

/// Query used when the caller provides neither a WIQL string nor a saved query.
pub fn default_wiql(project: &str) -> String {
    format!(
        "SELECT [System.Id] FROM WorkItems WHERE {} ORDER BY [System.Id]",
        project_predicate(project)
    )
}

/// Returns `wiql` constrained to `project`.
///
/// Queries that already compare `[System.TeamProject]` are returned as-is,
/// which makes the rewrite idempotent. Otherwise the predicate is put in
/// front of the existing WHERE condition (wrapped in parentheses so `OR`
/// terms stay scoped), or a WHERE clause is added. Trailing `GROUP BY`,
/// `ORDER BY`, `ASOF` and `MODE` clauses are moved back after the condition
/// in their original order.
pub fn ensure_project_scope(wiql: &str, project: &str) -> String {
    if RE_PROJECT_CONSTRAINT.is_match(&mask(wiql, false)) {
        return wiql.to_string();
    }

    let masked = mask(wiql, true);
    let split_at = RE_TRAILING_CLAUSE
        .find(&masked)
        .map_or(wiql.len(), |m| m.start());
    let (body, trailing) = wiql.split_at(split_at);

    let predicate = project_predicate(project);
    let rewritten = match RE_WHERE.find(&masked[..split_at]) {
        Some(m) => {
            let (before_where, condition) = body.split_at(m.end());
            let condition = condition.trim();
            if condition.is_empty() {
                format!("{} {}", before_where, predicate)
            } else {
                format!("{} {} AND ({})", before_where, predicate, condition)
            }
        }
        None => {
            let body = body.trim();
            if body.is_empty() {
                format!("WHERE {}", predicate)
            } else {
                format!("{} WHERE {}", body, predicate)
            }
        }
    };

    // a clause glued to a closing paren still needs a separator
    let result = if trailing.is_empty() || trailing.starts_with(char::is_whitespace) {
        format!("{}{}", rewritten, trailing)
    } else {
        format!("{} {}", rewritten, trailing)
    };
    log::debug!("Modified WIQL to ensure project scope: {}", result);
    result
}

fn project_predicate(project: &str) -> String {
    format!("[System.TeamProject] = '{}'", project.replace('\'', "''"))
}

/// Copy of `wiql` with the contents of quoted literals replaced by `_`.
/// With `brackets` set, bracketed identifiers are blanked too. Byte offsets
/// are preserved.
fn mask(wiql: &str, brackets: bool) -> String {
    let bytes = wiql.as_bytes();
    let mut masked = Vec::with_capacity(bytes.len());
    let mut closing: Option<u8> = None;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        match closing {
            None => {
                closing = match b {
                    b'\'' | b'"' => Some(b),
                    b'[' if brackets => Some(b']'),
                    _ => None,
                };
                masked.push(b);
            }
            Some(end) if b == end => {
                // a doubled quote is an escaped quote inside the literal
                if end != b']' && bytes.get(i + 1) == Some(&end) {
                    masked.extend_from_slice(b"__");
                    i += 1;
                } else {
                    closing = None;
                    masked.push(b);
                }
            }
            Some(_) => masked.push(b'_'),
        }
        i += 1;
    }

    String::from_utf8_lossy(&masked).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROJECT: &str = "test-project";

    #[test]
    fn default_query_is_scoped_and_ordered() {
        assert_eq!(
            default_wiql(PROJECT),
            "SELECT [System.Id] FROM WorkItems WHERE [System.TeamProject] = 'test-project' ORDER BY [System.Id]"
        );
    }

    #[test]
    fn existing_where_condition_is_wrapped() {
        assert_eq!(
            ensure_project_scope(
                "SELECT [System.Id] FROM WorkItems WHERE [System.State] = 'Active'",
                PROJECT
            ),
            "SELECT [System.Id] FROM WorkItems WHERE [System.TeamProject] = 'test-project' AND ([System.State] = 'Active')"
        );
    }

    #[test]
    fn query_with_project_constraint_is_untouched() {
        let wiql = "SELECT [System.Id] FROM WorkItems WHERE [System.TeamProject] = 'other-project' AND [System.State] = 'Active'";
        assert_eq!(ensure_project_scope(wiql, PROJECT), wiql);

        let macro_scoped = "select [System.Id] from WorkItems where [system.teamproject]=@project";
        assert_eq!(ensure_project_scope(macro_scoped, PROJECT), macro_scoped);
    }

    #[test]
    fn where_clause_is_added_before_order_by() {
        assert_eq!(
            ensure_project_scope("SELECT [System.Id] FROM WorkItems ORDER BY [System.Id]", PROJECT),
            "SELECT [System.Id] FROM WorkItems WHERE [System.TeamProject] = 'test-project' ORDER BY [System.Id]"
        );
    }

    #[test]
    fn where_clause_is_added_before_group_by() {
        assert_eq!(
            ensure_project_scope("SELECT [System.Id] FROM WorkItems GROUP BY [System.State]", PROJECT),
            "SELECT [System.Id] FROM WorkItems WHERE [System.TeamProject] = 'test-project' GROUP BY [System.State]"
        );
    }

    #[test]
    fn where_and_order_by_desc_are_both_kept() {
        assert_eq!(
            ensure_project_scope(
                "SELECT [System.Id] FROM WorkItems WHERE [System.State] = 'Active' ORDER BY [System.Id] DESC",
                PROJECT
            ),
            "SELECT [System.Id] FROM WorkItems WHERE [System.TeamProject] = 'test-project' AND ([System.State] = 'Active') ORDER BY [System.Id] DESC"
        );
    }

    #[test]
    fn group_by_and_order_by_keep_their_order() {
        assert_eq!(
            ensure_project_scope(
                "SELECT [System.Id] FROM WorkItems WHERE [System.State] <> 'Closed' GROUP BY [System.State] ORDER BY [System.Id]",
                PROJECT
            ),
            "SELECT [System.Id] FROM WorkItems WHERE [System.TeamProject] = 'test-project' AND ([System.State] <> 'Closed') GROUP BY [System.State] ORDER BY [System.Id]"
        );
    }

    #[test]
    fn keywords_are_case_insensitive_and_spacing_is_tolerated() {
        assert_eq!(
            ensure_project_scope(
                "select [System.Id] from WorkItems where [System.State] = 'New'\n  order   by [System.Id]",
                PROJECT
            ),
            "select [System.Id] from WorkItems where [System.TeamProject] = 'test-project' AND ([System.State] = 'New')\n  order   by [System.Id]"
        );
    }

    #[test]
    fn or_conditions_stay_inside_the_project() {
        assert_eq!(
            ensure_project_scope(
                "SELECT [System.Id] FROM WorkItems WHERE [System.State] = 'New' OR [System.State] = 'Active'",
                PROJECT
            ),
            "SELECT [System.Id] FROM WorkItems WHERE [System.TeamProject] = 'test-project' AND ([System.State] = 'New' OR [System.State] = 'Active')"
        );
    }

    #[test]
    fn keywords_inside_literals_and_field_names_are_ignored() {
        assert_eq!(
            ensure_project_scope(
                "SELECT [System.Id] FROM WorkItems WHERE [System.Title] CONTAINS 'where to order by date' ORDER BY [Custom.Group By]",
                PROJECT
            ),
            "SELECT [System.Id] FROM WorkItems WHERE [System.TeamProject] = 'test-project' AND ([System.Title] CONTAINS 'where to order by date') ORDER BY [Custom.Group By]"
        );

        // a project comparison inside a literal is not a constraint
        let in_literal =
            "SELECT [System.Id] FROM WorkItems WHERE [System.Title] = '[System.TeamProject] = x'";
        assert!(ensure_project_scope(in_literal, PROJECT)
            .contains("WHERE [System.TeamProject] = 'test-project' AND ("));
    }

    #[test]
    fn escaped_quotes_do_not_end_a_literal() {
        assert_eq!(
            ensure_project_scope(
                "SELECT [System.Id] FROM WorkItems WHERE [System.Title] = 'it''s where order by goes'",
                PROJECT
            ),
            "SELECT [System.Id] FROM WorkItems WHERE [System.TeamProject] = 'test-project' AND ([System.Title] = 'it''s where order by goes')"
        );
    }

    #[test]
    fn empty_where_condition_gets_only_the_project() {
        assert_eq!(
            ensure_project_scope("SELECT [System.Id] FROM WorkItems WHERE ORDER BY [System.Id]", PROJECT),
            "SELECT [System.Id] FROM WorkItems WHERE [System.TeamProject] = 'test-project' ORDER BY [System.Id]"
        );
    }

    #[test]
    fn clause_after_a_closing_paren_ends_the_condition() {
        assert_eq!(
            ensure_project_scope(
                "SELECT [System.Id] FROM WorkItems WHERE ([System.State] = 'A')ORDER BY [System.Id]",
                PROJECT
            ),
            "SELECT [System.Id] FROM WorkItems WHERE [System.TeamProject] = 'test-project' AND (([System.State] = 'A')) ORDER BY [System.Id]"
        );
        assert_eq!(
            ensure_project_scope(
                "SELECT [System.Id] FROM WorkItems WHERE [System.Title] = 'x'GROUP BY [System.State]",
                PROJECT
            ),
            "SELECT [System.Id] FROM WorkItems WHERE [System.TeamProject] = 'test-project' AND ([System.Title] = 'x') GROUP BY [System.State]"
        );
    }

    #[test]
    fn asof_clause_stays_at_the_end() {
        assert_eq!(
            ensure_project_scope(
                "SELECT [System.Id] FROM WorkItems WHERE [System.State] = 'Active' ASOF '2024-01-01'",
                PROJECT
            ),
            "SELECT [System.Id] FROM WorkItems WHERE [System.TeamProject] = 'test-project' AND ([System.State] = 'Active') ASOF '2024-01-01'"
        );
    }

    #[test]
    fn project_names_with_quotes_are_escaped() {
        assert_eq!(
            ensure_project_scope("SELECT [System.Id] FROM WorkItems", "Bob's Project"),
            "SELECT [System.Id] FROM WorkItems WHERE [System.TeamProject] = 'Bob''s Project'"
        );
    }

    #[test]
    fn rewriting_is_idempotent() {
        let queries = [
            "SELECT [System.Id] FROM WorkItems",
            "SELECT [System.Id] FROM WorkItems WHERE [System.State] = 'Active'",
            "SELECT [System.Id] FROM WorkItems GROUP BY [System.State] ORDER BY [System.Id] DESC",
            "SELECT [System.Id] FROM WorkItems WHERE [System.Tags] CONTAINS 'x' ORDER BY [System.ChangedDate]",
        ];
        for query in queries {
            let once = ensure_project_scope(query, PROJECT);
            assert_eq!(ensure_project_scope(&once, PROJECT), once, "query: {}", query);
        }
    }

    #[test]
    fn mask_preserves_offsets() {
        let wiql = "WHERE [Sys.Ä] = 'héllo ''x''' ";
        let masked = mask(wiql, true);
        assert_eq!(masked.len(), wiql.len());
        assert_eq!(&masked[..7], "WHERE [");
        assert!(!masked.contains("héllo"));
    }
}
