//! Text rendering of a result set for the analysis prompt.

use trxql_common::ResultSet;

pub const DEFAULT_ANALYSIS_ROWS: usize = 100;

/// Render at most `max_rows` rows as pipe-separated text.
pub fn format_results_for_analysis(result: &ResultSet, max_rows: usize) -> String {
    if result.columns.is_empty() {
        return "No columns returned.".to_string();
    }
    if result.rows.is_empty() {
        return "Query executed successfully. No rows returned.".to_string();
    }

    let total = result.row_count();
    let mut out = format!(
        "Query Results ({total} row{}):\n\n",
        if total == 1 { "" } else { "s" }
    );

    out.push_str(&result.columns.join(" | "));
    out.push('\n');
    let rule_len: usize = result.columns.iter().map(|c| c.chars().count()).sum::<usize>()
        + 3 * (result.columns.len() - 1);
    out.push_str(&"-".repeat(rule_len));
    out.push('\n');

    for row in result.rows.iter().take(max_rows) {
        let line = row
            .iter()
            .map(|cell| cell.as_deref().unwrap_or("NULL"))
            .collect::<Vec<_>>()
            .join(" | ");
        out.push_str(&line);
        out.push('\n');
    }

    if total > max_rows {
        out.push_str(&format!("\n... (showing first {max_rows} of {total} rows)\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn numbers(n: usize) -> ResultSet {
        ResultSet::new(
            vec!["id".into(), "city".into()],
            (0..n).map(|i| vec![Some(i.to_string()), None]).collect(),
        )
    }

    #[test]
    fn test_small_result() {
        assert_eq!(
            format_results_for_analysis(&numbers(1), DEFAULT_ANALYSIS_ROWS),
            "Query Results (1 row):\n\nid | city\n---------\n0 | NULL\n"
        );
    }

    #[test]
    fn test_truncated_to_max_rows() {
        let text = format_results_for_analysis(&numbers(150), DEFAULT_ANALYSIS_ROWS);
        assert!(text.starts_with("Query Results (150 rows):"));
        assert!(text.contains("\n99 | NULL\n"));
        assert!(!text.contains("\n100 | NULL\n"));
        assert!(text.ends_with("... (showing first 100 of 150 rows)\n"));
    }

    #[test]
    fn test_empty_cases() {
        assert_eq!(
            format_results_for_analysis(&ResultSet::default(), 100),
            "No columns returned."
        );
        assert_eq!(
            format_results_for_analysis(&ResultSet::new(vec!["id".into()], vec![]), 100),
            "Query executed successfully. No rows returned."
        );
    }
}
