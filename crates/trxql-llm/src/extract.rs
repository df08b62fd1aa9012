//! Turning a raw completion into candidate SQL text.

use serde_json::Value;

pub const REFUSAL_PREFIX: &str = "ERROR:";

/// True when the model declined the request.
pub fn is_refusal(completion: &str) -> bool {
    completion.trim_start().starts_with(REFUSAL_PREFIX)
}

fn strip_code_fences(text: &str) -> String {
    if !text.starts_with("```") {
        return text.to_string();
    }

    let mut lines: Vec<&str> = text.lines().collect();
    if lines.len() == 1 {
        // ```SELECT 1``` or ```sql SELECT 1```
        let inner = text.trim_matches('`').trim();
        return match inner.split_once(char::is_whitespace) {
            Some((tag, rest)) if tag.eq_ignore_ascii_case("sql") => rest.to_string(),
            _ => inner.to_string(),
        };
    }

    lines.remove(0);
    if lines.last().is_some_and(|l| l.trim() == "```") {
        lines.pop();
    }
    lines.join("\n")
}

/// Extract bare SQL from a completion. Never fails; unrecognised shapes pass through.
pub fn extract_sql(completion: &str) -> String {
    let text = strip_code_fences(completion.trim());
    let text = text.trim();

    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(text) {
        for key in ["query", "sql"] {
            if let Some(Value::String(sql)) = map.get(key) {
                return sql.trim().to_string();
            }
        }
    }
    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQL: &str = "SELECT * FROM transaction ORDER BY transaction_amount_kzt DESC LIMIT 10";

    #[test]
    fn test_plain_sql_passes_through_trimmed() {
        assert_eq!(extract_sql(&format!("  {SQL}\n")), SQL);
    }

    #[test]
    fn test_fenced_with_language_tag() {
        assert_eq!(extract_sql(&format!("```sql\n{SQL}\n```")), SQL);
    }

    #[test]
    fn test_fenced_without_tag() {
        assert_eq!(extract_sql(&format!("```\n{SQL}\n```")), SQL);
    }

    #[test]
    fn test_fence_without_closing_line() {
        assert_eq!(extract_sql(&format!("```sql\n{SQL}")), SQL);
    }

    #[test]
    fn test_multiline_query_keeps_inner_lines() {
        let got = extract_sql("```sql\nSELECT merchant_city\nFROM transaction\n```");
        assert_eq!(got, "SELECT merchant_city\nFROM transaction");
    }

    #[test]
    fn test_single_line_fence() {
        assert_eq!(extract_sql("```SELECT 1```"), "SELECT 1");
        assert_eq!(extract_sql("```sql SELECT 1```"), "SELECT 1");
    }

    #[test]
    fn test_json_query_member() {
        assert_eq!(extract_sql(r#"{"query": "SELECT 1"}"#), "SELECT 1");
    }

    #[test]
    fn test_json_sql_member_used_when_no_query() {
        assert_eq!(extract_sql(r#"{"sql": " SELECT 2 "}"#), "SELECT 2");
    }

    #[test]
    fn test_fenced_json() {
        assert_eq!(extract_sql("```json\n{\"query\": \"SELECT 3\"}\n```"), "SELECT 3");
    }

    #[test]
    fn test_json_without_known_member_passes_through() {
        assert_eq!(extract_sql(r#"{"text": "hi"}"#), r#"{"text": "hi"}"#);
        assert_eq!(extract_sql("[1, 2]"), "[1, 2]");
    }

    #[test]
    fn test_malformed_json_passes_through() {
        assert_eq!(extract_sql(r#"{"query": "SELECT"#), r#"{"query": "SELECT"#);
    }

    #[test]
    fn test_refusal_detection() {
        assert!(is_refusal(crate::prompts::REFUSAL_MESSAGE));
        assert!(is_refusal("\nERROR: nope"));
        assert!(!is_refusal("SELECT 'ERROR:' FROM transaction"));
    }
}
