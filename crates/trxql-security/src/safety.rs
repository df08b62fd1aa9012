//! Denylist check over generated SQL.
//!
//! This is not a parser. A denylisted verb inside a string literal or a
//! comment is still rejected, and destructive statements that use no
//! denylisted verb pass. Both gaps are accepted.

use regex::Regex;
use std::sync::OnceLock;

/// Whole-word verbs that may never reach the executor, checked in this order.
pub const DENYLIST: [&str; 15] = [
    "DROP", "DELETE", "UPDATE", "INSERT", "ALTER", "CREATE", "TRUNCATE",
    "EXEC", "EXECUTE", "GRANT", "REVOKE", "COMMIT", "ROLLBACK", "LOCK", "UNLOCK",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SafetyVerdict {
    Safe,
    Rejected { keyword: &'static str },
}

impl SafetyVerdict {
    pub fn is_safe(&self) -> bool {
        matches!(self, SafetyVerdict::Safe)
    }

    /// User-facing reason, `None` when safe.
    pub fn message(&self) -> Option<String> {
        match self {
            SafetyVerdict::Safe => None,
            SafetyVerdict::Rejected { keyword } => {
                Some(format!("Dangerous SQL operation detected: {keyword}"))
            }
        }
    }
}

fn denylist_patterns() -> &'static [(&'static str, Regex)] {
    static PATTERNS: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        DENYLIST
            .iter()
            .filter_map(|kw| {
                Regex::new(&format!(r"\b{}\b", regex::escape(kw)))
                    .ok()
                    .map(|re| (*kw, re))
            })
            .collect()
    })
}

/// Check a candidate query; the first denylisted verb (in [`DENYLIST`] order) wins.
pub fn check_sql_safety(sql: &str) -> SafetyVerdict {
    let upper = sql.trim().to_uppercase();
    for &(keyword, ref re) in denylist_patterns() {
        if re.is_match(&upper) {
            tracing::warn!(keyword, "generated SQL rejected by denylist");
            return SafetyVerdict::Rejected { keyword };
        }
    }
    SafetyVerdict::Safe
}
